//! Data models for LinkBox
//!
//! Defines the core data structures: Link, NewLink and Profile.
//! Links are stored as JSON documents in the owner's `links` collection;
//! the document id lives outside the record and is attached on decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{Document, Record};
use crate::error::{LinkError, StoreError};

/// Placeholder title for links saved without one
pub const DEFAULT_TITLE: &str = "Untitled";

/// Category assigned to every new link
pub const DEFAULT_CATEGORY: &str = "default";

/// Username stored when a profile is saved without one
pub const DEFAULT_USERNAME: &str = "Anonymous User";

/// A saved link as mirrored from the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Store-assigned document id
    pub id: String,
    /// The URL
    pub url: String,
    /// Display title
    #[serde(default = "default_title")]
    pub title: String,
    /// Tags, in the order they were entered
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    /// Whether the link is marked as a favorite
    #[serde(default)]
    pub is_favorite: bool,
    /// Owner identity
    pub user_id: String,
    /// When this link was created (milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Decode a store document into a link
    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        let Document { id, mut data } = doc;
        data.insert("id".to_string(), serde_json::Value::String(id));
        Ok(serde_json::from_value(serde_json::Value::Object(data))?)
    }

    /// Case-insensitive match against the title only
    pub fn title_contains(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// User-supplied fields of a link that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub category: String,
}

impl NewLink {
    /// Create a new link draft for the given URL
    ///
    /// The URL is trimmed and must not be empty.
    pub fn new(url: impl AsRef<str>) -> Result<Self, LinkError> {
        let url = url.as_ref().trim();
        if url.is_empty() {
            return Err(LinkError::InvalidInput("URL is required".to_string()));
        }
        Ok(Self {
            url: url.to_string(),
            title: DEFAULT_TITLE.to_string(),
            tags: Vec::new(),
            category: DEFAULT_CATEGORY.to_string(),
        })
    }

    /// Set the title; blank input keeps the placeholder
    pub fn with_title(mut self, title: impl AsRef<str>) -> Self {
        let title = title.as_ref().trim();
        self.title = if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title.to_string()
        };
        self
    }

    /// Set tags from free-text input (see [`parse_tags`])
    pub fn with_tags_input(mut self, input: &str) -> Self {
        self.tags = parse_tags(input);
        self
    }

    /// Set tags directly, dropping blank entries
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags
            .into_iter()
            .map(Into::into)
            .filter(|t| !t.trim().is_empty())
            .collect();
        self
    }

    /// Build the stored record for this draft
    pub(crate) fn into_record(
        self,
        is_favorite: bool,
        user_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Record, StoreError> {
        let record = LinkRecord {
            url: self.url,
            title: self.title,
            tags: self.tags,
            category: self.category,
            is_favorite,
            user_id: user_id.to_string(),
            created_at,
        };
        match serde_json::to_value(record)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(StoreError::Persistence(format!(
                "link record encoded as {} instead of an object",
                other
            ))),
        }
    }
}

/// Stored shape of a link (everything but the id)
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkRecord {
    url: String,
    title: String,
    tags: Vec<String>,
    category: String,
    is_favorite: bool,
    user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
}

/// Split free-text tag input on whitespace and commas
///
/// Empty tokens are discarded; order is preserved.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Public profile of a user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub website: String,
    pub bio: String,
}
