//! Signed-in identity
//!
//! The identity's `uid` scopes every collection a user can read or write.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user handle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Stable unique id
    pub uid: String,
    /// Email address, if the provider knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether this identity was issued without credentials
    #[serde(default)]
    pub anonymous: bool,
}

impl Identity {
    /// Create an identity for a known user id
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            anonymous: false,
        }
    }

    /// Create a fresh anonymous identity
    pub fn anonymous() -> Self {
        Self {
            uid: Uuid::new_v4().simple().to_string(),
            email: None,
            anonymous: true,
        }
    }

    /// Attach an email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.email, self.anonymous) {
            (Some(email), _) => write!(f, "{} <{}>", self.uid, email),
            (None, true) => write!(f, "{} (anonymous)", self.uid),
            (None, false) => write!(f, "{}", self.uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_ids_are_unique() {
        let a = Identity::anonymous();
        let b = Identity::anonymous();
        assert!(a.anonymous);
        assert_ne!(a.uid, b.uid);
    }

    #[test]
    fn test_display() {
        assert_eq!(Identity::new("alice").to_string(), "alice");
        assert_eq!(
            Identity::new("alice")
                .with_email("alice@example.com")
                .to_string(),
            "alice <alice@example.com>"
        );
        assert!(Identity::anonymous().to_string().ends_with("(anonymous)"));
    }

    #[test]
    fn test_serialization_skips_missing_email() {
        let json = serde_json::to_string(&Identity::new("bob")).unwrap();
        assert!(!json.contains("email"));
        let parsed: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Identity::new("bob"));
    }
}
