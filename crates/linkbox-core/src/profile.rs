//! User profiles
//!
//! One document per user at `profile/userProfile`. Saving merges into the
//! existing document so fields written by other clients survive.

use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::{DocumentStore, Record};
use crate::error::{LinkError, LinkResult, Operation, StoreError};
use crate::identity::Identity;
use crate::models::{Profile, DEFAULT_USERNAME};

/// Collection holding the profile document
pub const PROFILE_COLLECTION: &str = "profile";

/// Id of the single profile document
pub const PROFILE_DOCUMENT: &str = "userProfile";

/// Loads and saves the signed-in user's profile
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load the profile of `identity`
    ///
    /// A missing document yields an empty profile. The identity's email, when
    /// known, takes precedence over the stored one.
    pub async fn load(&self, identity: Option<&Identity>) -> LinkResult<Profile> {
        let identity = identity.ok_or(LinkError::Unauthenticated)?;

        let doc = self
            .store
            .get(&identity.uid, PROFILE_COLLECTION, PROFILE_DOCUMENT)
            .await
            .map_err(|e| LinkError::from_store(Operation::ProfileLoad, e))?;

        let mut profile = match doc {
            Some(doc) => serde_json::from_value(serde_json::Value::Object(doc.data))
                .map_err(|e| LinkError::from_store(Operation::ProfileLoad, e.into()))?,
            None => {
                debug!("No profile for {}; using defaults", identity.uid);
                Profile::default()
            }
        };

        if let Some(ref email) = identity.email {
            profile.email = email.clone();
        }
        Ok(profile)
    }

    /// Save `profile` for `identity`, returning what was stored
    pub async fn save(&self, identity: Option<&Identity>, mut profile: Profile) -> LinkResult<Profile> {
        let identity = identity.ok_or(LinkError::Unauthenticated)?;

        if profile.username.trim().is_empty() {
            profile.username = DEFAULT_USERNAME.to_string();
        }

        let record = to_record(&profile)
            .map_err(|e| LinkError::from_store(Operation::ProfileSave, e))?;

        self.store
            .set(&identity.uid, PROFILE_COLLECTION, PROFILE_DOCUMENT, record, true)
            .await
            .map_err(|e| LinkError::from_store(Operation::ProfileSave, e))?;

        info!("Saved profile for {}", identity.uid);
        Ok(profile)
    }
}

fn to_record(profile: &Profile) -> Result<Record, StoreError> {
    match serde_json::to_value(profile)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::Persistence(format!(
            "profile encoded as {} instead of an object",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use serde_json::json;

    fn service() -> (ProfileService, MemoryStore) {
        let store = MemoryStore::new();
        (ProfileService::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_requires_identity() {
        let (profiles, _) = service();
        assert!(matches!(
            profiles.load(None).await,
            Err(LinkError::Unauthenticated)
        ));
        assert!(matches!(
            profiles.save(None, Profile::default()).await,
            Err(LinkError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_missing_profile_uses_identity_email() {
        let (profiles, _) = service();
        let identity = Identity::new("u1").with_email("u1@example.com");

        let profile = profiles.load(Some(&identity)).await.unwrap();
        assert_eq!(profile.email, "u1@example.com");
        assert!(profile.username.is_empty());
    }

    #[tokio::test]
    async fn test_save_defaults_username() {
        let (profiles, _) = service();
        let identity = Identity::new("u1");

        let saved = profiles
            .save(Some(&identity), Profile::default())
            .await
            .unwrap();
        assert_eq!(saved.username, DEFAULT_USERNAME);

        let loaded = profiles.load(Some(&identity)).await.unwrap();
        assert_eq!(loaded.username, DEFAULT_USERNAME);
    }

    #[tokio::test]
    async fn test_save_merges_into_existing_document() {
        let (profiles, store) = service();
        let identity = Identity::new("u1");

        let serde_json::Value::Object(extra) = json!({ "avatarUrl": "https://img" }) else {
            unreachable!()
        };
        store
            .set("u1", PROFILE_COLLECTION, PROFILE_DOCUMENT, extra, false)
            .await
            .unwrap();

        let profile = Profile {
            username: "alice".to_string(),
            bio: "reads a lot".to_string(),
            ..Profile::default()
        };
        profiles.save(Some(&identity), profile).await.unwrap();

        let doc = store
            .get("u1", PROFILE_COLLECTION, PROFILE_DOCUMENT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.data["avatarUrl"], json!("https://img"));
        assert_eq!(doc.data["username"], json!("alice"));
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let (profiles, store) = service();
        store.set_available(false);

        let err = profiles
            .load(Some(&Identity::new("u1")))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::StoreUnavailable { .. }));
        assert!(err.to_string().starts_with("profile load failed"));
    }
}
