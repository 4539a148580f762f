//! External collaborators
//!
//! The sync service never talks to a concrete backend. It is handed an
//! [`AuthProvider`] and a [`DocumentStore`] at construction time.
//!
//! ## Contracts
//!
//! - `AuthProvider::on_identity_change` registers a callback that receives the
//!   current identity (or `None`) on every sign-in/sign-out transition.
//! - `DocumentStore::subscribe_collection` pushes a complete snapshot of the
//!   owner's collection on every change, ordered by the requested field.
//! - Writes are scoped by owner; the store's own access policy decides what an
//!   owner may touch.
//!
//! Both registrations return a [`Subscription`] guard that releases the
//! callback when dropped.
//!
//! Local implementations live in [`auth`] and [`memory`].

pub mod auth;
pub mod memory;
mod persistence;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::identity::Identity;

pub use auth::LocalAuth;
pub use memory::MemoryStore;

/// A stored record: a JSON object without its id
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A document as delivered by the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Record,
}

/// Sort direction for collection queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A live query over one owner's collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub owner: String,
    pub collection: String,
    pub order_field: String,
    pub direction: SortDirection,
}

impl CollectionQuery {
    /// Query `collection` of `owner`, newest `order_field` first
    pub fn newest_first(
        owner: impl Into<String>,
        collection: impl Into<String>,
        order_field: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            collection: collection.into(),
            order_field: order_field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Receives each complete snapshot of a subscribed collection
pub type SnapshotCallback = Arc<dyn Fn(Vec<Document>) + Send + Sync>;

/// Receives errors raised by a live subscription
pub type ErrorCallback = Arc<dyn Fn(StoreError) + Send + Sync>;

/// Receives identity transitions
pub type IdentityCallback = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

/// Guard for a registered callback
///
/// The release closure runs exactly once: on [`Subscription::unsubscribe`] or
/// on drop, whichever comes first.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a release closure
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Release the registration now
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Issues identities and reports sign-in/sign-out transitions
pub trait AuthProvider: Send + Sync {
    /// Register for identity changes
    ///
    /// Implementations deliver the current state to the new callback as soon
    /// as it is registered, then once per transition.
    fn on_identity_change(&self, callback: IdentityCallback) -> Subscription;
}

/// A remote, multi-tenant collection store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a live query
    ///
    /// `on_snapshot` receives the full ordered collection after every change.
    /// `on_error` receives failures of the live query after it was opened.
    fn subscribe_collection(
        &self,
        query: CollectionQuery,
        on_snapshot: SnapshotCallback,
        on_error: ErrorCallback,
    ) -> StoreResult<Subscription>;

    /// Insert a record, returning the assigned document id
    async fn insert(&self, owner: &str, collection: &str, record: Record) -> StoreResult<String>;

    /// Merge `patch` into an existing document
    async fn update(
        &self,
        owner: &str,
        collection: &str,
        doc_id: &str,
        patch: Record,
    ) -> StoreResult<()>;

    /// Remove a document
    async fn delete(&self, owner: &str, collection: &str, doc_id: &str) -> StoreResult<()>;

    /// Fetch a single document
    async fn get(&self, owner: &str, collection: &str, doc_id: &str)
        -> StoreResult<Option<Document>>;

    /// Write a document under a caller-chosen id
    ///
    /// With `merge`, fields of an existing document not present in `record`
    /// are kept; otherwise the document is replaced.
    async fn set(
        &self,
        owner: &str,
        collection: &str,
        doc_id: &str,
        record: Record,
        merge: bool,
    ) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_releases_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.unsubscribe();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_releases_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let counter = count.clone();
            let _sub = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_newest_first_query() {
        let query = CollectionQuery::newest_first("u1", "links", "createdAt");
        assert_eq!(query.direction, SortDirection::Descending);
        assert_eq!(query.owner, "u1");
    }
}
