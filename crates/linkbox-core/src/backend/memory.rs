//! In-process document store
//!
//! A multi-tenant collection store keyed by `(owner, collection)` with live
//! queries. Every successful write pushes a fresh, ordered snapshot to each
//! subscriber of the affected collection.
//!
//! ## Behavior
//!
//! - Document ids are random UUIDs, never reused
//! - Inserts whose `userId` field differs from the owner are rejected
//! - Updating a missing document fails with `NotFound`; deleting one succeeds
//! - When marked unavailable, calls fail with `Unavailable` and live queries
//!   receive one error and are then closed
//!
//! With a backing file, the whole store is saved after every write.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::persistence;
use super::{
    CollectionQuery, Document, DocumentStore, ErrorCallback, Record, SnapshotCallback,
    SortDirection, Subscription,
};
use crate::error::{StoreError, StoreResult};

/// Field checked against the owner on insert
const OWNER_FIELD: &str = "userId";

/// Document store held in memory, optionally backed by a JSON file
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<StoreState>,
    /// Serializes deliveries so subscribers see snapshots in write order
    notify: Mutex<()>,
    path: Option<PathBuf>,
}

#[derive(Default)]
struct StoreState {
    data: StoreData,
    subscribers: HashMap<u64, Subscriber>,
    next_subscriber: u64,
    available: bool,
}

/// Persisted contents: owner -> collection -> documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    next_seq: u64,
    owners: BTreeMap<String, BTreeMap<String, Vec<StoredDocument>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    id: String,
    /// Write order, used to break ties between equal sort keys
    seq: u64,
    data: Record,
}

struct Subscriber {
    query: CollectionQuery,
    on_snapshot: SnapshotCallback,
    on_error: ErrorCallback,
}

type Delivery = (SnapshotCallback, Vec<Document>);

impl MemoryStore {
    /// Create an empty, purely in-memory store
    pub fn new() -> Self {
        Self::build(StoreData::default(), None)
    }

    /// Open a store backed by `path`, loading existing contents
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = persistence::load_json(&path)?.unwrap_or_default();
        Ok(Self::build(data, Some(path)))
    }

    fn build(data: StoreData, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState {
                    data,
                    available: true,
                    ..StoreState::default()
                }),
                notify: Mutex::new(()),
                path,
            }),
        }
    }

    /// Mark the store reachable or unreachable
    ///
    /// Going offline fails every live query once and closes it.
    pub fn set_available(&self, available: bool) {
        let _order = self.inner.lock_notify();
        let failed: Vec<ErrorCallback> = {
            let mut state = self.inner.lock_state();
            state.available = available;
            if available {
                Vec::new()
            } else {
                state
                    .subscribers
                    .drain()
                    .map(|(_, sub)| sub.on_error)
                    .collect()
            }
        };

        for on_error in failed {
            on_error(StoreError::Unavailable("store is offline".to_string()));
        }
    }

    /// Number of documents in one owner's collection
    pub fn document_count(&self, owner: &str, collection: &str) -> usize {
        self.inner
            .lock_state()
            .data
            .collection(owner, collection)
            .map_or(0, Vec::len)
    }

    /// Number of live queries
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock_state().subscribers.len()
    }

    /// Apply a write and push snapshots to affected subscribers
    ///
    /// The write lands on a copy that only replaces the live data once it
    /// has been persisted, so a failed call leaves no trace.
    fn write<T>(
        &self,
        owner: &str,
        collection: &str,
        apply: impl FnOnce(&mut StoreData) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _order = self.inner.lock_notify();
        let (result, deliveries) = {
            let mut state = self.inner.lock_state();
            state.ensure_available()?;
            let mut next = state.data.clone();
            let result = apply(&mut next)?;
            self.inner.persist(&next)?;
            state.data = next;
            (result, state.deliveries_for(owner, collection))
        };

        for (on_snapshot, docs) in deliveries {
            on_snapshot(docs);
        }
        Ok(result)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreInner {
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_notify(&self) -> MutexGuard<'_, ()> {
        self.notify.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, data: &StoreData) -> StoreResult<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        persistence::save_json(path, data).map_err(|e| StoreError::Persistence(format!("{:#}", e)))
    }
}

impl StoreState {
    fn ensure_available(&self) -> StoreResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable("store is offline".to_string()))
        }
    }

    fn deliveries_for(&self, owner: &str, collection: &str) -> Vec<Delivery> {
        self.subscribers
            .values()
            .filter(|sub| sub.query.owner == owner && sub.query.collection == collection)
            .map(|sub| (sub.on_snapshot.clone(), self.data.snapshot(&sub.query)))
            .collect()
    }
}

impl StoreData {
    fn collection(&self, owner: &str, collection: &str) -> Option<&Vec<StoredDocument>> {
        self.owners.get(owner).and_then(|c| c.get(collection))
    }

    /// Existing collection, if the owner ever wrote to it
    fn existing_mut(
        &mut self,
        owner: &str,
        collection: &str,
    ) -> Option<&mut Vec<StoredDocument>> {
        self.owners.get_mut(owner).and_then(|c| c.get_mut(collection))
    }

    /// Collection to write into, created on first use
    fn collection_mut(&mut self, owner: &str, collection: &str) -> &mut Vec<StoredDocument> {
        self.owners
            .entry(owner.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Ordered copy of the collection a query points at
    fn snapshot(&self, query: &CollectionQuery) -> Vec<Document> {
        let mut docs: Vec<&StoredDocument> = self
            .collection(&query.owner, &query.collection)
            .map(|docs| docs.iter().collect())
            .unwrap_or_default();

        docs.sort_by(|a, b| {
            let ordering = compare_values(
                a.data.get(&query.order_field),
                b.data.get(&query.order_field),
            )
            .then(a.seq.cmp(&b.seq));
            match query.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        docs.into_iter()
            .map(|doc| Document {
                id: doc.id.clone(),
                data: doc.data.clone(),
            })
            .collect()
    }
}

/// Order JSON values: missing < null < bool < number < string < other
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn subscribe_collection(
        &self,
        query: CollectionQuery,
        on_snapshot: SnapshotCallback,
        on_error: ErrorCallback,
    ) -> StoreResult<Subscription> {
        let _order = self.inner.lock_notify();
        let (id, initial) = {
            let mut state = self.inner.lock_state();
            state.ensure_available()?;
            let id = state.next_subscriber;
            state.next_subscriber += 1;
            let initial = state.data.snapshot(&query);
            debug!(
                "Subscribed to {}/{} ({} documents)",
                query.owner,
                query.collection,
                initial.len()
            );
            state.subscribers.insert(
                id,
                Subscriber {
                    query,
                    on_snapshot: on_snapshot.clone(),
                    on_error,
                },
            );
            (id, initial)
        };

        on_snapshot(initial);

        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock_state().subscribers.remove(&id);
            }
        }))
    }

    async fn insert(&self, owner: &str, collection: &str, record: Record) -> StoreResult<String> {
        if let Some(record_owner) = record.get(OWNER_FIELD).and_then(Value::as_str) {
            if record_owner != owner {
                return Err(StoreError::PermissionDenied(format!(
                    "'{}' cannot write into the collection of '{}'",
                    record_owner, owner
                )));
            }
        }

        self.write(owner, collection, |data| {
            let id = Uuid::new_v4().simple().to_string();
            let seq = data.next_seq();
            data.collection_mut(owner, collection).push(StoredDocument {
                id: id.clone(),
                seq,
                data: record,
            });
            Ok(id)
        })
    }

    async fn update(
        &self,
        owner: &str,
        collection: &str,
        doc_id: &str,
        patch: Record,
    ) -> StoreResult<()> {
        self.write(owner, collection, |data| {
            let doc = data
                .existing_mut(owner, collection)
                .and_then(|docs| docs.iter_mut().find(|doc| doc.id == doc_id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: doc_id.to_string(),
                })?;
            doc.data.extend(patch);
            Ok(())
        })
    }

    async fn delete(&self, owner: &str, collection: &str, doc_id: &str) -> StoreResult<()> {
        self.write(owner, collection, |data| {
            if let Some(docs) = data.existing_mut(owner, collection) {
                docs.retain(|doc| doc.id != doc_id);
            }
            Ok(())
        })
    }

    async fn get(
        &self,
        owner: &str,
        collection: &str,
        doc_id: &str,
    ) -> StoreResult<Option<Document>> {
        let state = self.inner.lock_state();
        state.ensure_available()?;
        Ok(state
            .data
            .collection(owner, collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == doc_id))
            .map(|doc| Document {
                id: doc.id.clone(),
                data: doc.data.clone(),
            }))
    }

    async fn set(
        &self,
        owner: &str,
        collection: &str,
        doc_id: &str,
        record: Record,
        merge: bool,
    ) -> StoreResult<()> {
        self.write(owner, collection, |data| {
            let seq = data.next_seq();
            let docs = data.collection_mut(owner, collection);
            match docs.iter_mut().find(|doc| doc.id == doc_id) {
                Some(doc) if merge => doc.data.extend(record),
                Some(doc) => doc.data = record,
                None => docs.push(StoredDocument {
                    id: doc_id.to_string(),
                    seq,
                    data: record,
                }),
            }
            Ok(())
        })
    }
}
