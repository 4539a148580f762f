//! Link synchronization service
//!
//! A single background task owns the mirror. Auth and store callbacks never
//! touch it directly; they post [`Inbound`] messages into the task's inbox.
//! Each collection subscription is tagged with the epoch that was current
//! when it was opened, and messages from an older epoch are dropped.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::LinkState;
use crate::backend::{
    AuthProvider, CollectionQuery, Document, DocumentStore, ErrorCallback, Record,
    SnapshotCallback, Subscription,
};
use crate::error::{LinkError, LinkResult, Operation, StoreError};
use crate::identity::Identity;
use crate::models::{Link, NewLink};

/// Collection holding each user's links
pub const LINKS_COLLECTION: &str = "links";

/// Field the live query is ordered by (newest first)
pub const ORDER_FIELD: &str = "createdAt";

/// Commands sent to the sync task
#[derive(Debug)]
enum SyncCommand {
    /// Release all subscriptions and stop
    Shutdown,
}

/// Messages posted by collaborator callbacks
enum Inbound {
    Identity(Option<Identity>),
    Snapshot { epoch: u64, docs: Vec<Document> },
    SubscriptionFailed { epoch: u64, error: StoreError },
}

/// Handle to the live mirror of the signed-in user's links
///
/// Dropping the handle stops the sync task, which releases the identity
/// listener and the collection subscription together.
pub struct LinkSync {
    store: Arc<dyn DocumentStore>,
    state_rx: watch::Receiver<LinkState>,
    command_tx: mpsc::Sender<SyncCommand>,
    task: JoinHandle<()>,
}

impl LinkSync {
    /// Start syncing
    ///
    /// Registers with `auth` immediately; must be called inside a tokio
    /// runtime.
    pub fn spawn(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(4);
        let (state_tx, state_rx) = watch::channel(LinkState::initial());

        let identity_tx = inbox_tx.clone();
        let auth_subscription = auth.on_identity_change(Arc::new(move |identity| {
            let _ = identity_tx.send(Inbound::Identity(identity));
        }));

        let worker = SyncWorker {
            store: store.clone(),
            inbox_tx,
            state_tx,
            epoch: 0,
            session: None,
            auth_subscription: Some(auth_subscription),
        };
        let task = tokio::spawn(worker.run(inbox_rx, command_rx));

        Self {
            store,
            state_rx,
            command_tx,
            task,
        }
    }

    /// Current state of the mirror
    pub fn state(&self) -> LinkState {
        self.state_rx.borrow().clone()
    }

    /// Watch the mirror for changes
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state_rx.clone()
    }

    /// Wait until the first snapshot or "no identity" signal has arrived
    pub async fn wait_until_loaded(&self) -> LinkState {
        let mut rx = self.state_rx.clone();
        let loaded = rx
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone());
        match loaded {
            Ok(state) => state,
            // Task is gone; report whatever it last published
            Err(_) => rx.borrow().clone(),
        }
    }

    /// Store a new link for the signed-in user
    ///
    /// The link shows up in the mirror with the store's next snapshot.
    pub async fn add(&self, link: NewLink, is_favorite: bool) -> LinkResult<()> {
        let identity = self.require_identity()?;
        let record = link
            .into_record(is_favorite, &identity.uid, Utc::now())
            .map_err(|e| LinkError::from_store(Operation::Add, e))?;

        let id = self
            .store
            .insert(&identity.uid, LINKS_COLLECTION, record)
            .await
            .map_err(|e| failed(Operation::Add, e))?;

        info!("Added link {} (favorite={})", id, is_favorite);
        Ok(())
    }

    /// Delete a link
    pub async fn delete(&self, link_id: &str) -> LinkResult<()> {
        let identity = self.require_identity()?;

        self.store
            .delete(&identity.uid, LINKS_COLLECTION, link_id)
            .await
            .map_err(|e| failed(Operation::Delete, e))?;

        info!("Deleted link {}", link_id);
        Ok(())
    }

    /// Set the favorite flag of a link
    pub async fn toggle_favorite(&self, link_id: &str, is_favorite: bool) -> LinkResult<()> {
        let identity = self.require_identity()?;

        let mut patch = Record::new();
        patch.insert("isFavorite".to_string(), Value::Bool(is_favorite));

        self.store
            .update(&identity.uid, LINKS_COLLECTION, link_id, patch)
            .await
            .map_err(|e| failed(Operation::FavoriteUpdate, e))?;

        info!("Link {} favorite={}", link_id, is_favorite);
        Ok(())
    }

    /// Stop syncing and wait for subscriptions to be released
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(SyncCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!("Sync task ended abnormally: {}", e);
        }
    }

    fn require_identity(&self) -> LinkResult<Identity> {
        self.state_rx
            .borrow()
            .identity()
            .cloned()
            .ok_or(LinkError::Unauthenticated)
    }
}

fn failed(op: Operation, error: StoreError) -> LinkError {
    warn!("{} failed: {}", op, error);
    LinkError::from_store(op, error)
}

/// State owned by the sync task
struct SyncWorker {
    store: Arc<dyn DocumentStore>,
    /// Cloned into each subscription's callbacks
    inbox_tx: mpsc::UnboundedSender<Inbound>,
    state_tx: watch::Sender<LinkState>,
    epoch: u64,
    session: Option<Subscription>,
    auth_subscription: Option<Subscription>,
}

impl SyncWorker {
    async fn run(
        mut self,
        mut inbox_rx: mpsc::UnboundedReceiver<Inbound>,
        mut command_rx: mpsc::Receiver<SyncCommand>,
    ) {
        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SyncCommand::Shutdown) | None => break,
                    }
                }
                msg = inbox_rx.recv() => {
                    match msg {
                        Some(msg) => self.handle(msg),
                        None => break,
                    }
                }
            }
        }

        self.teardown();
    }

    fn handle(&mut self, msg: Inbound) {
        match msg {
            Inbound::Identity(identity) => self.on_identity(identity),
            Inbound::Snapshot { epoch, docs } => self.on_snapshot(epoch, docs),
            Inbound::SubscriptionFailed { epoch, error } => self.on_subscription_error(epoch, error),
        }
    }

    fn on_identity(&mut self, identity: Option<Identity>) {
        // Old session goes before the new one opens
        self.epoch += 1;
        if let Some(session) = self.session.take() {
            session.unsubscribe();
        }
        let epoch = self.epoch;

        match identity {
            None => {
                info!("No identity; mirror cleared");
                self.state_tx.send_modify(|state| state.clear_identity(epoch));
            }
            Some(identity) => {
                info!("Opening session {} for {}", epoch, identity.uid);
                let query =
                    CollectionQuery::newest_first(&identity.uid, LINKS_COLLECTION, ORDER_FIELD);
                self.state_tx
                    .send_modify(|state| state.begin_session(identity, epoch));
                self.open_session(query, epoch);
            }
        }
    }

    fn open_session(&mut self, query: CollectionQuery, epoch: u64) {
        let snapshot_tx = self.inbox_tx.clone();
        let on_snapshot: SnapshotCallback = Arc::new(move |docs| {
            let _ = snapshot_tx.send(Inbound::Snapshot { epoch, docs });
        });

        let error_tx = self.inbox_tx.clone();
        let on_error: ErrorCallback = Arc::new(move |error| {
            let _ = error_tx.send(Inbound::SubscriptionFailed { epoch, error });
        });

        match self.store.subscribe_collection(query, on_snapshot, on_error) {
            Ok(session) => self.session = Some(session),
            Err(error) => self.on_subscription_error(epoch, error),
        }
    }

    fn on_snapshot(&mut self, epoch: u64, docs: Vec<Document>) {
        if epoch != self.epoch {
            debug!(
                "Discarding snapshot from epoch {} (current {})",
                epoch, self.epoch
            );
            return;
        }

        let links: Vec<Link> = docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match Link::from_document(doc) {
                    Ok(link) => Some(link),
                    Err(e) => {
                        warn!("Skipping undecodable link {}: {}", id, e);
                        None
                    }
                }
            })
            .collect();

        debug!("Snapshot for epoch {}: {} links", epoch, links.len());
        self.state_tx.send_modify(|state| state.apply_snapshot(links));
    }

    fn on_subscription_error(&mut self, epoch: u64, error: StoreError) {
        if epoch != self.epoch {
            debug!("Discarding error from epoch {}: {}", epoch, error);
            return;
        }

        warn!("Link subscription failed: {}", error);
        let message = error.to_string();
        self.state_tx.send_modify(|state| state.fail(message));
    }

    /// Release the identity listener and the collection subscription
    fn teardown(&mut self) {
        if let Some(auth) = self.auth_subscription.take() {
            auth.unsubscribe();
        }
        if let Some(session) = self.session.take() {
            session.unsubscribe();
        }
        debug!("Sync task stopped at epoch {}", self.epoch);
    }
}
