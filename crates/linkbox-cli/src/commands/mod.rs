//! Command handlers

pub mod config;
pub mod link;
pub mod profile;
pub mod session;
pub mod status;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use linkbox_core::{Config, LinkState, LinkSync, LocalAuth, MemoryStore};

/// How long a command waits for the store to push a change back
const SNAPSHOT_WAIT: Duration = Duration::from_secs(2);

/// Collaborators and the running sync service for one command
pub struct App {
    pub config: Config,
    pub store: MemoryStore,
    pub sync: LinkSync,
}

impl App {
    /// Open the local backends and wait for the first snapshot
    pub async fn open(config: Config) -> Result<Self> {
        let auth = LocalAuth::with_session_file(config.session_path())
            .context("Failed to load session")?;
        let store =
            MemoryStore::open(config.store_path()).context("Failed to open link store")?;

        let sync = LinkSync::spawn(Arc::new(auth), Arc::new(store.clone()));
        let state = sync.wait_until_loaded().await;
        if let Some(error) = state.last_error() {
            warn!("Link subscription failed on start: {}", error);
        }
        debug!("Loaded {} links", state.links().len());

        Ok(Self {
            config,
            store,
            sync,
        })
    }

    /// Wait until the mirror satisfies `pred`, or give up and return it as is
    pub async fn wait_for(&self, pred: impl Fn(&LinkState) -> bool) -> LinkState {
        let mut rx = self.sync.subscribe();
        let waited = tokio::time::timeout(SNAPSHOT_WAIT, rx.wait_for(|state| pred(state)))
            .await
            .ok()
            .and_then(|loaded| loaded.ok().map(|state| state.clone()));
        if let Some(state) = waited {
            return state;
        }
        debug!("Gave up waiting for the store to catch up");
        self.sync.state()
    }

    /// Stop the sync service
    pub async fn close(self) {
        self.sync.shutdown().await;
    }
}
