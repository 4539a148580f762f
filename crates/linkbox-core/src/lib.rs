//! LinkBox Core Library
//!
//! This crate provides the core functionality for LinkBox, a bookmark
//! collection that stays live-synced with a remote document store.
//!
//! # Architecture
//!
//! - **AuthProvider**: reports who is signed in
//! - **DocumentStore**: owns the data and pushes collection snapshots
//! - **LinkSync**: mirrors the signed-in user's links and forwards mutations
//!
//! Collaborators are constructed once and injected; nothing here is global.
//!
//! # Quick Start
//!
//! ```text
//! let auth = Arc::new(LocalAuth::signed_in(Identity::new("alice")));
//! let store = Arc::new(MemoryStore::new());
//! let sync = LinkSync::spawn(auth, store);
//!
//! sync.wait_until_loaded().await;
//! sync.add(NewLink::new("https://example.com")?.with_title("Example"), false).await?;
//!
//! let state = sync.state();
//! let hits = state.search("example");
//! ```
//!
//! # Modules
//!
//! - `sync`: the link synchronization service (main entry point)
//! - `backend`: collaborator traits plus local auth and store implementations
//! - `models`: links, link drafts and profiles
//! - `views`: favorites, recent and title search
//! - `profile`: profile load/save
//! - `config`: application configuration

pub mod backend;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod profile;
pub mod sync;
pub mod views;

pub use backend::{AuthProvider, DocumentStore, LocalAuth, MemoryStore, Subscription};
pub use config::Config;
pub use error::{LinkError, LinkResult, Operation, StoreError};
pub use identity::Identity;
pub use models::{parse_tags, Link, NewLink, Profile};
pub use profile::ProfileService;
pub use sync::{LinkState, LinkSync};
