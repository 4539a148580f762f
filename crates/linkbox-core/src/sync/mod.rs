//! Live link synchronization
//!
//! Keeps an in-memory mirror of the signed-in user's `links` collection.
//!
//! ## Flow
//!
//! 1. The auth provider reports an identity change
//! 2. The previous collection subscription is released and a new one is
//!    opened for the new identity, under a fresh epoch
//! 3. Every snapshot pushed by the store replaces the mirror wholesale
//! 4. Mutations go straight to the store; their effect arrives with the
//!    next snapshot
//!
//! ## Usage
//!
//! ```ignore
//! let sync = LinkSync::spawn(auth, store);
//! sync.wait_until_loaded().await;
//! sync.add(NewLink::new("https://example.com")?, false).await?;
//! let favorites = sync.state().favorites().to_vec();
//! ```

mod service;
mod state;

pub use service::{LinkSync, LINKS_COLLECTION, ORDER_FIELD};
pub use state::LinkState;
