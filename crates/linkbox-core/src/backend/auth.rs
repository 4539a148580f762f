//! Local authentication provider
//!
//! Keeps the signed-in identity in memory and, optionally, in a session file
//! so it survives restarts. Supports explicit sign-in, anonymous sign-in and
//! sign-out; every transition is pushed to all registered listeners.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use anyhow::Result;
use tracing::{debug, info};

use super::persistence;
use super::{AuthProvider, IdentityCallback, Subscription};
use crate::identity::Identity;

/// Authentication provider backed by local state
#[derive(Clone)]
pub struct LocalAuth {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    state: Mutex<AuthState>,
    /// Serializes notifications so listeners observe transitions in order
    notify: Mutex<()>,
    session_path: Option<PathBuf>,
}

#[derive(Default)]
struct AuthState {
    current: Option<Identity>,
    listeners: HashMap<u64, IdentityCallback>,
    next_listener: u64,
}

impl LocalAuth {
    /// Create a provider with nobody signed in
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Create a provider with `identity` already signed in
    pub fn signed_in(identity: Identity) -> Self {
        Self::build(Some(identity), None)
    }

    /// Create a provider that persists the session to `path`
    ///
    /// An existing session file is loaded as the initial identity.
    pub fn with_session_file(path: PathBuf) -> Result<Self> {
        let current: Option<Identity> = persistence::load_json(&path)?;
        if let Some(ref identity) = current {
            debug!("Restored session for {}", identity.uid);
        }
        Ok(Self::build(current, Some(path)))
    }

    fn build(current: Option<Identity>, session_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                state: Mutex::new(AuthState {
                    current,
                    ..AuthState::default()
                }),
                notify: Mutex::new(()),
                session_path,
            }),
        }
    }

    /// The currently signed-in identity
    pub fn current(&self) -> Option<Identity> {
        self.inner.lock_state().current.clone()
    }

    /// Sign in as `identity`
    pub fn sign_in(&self, identity: Identity) -> Result<()> {
        info!("Signed in as {}", identity);
        self.transition(Some(identity))
    }

    /// Sign in with a fresh anonymous identity
    pub fn sign_in_anonymously(&self) -> Result<Identity> {
        let identity = Identity::anonymous();
        self.sign_in(identity.clone())?;
        Ok(identity)
    }

    /// Sign out the current identity
    pub fn sign_out(&self) -> Result<()> {
        info!("Signed out");
        self.transition(None)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.lock_state().listeners.len()
    }

    fn transition(&self, next: Option<Identity>) -> Result<()> {
        if let Some(ref path) = self.inner.session_path {
            match next {
                Some(ref identity) => persistence::save_json(path, identity)?,
                None => persistence::remove_file(path)?,
            }
        }

        let _order = self.inner.lock_notify();
        let listeners: Vec<IdentityCallback> = {
            let mut state = self.inner.lock_state();
            state.current = next.clone();
            state.listeners.values().cloned().collect()
        };

        for listener in listeners {
            listener(next.clone());
        }
        Ok(())
    }
}

impl Default for LocalAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthInner {
    fn lock_state(&self) -> MutexGuard<'_, AuthState> {
        // A panicking listener must not take the provider down with it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_notify(&self) -> MutexGuard<'_, ()> {
        self.notify.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AuthProvider for LocalAuth {
    fn on_identity_change(&self, callback: IdentityCallback) -> Subscription {
        let _order = self.inner.lock_notify();
        let (id, current) = {
            let mut state = self.inner.lock_state();
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.insert(id, callback.clone());
            (id, state.current.clone())
        };

        callback(current);

        let weak: Weak<AuthInner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock_state().listeners.remove(&id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn recorder() -> (IdentityCallback, Arc<Mutex<Vec<Option<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: IdentityCallback = Arc::new(move |identity: Option<Identity>| {
            sink.lock().unwrap().push(identity.map(|i| i.uid));
        });
        (callback, seen)
    }

    #[test]
    fn test_initial_state_delivered_on_register() {
        let auth = LocalAuth::signed_in(Identity::new("alice"));
        let (callback, seen) = recorder();

        let _sub = auth.on_identity_change(callback);
        assert_eq!(*seen.lock().unwrap(), vec![Some("alice".to_string())]);
    }

    #[test]
    fn test_transitions_notify_listeners() {
        let auth = LocalAuth::new();
        let (callback, seen) = recorder();
        let _sub = auth.on_identity_change(callback);

        auth.sign_in(Identity::new("alice")).unwrap();
        auth.sign_out().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("alice".to_string()), None]
        );
        assert!(auth.current().is_none());
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let auth = LocalAuth::new();
        let (callback, seen) = recorder();
        let sub = auth.on_identity_change(callback);
        assert_eq!(auth.listener_count(), 1);

        sub.unsubscribe();
        assert_eq!(auth.listener_count(), 0);

        auth.sign_in(Identity::new("alice")).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_anonymous_sign_in() {
        let auth = LocalAuth::new();
        let identity = auth.sign_in_anonymously().unwrap();
        assert!(identity.anonymous);
        assert_eq!(auth.current(), Some(identity));
    }

    #[test]
    fn test_session_file_persists_identity() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        {
            let auth = LocalAuth::with_session_file(path.clone()).unwrap();
            assert!(auth.current().is_none());
            auth.sign_in(Identity::new("alice").with_email("a@example.com"))
                .unwrap();
        }

        let auth = LocalAuth::with_session_file(path.clone()).unwrap();
        let identity = auth.current().unwrap();
        assert_eq!(identity.uid, "alice");
        assert_eq!(identity.email.as_deref(), Some("a@example.com"));

        auth.sign_out().unwrap();
        assert!(!path.exists());
    }
}
