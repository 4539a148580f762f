//! Mirror state
//!
//! The snapshot of the current user's links that the sync task publishes.
//! Readers get it through a `watch` channel and can't mutate it; only the
//! sync task calls the `pub(crate)` transitions below.

use crate::identity::Identity;
use crate::models::Link;
use crate::views;

/// Published state of the link mirror
#[derive(Debug, Clone, PartialEq)]
pub struct LinkState {
    identity: Option<Identity>,
    links: Vec<Link>,
    favorites: Vec<Link>,
    is_loading: bool,
    last_error: Option<String>,
    epoch: u64,
}

impl LinkState {
    /// State before anything has been heard from the auth provider
    pub(crate) fn initial() -> Self {
        Self {
            identity: None,
            links: Vec::new(),
            favorites: Vec::new(),
            is_loading: true,
            last_error: None,
            epoch: 0,
        }
    }

    /// Identity the mirror belongs to
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// All links, newest first
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Favorite links, in the same order as [`links`](Self::links)
    pub fn favorites(&self) -> &[Link] {
        &self.favorites
    }

    /// True until the first snapshot or "no identity" signal arrives
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Last subscription error, cleared by the next snapshot
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Epoch of the current session
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The first `n` links
    pub fn recent(&self, n: usize) -> &[Link] {
        views::recent(&self.links, n)
    }

    /// Links whose title contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Vec<&Link> {
        views::search_by_title(&self.links, term)
    }

    /// Number of distinct categories among the links
    pub fn category_count(&self) -> usize {
        views::category_count(&self.links)
    }

    /// Look up a link by id
    pub fn find(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.id == id)
    }

    /// Nobody is signed in
    pub(crate) fn clear_identity(&mut self, epoch: u64) {
        self.identity = None;
        self.replace_links(Vec::new());
        self.is_loading = false;
        self.last_error = None;
        self.epoch = epoch;
    }

    /// A new session was opened for `identity`
    ///
    /// Switching to a different user empties the mirror until that user's
    /// first snapshot arrives.
    pub(crate) fn begin_session(&mut self, identity: Identity, epoch: u64) {
        let switched = self.identity.as_ref().map(|i| &i.uid) != Some(&identity.uid);
        if switched {
            self.replace_links(Vec::new());
            self.is_loading = true;
            self.last_error = None;
        }
        self.identity = Some(identity);
        self.epoch = epoch;
    }

    /// A snapshot for the current session arrived
    pub(crate) fn apply_snapshot(&mut self, links: Vec<Link>) {
        self.replace_links(links);
        self.is_loading = false;
        self.last_error = None;
    }

    /// The current session failed; keep the last good links
    pub(crate) fn fail(&mut self, error: String) {
        self.is_loading = false;
        self.last_error = Some(error);
    }

    fn replace_links(&mut self, links: Vec<Link>) {
        self.favorites = views::favorites(&links);
        self.links = links;
    }
}
