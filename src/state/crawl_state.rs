use crate::state::ItemState;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Deduplication key of a work item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkKey {
    /// Canonical page title
    Page(String),
    /// Absolute asset URL
    Asset(String),
}

impl fmt::Display for WorkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(title) => write!(f, "page '{}'", title),
            Self::Asset(url) => write!(f, "asset {}", url),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Every key ever enqueued; only grows
    visited: HashSet<WorkKey>,
    /// Keys whose processing has finished, successfully or not
    completed: HashSet<WorkKey>,
    /// Latest state per key
    states: HashMap<WorkKey, ItemState>,
}

/// Shared bookkeeping for one crawl run
///
/// Holds the visited and completed sets behind a single lock so that every
/// check-and-insert is atomic across workers. One instance lives exactly as
/// long as one crawl.
#[derive(Debug, Default)]
pub struct CrawlState {
    inner: Mutex<Inner>,
}

impl CrawlState {
    /// Creates empty bookkeeping for a new run
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A worker that panicked while holding the lock left the sets consistent:
        // every mutation below is a single insert.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records a key as visited and queued
    ///
    /// Returns `true` only the first time a key is seen; callers enqueue work
    /// only on `true`.
    pub fn mark_visited(&self, key: WorkKey) -> bool {
        let mut inner = self.lock();
        if !inner.visited.insert(key.clone()) {
            return false;
        }
        inner.states.insert(key, ItemState::Queued);
        true
    }

    /// Claims a key for processing
    ///
    /// Returns `false` if the key is already in flight or completed, in which
    /// case the caller must not fetch or write anything for it. Never adds to
    /// the visited set; only `mark_visited` does.
    pub fn begin(&self, key: &WorkKey) -> bool {
        let mut inner = self.lock();
        if inner.completed.contains(key) {
            return false;
        }
        if inner.states.get(key) == Some(&ItemState::InFlight) {
            return false;
        }
        inner.states.insert(key.clone(), ItemState::InFlight);
        true
    }

    /// Marks a key as finished with the given terminal state
    pub fn finish(&self, key: &WorkKey, state: ItemState) {
        debug_assert!(state.is_terminal(), "finish called with active state {}", state);
        let mut inner = self.lock();
        inner.completed.insert(key.clone());
        inner.states.insert(key.clone(), state);
    }

    /// Returns true if processing of the key has finished
    pub fn is_completed(&self, key: &WorkKey) -> bool {
        self.lock().completed.contains(key)
    }

    /// Returns the latest state recorded for a key
    pub fn state_of(&self, key: &WorkKey) -> Option<ItemState> {
        self.lock().states.get(key).copied()
    }

    /// Number of keys ever enqueued
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Number of keys whose processing has finished
    pub fn completed_count(&self) -> usize {
        self.lock().completed.len()
    }

    /// Counts keys per state
    pub fn counts_by_state(&self) -> HashMap<ItemState, usize> {
        let inner = self.lock();
        let mut counts = HashMap::new();
        for state in inner.states.values() {
            *counts.entry(*state).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the keys currently in the given state, sorted
    pub fn keys_in_state(&self, state: ItemState) -> Vec<WorkKey> {
        let inner = self.lock();
        let mut keys: Vec<WorkKey> = inner
            .states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}
