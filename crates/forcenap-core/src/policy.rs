//! The set of applications to suspend while unfocused
//!
//! Configuration sources (stdin, a tray menu) hold a [`PolicyHandle`] and may
//! call it from any thread. Their requests only take effect when the
//! controller calls [`TrackingPolicy::reconcile`] at the start of a tick, so
//! every suspend/resume still happens on the poll thread.

use crate::AppName;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Pending {
    /// Latest request per name since the last reconcile
    requests: BTreeMap<AppName, bool>,
    /// Requested state as seen by configuration sources
    desired: BTreeSet<AppName>,
}

fn lock(shared: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable, thread-safe entry point for configuration events
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    shared: Arc<Mutex<Pending>>,
}

impl PolicyHandle {
    pub fn set_tracked(&self, name: impl Into<AppName>, track: bool) {
        let name = name.into();
        let mut pending = lock(&self.shared);
        if track {
            pending.desired.insert(name.clone());
        } else {
            pending.desired.remove(&name);
        }
        pending.requests.insert(name, track);
    }

    /// Flip the requested state of `name` and return the new state
    pub fn toggle(&self, name: impl Into<AppName>) -> bool {
        let name = name.into();
        let track = !self.is_tracked(&name);
        self.set_tracked(name, track);
        track
    }

    /// Requested state, including changes not reconciled yet
    pub fn is_tracked(&self, name: &AppName) -> bool {
        lock(&self.shared).desired.contains(name)
    }

    pub fn tracked(&self) -> Vec<AppName> {
        lock(&self.shared).desired.iter().cloned().collect()
    }
}

/// Names that entered or left the tracked set in one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDelta {
    pub added: BTreeSet<AppName>,
    pub removed: BTreeSet<AppName>,
}

impl PolicyDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Applied tracking state, owned by the controller
#[derive(Debug)]
pub struct TrackingPolicy {
    tracked: BTreeSet<AppName>,
    shared: Arc<Mutex<Pending>>,
}

impl TrackingPolicy {
    pub fn new() -> Self {
        Self {
            tracked: BTreeSet::new(),
            shared: Arc::new(Mutex::new(Pending::default())),
        }
    }

    pub fn handle(&self) -> PolicyHandle {
        PolicyHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn set_tracked(&self, name: impl Into<AppName>, track: bool) {
        self.handle().set_tracked(name, track);
    }

    /// Whether `name` is tracked as of the last reconcile
    pub fn is_tracked(&self, name: &AppName) -> bool {
        self.tracked.contains(name)
    }

    pub fn tracked(&self) -> impl Iterator<Item = &AppName> {
        self.tracked.iter()
    }

    /// Apply every pending request and return what changed.
    ///
    /// The pending requests are taken under one lock, so each request is
    /// applied exactly once. A name toggled back to its applied state produces
    /// no delta.
    pub fn reconcile(&mut self) -> PolicyDelta {
        let requests = std::mem::take(&mut lock(&self.shared).requests);

        let mut delta = PolicyDelta::default();
        for (name, track) in requests {
            if track {
                if self.tracked.insert(name.clone()) {
                    delta.added.insert(name);
                }
            } else if self.tracked.remove(&name) {
                delta.removed.insert(name);
            }
        }
        delta
    }
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self::new()
    }
}
