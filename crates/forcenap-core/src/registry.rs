//! Bookkeeping of processes stopped by ForceNap
//!
//! A pid is present exactly while it has received a stop and no matching
//! continue. Resume decisions are made from this table only.

use crate::{AppName, Pid};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Marker stored for every suspended pid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspendedProcess {
    /// Main pid of the application the process belongs to
    pub owner: Pid,
    /// Name of the owning application
    pub app: AppName,
    /// When the stop was delivered
    pub since: DateTime<Utc>,
}

impl SuspendedProcess {
    pub fn new(owner: Pid, app: AppName) -> Self {
        Self {
            owner,
            app,
            since: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SuspendRegistry {
    entries: BTreeMap<Pid, SuspendedProcess>,
}

impl SuspendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stopped pid. Returns false if it was already recorded.
    pub fn insert(&mut self, pid: Pid, entry: SuspendedProcess) -> bool {
        if self.entries.contains_key(&pid) {
            return false;
        }
        self.entries.insert(pid, entry);
        true
    }

    pub fn remove(&mut self, pid: Pid) -> Option<SuspendedProcess> {
        self.entries.remove(&pid)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn get(&self, pid: Pid) -> Option<&SuspendedProcess> {
        self.entries.get(&pid)
    }

    /// Pids recorded for the application whose main pid is `owner`
    pub fn owned_by(&self, owner: Pid) -> Vec<Pid> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.owner == owner)
            .map(|(pid, _)| *pid)
            .collect()
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every entry
    pub fn drain(&mut self) -> Vec<(Pid, SuspendedProcess)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}
