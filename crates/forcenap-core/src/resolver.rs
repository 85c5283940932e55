//! Application → process group resolution

use crate::host::ProcessTable;
use crate::{ApplicationIdentity, Pid};
use std::collections::BTreeSet;
use tracing::debug;

/// Resolves every pid belonging to an application: the main process and all
/// of its descendants. Nothing is cached since children come and go between
/// polls.
pub struct ProcessGroupResolver<P> {
    table: P,
}

impl<P: ProcessTable> ProcessGroupResolver<P> {
    pub fn new(table: P) -> Self {
        Self { table }
    }

    /// Resolve the process group of `app`.
    ///
    /// Empty only when the main process has exited. Child enumeration errors
    /// truncate the walk instead of failing it.
    pub fn resolve(&self, app: &ApplicationIdentity) -> BTreeSet<Pid> {
        let mut group = BTreeSet::new();
        if !self.table.is_running(app.pid) {
            debug!("{} has exited, nothing to resolve", app);
            return group;
        }

        group.insert(app.pid);
        let mut pending = vec![app.pid];
        while let Some(parent) = pending.pop() {
            match self.table.children_of(parent) {
                Ok(children) => {
                    for child in children {
                        if group.insert(child) {
                            pending.push(child);
                        }
                    }
                }
                Err(e) => debug!("Child lookup for {} of {} failed: {}", parent, app, e),
            }
        }

        group
    }

    /// Ancestors of `pid`, nearest first. Stops below init.
    pub fn ancestors(&self, pid: Pid) -> Vec<Pid> {
        let mut chain = Vec::new();
        let mut current = pid;
        while let Some(parent) = self.table.parent_of(current) {
            if parent <= 1 || parent == pid || chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub fn is_running(&self, pid: Pid) -> bool {
        self.table.is_running(pid)
    }
}
