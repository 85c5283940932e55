//! In-memory host used by the unit tests

use crate::error::{HostError, SignalError};
use crate::host::{FocusSource, ProcessTable, SignalSender};
use crate::{ApplicationIdentity, Pid};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sent {
    Stop(Pid),
    Cont(Pid),
}

#[derive(Default)]
struct HostState {
    focused: Option<ApplicationIdentity>,
    apps: Vec<ApplicationIdentity>,
    children: HashMap<Pid, Vec<Pid>>,
    dead: HashSet<Pid>,
    denied: HashSet<Pid>,
    broken_children: HashSet<Pid>,
    focus_fails: bool,
    attempts: usize,
    signals: Vec<Sent>,
}

/// Shared fake: clones observe and mutate the same state
#[derive(Clone, Default)]
pub struct FakeHost {
    state: Arc<Mutex<HostState>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launch(&self, name: &str, pid: Pid, children: &[Pid]) -> ApplicationIdentity {
        let app = ApplicationIdentity::new(name, pid);
        let mut state = self.state.lock().unwrap();
        state.apps.push(app.clone());
        state.children.insert(pid, children.to_vec());
        app
    }

    pub fn quit(&self, pid: Pid) {
        let mut state = self.state.lock().unwrap();
        state.apps.retain(|a| a.pid != pid);
        let children = state.children.remove(&pid).unwrap_or_default();
        state.dead.insert(pid);
        state.dead.extend(children);
    }

    /// The main process exits, its children live on
    pub fn exit_main(&self, pid: Pid) {
        let mut state = self.state.lock().unwrap();
        state.apps.retain(|a| a.pid != pid);
        state.dead.insert(pid);
    }

    pub fn kill(&self, pid: Pid) {
        self.state.lock().unwrap().dead.insert(pid);
    }

    pub fn focus(&self, app: Option<&ApplicationIdentity>) {
        self.state.lock().unwrap().focused = app.cloned();
    }

    pub fn deny(&self, pid: Pid) {
        self.state.lock().unwrap().denied.insert(pid);
    }

    pub fn allow(&self, pid: Pid) {
        self.state.lock().unwrap().denied.remove(&pid);
    }

    pub fn break_children(&self, pid: Pid) {
        self.state.lock().unwrap().broken_children.insert(pid);
    }

    pub fn set_focus_fails(&self, fails: bool) {
        self.state.lock().unwrap().focus_fails = fails;
    }

    pub fn set_children(&self, pid: Pid, children: &[Pid]) {
        self.state
            .lock()
            .unwrap()
            .children
            .insert(pid, children.to_vec());
    }

    pub fn signals(&self) -> Vec<Sent> {
        self.state.lock().unwrap().signals.clone()
    }

    pub fn clear_signals(&self) {
        let mut state = self.state.lock().unwrap();
        state.signals.clear();
        state.attempts = 0;
    }

    /// Deliveries tried since the last clear, failed ones included
    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    fn deliver(&self, pid: Pid, sent: Sent) -> Result<(), SignalError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;
        if state.dead.contains(&pid) {
            return Err(SignalError::ProcessGone(pid));
        }
        if state.denied.contains(&pid) {
            return Err(SignalError::PermissionDenied(pid));
        }
        state.signals.push(sent);
        Ok(())
    }
}

impl FocusSource for FakeHost {
    fn focused_app(&self) -> Result<Option<ApplicationIdentity>, HostError> {
        let state = self.state.lock().unwrap();
        if state.focus_fails {
            return Err(HostError::Query("window server unavailable".to_string()));
        }
        Ok(state.focused.clone())
    }

    fn running_apps(&self) -> Result<Vec<ApplicationIdentity>, HostError> {
        let state = self.state.lock().unwrap();
        if state.focus_fails {
            return Err(HostError::Query("window server unavailable".to_string()));
        }
        Ok(state.apps.clone())
    }
}

impl ProcessTable for FakeHost {
    fn children_of(&self, pid: Pid) -> Result<Vec<Pid>, HostError> {
        let state = self.state.lock().unwrap();
        if state.broken_children.contains(&pid) {
            return Err(HostError::Query("pgrep failed".to_string()));
        }
        Ok(state.children.get(&pid).cloned().unwrap_or_default())
    }

    fn is_running(&self, pid: Pid) -> bool {
        !self.state.lock().unwrap().dead.contains(&pid)
    }

    fn parent_of(&self, pid: Pid) -> Option<Pid> {
        let state = self.state.lock().unwrap();
        state
            .children
            .iter()
            .find(|(_, children)| children.contains(&pid))
            .map(|(parent, _)| *parent)
    }
}

impl SignalSender for FakeHost {
    fn stop(&self, pid: Pid) -> Result<(), SignalError> {
        self.deliver(pid, Sent::Stop(pid))
    }

    fn resume(&self, pid: Pid) -> Result<(), SignalError> {
        self.deliver(pid, Sent::Cont(pid))
    }
}
