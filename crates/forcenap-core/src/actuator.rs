//! Stop/continue delivery guarded by the allow-list

use crate::error::SignalError;
use crate::host::SignalSender;
use crate::{AppName, Pid};
use std::collections::BTreeSet;
use tracing::debug;

/// Applications that are never suspended or resumed. The terminal ForceNap
/// was launched from must stay usable, and so must system monitors. The
/// launching process chain is also protected by pid, see
/// [`SignalActuator::protect_pids`].
pub const DEFAULT_ALLOW_LIST: &[&str] = &["iTerm2", "Terminal", "Activity Monitor"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    names: BTreeSet<AppName>,
}

impl AllowList {
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<AppName>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &AppName) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &AppName> {
        self.names.iter()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOW_LIST.iter().copied())
    }
}

/// Result of a stop/continue request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Target is allow-listed, ForceNap itself or one of its launchers;
    /// nothing was sent
    Protected,
}

pub struct SignalActuator<S> {
    sender: S,
    allow: AllowList,
    /// ForceNap and the processes that launched it
    pids: BTreeSet<Pid>,
}

impl<S: SignalSender> SignalActuator<S> {
    pub fn new(sender: S, allow: AllowList) -> Self {
        Self {
            sender,
            allow,
            pids: BTreeSet::from([std::process::id()]),
        }
    }

    /// Never signal these pids, whatever application they belong to
    pub fn protect_pids<I: IntoIterator<Item = Pid>>(&mut self, pids: I) {
        self.pids.extend(pids);
    }

    pub fn is_protected(&self, name: &AppName) -> bool {
        self.allow.contains(name)
    }

    pub fn is_protected_pid(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow
    }

    pub fn stop(&self, name: &AppName, pid: Pid) -> Result<Delivery, SignalError> {
        if self.guarded(name, pid) {
            debug!("{} ({}) is protected, not stopped", name, pid);
            return Ok(Delivery::Protected);
        }
        self.sender.stop(pid)?;
        Ok(Delivery::Sent)
    }

    pub fn resume(&self, name: &AppName, pid: Pid) -> Result<Delivery, SignalError> {
        if self.guarded(name, pid) {
            debug!("{} ({}) is protected, not resumed", name, pid);
            return Ok(Delivery::Protected);
        }
        self.sender.resume(pid)?;
        Ok(Delivery::Sent)
    }

    /// Continue a pid regardless of its name. Only used when flushing, where
    /// the registry is the sole authority.
    pub fn force_resume(&self, pid: Pid) -> Result<(), SignalError> {
        self.sender.resume(pid)
    }

    fn guarded(&self, name: &AppName, pid: Pid) -> bool {
        self.pids.contains(&pid) || self.allow.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeHost, Sent};

    #[test]
    fn test_allow_listed_names_are_never_signalled() {
        let host = FakeHost::new();
        let actuator = SignalActuator::new(host.clone(), AllowList::default());
        let terminal = AppName::from("Terminal");

        assert_eq!(actuator.stop(&terminal, 500).unwrap(), Delivery::Protected);
        assert_eq!(actuator.resume(&terminal, 500).unwrap(), Delivery::Protected);
        assert!(host.signals().is_empty());
    }

    #[test]
    fn test_own_pid_is_protected() {
        let host = FakeHost::new();
        let actuator = SignalActuator::new(host.clone(), AllowList::new(Vec::<String>::new()));

        let me = std::process::id();
        assert_eq!(
            actuator.stop(&AppName::from("forcenapd"), me).unwrap(),
            Delivery::Protected
        );
        assert!(host.signals().is_empty());
    }

    #[test]
    fn test_launcher_pids_are_protected() {
        let host = FakeHost::new();
        let mut actuator = SignalActuator::new(host.clone(), AllowList::new(Vec::<String>::new()));
        actuator.protect_pids([4100, 4000]);
        let kitty = AppName::from("kitty");

        assert_eq!(actuator.stop(&kitty, 4000).unwrap(), Delivery::Protected);
        assert_eq!(actuator.resume(&kitty, 4100).unwrap(), Delivery::Protected);
        assert_eq!(actuator.stop(&kitty, 4001).unwrap(), Delivery::Sent);
        assert_eq!(host.signals(), vec![Sent::Stop(4001)]);
    }

    #[test]
    fn test_delivery_errors_are_classified() {
        let host = FakeHost::new();
        host.deny(600);
        host.kill(601);
        let actuator = SignalActuator::new(host.clone(), AllowList::default());
        let name = AppName::from("Slack");

        assert_eq!(
            actuator.stop(&name, 600),
            Err(SignalError::PermissionDenied(600))
        );
        assert_eq!(actuator.stop(&name, 601), Err(SignalError::ProcessGone(601)));
        assert_eq!(actuator.stop(&name, 602), Ok(Delivery::Sent));
        assert_eq!(host.signals(), vec![Sent::Stop(602)]);
    }
}
