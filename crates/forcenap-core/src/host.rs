//! Interfaces to the host operating system
//!
//! The core never talks to the OS directly. `forcenap-host` provides the real
//! implementations; tests use in-memory fakes.

use crate::error::{HostError, SignalError};
use crate::{ApplicationIdentity, Pid};

/// Foreground application and running application queries
pub trait FocusSource {
    /// The application that currently has user focus, if any
    fn focused_app(&self) -> Result<Option<ApplicationIdentity>, HostError>;

    /// All running user-facing applications
    fn running_apps(&self) -> Result<Vec<ApplicationIdentity>, HostError>;
}

/// Process tree queries
pub trait ProcessTable {
    /// Direct children of `pid`. An empty list is a valid answer.
    fn children_of(&self, pid: Pid) -> Result<Vec<Pid>, HostError>;

    /// Whether `pid` still exists
    fn is_running(&self, pid: Pid) -> bool;

    /// Parent of `pid`, `None` when it cannot be determined
    fn parent_of(&self, _pid: Pid) -> Option<Pid> {
        None
    }
}

/// Stop/continue delivery. Best effort, no acknowledgement from the kernel.
pub trait SignalSender {
    fn stop(&self, pid: Pid) -> Result<(), SignalError>;

    fn resume(&self, pid: Pid) -> Result<(), SignalError>;
}

impl<T: FocusSource + ?Sized> FocusSource for Box<T> {
    fn focused_app(&self) -> Result<Option<ApplicationIdentity>, HostError> {
        (**self).focused_app()
    }

    fn running_apps(&self) -> Result<Vec<ApplicationIdentity>, HostError> {
        (**self).running_apps()
    }
}

impl<T: ProcessTable + ?Sized> ProcessTable for Box<T> {
    fn children_of(&self, pid: Pid) -> Result<Vec<Pid>, HostError> {
        (**self).children_of(pid)
    }

    fn is_running(&self, pid: Pid) -> bool {
        (**self).is_running(pid)
    }

    fn parent_of(&self, pid: Pid) -> Option<Pid> {
        (**self).parent_of(pid)
    }
}

impl<T: SignalSender + ?Sized> SignalSender for Box<T> {
    fn stop(&self, pid: Pid) -> Result<(), SignalError> {
        (**self).stop(pid)
    }

    fn resume(&self, pid: Pid) -> Result<(), SignalError> {
        (**self).resume(pid)
    }
}
