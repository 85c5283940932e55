//! SIGSTOP / SIGCONT delivery

use forcenap_core::{Pid, SignalError, SignalSender};

#[derive(Debug, Clone, Copy, Default)]
pub struct PosixSignals;

#[cfg(unix)]
impl SignalSender for PosixSignals {
    fn stop(&self, pid: Pid) -> Result<(), SignalError> {
        send(pid, nix::sys::signal::Signal::SIGSTOP)
    }

    fn resume(&self, pid: Pid) -> Result<(), SignalError> {
        send(pid, nix::sys::signal::Signal::SIGCONT)
    }
}

#[cfg(not(unix))]
impl SignalSender for PosixSignals {
    fn stop(&self, _pid: Pid) -> Result<(), SignalError> {
        Err(SignalError::Unsupported)
    }

    fn resume(&self, _pid: Pid) -> Result<(), SignalError> {
        Err(SignalError::Unsupported)
    }
}

#[cfg(unix)]
fn send(pid: Pid, signal: nix::sys::signal::Signal) -> Result<(), SignalError> {
    use nix::errno::Errno;
    use nix::unistd::Pid as NixPid;

    // 0 and negative values address process groups, never send those
    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => {
            return Err(SignalError::Failed {
                pid,
                reason: "not a single process id".to_string(),
            })
        }
    };

    match nix::sys::signal::kill(NixPid::from_raw(raw), signal) {
        Ok(()) => {
            tracing::trace!("Sent {:?} to {}", signal, pid);
            Ok(())
        }
        Err(Errno::ESRCH) => Err(SignalError::ProcessGone(pid)),
        Err(Errno::EPERM) => Err(SignalError::PermissionDenied(pid)),
        Err(e) => Err(SignalError::Failed {
            pid,
            reason: e.to_string(),
        }),
    }
}
