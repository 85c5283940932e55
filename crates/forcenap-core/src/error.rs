//! Error types shared by the core and the host crate

use crate::Pid;
use thiserror::Error;

/// A host query (focus, application list, process table) gave no usable data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Host query failed: {0}")]
    Query(String),
    #[error("Unsupported platform")]
    Unsupported,
}

/// Stop/continue delivery failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Process {0} no longer exists")]
    ProcessGone(Pid),
    #[error("Permission denied signalling process {0}")]
    PermissionDenied(Pid),
    #[error("Process signals are not supported on this platform")]
    Unsupported,
    #[error("Failed to signal process {pid}: {reason}")]
    Failed { pid: Pid, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to start poll thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Poll thread panicked")]
    Panicked,
}
