//! ForceNap Core Library
//!
//! Focus tracking, suspend bookkeeping and tracking policy for the ForceNap
//! background application suspender. Everything that talks to the operating
//! system sits behind the traits in [`host`].

pub mod actuator;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod menu;
pub mod policy;
pub mod poller;
pub mod registry;
pub mod resolver;
pub mod service;

#[cfg(test)]
mod fakes;

pub use actuator::{AllowList, Delivery, SignalActuator};
pub use config::Config;
pub use controller::{FlushReport, Outcome, SkipReason, SuspendController};
pub use error::{ConfigError, HostError, ServiceError, SignalError};
pub use host::{FocusSource, ProcessTable, SignalSender};
pub use menu::{MenuDiff, ToggleEntry, ToggleMenu};
pub use policy::{PolicyDelta, PolicyHandle, TrackingPolicy};
pub use poller::{FocusPoller, PollEvent};
pub use registry::{SuspendRegistry, SuspendedProcess};
pub use resolver::ProcessGroupResolver;
pub use service::NapService;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// OS process identifier
pub type Pid = u32;

/// Human-readable application name, the key for tracking decisions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppName(String);

impl AppName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AppName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A running application instance.
///
/// Two instances may share a display name, so equality and hashing only look
/// at the main process id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationIdentity {
    /// Display name of the application
    pub name: AppName,
    /// Main process id
    pub pid: Pid,
}

impl ApplicationIdentity {
    pub fn new(name: impl Into<AppName>, pid: Pid) -> Self {
        Self {
            name: name.into(),
            pid,
        }
    }
}

impl PartialEq for ApplicationIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for ApplicationIdentity {}

impl Hash for ApplicationIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}

impl fmt::Display for ApplicationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.pid)
    }
}

/// Get the configuration directory for ForceNap
pub fn config_dir() -> std::path::PathBuf {
    directories::ProjectDirs::from("com", "forcenap", "forcenap")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| {
            directories::BaseDirs::new()
                .map(|d| d.home_dir().join(".forcenap"))
                .unwrap_or_else(|| std::path::PathBuf::from(".forcenap"))
        })
}

/// Get the configuration file path
pub fn config_path() -> std::path::PathBuf {
    config_dir().join("config.json")
}
