//! Platform-specific focus and application list queries

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

use forcenap_core::{ApplicationIdentity, FocusSource, HostError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window system query failed: {0}")]
    Query(String),
    #[error("Unsupported platform")]
    Unsupported,
}

impl From<PlatformError> for HostError {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::Query(msg) => HostError::Query(msg),
            PlatformError::Unsupported => HostError::Unsupported,
        }
    }
}

/// Get the application that currently has focus
#[cfg(target_os = "macos")]
pub fn focused_app() -> Result<Option<ApplicationIdentity>, PlatformError> {
    macos::focused_app()
}

#[cfg(target_os = "windows")]
pub fn focused_app() -> Result<Option<ApplicationIdentity>, PlatformError> {
    windows::focused_app()
}

#[cfg(target_os = "linux")]
pub fn focused_app() -> Result<Option<ApplicationIdentity>, PlatformError> {
    linux::focused_app()
}

#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
pub fn focused_app() -> Result<Option<ApplicationIdentity>, PlatformError> {
    Err(PlatformError::Unsupported)
}

/// Get every running application with a user interface, one entry per main
/// process
#[cfg(target_os = "macos")]
pub fn running_apps() -> Result<Vec<ApplicationIdentity>, PlatformError> {
    macos::running_apps()
}

#[cfg(target_os = "windows")]
pub fn running_apps() -> Result<Vec<ApplicationIdentity>, PlatformError> {
    windows::running_apps()
}

#[cfg(target_os = "linux")]
pub fn running_apps() -> Result<Vec<ApplicationIdentity>, PlatformError> {
    linux::running_apps()
}

#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
pub fn running_apps() -> Result<Vec<ApplicationIdentity>, PlatformError> {
    Err(PlatformError::Unsupported)
}

/// [`FocusSource`] backed by the platform queries above
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFocus;

impl FocusSource for HostFocus {
    fn focused_app(&self) -> Result<Option<ApplicationIdentity>, HostError> {
        Ok(focused_app()?)
    }

    fn running_apps(&self) -> Result<Vec<ApplicationIdentity>, HostError> {
        Ok(running_apps()?)
    }
}
