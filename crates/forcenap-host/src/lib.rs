//! Host OS collaborators for ForceNap
//!
//! Focus queries per platform (AppKit on macOS, X11 on Linux, Win32 on
//! Windows), process tree discovery and POSIX stop/continue delivery. Each
//! type implements one of the traits in `forcenap_core::host`.

pub mod platform;
pub mod process;
pub mod signals;

pub use platform::{HostFocus, PlatformError};
pub use process::ProcessTree;
pub use signals::PosixSignals;
