//! Error taxonomy for the engine.
//!
//! Failures during `enable` are fatal and surfaced synchronously; geometry
//! query failures are recoverable and retried on every poll cycle.

use thiserror::Error;

/// Fatal engine errors.
#[derive(Debug, Error)]
pub enum TrayError {
    /// The low-level mouse hook could not be installed (permissions, no
    /// message loop available). The icon is not shown.
    #[error("failed to install low-level mouse hook: {0}")]
    HookInstall(String),

    /// The shell refused the notification-icon registration.
    #[error("failed to register shell notification icon: {0}")]
    ShellRegistration(String),
}

/// Recoverable geometry poll failures.
///
/// The previous rectangle is retained for queries, but hover state must not
/// trust it for a positive hit-test while the failure persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The icon is not currently present in the shell (shell restarted, or
    /// the icon overflowed into a hidden tray).
    #[error("tray icon not present in the shell")]
    IconAbsent,
}
