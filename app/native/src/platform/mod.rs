//! Platform backends for browser discovery and default-handler access.
//!
//! - [`macos`] - Launch Services bindings (macOS only)
//! - [`unsupported`] - inert backend for every other target
//!
//! [`native_backend`] returns whichever backend matches the build target.

#[cfg(target_os = "macos")]
pub mod macos;
pub mod unsupported;

use std::sync::Arc;

use thiserror::Error;

/// Errors raised while talking to the OS.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The OS query returned an error or an unusable value.
    #[error("OS query failed: {0}")]
    QueryFailed(String),
    /// The probe URL could not be turned into an OS URL object.
    #[error("invalid probe URL '{0}'")]
    InvalidProbeUrl(String),
    /// This target has no default-handler integration.
    #[error("default browser management is not supported on this platform")]
    Unsupported,
}

/// Backend used on the current build target.
#[cfg(target_os = "macos")]
pub type NativeBackend = macos::LaunchServices;

/// Backend used on the current build target.
#[cfg(not(target_os = "macos"))]
pub type NativeBackend = unsupported::UnsupportedPlatform;

/// Creates the native backend for the given probe URL.
///
/// The same instance serves as both browser registry and handler service.
#[must_use]
pub fn native_backend(probe_url: &str) -> Arc<NativeBackend> {
    tracing::debug!(probe_url, "platform: creating native backend");
    Arc::new(NativeBackend::new(probe_url))
}
