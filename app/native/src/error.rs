//! Error types for BrowserBar.
//!
//! Each subsystem owns a narrow error enum (`SwitchError`, `StoreError`,
//! `PlatformError`, `ConfigError`, `ActorError`). This module unifies them for
//! the command-line front end, which prints the message and exits non-zero.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::platform::PlatformError;
use crate::store::StoreError;
use crate::switcher::{ActorError, SwitchError};

/// Errors that can surface to the user.
///
/// Serializes as `{ "kind": ..., "message": ... }` so `--json` output can
/// report failures in the same shape as successes.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum BrowserbarError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// The default browser could not be changed.
    #[error("Switch error: {0}")]
    SwitchError(String),
    /// Preference storage failed.
    #[error("Preferences error: {0}")]
    StoreError(String),
    /// A platform query failed.
    #[error("Platform error: {0}")]
    PlatformError(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The switch coordinator stopped responding.
    #[error("Coordinator error: {0}")]
    ActorError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<SwitchError> for BrowserbarError {
    fn from(err: SwitchError) -> Self { Self::SwitchError(err.to_string()) }
}

impl From<StoreError> for BrowserbarError {
    fn from(err: StoreError) -> Self { Self::StoreError(err.to_string()) }
}

impl From<PlatformError> for BrowserbarError {
    fn from(err: PlatformError) -> Self { Self::PlatformError(err.to_string()) }
}

impl From<ConfigError> for BrowserbarError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<ActorError> for BrowserbarError {
    fn from(err: ActorError) -> Self { Self::ActorError(err.to_string()) }
}

impl From<std::io::Error> for BrowserbarError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for BrowserbarError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<String> for BrowserbarError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for BrowserbarError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_display() {
        let err = BrowserbarError::InvalidArguments("unknown browser 'com.x'".to_string());
        assert_eq!(err.to_string(), "unknown browser 'com.x'");
    }

    #[test]
    fn test_switch_error_from_permission_denied() {
        let err: BrowserbarError = SwitchError::PermissionDenied { status: -54 }.into();
        let msg = err.to_string();
        assert!(msg.contains("Switch error"));
        assert!(msg.contains("-54"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: BrowserbarError = io_err.into();
        assert!(matches!(err, BrowserbarError::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_actor_error_display() {
        let err: BrowserbarError = ActorError::SendFailed.into();
        assert!(err.to_string().contains("Coordinator error"));
    }

    #[test]
    fn test_command_error_display() {
        let err: BrowserbarError = "generic failure".into();
        assert_eq!(err.to_string(), "generic failure");
    }

    #[test]
    fn test_error_serializes_with_kind() {
        let err = BrowserbarError::StoreError("disk full".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("StoreError"));
        assert!(json.contains("disk full"));
    }
}
