//! Backend for targets without default-handler integration.
//!
//! Detection reports [`PlatformError::Unsupported`] (so the menu shows no
//! candidates), the current default is unknown, and every registration fails
//! with `unimpErr`.

use crate::browsers::{BrowserHandle, BrowserRegistry};
use crate::handler::DefaultHandlerService;
use crate::platform::PlatformError;

/// Status returned for registrations on unsupported targets (`unimpErr`).
pub const STATUS_UNSUPPORTED: i32 = -4;

/// Inert platform backend.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedPlatform {
    probe_url: String,
}

impl UnsupportedPlatform {
    /// Creates the backend. The probe URL is kept only for diagnostics.
    #[must_use]
    pub fn new(probe_url: &str) -> Self { Self { probe_url: probe_url.to_string() } }
}

impl BrowserRegistry for UnsupportedPlatform {
    fn query_applications(&self) -> Result<Vec<BrowserHandle>, PlatformError> {
        tracing::debug!(probe_url = %self.probe_url, "platform: discovery unsupported");
        Err(PlatformError::Unsupported)
    }
}

impl DefaultHandlerService for UnsupportedPlatform {
    fn current_default(&self) -> Option<String> { None }

    fn register_scheme(&self, scheme: &'static str, bundle_id: &str) -> i32 {
        tracing::warn!(scheme, bundle_id, "platform: cannot register handler on this platform");
        STATUS_UNSUPPORTED
    }
}
