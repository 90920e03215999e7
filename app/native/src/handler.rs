//! Default web-link handler access.
//!
//! Changing the default browser means registering the same application for
//! both web schemes. Each registration reports its own OS status, and
//! [`combine_statuses`] folds the two into one outcome.

use serde::Serialize;

use crate::constants::WEB_SCHEMES;

/// OS status reported by a successful registration.
pub const STATUS_OK: i32 = 0;

/// OS status for a sandbox refusal (`permErr`).
pub const STATUS_PERMISSION_DENIED: i32 = -54;

/// Result of registering one scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemeStatus {
    /// The URL scheme that was registered.
    pub scheme: &'static str,
    /// Raw OS status, `0` on success.
    pub status: i32,
}

impl SchemeStatus {
    /// Returns whether the registration succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool { self.status == STATUS_OK }
}

/// Outcome of asking the OS to change the default handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SetDefaultOutcome {
    /// Both schemes were registered.
    Ok,
    /// The OS refused the change, typically because of a sandbox restriction.
    PermissionDenied { status: i32 },
    /// Neither scheme was registered.
    Failed { status: i32 },
    /// One scheme was registered and the other was not.
    PartiallyApplied {
        applied: &'static str,
        failed: &'static str,
        status: i32,
    },
}

impl SetDefaultOutcome {
    /// Returns whether the change was fully accepted.
    #[must_use]
    pub const fn is_ok(&self) -> bool { matches!(self, Self::Ok) }
}

/// Folds per-scheme statuses into a single outcome.
///
/// Permission denial wins over a generic failure when no scheme succeeded,
/// so the caller can tell the user the app needs to run unsandboxed.
#[must_use]
pub fn combine_statuses(statuses: &[SchemeStatus]) -> SetDefaultOutcome {
    let applied = statuses.iter().find(|s| s.is_ok());
    let failures: Vec<&SchemeStatus> = statuses.iter().filter(|s| !s.is_ok()).collect();

    match (applied, failures.first()) {
        (_, None) => SetDefaultOutcome::Ok,
        (Some(applied), Some(failed)) => SetDefaultOutcome::PartiallyApplied {
            applied: applied.scheme,
            failed: failed.scheme,
            status: failed.status,
        },
        (None, Some(first)) => failures
            .iter()
            .find(|s| s.status == STATUS_PERMISSION_DENIED)
            .map_or(
                SetDefaultOutcome::Failed { status: first.status },
                |denied| SetDefaultOutcome::PermissionDenied { status: denied.status },
            ),
    }
}

/// Reads and writes the OS default handler for web links.
pub trait DefaultHandlerService: Send + Sync + 'static {
    /// Returns the bundle identifier of the current `http` handler.
    ///
    /// `None` when the OS cannot tell.
    fn current_default(&self) -> Option<String>;

    /// Registers `bundle_id` as the handler for a single scheme and returns
    /// the raw OS status.
    fn register_scheme(&self, scheme: &'static str, bundle_id: &str) -> i32;

    /// Registers `bundle_id` for both web schemes.
    ///
    /// Both registrations are always attempted, even if the first one fails.
    fn set_default(&self, bundle_id: &str) -> SetDefaultOutcome {
        let statuses: Vec<SchemeStatus> = WEB_SCHEMES
            .iter()
            .map(|&scheme| {
                let status = self.register_scheme(scheme, bundle_id);
                tracing::debug!(scheme, bundle_id, status, "handler: scheme registration");
                SchemeStatus { scheme, status }
            })
            .collect();

        combine_statuses(&statuses)
    }
}
