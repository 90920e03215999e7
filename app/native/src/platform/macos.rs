//! Launch Services bindings.
//!
//! Discovery goes through `LSCopyApplicationURLsForURL`, the current handler
//! through `LSCopyDefaultHandlerForURLScheme`, and registration through
//! `LSSetDefaultHandlerForURLScheme`. On recent macOS versions a successful
//! registration only means the request was accepted: the system may still
//! show a confirmation prompt, which is why the switch coordinator polls.
//!
//! Registration fails with `permErr` (-54) when the process runs inside the
//! App Sandbox.

use std::path::Path;

use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::TCFType;
use core_foundation::bundle::CFBundle;
use core_foundation::string::{CFString, CFStringRef};
use core_foundation::url::{CFURL, CFURLRef};
use core_foundation_sys::base::{CFGetTypeID, CFTypeRef, kCFAllocatorDefault};
use core_foundation_sys::bundle::{
    CFBundleGetIdentifier, CFBundleGetValueForInfoDictionaryKey, CFBundleRef,
};
use core_foundation_sys::string::CFStringGetTypeID;
use core_foundation_sys::url::CFURLCreateWithString;

use crate::browsers::{BrowserHandle, BrowserRegistry, IconRef};
use crate::constants::PRIMARY_SCHEME;
use crate::handler::DefaultHandlerService;
use crate::platform::PlatformError;

// ============================================================================
// FFI Declarations
// ============================================================================

type LSRolesMask = u32;

/// Match applications in any role (viewer, editor, shell).
const K_LS_ROLES_ALL: LSRolesMask = 0xFFFF_FFFF;

#[link(name = "CoreServices", kind = "framework")]
unsafe extern "C" {
    fn LSCopyApplicationURLsForURL(in_url: CFURLRef, in_role_mask: LSRolesMask) -> CFArrayRef;
    fn LSCopyDefaultHandlerForURLScheme(in_url_scheme: CFStringRef) -> CFStringRef;
    fn LSSetDefaultHandlerForURLScheme(
        in_url_scheme: CFStringRef,
        in_handler_bundle_id: CFStringRef,
    ) -> i32;
}

// ============================================================================
// Backend
// ============================================================================

/// Launch Services backed browser registry and handler service.
#[derive(Debug, Clone)]
pub struct LaunchServices {
    probe_url: String,
}

impl LaunchServices {
    /// Creates a backend that discovers browsers using `probe_url`.
    #[must_use]
    pub fn new(probe_url: &str) -> Self { Self { probe_url: probe_url.to_string() } }

    fn probe_cfurl(&self) -> Result<CFURL, PlatformError> {
        let url_string = CFString::new(&self.probe_url);
        let url_ref = unsafe {
            CFURLCreateWithString(
                kCFAllocatorDefault,
                url_string.as_concrete_TypeRef(),
                std::ptr::null(),
            )
        };
        if url_ref.is_null() {
            return Err(PlatformError::InvalidProbeUrl(self.probe_url.clone()));
        }

        // SAFETY: CFURLCreateWithString follows the create rule and the pointer is non-null
        Ok(unsafe { CFURL::wrap_under_create_rule(url_ref) })
    }
}

impl BrowserRegistry for LaunchServices {
    fn query_applications(&self) -> Result<Vec<BrowserHandle>, PlatformError> {
        let probe = self.probe_cfurl()?;
        let array_ref =
            unsafe { LSCopyApplicationURLsForURL(probe.as_concrete_TypeRef(), K_LS_ROLES_ALL) };
        if array_ref.is_null() {
            return Err(PlatformError::QueryFailed(format!(
                "no applications reported for {}",
                self.probe_url
            )));
        }

        // SAFETY: LSCopyApplicationURLsForURL follows the create rule and returns CFURLs
        let urls: CFArray<CFURL> = unsafe { CFArray::wrap_under_create_rule(array_ref) };

        Ok(urls.iter().filter_map(|url| browser_from_app_url(&url)).collect())
    }
}

impl DefaultHandlerService for LaunchServices {
    fn current_default(&self) -> Option<String> {
        let scheme = CFString::from_static_string(PRIMARY_SCHEME);
        let handler_ref = unsafe { LSCopyDefaultHandlerForURLScheme(scheme.as_concrete_TypeRef()) };
        if handler_ref.is_null() {
            return None;
        }

        // SAFETY: the copy function follows the create rule and the pointer is non-null
        let handler = unsafe { CFString::wrap_under_create_rule(handler_ref) }.to_string();
        (!handler.is_empty()).then_some(handler)
    }

    fn register_scheme(&self, scheme: &'static str, bundle_id: &str) -> i32 {
        let scheme = CFString::from_static_string(scheme);
        let bundle_id = CFString::new(bundle_id);
        unsafe {
            LSSetDefaultHandlerForURLScheme(
                scheme.as_concrete_TypeRef(),
                bundle_id.as_concrete_TypeRef(),
            )
        }
    }
}

// ============================================================================
// Bundle helpers
// ============================================================================

/// Builds a browser handle from an application bundle URL.
///
/// Returns `None` for bundles without an identifier.
fn browser_from_app_url(url: &CFURL) -> Option<BrowserHandle> {
    let path = url.to_path()?;
    let bundle = CFBundle::new(url.clone())?;
    let bundle_ref = bundle.as_concrete_TypeRef();

    let id = unsafe { get_string(CFBundleGetIdentifier(bundle_ref).cast()) }?;
    let display_name = unsafe { info_string(bundle_ref, "CFBundleDisplayName") }
        .or_else(|| unsafe { info_string(bundle_ref, "CFBundleName") })
        .unwrap_or_else(|| fallback_name(&path));

    Some(BrowserHandle::new(id, display_name, IconRef::from_bundle_path(path)))
}

/// Reads a string value from a bundle's (localized) info dictionary.
///
/// # Safety
///
/// `bundle` must be a valid `CFBundleRef`.
unsafe fn info_string(bundle: CFBundleRef, key: &'static str) -> Option<String> {
    let key = CFString::from_static_string(key);
    let value = unsafe { CFBundleGetValueForInfoDictionaryKey(bundle, key.as_concrete_TypeRef()) };
    unsafe { get_string(value) }
}

/// Converts a borrowed `CFTypeRef` to a Rust string if it is a non-empty `CFString`.
///
/// # Safety
///
/// `value` must be null or a valid CF object owned by someone else (get rule).
unsafe fn get_string(value: CFTypeRef) -> Option<String> {
    if value.is_null() || unsafe { CFGetTypeID(value) != CFStringGetTypeID() } {
        return None;
    }

    // SAFETY: type checked above; get rule means we must retain, which wrap_under_get_rule does
    let string = unsafe { CFString::wrap_under_get_rule(value.cast()) }.to_string();
    (!string.is_empty()).then_some(string)
}

/// Falls back to the bundle file name without its `.app` extension.
fn fallback_name(path: &Path) -> String {
    path.file_stem().map_or_else(
        || path.to_string_lossy().into_owned(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_name_strips_extension() {
        assert_eq!(fallback_name(Path::new("/Applications/Arc.app")), "Arc");
    }

    #[test]
    fn test_probe_url_is_accepted() {
        let backend = LaunchServices::new("http://www.google.com");
        assert!(backend.probe_cfurl().is_ok());
    }

    #[test]
    fn test_unhandled_probe_scheme_is_query_failure() {
        let backend = LaunchServices::new("browserbar-unregistered-scheme://probe");
        assert!(matches!(backend.query_applications(), Err(PlatformError::QueryFailed(_))));
        assert!(backend.detect_candidates().is_empty());
    }

    #[test]
    fn test_get_string_null() {
        assert!(unsafe { get_string(std::ptr::null()) }.is_none());
    }
}
