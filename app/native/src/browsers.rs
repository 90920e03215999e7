//! Browser discovery.
//!
//! A browser is any application the OS reports as able to open the probe URL.
//! Discovery is a pure query: it never touches persisted state and may be
//! slow, so the switch coordinator always runs it on the blocking pool.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::platform::PlatformError;

/// Opaque reference to an application's icon.
///
/// The core never interprets it. On macOS it holds the application bundle
/// path, which is what an icon renderer loads the icon from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct IconRef(Option<PathBuf>);

impl IconRef {
    /// Creates an icon reference pointing at an application bundle.
    #[must_use]
    pub fn from_bundle_path(path: impl Into<PathBuf>) -> Self { Self(Some(path.into())) }

    /// Creates an empty icon reference.
    #[must_use]
    pub const fn none() -> Self { Self(None) }

    /// Returns the bundle path backing this icon, if known.
    #[must_use]
    pub fn bundle_path(&self) -> Option<&Path> { self.0.as_deref() }
}

/// An application able to handle web links.
///
/// Handles are rebuilt on every detection pass and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserHandle {
    /// Bundle identifier. Unique among handles.
    pub id: String,
    /// Name shown in the menu.
    pub display_name: String,
    /// Icon for the menu item.
    #[serde(skip)]
    pub icon: IconRef,
}

impl BrowserHandle {
    /// Creates a new browser handle.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, icon: IconRef) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            icon,
        }
    }
}

/// Source of browser candidates.
pub trait BrowserRegistry: Send + Sync + 'static {
    /// Asks the OS for every application able to open the probe URL.
    ///
    /// Results are returned in whatever order the OS reports them and may
    /// contain duplicates.
    ///
    /// # Errors
    ///
    /// Returns a [`PlatformError`] when the OS query itself fails.
    fn query_applications(&self) -> Result<Vec<BrowserHandle>, PlatformError>;

    /// Detects all browser candidates, deduplicated and sorted by name.
    ///
    /// A failing OS query is not fatal: it is logged and yields an empty list.
    fn detect_candidates(&self) -> Vec<BrowserHandle> {
        match self.query_applications() {
            Ok(found) => {
                let candidates = normalize_candidates(found);
                tracing::debug!(count = candidates.len(), "browsers: detection finished");
                candidates
            }
            Err(err) => {
                tracing::warn!(error = %err, "browsers: detection failed, showing no candidates");
                Vec::new()
            }
        }
    }
}

/// Deduplicates candidates by id and sorts them by display name.
///
/// The first occurrence of an id wins. Sorting is case-insensitive with
/// natural ordering of digit runs; equal names fall back to the id so the
/// result is deterministic.
#[must_use]
pub fn normalize_candidates(found: Vec<BrowserHandle>) -> Vec<BrowserHandle> {
    let mut seen = HashSet::with_capacity(found.len());
    let mut candidates: Vec<BrowserHandle> =
        found.into_iter().filter(|handle| seen.insert(handle.id.clone())).collect();

    candidates.sort_by(compare_by_name);
    candidates
}

fn compare_by_name(a: &BrowserHandle, b: &BrowserHandle) -> Ordering {
    natord::compare_ignore_case(&a.display_name, &b.display_name).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: &str, name: &str) -> BrowserHandle { BrowserHandle::new(id, name, IconRef::none()) }

    struct FixedRegistry(Result<Vec<BrowserHandle>, PlatformError>);

    impl BrowserRegistry for FixedRegistry {
        fn query_applications(&self) -> Result<Vec<BrowserHandle>, PlatformError> {
            match &self.0 {
                Ok(list) => Ok(list.clone()),
                Err(_) => Err(PlatformError::QueryFailed("no answer".into())),
            }
        }
    }

    #[test]
    fn test_normalize_sorts_case_insensitively() {
        let sorted = normalize_candidates(vec![
            handle("org.mozilla.firefox", "firefox"),
            handle("com.apple.Safari", "Safari"),
            handle("com.brave.Browser", "Brave Browser"),
        ]);
        let names: Vec<_> = sorted.iter().map(|h| h.display_name.as_str()).collect();
        assert_eq!(names, vec!["Brave Browser", "firefox", "Safari"]);
    }

    #[test]
    fn test_normalize_dedupes_keeping_first() {
        let sorted = normalize_candidates(vec![
            handle("com.google.Chrome", "Google Chrome"),
            handle("com.apple.Safari", "Safari"),
            handle("com.google.Chrome", "Google Chrome Beta Copy"),
        ]);
        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0].display_name, "Google Chrome");
    }

    #[test]
    fn test_normalize_natural_digit_order() {
        let sorted = normalize_candidates(vec![
            handle("com.example.b10", "Browser 10"),
            handle("com.example.b2", "Browser 2"),
        ]);
        assert_eq!(sorted[0].id, "com.example.b2");
    }

    #[test]
    fn test_normalize_equal_names_ordered_by_id() {
        let sorted = normalize_candidates(vec![handle("com.b", "Same"), handle("com.a", "same")]);
        assert_eq!(sorted[0].id, "com.a");
    }

    #[test]
    fn test_detect_candidates_failure_is_empty() {
        let registry = FixedRegistry(Err(PlatformError::Unsupported));
        assert!(registry.detect_candidates().is_empty());
    }

    #[test]
    fn test_detect_candidates_normalizes() {
        let registry = FixedRegistry(Ok(vec![handle("com.b", "B"), handle("com.a", "A")]));
        let ids: Vec<_> = registry.detect_candidates().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["com.a", "com.b"]);
    }

    #[test]
    fn test_icon_ref_bundle_path() {
        let icon = IconRef::from_bundle_path("/Applications/Safari.app");
        assert_eq!(icon.bundle_path(), Some(Path::new("/Applications/Safari.app")));
        assert!(IconRef::none().bundle_path().is_none());
    }
}
