//! Hidden-browser bookkeeping.

use std::collections::HashSet;

use super::PreferenceStore;
use crate::browsers::BrowserHandle;

/// Persisted set of browsers the user chose to hide from the menu.
///
/// Storage failures never propagate: reads fall back to an empty set and
/// failed writes are logged and dropped.
#[derive(Debug)]
pub struct VisibilityStore {
    store: PreferenceStore,
}

impl VisibilityStore {
    /// Wraps a preference store.
    #[must_use]
    pub const fn new(store: PreferenceStore) -> Self { Self { store } }

    /// Returns the hidden bundle identifiers.
    #[must_use]
    pub fn get_hidden(&self) -> HashSet<String> {
        match self.store.load() {
            Ok(prefs) => prefs.hidden_browsers.into_iter().collect(),
            Err(err) => {
                tracing::warn!(error = %err, "store: failed to read hidden browsers, assuming none");
                HashSet::new()
            }
        }
    }

    /// Hides or shows a browser. Idempotent; persisted immediately.
    pub fn set_hidden(&self, id: &str, hidden: bool) {
        let result = self.store.update(|prefs| {
            if hidden {
                if !prefs.hidden_browsers.iter().any(|h| h == id) {
                    prefs.hidden_browsers.push(id.to_string());
                }
            } else {
                prefs.hidden_browsers.retain(|h| h != id);
            }
        });

        match result {
            Ok(_) => tracing::debug!(id, hidden, "store: visibility updated"),
            Err(err) => tracing::warn!(error = %err, id, hidden, "store: failed to persist visibility"),
        }
    }
}

/// Removes hidden browsers from `candidates`, keeping the original order.
#[must_use]
pub fn filter_visible(candidates: &[BrowserHandle], hidden: &HashSet<String>) -> Vec<BrowserHandle> {
    candidates.iter().filter(|c| !hidden.contains(&c.id)).cloned().collect()
}
