//! BrowserBar - switch the default web browser and watch the change land.
//!
//! The library holds the switch coordinator and everything around it:
//! browser detection, the default-handler service, persisted preferences
//! and the presenters (terminal menu and CLI) built on top.

pub mod browsers;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod handler;
pub mod menu;
pub mod platform;
pub mod store;
pub mod switcher;

mod utils;

use std::sync::Arc;

use config::BrowserbarConfig;
use error::BrowserbarError;
use menu::MenuLabels;
use store::{PreferenceStore, VisibilityStore};
use switcher::{SwitchActor, SwitchActorHandle, SwitchServices};

/// Starts the switch coordinator against the native backend.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn start_coordinator(config: &BrowserbarConfig) -> SwitchActorHandle {
    let backend = platform::native_backend(&config.probe_url);
    let visibility = Arc::new(VisibilityStore::new(preference_store(config)));
    SwitchActor::spawn(SwitchServices::new(backend, visibility), config.timings())
}

/// Runs the interactive terminal menu until the user quits.
///
/// # Errors
///
/// Returns an error if the menu cannot read its input.
pub async fn run_menu(
    handle: SwitchActorHandle,
    config: &BrowserbarConfig,
) -> Result<(), BrowserbarError> {
    let language = match preference_store(config).load() {
        Ok(preferences) => preferences.app_language,
        Err(err) => {
            tracing::warn!(error = %err, "menu: failed to read preferences, using defaults");
            store::AppLanguage::default()
        }
    };

    let labels = MenuLabels::for_language(language.resolve(&system_locale()));
    menu::terminal::run(handle, labels).await
}

fn preference_store(config: &BrowserbarConfig) -> PreferenceStore {
    PreferenceStore::new(config.preferences_path().unwrap_or_else(store::default_preferences_path))
}

/// Locale identifier from the usual environment variables, e.g. `tr_TR.UTF-8`.
fn system_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}
