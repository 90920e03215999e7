//! Persisted preferences.
//!
//! Preferences live in a small JSON document (`preferences.json`) under the
//! platform config directory. The document is the key-value store the rest
//! of the app reads from: `hiddenBrowsers`, `launchAtLogin` and `appLanguage`.
//!
//! Writes go through a temporary file in the same directory followed by a
//! rename, so a crash mid-write never leaves a truncated document behind.

pub mod visibility;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::APP_BUNDLE_ID;
pub use visibility::{VisibilityStore, filter_visible};

/// File name of the preferences document.
const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Errors raised by the preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The preferences file could not be read or written.
    #[error("failed to access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The preferences file is not valid JSON.
    #[error("failed to parse preferences at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Interface language stored under `appLanguage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLanguage {
    /// Follow the system language.
    #[default]
    Auto,
    /// English.
    En,
    /// Turkish.
    Tr,
}

impl AppLanguage {
    /// Resolves `Auto` against a system locale identifier such as `tr_TR`.
    ///
    /// Anything that is not Turkish resolves to English.
    #[must_use]
    pub fn resolve(self, system_locale: &str) -> Self {
        match self {
            Self::Auto if system_locale.to_lowercase().starts_with("tr") => Self::Tr,
            Self::Auto => Self::En,
            other => other,
        }
    }
}

impl FromStr for AppLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "en" => Ok(Self::En),
            "tr" => Ok(Self::Tr),
            _ => Err(format!("Invalid language '{s}'. Expected 'auto', 'en', or 'tr'.")),
        }
    }
}

/// The persisted preferences document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    /// Bundle identifiers hidden from the menu. Order is irrelevant.
    pub hidden_browsers: Vec<String>,
    /// Whether the app should start at login. Applied by the OS login-item service.
    pub launch_at_login: bool,
    /// Interface language.
    pub app_language: AppLanguage,
}

/// JSON file backed preference store.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// Creates a store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a store at the default location.
    ///
    /// `~/Library/Application Support/{APP_BUNDLE_ID}/preferences.json` on
    /// macOS, falling back to `/tmp/{APP_BUNDLE_ID}/` when no config directory
    /// is available.
    #[must_use]
    pub fn at_default_location() -> Self { Self::new(default_preferences_path()) }

    /// Returns the file backing this store.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Reads the preferences document.
    ///
    /// A missing file is not an error and yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Preferences, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Preferences::default());
            }
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };

        if content.trim().is_empty() {
            return Ok(Preferences::default());
        }

        serde_json::from_str(&content)
            .map_err(|source| StoreError::Parse { path: self.path.clone(), source })
    }

    /// Applies `change` to the stored preferences and writes them back.
    ///
    /// Concurrent updates through the same store are serialized.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if reading or writing the document fails.
    pub fn update<F>(&self, change: F) -> Result<Preferences, StoreError>
    where F: FnOnce(&mut Preferences) {
        let _guard = self.write_lock.lock();

        let mut preferences = self.load()?;
        change(&mut preferences);
        self.save(&preferences)?;
        Ok(preferences)
    }

    fn save(&self, preferences: &Preferences) -> Result<(), StoreError> {
        let io_error = |source: std::io::Error| StoreError::Io { path: self.path.clone(), source };

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(io_error)?;

        let json = serde_json::to_vec_pretty(preferences)
            .map_err(|source| StoreError::Parse { path: self.path.clone(), source })?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
        tmp.write_all(&json).map_err(io_error)?;
        tmp.persist(&self.path).map_err(|err| io_error(err.error))?;

        tracing::trace!(path = %self.path.display(), "store: preferences written");
        Ok(())
    }
}

/// Returns the default preferences file location.
#[must_use]
pub fn default_preferences_path() -> PathBuf {
    dirs::config_dir()
        .map_or_else(|| PathBuf::from(format!("/tmp/{APP_BUNDLE_ID}")), |dir| dir.join(APP_BUNDLE_ID))
        .join(PREFERENCES_FILE_NAME)
}
