//! Configuration types and loading for BrowserBar.
//!
//! The configuration file is optional. Every field has a default, so an empty
//! object (or no file at all) yields the stock behavior.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{APP_NAME, DEFAULT_PROBE_URL, timing};

/// File names searched in each configuration directory, in priority order.
const CONFIG_FILE_NAMES: [&str; 2] = ["config.jsonc", "config.json"];

/// Root configuration object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowserbarConfig {
    /// Milliseconds between default-handler checks while a switch is pending.
    pub poll_interval_ms: u64,

    /// Milliseconds a switch may remain unconfirmed before the indicator
    /// returns to idle.
    pub confirm_timeout_ms: u64,

    /// Milliseconds the success indicator stays visible.
    pub success_grace_ms: u64,

    /// URL used to discover applications able to open web links.
    pub probe_url: String,

    /// Overrides the location of the preferences file.
    ///
    /// Supports `~` for the home directory.
    pub preferences_path: Option<String>,
}

impl Default for BrowserbarConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: timing::POLL_INTERVAL_MS,
            confirm_timeout_ms: timing::CONFIRM_TIMEOUT_MS,
            success_grace_ms: timing::SUCCESS_GRACE_MS,
            probe_url: DEFAULT_PROBE_URL.to_string(),
            preferences_path: None,
        }
    }
}

impl BrowserbarConfig {
    /// Returns the switch timings described by this configuration.
    #[must_use]
    pub const fn timings(&self) -> SwitchTimings {
        SwitchTimings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            confirm_timeout: Duration::from_millis(self.confirm_timeout_ms),
            success_grace: Duration::from_millis(self.success_grace_ms),
        }
    }

    /// Returns the preferences file override, with `~` expanded.
    #[must_use]
    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences_path.as_deref().map(expand_home)
    }

    /// Checks the configuration for values the switcher cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("pollIntervalMs must be greater than 0".into()));
        }
        if self.confirm_timeout_ms == 0 {
            return Err(ConfigError::Invalid("confirmTimeoutMs must be greater than 0".into()));
        }
        if self.success_grace_ms == 0 {
            return Err(ConfigError::Invalid("successGraceMs must be greater than 0".into()));
        }
        if self.probe_url.trim().is_empty() {
            return Err(ConfigError::Invalid("probeUrl must not be empty".into()));
        }
        Ok(())
    }
}

/// Timer durations driving the switch indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchTimings {
    /// Interval between confirmation polls.
    pub poll_interval: Duration,
    /// Deadline after which an unconfirmed switch is abandoned.
    pub confirm_timeout: Duration,
    /// How long `Success` is shown before returning to `Idle`.
    pub success_grace: Duration,
}

impl Default for SwitchTimings {
    fn default() -> Self { BrowserbarConfig::default().timings() }
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/browserbar/config.jsonc, \
         the platform config directory, or ~/.browserbar.json"
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
    /// The configuration parsed but holds unusable values.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Returns the candidate configuration file paths, in search order.
///
/// 1. `$XDG_CONFIG_HOME/browserbar/`
/// 2. `~/.config/browserbar/`
/// 3. The platform config directory (`~/Library/Application Support` on macOS)
/// 4. `~/.browserbar.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let push_dir = |dir: PathBuf, paths: &mut Vec<PathBuf>| {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    };

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        push_dir(PathBuf::from(xdg_config).join(APP_NAME), &mut paths);
    }

    if let Some(home) = dirs::home_dir() {
        push_dir(home.join(".config").join(APP_NAME), &mut paths);
    }

    if let Some(config_dir) = dirs::config_dir() {
        push_dir(config_dir.join(APP_NAME), &mut paths);
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{APP_NAME}.json")));
    }

    paths
}

/// Loads the configuration from the first existing default location.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if no file exists, or a read/parse error
/// for the first file that does.
pub fn load_config() -> Result<(BrowserbarConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    Err(ConfigError::NotFound)
}

/// Loads the configuration from an explicit path.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if the file is missing, or a read/parse
/// error otherwise.
pub fn load_config_from_path(path: &Path) -> Result<(BrowserbarConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }

    let file = fs::File::open(path)?;
    // Strip comments from JSONC before parsing
    let reader = json_comments::StripComments::new(file);
    let config: BrowserbarConfig = serde_json::from_reader(reader)?;
    Ok((config, path.to_path_buf()))
}

/// Expands a leading `~` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    let path = path.trim();
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}
