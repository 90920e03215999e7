//! Configuration module for BrowserBar.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

pub mod types;

use std::path::PathBuf;
use std::sync::OnceLock;

pub use types::{
    BrowserbarConfig, ConfigError, SwitchTimings, config_paths, load_config as load_config_default,
    load_config_from_path,
};

/// Global configuration instance, loaded once at startup.
static CONFIG: OnceLock<BrowserbarConfig> = OnceLock::new();

/// Custom config path override (set via CLI --config flag).
static CUSTOM_CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets a custom configuration file path to use instead of the default search paths.
///
/// This must be called before `init()` to take effect.
///
/// # Returns
///
/// `true` if the path was set successfully, `false` if a path was already set.
pub fn set_custom_config_path(path: PathBuf) -> bool { CUSTOM_CONFIG_PATH.set(path).is_ok() }

/// Loads the configuration from disk.
///
/// Returns the loaded configuration, or the default configuration if loading
/// or validation fails.
fn load_or_default() -> BrowserbarConfig {
    let result = CUSTOM_CONFIG_PATH
        .get()
        .map_or_else(load_config_default, |path| load_config_from_path(path));

    match result {
        Ok((config, path)) => {
            if let Err(err) = config.validate() {
                tracing::warn!(
                    error = %err,
                    path = %path.display(),
                    "invalid configuration, using defaults"
                );
                return BrowserbarConfig::default();
            }
            tracing::debug!(path = %path.display(), "configuration loaded");
            config
        }
        Err(ConfigError::NotFound) => {
            tracing::debug!("no configuration file found, using defaults");
            BrowserbarConfig::default()
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load configuration, using defaults");
            BrowserbarConfig::default()
        }
    }
}

/// Initializes and returns the global configuration instance.
///
/// This function is idempotent - calling it multiple times will return
/// the same configuration instance.
pub fn init() -> &'static BrowserbarConfig { CONFIG.get_or_init(load_or_default) }

/// Renders the JSON Schema of the configuration file.
///
/// # Errors
///
/// Returns an error if the schema cannot be serialized.
pub fn json_schema() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schemars::schema_for!(BrowserbarConfig))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexported_types_are_available() {
        let config = BrowserbarConfig::default();
        let timings: SwitchTimings = config.timings();
        assert_eq!(timings, SwitchTimings::default());
    }

    #[test]
    fn test_json_schema_lists_fields() {
        let schema = json_schema().unwrap();
        for field in ["pollIntervalMs", "confirmTimeoutMs", "successGraceMs", "probeUrl"] {
            assert!(schema.contains(field), "schema should describe {field}");
        }
    }

    #[test]
    fn test_config_error_not_found_message() {
        let err = ConfigError::NotFound;
        assert!(err.to_string().contains("No configuration file found"));
    }
}
