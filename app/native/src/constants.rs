//! Application-wide constants.

/// Bundle identifier used for the preferences and cache directories.
pub const APP_BUNDLE_ID: &str = "com.browserbar.app";

/// Application name used in logs, config paths and CLI output.
pub const APP_NAME: &str = "browserbar";

/// URL used to ask the OS which applications can open web links.
pub const DEFAULT_PROBE_URL: &str = "http://www.google.com";

/// Primary web scheme. Its handler is what we report as the current default.
pub const PRIMARY_SCHEME: &str = "http";

/// Secure variant of the web scheme, registered alongside the primary one.
pub const SECURE_SCHEME: &str = "https";

/// Both schemes, in the order they are registered.
pub const WEB_SCHEMES: [&str; 2] = [PRIMARY_SCHEME, SECURE_SCHEME];

/// Persisted preference keys.
pub mod keys {
    /// Set of bundle identifiers hidden from the menu.
    pub const HIDDEN_BROWSERS: &str = "hiddenBrowsers";

    /// Whether the app registers itself as a login item.
    pub const LAUNCH_AT_LOGIN: &str = "launchAtLogin";

    /// Interface language (`auto`, `en` or `tr`).
    pub const APP_LANGUAGE: &str = "appLanguage";
}

/// Default switch confirmation timings, in milliseconds.
pub mod timing {
    /// Interval between default-handler polls while a switch is pending.
    pub const POLL_INTERVAL_MS: u64 = 500;

    /// How long a switch may stay unconfirmed before the indicator gives up.
    pub const CONFIRM_TIMEOUT_MS: u64 = 15_000;

    /// How long the success indicator stays up before returning to idle.
    pub const SUCCESS_GRACE_MS: u64 = 2_000;
}
