#![allow(clippy::multiple_crate_versions)]

//! BrowserBar - switch the default web browser from a menu and watch the
//! change take effect.
//!
//! With no arguments the interactive menu opens; subcommands (e.g.
//! `browserbar switch firefox`) run once and exit.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "BROWSERBAR_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("browserbar_lib=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(err) = browserbar_lib::cli::run() {
        eprintln!("browserbar: {err}");
        std::process::exit(1);
    }
}
