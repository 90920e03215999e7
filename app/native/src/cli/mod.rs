//! CLI module for BrowserBar.
//!
//! Every command starts its own switch coordinator in-process; there is no
//! long-running daemon to talk to.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::BrowserbarError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), BrowserbarError> {
    let cli = Cli::parse();
    cli.execute()
}
