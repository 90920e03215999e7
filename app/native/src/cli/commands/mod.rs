//! CLI command definitions using Clap.
//!
//! - `browsers` - list, inspect, switch and hide browsers

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::config::{self, BrowserbarConfig};
use crate::constants::APP_NAME;
use crate::error::BrowserbarError;

pub mod browsers;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// BrowserBar - switch the default web browser and watch the change land.
///
/// Run without a subcommand to open the interactive menu.
#[derive(Parser, Debug)]
#[command(name = "browserbar")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
#[command(next_display_order = None)]
pub enum Commands {
    /// List browsers able to open web links.
    ///
    /// Hidden browsers are left out unless `--all` is given.
    List {
        /// Include hidden browsers.
        #[arg(long, short)]
        all: bool,

        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Show the current default browser.
    Current {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Make a browser the default.
    ///
    /// BROWSER is a bundle identifier or a display name (case-insensitive).
    /// By default the command waits until the system reports the change, which
    /// may require confirming a system prompt.
    #[command(after_long_help = r#"Examples:
  browserbar switch com.apple.Safari
  browserbar switch firefox
  browserbar switch "Google Chrome" --no-wait"#)]
    Switch {
        /// Bundle identifier or display name.
        browser: String,

        /// Return once the system accepted the request instead of waiting
        /// for confirmation.
        #[arg(long)]
        no_wait: bool,
    },

    /// Hide a browser from the menu.
    Hide {
        /// Bundle identifier or display name.
        browser: String,
    },

    /// Show a previously hidden browser in the menu again.
    Show {
        /// Bundle identifier or display name.
        browser: String,
    },

    /// Open the interactive terminal menu (default).
    Menu,

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(browserbar completions --shell zsh)"
    ///   browserbar completions --shell fish > ~/.config/fish/completions/browserbar.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> { self.config.as_ref().map(PathBuf::from) }

    /// Returns the selected command; no subcommand means the menu.
    #[must_use]
    pub fn selected_command(&self) -> Commands { self.command.clone().unwrap_or(Commands::Menu) }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), BrowserbarError> {
        if let Some(path) = self.config_path() {
            if !path.exists() {
                return Err(BrowserbarError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            config::set_custom_config_path(path);
        }

        match self.selected_command() {
            Commands::Schema => {
                println!("{}", config::json_schema()?);
                Ok(())
            }
            Commands::Completions { shell } => {
                Self::print_completions(shell);
                Ok(())
            }
            command => {
                let config = config::init();
                let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
                runtime.block_on(execute_with_coordinator(command, config))
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command_factory();
        generate(generator, &mut cmd, APP_NAME, &mut io::stdout());
    }

    fn command_factory() -> clap::Command { <Self as CommandFactory>::command() }
}

/// Runs a command that needs the switch coordinator.
async fn execute_with_coordinator(
    command: Commands,
    config: &BrowserbarConfig,
) -> Result<(), BrowserbarError> {
    let handle = crate::start_coordinator(config);

    let result = match command {
        Commands::List { all, json } => browsers::list(&handle, all, json).await,
        Commands::Current { json } => browsers::current(&handle, json).await,
        Commands::Switch { browser, no_wait } => {
            browsers::switch(&handle, &browser, !no_wait, config.timings().confirm_timeout).await
        }
        Commands::Hide { browser } => browsers::set_visibility(&handle, &browser, true).await,
        Commands::Show { browser } => browsers::set_visibility(&handle, &browser, false).await,
        Commands::Menu => crate::run_menu(handle.clone(), config).await,
        Commands::Schema | Commands::Completions { .. } => Ok(()),
    };

    if handle.is_alive() && handle.shutdown().is_err() {
        tracing::debug!("cli: coordinator already stopped");
    }
    result
}
