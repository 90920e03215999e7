//! Terminal rendition of the status menu.
//!
//! The menu is reprinted whenever the coordinator publishes a change. Commands
//! are read line by line from stdin on a dedicated thread:
//!
//! | Input | Action |
//! |-------|--------|
//! | `1`..`n` | switch to the n-th browser |
//! | `o` | the menu was opened (re-read the current default) |
//! | `r` | re-detect browsers |
//! | `q` | quit |

use std::io::{self, BufRead};

use colored::Colorize;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::{IconAppearance, MenuEntry, MenuLabels, MenuModel, Tint, build_menu};
use crate::error::BrowserbarError;
use crate::switcher::{IconState, SwitchActorHandle};
use crate::utils::thread::spawn_named_thread;

/// A parsed line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    /// One-based browser row.
    Select(usize),
    Open,
    Refresh,
    Help,
    Quit,
}

impl MenuCommand {
    /// Parses one input line. `None` for blank or unrecognized input.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "o" | "open" => Some(Self::Open),
            "r" | "refresh" => Some(Self::Refresh),
            "q" | "quit" => Some(Self::Quit),
            "?" | "h" | "help" => Some(Self::Help),
            other => other.parse::<usize>().ok().filter(|&n| n > 0).map(Self::Select),
        }
    }
}

const HELP: &str = "commands: <number> switch, o open menu, r re-detect, q quit";

/// Renders the indicator line followed by the menu rows.
#[must_use]
pub fn render(menu: &MenuModel, icon: &IconState) -> String {
    let mut lines = vec![render_indicator(icon)];
    let mut row = 0;

    for entry in &menu.entries {
        let line = match entry {
            MenuEntry::Title { label } => format!("  {}", label.bold().dimmed()),
            MenuEntry::Separator => format!("  {}", "─".repeat(24).dimmed()),
            MenuEntry::Browser { label, checked, .. } => {
                row += 1;
                let mark = if *checked { "✓".green().bold().to_string() } else { " ".to_string() };
                format!("  {mark} {row:>2}. {label}")
            }
            MenuEntry::Settings { label, key_equivalent }
            | MenuEntry::Quit { label, key_equivalent } => {
                format!("    {}  {label}", format!("⌘{key_equivalent}").dimmed())
            }
        };
        lines.push(line);
    }

    lines.join("\n")
}

fn render_indicator(icon: &IconState) -> String {
    let glyph = "⟳";
    let glyph = match IconAppearance::for_state(icon).tint {
        Tint::Template => glyph.normal(),
        Tint::Orange => glyph.truecolor(255, 149, 0).bold(),
        Tint::Green => glyph.green().bold(),
    };

    let status = match icon {
        IconState::Idle => String::new(),
        IconState::Switching(target) => format!("switching to {target}..."),
        IconState::Success(target) => format!("{target} is now the default"),
    };

    format!("{glyph} browserbar  {}", status.dimmed())
}

fn current_menu(handle: &SwitchActorHandle, labels: &MenuLabels) -> MenuModel {
    build_menu(&handle.visible_candidates(), handle.current_default().as_deref(), labels)
}

fn print_menu(handle: &SwitchActorHandle, labels: &MenuLabels) {
    println!("\n{}", render(&current_menu(handle, labels), &handle.icon_state()));
}

fn select(handle: &SwitchActorHandle, labels: &MenuLabels, row: usize) {
    let menu = current_menu(handle, labels);
    let Some(id) = menu.browser_at(row - 1).map(ToString::to_string) else {
        println!("{}", format!("no browser #{row}").yellow());
        return;
    };

    let handle = handle.clone();
    tokio::spawn(async move {
        if let Err(err) = handle.request_switch(id.as_str()).await {
            eprintln!("{} {err}", "switch failed:".red().bold());
        }
    });
}

/// Runs the terminal menu until `q` or end of input.
///
/// # Errors
///
/// Returns an error if the input thread cannot be started or the coordinator
/// stops responding.
pub async fn run(handle: SwitchActorHandle, labels: MenuLabels) -> Result<(), BrowserbarError> {
    let (tx, mut lines) = mpsc::channel::<String>(16);
    spawn_named_thread("menu-input", move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    })?;

    let mut events = handle.events();
    print_menu(&handle, &labels);
    println!("{}", HELP.dimmed());

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                tracing::debug!(event = event.name(), "menu: state changed");
                print_menu(&handle, &labels);
            }
            line = lines.recv() => {
                let Some(line) = line else { break };
                match MenuCommand::parse(&line) {
                    Some(MenuCommand::Quit) => break,
                    Some(MenuCommand::Open) => handle.menu_opened()?,
                    Some(MenuCommand::Refresh) => handle.refresh_candidates()?,
                    Some(MenuCommand::Help) => println!("{HELP}"),
                    Some(MenuCommand::Select(row)) => select(&handle, &labels, row),
                    None if line.trim().is_empty() => print_menu(&handle, &labels),
                    None => println!("{}", format!("unknown command '{}'", line.trim()).yellow()),
                }
            }
        }
    }

    tracing::info!("menu: quit requested");
    if handle.shutdown().is_err() {
        tracing::debug!("menu: coordinator already stopped");
    }
    Ok(())
}
