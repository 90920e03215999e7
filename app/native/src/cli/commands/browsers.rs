//! Browser commands.
//!
//! Every command talks to a freshly spawned switch coordinator, exactly as
//! the menu does, so the CLI sees the same detection, filtering and
//! confirmation behavior.

use std::time::Duration;

use colored::Colorize;
use serde_json::json;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::browsers::BrowserHandle;
use crate::cli::output;
use crate::error::BrowserbarError;
use crate::switcher::{IconState, SwitchActorHandle};

/// Finds a browser by bundle identifier or display name.
///
/// Exact identifier matches win over case-insensitive ones, which win over
/// display name matches.
///
/// # Errors
///
/// Returns [`BrowserbarError::InvalidArguments`] if nothing matches.
pub fn resolve_browser<'a>(
    candidates: &'a [BrowserHandle],
    query: &str,
) -> Result<&'a BrowserHandle, BrowserbarError> {
    let query = query.trim();
    candidates
        .iter()
        .find(|c| c.id == query)
        .or_else(|| candidates.iter().find(|c| c.id.eq_ignore_ascii_case(query)))
        .or_else(|| {
            let lowered = query.to_lowercase();
            candidates.iter().find(|c| c.display_name.to_lowercase() == lowered)
        })
        .ok_or_else(|| {
            BrowserbarError::InvalidArguments(format!(
                "Unknown browser '{query}'. Run `browserbar list --all` to see the available ones."
            ))
        })
}

/// Detects browsers and returns `(all, visible)`.
async fn detect(
    handle: &SwitchActorHandle,
) -> Result<(Vec<BrowserHandle>, Vec<BrowserHandle>), BrowserbarError> {
    let visible = handle.refresh_candidates_and_wait().await?;
    let all = handle.all_candidates().await?;
    Ok((all, visible))
}

/// Execute `browserbar list`.
///
/// # Errors
///
/// Returns an error if the coordinator stops responding.
pub async fn list(handle: &SwitchActorHandle, all: bool, json: bool) -> Result<(), BrowserbarError> {
    #[derive(Tabled)]
    struct BrowserRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Bundle ID")]
        id: String,
        #[tabled(rename = "Default")]
        default: String,
    }

    #[derive(Tabled)]
    struct BrowserRowWithVisibility {
        #[tabled(inline)]
        row: BrowserRow,
        #[tabled(rename = "Visible")]
        visible: String,
    }

    let (all_candidates, visible) = detect(handle).await?;
    let current = handle.refresh_default().await?;
    let hidden = handle.hidden_browsers().await?;
    let shown = if all { all_candidates } else { visible };

    if json {
        let items: Vec<serde_json::Value> = shown
            .iter()
            .map(|b| {
                json!({
                    "id": b.id,
                    "displayName": b.display_name,
                    "isDefault": current.as_deref() == Some(b.id.as_str()),
                    "hidden": hidden.contains(&b.id),
                })
            })
            .collect();
        output::print_highlighted_json(&serde_json::Value::Array(items));
        return Ok(());
    }

    if shown.is_empty() {
        println!("{}", "No browsers detected.".dimmed());
        return Ok(());
    }

    let row = |(i, b): (usize, &BrowserHandle)| BrowserRow {
        index: i + 1,
        name: b.display_name.clone(),
        id: b.id.clone(),
        default: output::format_check(current.as_deref() == Some(b.id.as_str())),
    };

    let table = if all {
        let rows: Vec<BrowserRowWithVisibility> = shown
            .iter()
            .enumerate()
            .map(|entry| BrowserRowWithVisibility {
                visible: output::format_bool(!hidden.contains(&entry.1.id)),
                row: row(entry),
            })
            .collect();
        Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::first()).with(Alignment::right()))
            .with(Modify::new(Columns::new(3..5)).with(Alignment::center()))
            .to_string()
    } else {
        let rows: Vec<BrowserRow> = shown.iter().enumerate().map(row).collect();
        Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::first()).with(Alignment::right()))
            .with(Modify::new(Columns::new(3..4)).with(Alignment::center()))
            .to_string()
    };

    println!("{}", format!("Browsers ({})", shown.len()).bold());
    println!("{table}");
    Ok(())
}

/// Execute `browserbar current`.
///
/// # Errors
///
/// Returns an error if the coordinator stops responding.
pub async fn current(handle: &SwitchActorHandle, json: bool) -> Result<(), BrowserbarError> {
    let (all_candidates, _) = detect(handle).await?;
    let current = handle.refresh_default().await?;
    let name = current
        .as_deref()
        .and_then(|id| all_candidates.iter().find(|c| c.id == id))
        .map(|c| c.display_name.clone());

    if json {
        output::print_highlighted_json(&json!({ "id": current, "displayName": name }));
        return Ok(());
    }

    match (current, name) {
        (Some(id), Some(name)) => println!("{} {}", name.bold(), format!("({id})").dimmed()),
        (Some(id), None) => println!("{id}"),
        (None, _) => println!("{}", "The default browser could not be determined.".yellow()),
    }
    Ok(())
}

/// Execute `browserbar switch`.
///
/// With `wait`, returns once the system reports the new default, or fails
/// after the confirmation timeout.
///
/// # Errors
///
/// Returns an error if the browser is unknown, the system refused the change,
/// or the change was not confirmed in time.
pub async fn switch(
    handle: &SwitchActorHandle,
    query: &str,
    wait: bool,
    confirm_timeout: Duration,
) -> Result<(), BrowserbarError> {
    let (all_candidates, _) = detect(handle).await?;
    let browser = resolve_browser(&all_candidates, query)?.clone();

    let mut icon = handle.subscribe_icon_state();
    let generation = handle.request_switch(browser.id.clone()).await?;
    tracing::debug!(generation, id = %browser.id, "cli: switch accepted");

    if !wait {
        println!("Requested {} as the default browser.", browser.display_name.bold());
        return Ok(());
    }

    println!(
        "{} {} {}",
        "⟳".truecolor(255, 149, 0).bold(),
        format!("Switching to {}...", browser.display_name).bold(),
        "(confirm the system prompt if one appears)".dimmed()
    );

    loop {
        match icon.get() {
            IconState::Success(target) if target == browser.id => {
                println!("{} {} is now the default browser.", "✓".green().bold(), browser.display_name);
                return Ok(());
            }
            IconState::Switching(target) if target == browser.id => {}
            _ => {
                return Err(BrowserbarError::CommandError(format!(
                    "{} did not become the default browser within {}s",
                    browser.display_name,
                    confirm_timeout.as_secs()
                )));
            }
        }

        if icon.next().await.is_none() {
            return Err(BrowserbarError::ActorError("switch coordinator stopped".into()));
        }
    }
}

/// Execute `browserbar hide` / `browserbar show`.
///
/// # Errors
///
/// Returns an error if the browser is unknown or the coordinator stops
/// responding.
pub async fn set_visibility(
    handle: &SwitchActorHandle,
    query: &str,
    hidden: bool,
) -> Result<(), BrowserbarError> {
    let (all_candidates, _) = detect(handle).await?;
    let browser = resolve_browser(&all_candidates, query)?;

    let visible = handle.set_hidden(browser.id.clone(), hidden).await?;
    let now_hidden = !visible.iter().any(|c| c.id == browser.id);
    if now_hidden != hidden {
        tracing::warn!(id = %browser.id, hidden, "cli: visibility change was not persisted");
    }

    let verb = if hidden { "Hidden" } else { "Showing" };
    println!("{verb} {} {}", browser.display_name.bold(), format!("({})", browser.id).dimmed());
    Ok(())
}
