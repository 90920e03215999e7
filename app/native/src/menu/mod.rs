//! Menu bar presentation model.
//!
//! Everything a status-item presenter needs is computed here from published
//! coordinator state: the menu entries and the indicator appearance. The model
//! is toolkit-agnostic; [`terminal`] renders it on a terminal.

pub mod terminal;

use serde::Serialize;

use crate::browsers::{BrowserHandle, IconRef};
use crate::store::AppLanguage;
use crate::switcher::IconState;

/// SF Symbol shown in the menu bar.
pub const STATUS_SYMBOL: &str = "arrow.triangle.2.circlepath";

/// Symbol used when [`STATUS_SYMBOL`] is unavailable.
pub const FALLBACK_SYMBOL: &str = "globe";

/// Fixed menu labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuLabels {
    pub title: &'static str,
    pub settings: &'static str,
    pub quit: &'static str,
}

impl MenuLabels {
    pub const ENGLISH: Self = Self {
        title: "Browsers",
        settings: "Settings...",
        quit: "Quit",
    };

    pub const TURKISH: Self = Self {
        title: "Tarayıcılar",
        settings: "Ayarlar...",
        quit: "Çıkış",
    };

    /// Labels for a resolved language. `Auto` falls back to English.
    #[must_use]
    pub const fn for_language(language: AppLanguage) -> Self {
        match language {
            AppLanguage::Tr => Self::TURKISH,
            AppLanguage::En | AppLanguage::Auto => Self::ENGLISH,
        }
    }
}

impl Default for MenuLabels {
    fn default() -> Self { Self::ENGLISH }
}

/// One row of the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MenuEntry {
    /// Disabled header row.
    Title { label: String },
    Separator,
    /// Selecting it requests a switch to `id`.
    Browser {
        id: String,
        label: String,
        checked: bool,
        #[serde(skip)]
        icon: IconRef,
    },
    Settings { label: String, key_equivalent: char },
    Quit { label: String, key_equivalent: char },
}

/// The full menu, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MenuModel {
    pub entries: Vec<MenuEntry>,
}

impl MenuModel {
    /// Browser rows in display order as `(id, label, checked)`.
    pub fn browsers(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.entries.iter().filter_map(|entry| match entry {
            MenuEntry::Browser { id, label, checked, .. } => {
                Some((id.as_str(), label.as_str(), *checked))
            }
            _ => None,
        })
    }

    /// Id of the `index`-th browser row, zero-based.
    #[must_use]
    pub fn browser_at(&self, index: usize) -> Option<&str> {
        self.browsers().nth(index).map(|(id, _, _)| id)
    }
}

/// Builds the menu for the given visible candidates.
///
/// Layout: disabled title, separator, one row per browser (the current
/// default carries a checkmark), separator, Settings, Quit.
#[must_use]
pub fn build_menu(
    candidates: &[BrowserHandle],
    current_default: Option<&str>,
    labels: &MenuLabels,
) -> MenuModel {
    let mut entries = Vec::with_capacity(candidates.len() + 5);
    entries.push(MenuEntry::Title { label: labels.title.to_string() });
    entries.push(MenuEntry::Separator);

    entries.extend(candidates.iter().map(|browser| MenuEntry::Browser {
        id: browser.id.clone(),
        label: browser.display_name.clone(),
        checked: current_default == Some(browser.id.as_str()),
        icon: browser.icon.clone(),
    }));

    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::Settings {
        label: labels.settings.to_string(),
        key_equivalent: ',',
    });
    entries.push(MenuEntry::Quit {
        label: labels.quit.to_string(),
        key_equivalent: 'q',
    });

    MenuModel { entries }
}

/// How the status symbol is tinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tint {
    /// Template image; follows the system light/dark appearance.
    Template,
    /// System orange: a switch is pending.
    Orange,
    /// System green: a switch was confirmed.
    Green,
}

/// Appearance of the menu bar indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IconAppearance {
    pub symbol: &'static str,
    pub fallback_symbol: &'static str,
    pub tint: Tint,
}

impl IconAppearance {
    #[must_use]
    pub const fn for_state(state: &IconState) -> Self {
        let tint = match state {
            IconState::Idle => Tint::Template,
            IconState::Switching(_) => Tint::Orange,
            IconState::Success(_) => Tint::Green,
        };
        Self {
            symbol: STATUS_SYMBOL,
            fallback_symbol: FALLBACK_SYMBOL,
            tint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: &str, name: &str) -> BrowserHandle { BrowserHandle::new(id, name, IconRef::none()) }

    #[test]
    fn test_menu_layout() {
        let candidates = vec![handle("com.a", "Arc"), handle("com.b", "Brave")];
        let menu = build_menu(&candidates, Some("com.b"), &MenuLabels::ENGLISH);

        assert_eq!(menu.entries.len(), 7);
        assert_eq!(menu.entries[0], MenuEntry::Title { label: "Browsers".into() });
        assert_eq!(menu.entries[1], MenuEntry::Separator);
        assert_eq!(menu.entries[4], MenuEntry::Separator);
        assert!(matches!(&menu.entries[5], MenuEntry::Settings { key_equivalent: ',', .. }));
        assert!(matches!(&menu.entries[6], MenuEntry::Quit { key_equivalent: 'q', .. }));
    }

    #[test]
    fn test_only_default_is_checked() {
        let candidates = vec![handle("com.a", "Arc"), handle("com.b", "Brave")];
        let menu = build_menu(&candidates, Some("com.b"), &MenuLabels::ENGLISH);

        let rows: Vec<_> = menu.browsers().collect();
        assert_eq!(rows, vec![("com.a", "Arc", false), ("com.b", "Brave", true)]);
    }

    #[test]
    fn test_unknown_default_checks_nothing() {
        let candidates = vec![handle("com.a", "Arc")];
        let menu = build_menu(&candidates, None, &MenuLabels::ENGLISH);
        assert!(menu.browsers().all(|(_, _, checked)| !checked));
    }

    #[test]
    fn test_empty_candidates_keep_fixed_rows() {
        let menu = build_menu(&[], None, &MenuLabels::TURKISH);
        assert_eq!(menu.entries.len(), 5);
        assert_eq!(menu.entries[0], MenuEntry::Title { label: "Tarayıcılar".into() });
        assert_eq!(menu.browser_at(0), None);
    }

    #[test]
    fn test_browser_at_is_zero_based() {
        let candidates = vec![handle("com.a", "Arc"), handle("com.b", "Brave")];
        let menu = build_menu(&candidates, None, &MenuLabels::ENGLISH);
        assert_eq!(menu.browser_at(1), Some("com.b"));
        assert_eq!(menu.browser_at(2), None);
    }

    #[test]
    fn test_icon_appearance_tints() {
        assert_eq!(IconAppearance::for_state(&IconState::Idle).tint, Tint::Template);
        assert_eq!(
            IconAppearance::for_state(&IconState::Switching("com.a".into())).tint,
            Tint::Orange
        );
        assert_eq!(
            IconAppearance::for_state(&IconState::Success("com.a".into())).tint,
            Tint::Green
        );
        assert_eq!(IconAppearance::for_state(&IconState::Idle).symbol, STATUS_SYMBOL);
    }

    #[test]
    fn test_labels_for_language() {
        assert_eq!(MenuLabels::for_language(AppLanguage::Tr).quit, "Çıkış");
        assert_eq!(MenuLabels::for_language(AppLanguage::Auto), MenuLabels::ENGLISH);
    }
}
