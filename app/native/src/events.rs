//! Centralized event definitions for presenter communication.
//!
//! Every change the switch coordinator publishes is delivered as a
//! [`SwitcherEvent`]. The string names are stable identifiers presenters can
//! log or forward.
//!
//! ## Naming Convention
//!
//! All events follow the pattern: `browserbar://<module>/<event-name>`
//!
//! - `browserbar://browsers/candidate-list-changed` - Visible browser list changed
//! - `browserbar://handler/default-changed` - OS default browser changed
//! - `browserbar://switcher/icon-state-changed` - Menu bar indicator changed

use serde::Serialize;

use crate::browsers::BrowserHandle;
use crate::switcher::IconState;

/// Browser discovery events.
pub mod browsers {
    /// Emitted when the visible candidate list changes.
    ///
    /// Payload: `Vec<BrowserHandle>` - visible candidates, sorted by name.
    pub const CANDIDATE_LIST_CHANGED: &str = "browserbar://browsers/candidate-list-changed";
}

/// Default handler events.
pub mod handler {
    /// Emitted when the observed default browser changes.
    ///
    /// Payload: `Option<String>` - bundle identifier of the new default.
    pub const DEFAULT_CHANGED: &str = "browserbar://handler/default-changed";
}

/// Switch coordinator events.
pub mod switcher {
    /// Emitted when the menu bar indicator changes.
    ///
    /// Payload: `IconState`
    pub const ICON_STATE_CHANGED: &str = "browserbar://switcher/icon-state-changed";
}

/// A change published by the switch coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum SwitcherEvent {
    CandidateListChanged(Vec<BrowserHandle>),
    DefaultChanged(Option<String>),
    IconStateChanged(IconState),
}

impl SwitcherEvent {
    /// Returns the stable event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CandidateListChanged(_) => browsers::CANDIDATE_LIST_CHANGED,
            Self::DefaultChanged(_) => handler::DEFAULT_CHANGED,
            Self::IconStateChanged(_) => switcher::ICON_STATE_CHANGED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_naming_convention() {
        let events = [
            (browsers::CANDIDATE_LIST_CHANGED, "browsers", "candidate-list-changed"),
            (handler::DEFAULT_CHANGED, "handler", "default-changed"),
            (switcher::ICON_STATE_CHANGED, "switcher", "icon-state-changed"),
        ];

        for (event, module, name) in events {
            let expected = format!("browserbar://{module}/{name}");
            assert_eq!(event, expected, "Event should match expected format");
        }
    }

    #[test]
    fn test_event_names_match_variants() {
        assert_eq!(
            SwitcherEvent::DefaultChanged(None).name(),
            handler::DEFAULT_CHANGED
        );
        assert_eq!(
            SwitcherEvent::IconStateChanged(IconState::Idle).name(),
            switcher::ICON_STATE_CHANGED
        );
        assert_eq!(
            SwitcherEvent::CandidateListChanged(Vec::new()).name(),
            browsers::CANDIDATE_LIST_CHANGED
        );
    }

    #[test]
    fn test_event_serializes_with_payload() {
        let event = SwitcherEvent::DefaultChanged(Some("com.apple.Safari".into()));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "defaultChanged");
        assert_eq!(json["payload"], "com.apple.Safari");
    }
}
