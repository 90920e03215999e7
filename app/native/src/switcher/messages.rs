//! Message types for the switch actor.
//!
//! - `SwitchMessage` - commands from presenters and results of offloaded work
//! - `SwitchQuery` - requests for coordinator data (with response channel)
//! - `QueryResult` - responses from queries
//!
//! Results of blocking OS calls come back as messages tagged with the
//! generation (and observation sequence) they were started for, so the actor
//! can tell a stale answer from a live one.

use std::collections::HashSet;

use tokio::sync::oneshot;

use super::SwitchError;
use super::machine::SwitchPhase;
use crate::browsers::BrowserHandle;
use crate::handler::SetDefaultOutcome;

/// Reply channel for a switch request.
pub type SwitchReply = oneshot::Sender<Result<u64, SwitchError>>;

/// Reply channel carrying the visible candidate list.
pub type CandidatesReply = oneshot::Sender<Vec<BrowserHandle>>;

/// Reply channel carrying a freshly read default handler.
pub type DefaultReply = oneshot::Sender<Option<String>>;

/// Where a default-handler read was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationSource {
    /// A confirmation poll tick.
    Poll,
    /// The menu was opened, or the coordinator started.
    Refresh,
}

/// Messages sent to the switch actor.
#[derive(Debug)]
pub enum SwitchMessage {
    // ════════════════════════════════════════════════════════════════════════
    // Presenter commands
    // ════════════════════════════════════════════════════════════════════════
    /// Make `target` the default browser.
    RequestSwitch { target: String, respond_to: SwitchReply },

    /// The menu is about to be shown; re-read the current default.
    MenuOpened { respond_to: Option<DefaultReply> },

    /// Re-run browser detection.
    RefreshCandidates { respond_to: Option<CandidatesReply> },

    /// Hide or show a browser in the menu.
    SetHidden {
        id: String,
        hidden: bool,
        respond_to: Option<CandidatesReply>,
    },

    // ════════════════════════════════════════════════════════════════════════
    // Results of offloaded work
    // ════════════════════════════════════════════════════════════════════════
    /// The OS answered a registration request.
    SwitchIssued {
        generation: u64,
        target: String,
        outcome: SetDefaultOutcome,
        respond_to: SwitchReply,
    },

    /// The current default handler was read.
    DefaultObserved {
        generation: u64,
        sequence: u64,
        source: ObservationSource,
        current: Option<String>,
        respond_to: Option<DefaultReply>,
    },

    /// Detection finished.
    CandidatesDetected {
        sequence: u64,
        candidates: Vec<BrowserHandle>,
        hidden: HashSet<String>,
        respond_to: Option<CandidatesReply>,
    },

    /// The hidden set was written and read back. `None` if the store call
    /// panicked.
    HiddenChanged {
        hidden: Option<HashSet<String>>,
        respond_to: Option<CandidatesReply>,
    },

    // ════════════════════════════════════════════════════════════════════════
    // Timers
    // ════════════════════════════════════════════════════════════════════════
    /// Poll interval elapsed while confirming `generation`.
    PollTick { generation: u64 },

    /// Confirmation deadline of `generation` passed.
    ConfirmTimeout { generation: u64 },

    /// Success grace window of `generation` ended.
    GraceElapsed { generation: u64 },

    // ════════════════════════════════════════════════════════════════════════
    // Queries & lifecycle
    // ════════════════════════════════════════════════════════════════════════
    /// Read coordinator data.
    Query {
        query: SwitchQuery,
        respond_to: oneshot::Sender<QueryResult>,
    },

    /// Stop the actor.
    Shutdown,
}

impl SwitchMessage {
    /// Returns the message name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RequestSwitch { .. } => "RequestSwitch",
            Self::MenuOpened { .. } => "MenuOpened",
            Self::RefreshCandidates { .. } => "RefreshCandidates",
            Self::SetHidden { .. } => "SetHidden",
            Self::SwitchIssued { .. } => "SwitchIssued",
            Self::DefaultObserved { .. } => "DefaultObserved",
            Self::CandidatesDetected { .. } => "CandidatesDetected",
            Self::HiddenChanged { .. } => "HiddenChanged",
            Self::PollTick { .. } => "PollTick",
            Self::ConfirmTimeout { .. } => "ConfirmTimeout",
            Self::GraceElapsed { .. } => "GraceElapsed",
            Self::Query { .. } => "Query",
            Self::Shutdown => "Shutdown",
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Query types for reading coordinator data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchQuery {
    /// Internal phase, including the generation.
    Phase,
    /// Every detected browser, hidden ones included.
    AllCandidates,
    /// Bundle identifiers currently hidden.
    HiddenBrowsers,
}

/// Results from queries.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Phase(SwitchPhase),
    Candidates(Vec<BrowserHandle>),
    Hidden(HashSet<String>),
}

impl QueryResult {
    /// Try to get the phase from the result.
    #[must_use]
    pub fn into_phase(self) -> Option<SwitchPhase> {
        match self {
            Self::Phase(phase) => Some(phase),
            _ => None,
        }
    }

    /// Try to get candidates from the result.
    #[must_use]
    pub fn into_candidates(self) -> Option<Vec<BrowserHandle>> {
        match self {
            Self::Candidates(candidates) => Some(candidates),
            _ => None,
        }
    }

    /// Try to get the hidden set from the result.
    #[must_use]
    pub fn into_hidden(self) -> Option<HashSet<String>> {
        match self {
            Self::Hidden(hidden) => Some(hidden),
            _ => None,
        }
    }
}
