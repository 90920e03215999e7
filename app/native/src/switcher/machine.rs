//! The switch indicator state machine.
//!
//! Everything here is pure: [`transition`] maps the current phase, the live
//! generation and an event to the next phase plus at most one effect for the
//! actor to perform. No timers, channels or OS calls are involved, which keeps
//! every race the actor can see reproducible in a plain unit test.
//!
//! # Generations
//!
//! Every switch request gets a fresh generation. Events carry the generation
//! they were produced for, and an event whose generation is not the live one
//! is stale: it leaves the phase untouched. This is how superseded poll,
//! timeout and reset tasks become no-ops without being cancelled.

use serde::Serialize;

/// Internal phase of the switch coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SwitchPhase {
    /// No switch is pending.
    #[default]
    Idle,
    /// The OS accepted the request; waiting for the handler to change.
    Switching { target: String, generation: u64 },
    /// The handler now matches the target; shown until the grace window ends.
    Success { target: String, generation: u64 },
}

impl SwitchPhase {
    /// Returns the generation-free projection shown to presenters.
    #[must_use]
    pub fn icon_state(&self) -> IconState {
        match self {
            Self::Idle => IconState::Idle,
            Self::Switching { target, .. } => IconState::Switching(target.clone()),
            Self::Success { target, .. } => IconState::Success(target.clone()),
        }
    }

    /// Returns the generation of a non-idle phase.
    #[must_use]
    pub const fn generation(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Switching { generation, .. } | Self::Success { generation, .. } => {
                Some(*generation)
            }
        }
    }

    /// Returns the target of a non-idle phase.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Switching { target, .. } | Self::Success { target, .. } => Some(target),
        }
    }

    /// Returns the generation awaiting confirmation, if any.
    #[must_use]
    pub const fn confirming_generation(&self) -> Option<u64> {
        match self {
            Self::Switching { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}

/// Tri-state menu bar indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "target", rename_all = "camelCase")]
pub enum IconState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Waiting for the OS to confirm the switch to the given browser.
    Switching(String),
    /// The switch to the given browser has been confirmed.
    Success(String),
}

impl IconState {
    /// Returns the browser the indicator refers to, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Switching(target) | Self::Success(target) => Some(target),
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    /// The OS answered the registration request for `generation`.
    Issued {
        generation: u64,
        target: String,
        accepted: bool,
    },
    /// The current default handler was read on behalf of `generation`.
    Observed {
        generation: u64,
        current: Option<String>,
    },
    /// The confirmation deadline of `generation` passed.
    TimedOut { generation: u64 },
    /// The success grace window of `generation` ended.
    GraceElapsed { generation: u64 },
}

impl SwitchEvent {
    /// Returns the generation the event was produced for.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        match self {
            Self::Issued { generation, .. }
            | Self::Observed { generation, .. }
            | Self::TimedOut { generation }
            | Self::GraceElapsed { generation } => *generation,
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start polling and arm the confirmation deadline.
    StartConfirmation { generation: u64 },
    /// Arm the success grace timer.
    ScheduleReset { generation: u64 },
}

/// Result of applying an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Phase after the event.
    pub phase: SwitchPhase,
    /// Effect to perform, if any.
    pub effect: Option<Effect>,
}

impl Transition {
    const fn stay(phase: SwitchPhase) -> Self { Self { phase, effect: None } }
}

/// Computes the next phase.
///
/// `live_generation` is the generation of the most recently issued request.
#[must_use]
pub fn transition(phase: &SwitchPhase, live_generation: u64, event: &SwitchEvent) -> Transition {
    if event.generation() != live_generation {
        return Transition::stay(phase.clone());
    }

    match (phase, event) {
        (_, SwitchEvent::Issued { generation, target, accepted: true }) => Transition {
            phase: SwitchPhase::Switching { target: target.clone(), generation: *generation },
            effect: Some(Effect::StartConfirmation { generation: *generation }),
        },
        (_, SwitchEvent::Issued { accepted: false, .. }) => Transition::stay(SwitchPhase::Idle),
        (
            SwitchPhase::Switching { target, generation },
            SwitchEvent::Observed { generation: observed_for, current: Some(current) },
        ) if generation == observed_for && current == target => Transition {
            phase: SwitchPhase::Success { target: target.clone(), generation: *generation },
            effect: Some(Effect::ScheduleReset { generation: *generation }),
        },
        (
            SwitchPhase::Switching { generation, .. },
            SwitchEvent::TimedOut { generation: expired },
        ) if generation == expired => Transition::stay(SwitchPhase::Idle),
        (
            SwitchPhase::Success { generation, .. },
            SwitchEvent::GraceElapsed { generation: elapsed },
        ) if generation == elapsed => Transition::stay(SwitchPhase::Idle),
        _ => Transition::stay(phase.clone()),
    }
}

/// Owns the phase and the generation counter.
#[derive(Debug, Default)]
pub struct SwitchMachine {
    phase: SwitchPhase,
    generation: u64,
}

impl SwitchMachine {
    /// Creates an idle machine. The first request gets generation 1.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> &SwitchPhase { &self.phase }

    /// Returns the generation of the most recent request (0 before any).
    #[must_use]
    pub const fn live_generation(&self) -> u64 { self.generation }

    /// Starts a new request and returns its generation.
    ///
    /// Every event tagged with an older generation is stale from now on.
    pub const fn begin_request(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Applies an event and returns the effect to perform.
    pub fn apply(&mut self, event: &SwitchEvent) -> Option<Effect> {
        let Transition { phase, effect } = transition(&self.phase, self.generation, event);
        self.phase = phase;
        effect
    }
}
