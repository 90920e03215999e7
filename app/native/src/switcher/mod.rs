//! Default browser switch coordinator.
//!
//! A single actor owns every piece of mutable switch state: the state
//! machine, the cached default, the detected candidates and the hidden set.
//! Presenters talk to it through a [`SwitchActorHandle`].
//!
//! Blocking OS calls (detection, registration, handler reads, store writes)
//! run on tokio's blocking pool and report back as messages, so the message
//! loop never waits on the OS. Results carry the generation they were started
//! for and the state machine ignores stale ones.
//!
//! # Lifecycle of a switch
//!
//! 1. `request_switch` bumps the generation; everything older becomes inert.
//! 2. The registration result arrives. Refused: back to idle, error returned.
//!    Accepted: `Switching`, poll loop and confirmation deadline start.
//! 3. A read matching the target moves to `Success` and arms the grace timer.
//! 4. Grace timer or deadline brings the indicator back to idle.

mod handle;
pub mod machine;
pub mod messages;
mod scheduler;
pub mod state;

use std::any::Any;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

pub use handle::{ActorError, SwitchActorHandle};
pub use machine::{Effect, IconState, SwitchEvent, SwitchMachine, SwitchPhase};
use messages::{
    CandidatesReply, DefaultReply, ObservationSource, QueryResult, SwitchQuery, SwitchReply,
};
pub use messages::SwitchMessage;
pub use state::PublishedState;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::browsers::{BrowserHandle, BrowserRegistry};
use crate::config::SwitchTimings;
use crate::handler::{DefaultHandlerService, SetDefaultOutcome};
use crate::store::{VisibilityStore, filter_visible};

/// Channel buffer size for the actor's message queue.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Status reported when the backend panicked during registration.
pub const STATUS_BACKEND_PANIC: i32 = -1;

/// Errors returned by a switch request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    /// The OS refused the change, typically because the app is sandboxed.
    #[error(
        "the system refused to change the default browser (status {status}); \
         browserbar must run outside the App Sandbox"
    )]
    PermissionDenied { status: i32 },

    /// Neither web scheme could be registered.
    #[error("failed to change the default browser (status {status})")]
    Failed { status: i32 },

    /// Only one of the web schemes was registered.
    #[error("registered for {applied} links but not {failed} links (status {status})")]
    PartiallyApplied {
        applied: &'static str,
        failed: &'static str,
        status: i32,
    },

    /// A newer request was issued before the OS answered this one.
    #[error("switch to {target} was superseded by a newer request")]
    Superseded { target: String },

    /// The coordinator could not be reached.
    #[error(transparent)]
    Actor(#[from] ActorError),
}

impl SwitchError {
    /// Maps a refused registration outcome. `None` for [`SetDefaultOutcome::Ok`].
    #[must_use]
    pub const fn from_outcome(outcome: SetDefaultOutcome) -> Option<Self> {
        match outcome {
            SetDefaultOutcome::Ok => None,
            SetDefaultOutcome::PermissionDenied { status } => Some(Self::PermissionDenied { status }),
            SetDefaultOutcome::Failed { status } => Some(Self::Failed { status }),
            SetDefaultOutcome::PartiallyApplied { applied, failed, status } => {
                Some(Self::PartiallyApplied { applied, failed, status })
            }
        }
    }
}

/// OS-facing services the coordinator drives.
#[derive(Clone)]
pub struct SwitchServices {
    pub registry: Arc<dyn BrowserRegistry>,
    pub handler: Arc<dyn DefaultHandlerService>,
    pub visibility: Arc<VisibilityStore>,
}

impl SwitchServices {
    /// Bundles a backend implementing both OS traits with a visibility store.
    #[must_use]
    pub fn new<B>(backend: Arc<B>, visibility: Arc<VisibilityStore>) -> Self
    where B: BrowserRegistry + DefaultHandlerService {
        Self {
            registry: backend.clone(),
            handler: backend,
            visibility,
        }
    }
}

/// The switch coordinator actor.
pub struct SwitchActor {
    machine: SwitchMachine,
    services: SwitchServices,
    timings: SwitchTimings,
    state: PublishedState,

    /// Every detected browser, hidden ones included.
    all_candidates: Vec<BrowserHandle>,
    hidden: HashSet<String>,

    /// Last dispatched and last applied handler reads.
    observation_dispatched: u64,
    observation_applied: u64,
    poll_in_flight: bool,

    /// Last dispatched and last applied detections.
    detection_dispatched: u64,
    detection_applied: u64,

    /// Generation currently awaiting confirmation; poll loops watch it.
    confirming: watch::Sender<Option<u64>>,

    sender: mpsc::WeakSender<SwitchMessage>,
    receiver: mpsc::Receiver<SwitchMessage>,
}

impl SwitchActor {
    /// Spawns the actor on the current tokio runtime and returns its handle.
    ///
    /// Detection and a first read of the current default start immediately.
    #[must_use]
    pub fn spawn(services: SwitchServices, timings: SwitchTimings) -> SwitchActorHandle {
        tracing::debug!(?timings, "switcher: spawning switch actor");
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (confirming, _) = watch::channel(None);
        let state = PublishedState::new();

        let actor = Self {
            machine: SwitchMachine::new(),
            services,
            timings,
            state: state.clone(),
            all_candidates: Vec::new(),
            hidden: HashSet::new(),
            observation_dispatched: 0,
            observation_applied: 0,
            poll_in_flight: false,
            detection_dispatched: 0,
            detection_applied: 0,
            confirming,
            sender: sender.downgrade(),
            receiver,
        };

        tokio::spawn(actor.run());

        SwitchActorHandle::new(sender, state)
    }

    /// Run the actor's message loop.
    ///
    /// If a message handler panics, the error is logged and the actor keeps
    /// processing messages.
    async fn run(mut self) {
        tracing::trace!("switcher: actor message loop starting");
        self.dispatch_detection(None);
        self.dispatch_observation(ObservationSource::Refresh, None);

        while let Some(msg) = self.receiver.recv().await {
            if matches!(msg, SwitchMessage::Shutdown) {
                tracing::debug!("switcher: actor received shutdown message");
                break;
            }

            let msg_name = msg.name();
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.handle_message(msg);
            }));

            if let Err(panic_info) = result {
                let panic_msg = panic_message(panic_info.as_ref());
                tracing::error!(msg = msg_name, panic = %panic_msg, "switcher: PANIC while handling message");
            }
        }

        // Leaving the confirming generation set would keep poll loops alive
        self.confirming.send_replace(None);
        tracing::debug!("switcher: actor stopped");
    }

    fn handle_message(&mut self, msg: SwitchMessage) {
        match msg {
            SwitchMessage::RequestSwitch { target, respond_to } => {
                self.on_request_switch(target, respond_to);
            }
            SwitchMessage::SwitchIssued { generation, target, outcome, respond_to } => {
                self.on_switch_issued(generation, target, outcome, respond_to);
            }
            SwitchMessage::MenuOpened { respond_to } => {
                self.dispatch_observation(ObservationSource::Refresh, respond_to);
            }
            SwitchMessage::PollTick { generation } => self.on_poll_tick(generation),
            SwitchMessage::DefaultObserved { generation, sequence, source, current, respond_to } => {
                self.on_default_observed(generation, sequence, source, current.clone());
                if let Some(tx) = respond_to {
                    let _ = tx.send(current);
                }
            }
            SwitchMessage::ConfirmTimeout { generation } => {
                let before = self.machine.phase().clone();
                self.apply(&SwitchEvent::TimedOut { generation });
                if before != *self.machine.phase() {
                    tracing::info!(
                        generation,
                        target = before.target(),
                        "switcher: switch not confirmed in time, giving up"
                    );
                }
            }
            SwitchMessage::GraceElapsed { generation } => {
                self.apply(&SwitchEvent::GraceElapsed { generation });
            }
            SwitchMessage::RefreshCandidates { respond_to } => self.dispatch_detection(respond_to),
            SwitchMessage::CandidatesDetected { sequence, candidates, hidden, respond_to } => {
                self.on_candidates_detected(sequence, candidates, hidden, respond_to);
            }
            SwitchMessage::SetHidden { id, hidden, respond_to } => {
                self.dispatch_set_hidden(id, hidden, respond_to);
            }
            SwitchMessage::HiddenChanged { hidden, respond_to } => {
                if let Some(hidden) = hidden {
                    self.hidden = hidden;
                }
                let visible = self.publish_visible();
                reply(respond_to, visible);
            }
            SwitchMessage::Query { query, respond_to } => {
                let result = match query {
                    SwitchQuery::Phase => QueryResult::Phase(self.machine.phase().clone()),
                    SwitchQuery::AllCandidates => QueryResult::Candidates(self.all_candidates.clone()),
                    SwitchQuery::HiddenBrowsers => QueryResult::Hidden(self.hidden.clone()),
                };
                let _ = respond_to.send(result);
            }
            // Handled in run()
            SwitchMessage::Shutdown => {}
        }
    }

    // ========================================================================
    // Switching
    // ========================================================================

    fn on_request_switch(&mut self, target: String, respond_to: SwitchReply) {
        let generation = self.machine.begin_request();
        self.sync_confirming();
        tracing::info!(generation, target = %target, "switcher: requesting default browser change");

        let handler = self.services.handler.clone();
        self.offload(move || {
            let outcome = guarded("set_default", || handler.set_default(&target))
                .unwrap_or(SetDefaultOutcome::Failed { status: STATUS_BACKEND_PANIC });
            SwitchMessage::SwitchIssued { generation, target, outcome, respond_to }
        });
    }

    fn on_switch_issued(
        &mut self,
        generation: u64,
        target: String,
        outcome: SetDefaultOutcome,
        respond_to: SwitchReply,
    ) {
        if generation != self.machine.live_generation() {
            tracing::debug!(generation, target = %target, "switcher: discarding superseded registration result");
            let _ = respond_to.send(Err(SwitchError::Superseded { target }));
            return;
        }

        let error = SwitchError::from_outcome(outcome);
        match &error {
            None => tracing::info!(generation, target = %target, "switcher: registration accepted, awaiting confirmation"),
            Some(err) => tracing::warn!(generation, target = %target, error = %err, "switcher: registration refused"),
        }

        self.apply(&SwitchEvent::Issued { generation, target, accepted: error.is_none() });
        let _ = respond_to.send(error.map_or(Ok(generation), Err));
    }

    fn on_poll_tick(&mut self, generation: u64) {
        if self.machine.phase().confirming_generation() != Some(generation)
            || generation != self.machine.live_generation()
        {
            return;
        }
        if self.poll_in_flight {
            tracing::trace!(generation, "switcher: previous read still running, skipping tick");
            return;
        }
        self.poll_in_flight = true;
        self.dispatch_observation(ObservationSource::Poll, None);
    }

    fn on_default_observed(
        &mut self,
        generation: u64,
        sequence: u64,
        source: ObservationSource,
        current: Option<String>,
    ) {
        if source == ObservationSource::Poll {
            self.poll_in_flight = false;
        }

        if sequence > self.observation_applied {
            self.observation_applied = sequence;
            if let Some(id) = &current
                && self.state.publish_default_handler(Some(id.clone()))
            {
                tracing::info!(default = %id, "switcher: default browser changed");
            }
        } else {
            tracing::trace!(sequence, "switcher: ignoring out-of-order handler read");
        }

        self.apply(&SwitchEvent::Observed { generation, current });
    }

    /// Feeds an event to the state machine and performs its effect.
    fn apply(&mut self, event: &SwitchEvent) {
        let effect = self.machine.apply(event);
        self.sync_confirming();

        match effect {
            Some(Effect::StartConfirmation { generation }) => {
                scheduler::spawn_poller(
                    generation,
                    self.timings.poll_interval,
                    self.sender.clone(),
                    self.confirming.subscribe(),
                );
                scheduler::spawn_timeout(generation, self.timings.confirm_timeout, self.sender.clone());
            }
            Some(Effect::ScheduleReset { generation }) => {
                tracing::info!(generation, "switcher: switch confirmed");
                scheduler::spawn_reset(generation, self.timings.success_grace, self.sender.clone());
            }
            None => {}
        }

        let icon = self.machine.phase().icon_state();
        if self.state.publish_icon_state(icon.clone()) {
            tracing::debug!(?icon, "switcher: indicator changed");
        }
    }

    /// Publishes the generation poll loops should keep running for.
    fn sync_confirming(&self) {
        let confirming = self
            .machine
            .phase()
            .confirming_generation()
            .filter(|&g| g == self.machine.live_generation());
        self.confirming.send_if_modified(|current| {
            if *current == confirming {
                false
            } else {
                *current = confirming;
                true
            }
        });
    }

    // ========================================================================
    // Offloaded reads
    // ========================================================================

    fn dispatch_observation(&mut self, source: ObservationSource, respond_to: Option<DefaultReply>) {
        self.observation_dispatched += 1;
        let sequence = self.observation_dispatched;
        let generation = self.machine.live_generation();
        let handler = self.services.handler.clone();

        self.offload(move || SwitchMessage::DefaultObserved {
            generation,
            sequence,
            source,
            current: guarded("current_default", || handler.current_default()).flatten(),
            respond_to,
        });
    }

    fn dispatch_detection(&mut self, respond_to: Option<CandidatesReply>) {
        self.detection_dispatched += 1;
        let sequence = self.detection_dispatched;
        let registry = self.services.registry.clone();
        let visibility = self.services.visibility.clone();

        self.offload(move || {
            let (candidates, hidden) =
                guarded("detection", || (registry.detect_candidates(), visibility.get_hidden()))
                    .unwrap_or_default();
            SwitchMessage::CandidatesDetected { sequence, candidates, hidden, respond_to }
        });
    }

    fn on_candidates_detected(
        &mut self,
        sequence: u64,
        candidates: Vec<BrowserHandle>,
        hidden: HashSet<String>,
        respond_to: Option<CandidatesReply>,
    ) {
        if sequence > self.detection_applied {
            self.detection_applied = sequence;
            self.all_candidates = candidates;
            self.hidden = hidden;
            tracing::debug!(
                detected = self.all_candidates.len(),
                hidden = self.hidden.len(),
                "switcher: candidates refreshed"
            );
        }
        let visible = self.publish_visible();
        reply(respond_to, visible);
    }

    fn dispatch_set_hidden(&self, id: String, hidden: bool, respond_to: Option<CandidatesReply>) {
        let visibility = self.services.visibility.clone();
        self.offload(move || {
            let hidden = guarded("set_hidden", || {
                visibility.set_hidden(&id, hidden);
                visibility.get_hidden()
            });
            SwitchMessage::HiddenChanged { hidden, respond_to }
        });
    }

    fn publish_visible(&self) -> Vec<BrowserHandle> {
        let visible = filter_visible(&self.all_candidates, &self.hidden);
        if self.state.publish_candidates(visible.clone()) {
            tracing::debug!(visible = visible.len(), "switcher: candidate list changed");
        }
        visible
    }

    /// Runs `work` on the blocking pool and sends its message back.
    ///
    /// Backend calls inside `work` go through [`guarded`], so a result
    /// message always comes back.
    fn offload<F>(&self, work: F)
    where F: FnOnce() -> SwitchMessage + Send + 'static {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(work).await {
                Ok(msg) => {
                    if let Some(tx) = sender.upgrade() {
                        let _ = tx.send(msg).await;
                    }
                }
                Err(err) => tracing::error!(error = %err, "switcher: blocking task failed"),
            }
        });
    }
}

/// Runs a backend call, turning a panic into `None`.
fn guarded<T>(what: &'static str, call: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(value) => Some(value),
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info.as_ref());
            tracing::error!(call = what, panic = %panic_msg, "switcher: PANIC in backend call");
            None
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    panic_info
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic_info.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn reply(respond_to: Option<CandidatesReply>, visible: Vec<BrowserHandle>) {
    if let Some(tx) = respond_to {
        let _ = tx.send(visible);
    }
}
