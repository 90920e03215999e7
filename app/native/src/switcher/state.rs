//! State published by the switch actor.
//!
//! The actor is the only writer. Presenters read snapshots or subscribe to
//! changes; every setter only notifies when the value actually changed.

use eyeball::{SharedObservable, Subscriber};
use futures::StreamExt;
use futures::stream::{self, BoxStream};

use super::machine::IconState;
use crate::browsers::BrowserHandle;
use crate::events::SwitcherEvent;

/// Observable snapshot of what presenters show.
///
/// Cloning shares the underlying observables.
#[derive(Clone)]
pub struct PublishedState {
    candidates: SharedObservable<Vec<BrowserHandle>>,
    default_handler: SharedObservable<Option<String>>,
    icon_state: SharedObservable<IconState>,
}

impl std::fmt::Debug for PublishedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishedState")
            .field("candidates", &self.candidates.get().len())
            .field("default_handler", &self.default_handler.get())
            .field("icon_state", &self.icon_state.get())
            .finish()
    }
}

impl Default for PublishedState {
    fn default() -> Self { Self::new() }
}

impl PublishedState {
    /// Creates empty state: no candidates, unknown default, idle indicator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            candidates: SharedObservable::new(Vec::new()),
            default_handler: SharedObservable::new(None),
            icon_state: SharedObservable::new(IconState::Idle),
        }
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Visible candidates, sorted by name.
    #[must_use]
    pub fn candidates(&self) -> Vec<BrowserHandle> { self.candidates.get() }

    /// Last observed default browser.
    #[must_use]
    pub fn default_handler(&self) -> Option<String> { self.default_handler.get() }

    /// Current indicator state.
    #[must_use]
    pub fn icon_state(&self) -> IconState { self.icon_state.get() }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    #[must_use]
    pub fn subscribe_candidates(&self) -> Subscriber<Vec<BrowserHandle>> {
        self.candidates.subscribe()
    }

    #[must_use]
    pub fn subscribe_default_handler(&self) -> Subscriber<Option<String>> {
        self.default_handler.subscribe()
    }

    #[must_use]
    pub fn subscribe_icon_state(&self) -> Subscriber<IconState> { self.icon_state.subscribe() }

    /// Merges every subscription into one stream of named events.
    ///
    /// Only changes after this call are delivered; read the snapshots for the
    /// initial values. Each subscription yields the latest value, so changes
    /// made in quick succession may arrive as a single event carrying the
    /// newest state. Presenters should render the payload, not count events.
    #[must_use]
    pub fn events(&self) -> BoxStream<'static, SwitcherEvent> {
        stream::select_all([
            self.subscribe_candidates().map(SwitcherEvent::CandidateListChanged).boxed(),
            self.subscribe_default_handler().map(SwitcherEvent::DefaultChanged).boxed(),
            self.subscribe_icon_state().map(SwitcherEvent::IconStateChanged).boxed(),
        ])
        .boxed()
    }

    // ========================================================================
    // Actor-side setters
    // ========================================================================

    /// Returns `true` if the list changed.
    pub(crate) fn publish_candidates(&self, candidates: Vec<BrowserHandle>) -> bool {
        self.candidates.set_if_not_eq(candidates).is_some()
    }

    /// Returns `true` if the default changed.
    pub(crate) fn publish_default_handler(&self, current: Option<String>) -> bool {
        self.default_handler.set_if_not_eq(current).is_some()
    }

    /// Returns `true` if the indicator changed.
    pub(crate) fn publish_icon_state(&self, state: IconState) -> bool {
        self.icon_state.set_if_not_eq(state).is_some()
    }
}
