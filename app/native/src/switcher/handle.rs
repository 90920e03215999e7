//! Handle for communicating with the switch actor.
//!
//! The `SwitchActorHandle` is what presenters hold: it sends commands, runs
//! queries and exposes the published state for reads and subscriptions.

use std::collections::HashSet;

use eyeball::Subscriber;
use futures::stream::BoxStream;
use tokio::sync::{mpsc, oneshot};

use super::SwitchError;
use super::machine::{IconState, SwitchPhase};
use super::messages::{QueryResult, SwitchMessage, SwitchQuery};
use super::state::PublishedState;
use crate::browsers::BrowserHandle;
use crate::events::SwitcherEvent;

/// Error types for actor communication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// Failed to send message to actor.
    #[error("Failed to send message to actor: channel closed")]
    SendFailed,

    /// Failed to receive response from actor.
    #[error("Failed to receive response from actor: channel closed")]
    ReceiveFailed,
}

/// Handle for communicating with the switch actor.
///
/// This handle is cheap to clone and can be shared across threads.
#[derive(Clone, Debug)]
pub struct SwitchActorHandle {
    sender: mpsc::Sender<SwitchMessage>,
    state: PublishedState,
}

impl SwitchActorHandle {
    pub(crate) const fn new(sender: mpsc::Sender<SwitchMessage>, state: PublishedState) -> Self {
        Self { sender, state }
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Send a message to the actor without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed or full.
    pub fn send(&self, msg: SwitchMessage) -> Result<(), ActorError> {
        self.sender.try_send(msg).map_err(|_| ActorError::SendFailed)
    }

    /// Send a message to the actor and wait for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub async fn send_async(&self, msg: SwitchMessage) -> Result<(), ActorError> {
        self.sender.send(msg).await.map_err(|_| ActorError::SendFailed)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Asks the OS to make `target` the default browser.
    ///
    /// Resolves once the OS answered the registration request, not once the
    /// change took effect; confirmation is tracked through
    /// [`PublishedState::icon_state`]. On success the request's generation is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns a [`SwitchError`] when the OS refused the request, when a newer
    /// request superseded this one before the OS answered, or when the actor
    /// is gone.
    pub async fn request_switch(&self, target: impl Into<String>) -> Result<u64, SwitchError> {
        let (tx, rx) = oneshot::channel();
        self.send_async(SwitchMessage::RequestSwitch { target: target.into(), respond_to: tx })
            .await?;

        rx.await.map_err(|_| ActorError::ReceiveFailed)?
    }

    /// Notifies the coordinator that the menu is about to be shown.
    ///
    /// The current default is re-read in the background.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the actor has stopped.
    pub fn menu_opened(&self) -> Result<(), ActorError> {
        self.send(SwitchMessage::MenuOpened { respond_to: None })
    }

    /// Re-reads the current default and returns it once the coordinator
    /// applied the result.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn refresh_default(&self) -> Result<Option<String>, ActorError> {
        let (tx, rx) = oneshot::channel();
        self.send_async(SwitchMessage::MenuOpened { respond_to: Some(tx) }).await?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Re-runs browser detection in the background.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the actor has stopped.
    pub fn refresh_candidates(&self) -> Result<(), ActorError> {
        self.send(SwitchMessage::RefreshCandidates { respond_to: None })
    }

    /// Re-runs browser detection and returns the visible candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn refresh_candidates_and_wait(&self) -> Result<Vec<BrowserHandle>, ActorError> {
        let (tx, rx) = oneshot::channel();
        self.send_async(SwitchMessage::RefreshCandidates { respond_to: Some(tx) }).await?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Hides or shows a browser and returns the visible candidates afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn set_hidden(
        &self,
        id: impl Into<String>,
        hidden: bool,
    ) -> Result<Vec<BrowserHandle>, ActorError> {
        let (tx, rx) = oneshot::channel();
        self.send_async(SwitchMessage::SetHidden {
            id: id.into(),
            hidden,
            respond_to: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Execute a query and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed, or
    /// [`ActorError::ReceiveFailed`] if the response channel is closed.
    pub async fn query(&self, query: SwitchQuery) -> Result<QueryResult, ActorError> {
        let (tx, rx) = oneshot::channel();
        self.send_async(SwitchMessage::Query { query, respond_to: tx }).await?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Internal coordinator phase, including the generation.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn phase(&self) -> Result<SwitchPhase, ActorError> {
        self.query(SwitchQuery::Phase)
            .await?
            .into_phase()
            .ok_or(ActorError::ReceiveFailed)
    }

    /// Every detected browser, hidden ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn all_candidates(&self) -> Result<Vec<BrowserHandle>, ActorError> {
        self.query(SwitchQuery::AllCandidates)
            .await?
            .into_candidates()
            .ok_or(ActorError::ReceiveFailed)
    }

    /// Bundle identifiers hidden from the menu.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn hidden_browsers(&self) -> Result<HashSet<String>, ActorError> {
        self.query(SwitchQuery::HiddenBrowsers)
            .await?
            .into_hidden()
            .ok_or(ActorError::ReceiveFailed)
    }

    // ========================================================================
    // Published state
    // ========================================================================

    /// Published state for reads and subscriptions.
    #[must_use]
    pub const fn state(&self) -> &PublishedState { &self.state }

    /// Current indicator state.
    #[must_use]
    pub fn icon_state(&self) -> IconState { self.state.icon_state() }

    /// Last observed default browser.
    #[must_use]
    pub fn current_default(&self) -> Option<String> { self.state.default_handler() }

    /// Visible candidates, sorted by name.
    #[must_use]
    pub fn visible_candidates(&self) -> Vec<BrowserHandle> { self.state.candidates() }

    #[must_use]
    pub fn subscribe_candidates(&self) -> Subscriber<Vec<BrowserHandle>> {
        self.state.subscribe_candidates()
    }

    #[must_use]
    pub fn subscribe_default_handler(&self) -> Subscriber<Option<String>> {
        self.state.subscribe_default_handler()
    }

    #[must_use]
    pub fn subscribe_icon_state(&self) -> Subscriber<IconState> { self.state.subscribe_icon_state() }

    /// Stream of published changes; see [`PublishedState::events`].
    #[must_use]
    pub fn events(&self) -> BoxStream<'static, SwitcherEvent> { self.state.events() }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Request the actor to shut down.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the actor has already stopped.
    pub fn shutdown(&self) -> Result<(), ActorError> { self.send(SwitchMessage::Shutdown) }

    /// Check if the actor is still running.
    #[must_use]
    pub fn is_alive(&self) -> bool { !self.sender.is_closed() }
}
