//! SessionController: runs the session reducer against the ports.
//!
//! # How it works (for beginners)
//!
//! `cast_core::SessionState` decides *what* should happen; it never touches
//! the network.  The controller is the part that makes it happen:
//!
//! ```text
//!   input (event or intent)
//!        │
//!        ▼
//!   SessionState::handle_*  ──►  Transition { state, effects }
//!        │                                 │
//!        │  store new state                ▼
//!        │                        execute each effect in order
//!        │                        (transport / message channel / presenter)
//!        ▼
//!   presenter.render(affordances)
//! ```
//!
//! The controller is the single owner of the live [`MessageChannel`].  It
//! creates the channel when the reducer emits `OpenChannel` and destroys it on
//! `CloseChannel`, so the channel exists exactly while the connection is
//! `ApplicationReady`.
//!
//! # Transport failures
//!
//! A request that the transport refuses synchronously is turned into a
//! `ConnectionLost` event for that connection and fed back through the
//! reducer.  The rest of the batch that failed is dropped: it belongs to a
//! connection that no longer exists.  Teardown requests
//! (`remove_channel`, `leave_application`, `disconnect`) are best-effort:
//! failures are logged and the session still returns to idle.

use std::collections::VecDeque;
use std::sync::Arc;

use cast_core::{
    Affordances, ConnectionId, SessionEffect, SessionError, SessionEvent, SessionIntent,
    SessionState, Transition,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::message_channel::{ChannelError, MessageChannel};
use crate::application::ports::{CastTransport, DeviceDiscovery, Presenter};

/// Identity and routing settings for the cast session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Receiver application to launch.
    pub application_id: String,
    /// Identifier we present to the receiver when connecting.
    pub sender_id: String,
    /// Namespace of the message channel.
    pub channel_namespace: String,
}

/// Error type for controller operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The reducer rejected the intent.  State is unchanged.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The intent was applied but its message could not be sent.
    #[error("message not sent: {0}")]
    Channel(#[from] ChannelError),
}

/// Why executing an effect could not complete.
enum EffectFailure {
    /// The connection can no longer make progress.
    Lost {
        connection: ConnectionId,
        reason: String,
    },
    /// An outbound message was dropped.
    Send(ChannelError),
}

/// The session controller use case.
pub struct SessionController {
    settings: SessionSettings,
    state: SessionState,
    channel: Option<MessageChannel>,
    discovery: Arc<dyn DeviceDiscovery>,
    transport: Arc<dyn CastTransport>,
    presenter: Arc<dyn Presenter>,
}

impl SessionController {
    /// Creates an idle controller.  Call [`start`](Self::start) to begin discovery.
    pub fn new(
        settings: SessionSettings,
        discovery: Arc<dyn DeviceDiscovery>,
        transport: Arc<dyn CastTransport>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            settings,
            state: SessionState::new(),
            channel: None,
            discovery,
            transport,
            presenter,
        }
    }

    /// Starts receiver discovery and publishes the initial affordances.
    pub fn start(&self) {
        info!(
            "starting discovery for application {}",
            self.settings.application_id
        );
        self.discovery
            .start_discovery(&self.settings.application_id);
        self.render();
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether a message channel object is currently held.
    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Affordances for the current state and registry.
    pub fn affordances(&self) -> Affordances {
        self.state.affordances(&self.discovery.current_devices())
    }

    // ── Inputs ────────────────────────────────────────────────────────────────

    /// Applies an external event (discovery change or transport callback).
    pub fn handle_event(&mut self, event: SessionEvent) {
        let transition = self.state.handle_event(event);
        if let Some(err) = self.apply(transition) {
            // Events never emit sends, so this only fires on a reducer change.
            warn!("event produced an unsent message: {err}");
        }
    }

    /// Applies a player intent.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::Session`] if the reducer rejected the intent.
    /// - [`ControllerError::Channel`] if the intent was applied but its
    ///   outbound message could not be sent.
    pub fn handle_intent(&mut self, intent: SessionIntent) -> Result<(), ControllerError> {
        let devices = self.discovery.current_devices();
        let transition = match self.state.handle_intent(intent, &devices) {
            Ok(transition) => transition,
            Err(err) => {
                if err.is_stale_selection() {
                    warn!("stale device selection: {err}");
                } else {
                    error!("contract violation: {err}");
                }
                self.render();
                return Err(err.into());
            }
        };
        match self.apply(transition) {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Cast button tapped.
    ///
    /// # Errors
    ///
    /// See [`handle_intent`](Self::handle_intent).
    pub fn request_device_choice(&mut self) -> Result<(), ControllerError> {
        self.handle_intent(SessionIntent::RequestDeviceChoice)
    }

    /// A row of the device picker was chosen.
    ///
    /// # Errors
    ///
    /// See [`handle_intent`](Self::handle_intent).
    pub fn select_device(&mut self, index: usize) -> Result<(), ControllerError> {
        self.handle_intent(SessionIntent::SelectDevice { index })
    }

    /// The picker or the disconnect confirmation was dismissed.
    ///
    /// # Errors
    ///
    /// See [`handle_intent`](Self::handle_intent).
    pub fn cancel_choice(&mut self) -> Result<(), ControllerError> {
        self.handle_intent(SessionIntent::CancelChoice)
    }

    /// "Disconnect" confirmed.
    ///
    /// # Errors
    ///
    /// See [`handle_intent`](Self::handle_intent).
    pub fn confirm_disconnect(&mut self) -> Result<(), ControllerError> {
        self.handle_intent(SessionIntent::ConfirmDisconnect)
    }

    /// Join button pressed with the text of the name field.
    ///
    /// # Errors
    ///
    /// See [`handle_intent`](Self::handle_intent).
    pub fn submit_join(&mut self, name: &str) -> Result<(), ControllerError> {
        self.handle_intent(SessionIntent::SubmitJoin {
            name: name.to_string(),
        })
    }

    /// Guess button pressed with the text of the guess field.
    ///
    /// # Errors
    ///
    /// See [`handle_intent`](Self::handle_intent).
    pub fn submit_guess(&mut self, text: &str) -> Result<(), ControllerError> {
        self.handle_intent(SessionIntent::SubmitGuess {
            text: text.to_string(),
        })
    }

    /// Releases the connection, if any, before the client exits.
    pub fn shutdown(&mut self) {
        if self.state.connection().is_none() {
            return;
        }
        info!("shutting down: releasing the receiver");
        if let Err(err) = self.confirm_disconnect() {
            warn!("release on shutdown failed: {err}");
        }
    }

    // ── Effects ───────────────────────────────────────────────────────────────

    /// Stores each transition and runs its effects.  A request failure that
    /// loses the connection abandons the rest of its batch; the resulting
    /// `ConnectionLost` is reduced next.  Returns the first send failure, if
    /// any.
    fn apply(&mut self, first: Transition) -> Option<ChannelError> {
        let mut follow_ups: VecDeque<SessionEvent> = VecDeque::new();
        let mut send_failure = None;
        let mut next = Some(first);

        while let Some(Transition { state, effects }) = next.take() {
            self.state = state;
            let mut pending = effects.into_iter();
            for effect in pending.by_ref() {
                match self.execute(effect) {
                    Ok(()) => {}
                    Err(EffectFailure::Lost { connection, reason }) => {
                        follow_ups.push_back(SessionEvent::ConnectionLost { connection, reason });
                        break;
                    }
                    Err(EffectFailure::Send(err)) => {
                        error!("{err}");
                        send_failure.get_or_insert(err);
                    }
                }
            }
            let skipped: Vec<SessionEffect> = pending.collect();
            if !skipped.is_empty() {
                debug!("skipping effects of a lost connection: {skipped:?}");
            }
            next = follow_ups
                .pop_front()
                .map(|event| self.state.handle_event(event));
        }

        self.render();
        send_failure
    }

    fn execute(&mut self, effect: SessionEffect) -> Result<(), EffectFailure> {
        debug!("effect: {effect:?}");
        match effect {
            SessionEffect::Connect { connection, device } => self
                .transport
                .connect(connection, &device, &self.settings.sender_id)
                .map_err(|err| {
                    warn!("{connection}: connect to {device} failed: {err}");
                    EffectFailure::Lost {
                        connection,
                        reason: err.to_string(),
                    }
                }),
            SessionEffect::LaunchApplication { connection } => self
                .transport
                .launch_application(connection, &self.settings.application_id)
                .map_err(|err| {
                    warn!("{connection}: launch failed: {err}");
                    self.release(connection);
                    EffectFailure::Lost {
                        connection,
                        reason: err.to_string(),
                    }
                }),
            SessionEffect::OpenChannel { connection } => self.open_channel(connection),
            SessionEffect::SendJoin { connection, name } => match self.live_channel(connection) {
                Some(channel) => channel.join(&name).map_err(EffectFailure::Send),
                None => {
                    warn!("{connection}: no open channel; dropping join as {name}");
                    Ok(())
                }
            },
            SessionEffect::SendGuess { connection, value } => {
                match self.live_channel(connection) {
                    Some(channel) => channel.guess(value).map_err(EffectFailure::Send),
                    None => {
                        warn!("{connection}: no open channel; dropping guess {value}");
                        Ok(())
                    }
                }
            }
            SessionEffect::CloseChannel { connection } => {
                self.close_channel(connection);
                Ok(())
            }
            SessionEffect::LeaveApplication { connection } => {
                if let Err(err) = self.transport.leave_application(connection) {
                    warn!("{connection}: leave application failed: {err}");
                }
                Ok(())
            }
            SessionEffect::Disconnect { connection } => {
                if let Err(err) = self.transport.disconnect(connection) {
                    warn!("{connection}: disconnect failed: {err}");
                }
                Ok(())
            }
            SessionEffect::PresentChoice(choice) => {
                self.presenter.present_choice(&choice);
                Ok(())
            }
            SessionEffect::FocusNameInput => {
                self.presenter.focus_name_input();
                Ok(())
            }
            SessionEffect::FocusGuessInput => {
                self.presenter.focus_guess_input();
                Ok(())
            }
            SessionEffect::ClearGuessInput => {
                self.presenter.clear_guess_input();
                Ok(())
            }
        }
    }

    fn open_channel(&mut self, connection: ConnectionId) -> Result<(), EffectFailure> {
        if let Some(stale) = self.channel.take() {
            warn!(
                "{}: channel {} still open; closing it",
                stale.connection(),
                stale.namespace()
            );
            if let Err(err) = stale.close() {
                warn!("close channel failed: {err}");
            }
        }
        match MessageChannel::open(
            Arc::clone(&self.transport),
            connection,
            self.settings.channel_namespace.as_str(),
        ) {
            Ok(channel) => {
                self.channel = Some(channel);
                Ok(())
            }
            Err(err) => {
                warn!("{connection}: open channel failed: {err}");
                self.release(connection);
                Err(EffectFailure::Lost {
                    connection,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// The held channel, if it belongs to `connection`.
    fn live_channel(&self, connection: ConnectionId) -> Option<&MessageChannel> {
        self.channel
            .as_ref()
            .filter(|channel| channel.connection() == connection)
    }

    fn close_channel(&mut self, connection: ConnectionId) {
        let Some(channel) = self.channel.take() else {
            debug!("{connection}: no channel to close");
            return;
        };
        if channel.connection() != connection {
            warn!(
                "{connection}: closing channel {} that belongs to {}",
                channel.namespace(),
                channel.connection()
            );
        }
        if let Err(err) = channel.close() {
            warn!("{connection}: close channel failed: {err}");
        }
    }

    /// Best-effort release of a link that cannot make progress.
    fn release(&self, connection: ConnectionId) {
        if let Err(err) = self.transport.leave_application(connection) {
            debug!("{connection}: leave after failure: {err}");
        }
        if let Err(err) = self.transport.disconnect(connection) {
            debug!("{connection}: disconnect after failure: {err}");
        }
    }

    fn render(&self) {
        self.presenter.render(&self.affordances());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
