//! SessionState: the reducer at the heart of the client.
//!
//! Every input is either a [`SessionEvent`] (something happened: a receiver
//! came online, the link came up, the application became ready) or a
//! [`SessionIntent`] (the player did something: opened the device picker,
//! typed a guess).  Each input produces a [`Transition`] holding the next
//! state and the [`SessionEffect`]s the caller must execute, in order.
//!
//! # Rules enforced here
//!
//! - At most one connection exists (`Option<ConnectionSlot>`).
//! - The message channel exists exactly while the connection is
//!   `ApplicationReady`: `OpenChannel` is emitted on entering that status and
//!   `CloseChannel` is emitted before any effect that leaves it.
//! - Events tagged with a connection id other than the live one are discarded.
//! - A device picked from the picker is resolved against the snapshot captured
//!   when the picker opened, then re-checked against the live registry by id.
//!
//! The registry is passed in as a read-only slice at each decision point; the
//! session never owns or mutates it.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::device::{Device, DeviceId};
use crate::domain::registry::DiscoveryEvent;
use crate::protocol::codec::decode_inbound;
use crate::protocol::messages::{parse_guess, ApplicationMetadata, PlayerName};
use crate::session::affordance::Affordances;
use crate::session::connection::{
    AppSession, ChannelState, ConnectionId, ConnectionPhase, ConnectionSlot, ConnectionStatus,
};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors returned by [`SessionState::handle_intent`].
///
/// The first three variants are contract violations: the presentation layer
/// offered a control that the affordances said was disabled.  The last three
/// are stale selections, which are expected under a racing registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{operation} is not allowed while the connection is {phase:?}")]
    InvalidState {
        operation: &'static str,
        phase: ConnectionPhase,
    },

    #[error("the player has already joined this session")]
    AlreadyJoined,

    #[error("the player must join before guessing")]
    NotJoined,

    #[error("no device choice is pending")]
    NoPendingChoice,

    #[error("selection {index} is out of range for a choice of {len} device(s)")]
    SelectionOutOfRange { index: usize, len: usize },

    #[error("device {0} is no longer available")]
    DeviceUnavailable(DeviceId),
}

impl SessionError {
    /// `true` for errors caused by the registry changing under an open picker.
    pub fn is_stale_selection(&self) -> bool {
        matches!(
            self,
            SessionError::NoPendingChoice
                | SessionError::SelectionOutOfRange { .. }
                | SessionError::DeviceUnavailable(_)
        )
    }
}

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Something that happened outside the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The registry changed.  The session only recomputes affordances.
    Discovery(DiscoveryEvent),
    /// The receiver acknowledged the link.
    Connected { connection: ConnectionId },
    /// The companion application is running and joinable.
    ApplicationReady {
        connection: ConnectionId,
        session_id: String,
        metadata: ApplicationMetadata,
        launched: bool,
    },
    /// Unsolicited failure of the link.
    ConnectionLost {
        connection: ConnectionId,
        reason: String,
    },
    /// Text received on the message channel.
    TextMessage {
        connection: ConnectionId,
        text: String,
    },
}

/// Something the player asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIntent {
    /// Cast button tapped.
    RequestDeviceChoice,
    /// A row of the device picker was chosen.
    SelectDevice { index: usize },
    /// The picker or the disconnect confirmation was dismissed.
    CancelChoice,
    /// "Disconnect" confirmed.
    ConfirmDisconnect,
    SubmitJoin { name: String },
    SubmitGuess { text: String },
}

// ── Outputs ───────────────────────────────────────────────────────────────────

/// What the presentation layer should show when the cast button is tapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceChoice {
    /// Pick one of these receivers (plus a cancel option).
    SelectDevice { devices: Vec<Device> },
    /// Already connected to `device_name`; offer to disconnect (plus cancel).
    ConfirmDisconnect { device_name: String },
}

/// A side effect to be executed by the caller, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    // Transport
    Connect { connection: ConnectionId, device: Device },
    LaunchApplication { connection: ConnectionId },
    OpenChannel { connection: ConnectionId },
    SendJoin { connection: ConnectionId, name: PlayerName },
    SendGuess { connection: ConnectionId, value: i32 },
    CloseChannel { connection: ConnectionId },
    LeaveApplication { connection: ConnectionId },
    Disconnect { connection: ConnectionId },
    // Presentation
    PresentChoice(DeviceChoice),
    FocusNameInput,
    FocusGuessInput,
    ClearGuessInput,
}

/// The result of applying one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<SessionEffect>,
}

impl Transition {
    fn unchanged(state: &SessionState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Snapshot captured when the device picker was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingChoice {
    Devices(Vec<Device>),
    Disconnect,
}

/// The complete session state.  Cheap to clone; replaced on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    connection: Option<ConnectionSlot>,
    pending_choice: Option<PendingChoice>,
    next_connection_id: u64,
}

impl SessionState {
    /// Idle, no picker open.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn connection(&self) -> Option<&ConnectionSlot> {
        self.connection.as_ref()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.connection
            .as_ref()
            .map_or(ConnectionPhase::Idle, ConnectionSlot::phase)
    }

    /// The connection reached `ApplicationReady`.
    pub fn application_started(&self) -> bool {
        self.phase() == ConnectionPhase::ApplicationReady
    }

    /// The join action has been sent on the live channel.
    pub fn has_joined(&self) -> bool {
        self.channel().is_some_and(|c| c.joined)
    }

    pub fn has_channel(&self) -> bool {
        self.channel().is_some()
    }

    pub fn has_pending_choice(&self) -> bool {
        self.pending_choice.is_some()
    }

    pub fn affordances(&self, devices: &[Device]) -> Affordances {
        Affordances::derive(!devices.is_empty(), self.phase(), self.has_joined())
    }

    fn channel(&self) -> Option<&ChannelState> {
        self.connection.as_ref().and_then(ConnectionSlot::channel)
    }

    /// Returns the live slot if `connection` names it.
    fn live_slot(&self, connection: ConnectionId) -> Option<&ConnectionSlot> {
        self.connection.as_ref().filter(|slot| slot.id == connection)
    }

    // ── Events ────────────────────────────────────────────────────────────────

    /// Applies an external event.
    ///
    /// Events never fail: anything that does not fit the current state (a
    /// duplicate callback, an event for a torn-down connection) is logged and
    /// dropped.
    pub fn handle_event(&self, event: SessionEvent) -> Transition {
        match event {
            SessionEvent::Discovery(change) => {
                debug!("registry changed: {change:?}");
                Transition::unchanged(self)
            }
            SessionEvent::Connected { connection } => self.on_connected(connection),
            SessionEvent::ApplicationReady {
                connection,
                session_id,
                metadata,
                launched,
            } => self.on_application_ready(
                connection,
                AppSession {
                    session_id,
                    metadata,
                    launched,
                },
            ),
            SessionEvent::ConnectionLost { connection, reason } => {
                self.on_connection_lost(connection, &reason)
            }
            SessionEvent::TextMessage { connection, text } => {
                self.on_text_message(connection, &text)
            }
        }
    }

    fn on_connected(&self, connection: ConnectionId) -> Transition {
        let Some(slot) = self.live_slot(connection) else {
            debug!("discarding Connected for stale {connection}");
            return Transition::unchanged(self);
        };
        if slot.status != ConnectionStatus::Connecting {
            warn!("ignoring duplicate Connected for {connection} in {:?}", slot.phase());
            return Transition::unchanged(self);
        }

        info!("{connection}: Connecting -> Connected -> ApplicationLaunching");
        let mut next = self.clone();
        if let Some(slot) = next.connection.as_mut() {
            slot.status = ConnectionStatus::ApplicationLaunching;
        }
        Transition {
            state: next,
            effects: vec![SessionEffect::LaunchApplication { connection }],
        }
    }

    fn on_application_ready(&self, connection: ConnectionId, session: AppSession) -> Transition {
        let Some(slot) = self.live_slot(connection) else {
            debug!("discarding ApplicationReady for stale {connection}");
            return Transition::unchanged(self);
        };
        if slot.status != ConnectionStatus::ApplicationLaunching {
            warn!(
                "ignoring ApplicationReady for {connection} in {:?}",
                slot.phase()
            );
            return Transition::unchanged(self);
        }

        info!(
            "application name: {}, session id: {}, launched: {}",
            session.metadata.application_name, session.session_id, session.launched
        );
        info!("{connection}: ApplicationLaunching -> ApplicationReady");

        let mut next = self.clone();
        if let Some(slot) = next.connection.as_mut() {
            slot.status = ConnectionStatus::ApplicationReady {
                session,
                channel: ChannelState::default(),
            };
        }
        Transition {
            state: next,
            effects: vec![
                SessionEffect::OpenChannel { connection },
                SessionEffect::FocusNameInput,
            ],
        }
    }

    fn on_connection_lost(&self, connection: ConnectionId, reason: &str) -> Transition {
        let Some(slot) = self.live_slot(connection) else {
            debug!("discarding ConnectionLost for stale {connection}");
            return Transition::unchanged(self);
        };

        warn!("{connection}: connection lost in {:?} ({reason}); -> Idle", slot.phase());

        let mut effects = Vec::new();
        if slot.channel().is_some() {
            effects.push(SessionEffect::CloseChannel { connection });
        }

        let mut next = self.clone();
        next.connection = None;
        if next.pending_choice == Some(PendingChoice::Disconnect) {
            next.pending_choice = None;
        }
        Transition {
            state: next,
            effects,
        }
    }

    fn on_text_message(&self, connection: ConnectionId, text: &str) -> Transition {
        match self.live_slot(connection) {
            Some(slot) if slot.channel().is_some() => {
                let note = decode_inbound(text);
                let shown = note.display_text();
                match &note.kind {
                    Some(kind) => info!("received text message ({kind}): {shown}"),
                    None => info!("received text message: {shown}"),
                }
            }
            _ => debug!("discarding text message for {connection} without a live channel"),
        }
        Transition::unchanged(self)
    }

    // ── Intents ───────────────────────────────────────────────────────────────

    /// Applies a player intent against the current registry snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] for contract violations and stale selections.
    /// The state is unchanged when an error is returned.
    pub fn handle_intent(
        &self,
        intent: SessionIntent,
        devices: &[Device],
    ) -> Result<Transition, SessionError> {
        match intent {
            SessionIntent::RequestDeviceChoice => Ok(self.request_device_choice(devices)),
            SessionIntent::SelectDevice { index } => self.select_device(index, devices),
            SessionIntent::CancelChoice => Ok(self.cancel_choice()),
            SessionIntent::ConfirmDisconnect => Ok(self.confirm_disconnect()),
            SessionIntent::SubmitJoin { name } => self.submit_join(&name),
            SessionIntent::SubmitGuess { text } => self.submit_guess(&text),
        }
    }

    fn request_device_choice(&self, devices: &[Device]) -> Transition {
        let mut next = self.clone();
        let choice = match &self.connection {
            None => {
                info!("choose device: {} candidate(s)", devices.len());
                next.pending_choice = Some(PendingChoice::Devices(devices.to_vec()));
                DeviceChoice::SelectDevice {
                    devices: devices.to_vec(),
                }
            }
            Some(slot) => {
                // Prefer the registry's current name; fall back to the one
                // captured at connect time if the receiver dropped out.
                let device_name = devices
                    .iter()
                    .find(|d| d.id == slot.device_id)
                    .map_or_else(|| slot.device_name.clone(), |d| d.friendly_name.clone());
                info!("connected device choice: {device_name}");
                next.pending_choice = Some(PendingChoice::Disconnect);
                DeviceChoice::ConfirmDisconnect { device_name }
            }
        };
        Transition {
            state: next,
            effects: vec![SessionEffect::PresentChoice(choice)],
        }
    }

    fn select_device(&self, index: usize, devices: &[Device]) -> Result<Transition, SessionError> {
        if let Some(slot) = &self.connection {
            return Err(SessionError::InvalidState {
                operation: "select_device",
                phase: slot.phase(),
            });
        }
        let Some(PendingChoice::Devices(snapshot)) = &self.pending_choice else {
            return Err(SessionError::NoPendingChoice);
        };
        let chosen = snapshot.get(index).ok_or(SessionError::SelectionOutOfRange {
            index,
            len: snapshot.len(),
        })?;
        let device = devices
            .iter()
            .find(|d| d.id == chosen.id)
            .ok_or_else(|| SessionError::DeviceUnavailable(chosen.id.clone()))?;

        let connection = ConnectionId::new(self.next_connection_id);
        info!("selecting device {device}; {connection}: Idle -> Connecting");

        let mut next = self.clone();
        next.pending_choice = None;
        next.next_connection_id = self.next_connection_id.wrapping_add(1);
        next.connection = Some(ConnectionSlot::connecting(connection, device));
        Ok(Transition {
            state: next,
            effects: vec![SessionEffect::Connect {
                connection,
                device: device.clone(),
            }],
        })
    }

    fn cancel_choice(&self) -> Transition {
        let mut next = self.clone();
        next.pending_choice = None;
        Transition {
            state: next,
            effects: Vec::new(),
        }
    }

    fn confirm_disconnect(&self) -> Transition {
        let mut next = self.clone();
        next.pending_choice = None;

        let Some(slot) = &self.connection else {
            debug!("disconnect requested while idle");
            return Transition {
                state: next,
                effects: Vec::new(),
            };
        };

        let connection = slot.id;
        info!(
            "disconnecting device {}; {connection}: {:?} -> Disconnecting -> Idle",
            slot.device_name,
            slot.phase()
        );

        let mut effects = Vec::new();
        if slot.channel().is_some() {
            effects.push(SessionEffect::CloseChannel { connection });
        }
        if slot.application_reachable() {
            effects.push(SessionEffect::LeaveApplication { connection });
        }
        effects.push(SessionEffect::Disconnect { connection });

        next.connection = None;
        Transition {
            state: next,
            effects,
        }
    }

    fn submit_join(&self, raw_name: &str) -> Result<Transition, SessionError> {
        let (connection, channel) = self.ready_channel("submit_join")?;
        if channel.joined {
            return Err(SessionError::AlreadyJoined);
        }
        let Some(name) = PlayerName::parse(raw_name) else {
            debug!("ignoring join with a blank name");
            return Ok(Transition::unchanged(self));
        };

        info!("{connection}: joining as {name}");
        let mut next = self.clone();
        if let Some(ConnectionSlot {
            status: ConnectionStatus::ApplicationReady { channel, .. },
            ..
        }) = next.connection.as_mut()
        {
            channel.joined = true;
        }
        Ok(Transition {
            state: next,
            effects: vec![
                SessionEffect::SendJoin { connection, name },
                SessionEffect::FocusGuessInput,
            ],
        })
    }

    fn submit_guess(&self, text: &str) -> Result<Transition, SessionError> {
        let (connection, channel) = self.ready_channel("submit_guess")?;
        if !channel.joined {
            return Err(SessionError::NotJoined);
        }

        let mut effects = Vec::with_capacity(2);
        match parse_guess(text) {
            Some(value) => effects.push(SessionEffect::SendGuess { connection, value }),
            None => debug!("ignoring non-numeric guess {text:?}"),
        }
        effects.push(SessionEffect::ClearGuessInput);

        Ok(Transition {
            state: self.clone(),
            effects,
        })
    }

    /// The live connection id and its channel, or `InvalidState`.
    fn ready_channel(
        &self,
        operation: &'static str,
    ) -> Result<(ConnectionId, &ChannelState), SessionError> {
        self.connection
            .as_ref()
            .and_then(|slot| slot.channel().map(|channel| (slot.id, channel)))
            .ok_or(SessionError::InvalidState {
                operation,
                phase: self.phase(),
            })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
