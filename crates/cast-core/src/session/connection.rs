//! Connection lifecycle types.
//!
//! # Connection lifecycle
//!
//! ```text
//!  Idle ──connect──► Connecting ──onConnected──► Connected ──launch──► ApplicationLaunching
//!   ▲                    │                           │                        │
//!   │                    │                           │          onApplicationReady
//!   │                    │                           │                        ▼
//!   │                    └─────── disconnect / connection lost ◄──── ApplicationReady
//!   │                                      │
//!   └──────────── Disconnecting ◄──────────┘
//! ```
//!
//! `Idle` is not a variant of [`ConnectionStatus`]: it is represented by the
//! *absence* of a [`ConnectionSlot`].
//!
//! `Connected` and `Disconnecting` are never stored.  The transition that
//! handles `onConnected` passes through `Connected` and issues the launch in
//! the same step, landing in `ApplicationLaunching`; `disconnect` passes
//! through `Disconnecting` while it emits the release effects and lands in
//! `Idle`.  Both show up in the transition logs only, so a disconnect
//! requested right after `onConnected` is a disconnect from
//! `ApplicationLaunching`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::device::{Device, DeviceId};
use crate::protocol::messages::ApplicationMetadata;

/// Identifies one connection attempt.
///
/// Every `connect` gets a fresh id.  Transport events carry the id of the
/// connection they belong to, so events that arrive after that connection was
/// torn down can be recognised and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Externally visible phase of the connection state machine.
///
/// Only phases a session can rest in are listed; see the module docs for the
/// pass-through `Connected` and `Disconnecting` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionPhase {
    /// No connection.
    Idle,
    /// `connect` issued, waiting for the receiver to acknowledge.
    Connecting,
    /// Link up and launch requested, waiting for the companion application.
    ApplicationLaunching,
    /// Companion application running; the message channel exists.
    ApplicationReady,
}

/// The companion-application session reported by the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSession {
    /// Receiver-assigned session id.
    pub session_id: String,
    pub metadata: ApplicationMetadata,
    /// `true` if our launch request started the application, `false` if it was
    /// already running and we joined it.  Informational only.
    pub launched: bool,
}

/// Per-channel protocol state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelState {
    /// Whether the join action has been sent on this channel.
    pub joined: bool,
}

/// Status of a live (non-idle) connection.
///
/// The channel state lives *inside* the `ApplicationReady` variant, so a
/// message channel cannot exist in any other status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    ApplicationLaunching,
    ApplicationReady {
        session: AppSession,
        channel: ChannelState,
    },
}

impl ConnectionStatus {
    pub fn phase(&self) -> ConnectionPhase {
        match self {
            ConnectionStatus::Connecting => ConnectionPhase::Connecting,
            ConnectionStatus::ApplicationLaunching => ConnectionPhase::ApplicationLaunching,
            ConnectionStatus::ApplicationReady { .. } => ConnectionPhase::ApplicationReady,
        }
    }
}

/// The single active connection owned by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSlot {
    pub id: ConnectionId,
    /// Target receiver.  Re-resolved from the registry when a fresh name is needed.
    pub device_id: DeviceId,
    /// Friendly name captured at connect time, used if the receiver has since
    /// dropped out of the registry.
    pub device_name: String,
    pub status: ConnectionStatus,
}

impl ConnectionSlot {
    /// A new slot in `Connecting`.
    pub fn connecting(id: ConnectionId, device: &Device) -> Self {
        Self {
            id,
            device_id: device.id.clone(),
            device_name: device.friendly_name.clone(),
            status: ConnectionStatus::Connecting,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.status.phase()
    }

    /// The message channel state, present only in `ApplicationReady`.
    pub fn channel(&self) -> Option<&ChannelState> {
        match &self.status {
            ConnectionStatus::ApplicationReady { channel, .. } => Some(channel),
            _ => None,
        }
    }

    /// Whether a leave request can reach the companion application.
    ///
    /// Once a launch has been requested the application may be running, so
    /// both `ApplicationLaunching` and `ApplicationReady` qualify.
    pub fn application_reachable(&self) -> bool {
        matches!(
            self.status,
            ConnectionStatus::ApplicationLaunching | ConnectionStatus::ApplicationReady { .. }
        )
    }
}
