//! # cast-core
//!
//! Shared library for the Just Pete trivia cast client containing the device
//! registry, the message-channel protocol, and the session state machine.
//!
//! It has zero dependencies on the casting SDK, UI frameworks, or async
//! runtimes.  Everything in here is a plain value that can be driven from a
//! unit test.
//!
//! # Architecture overview (for beginners)
//!
//! The trivia game itself runs on a wireless casting receiver (a TV dongle).
//! The phone app finds receivers on the local network, connects to one,
//! launches the companion receiver application, and then sends the player's
//! name and numeric guesses to it over a message channel.
//!
//! This crate (`cast-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The receiver devices and the live registry of which ones are
//!   currently online.
//!
//! - **`protocol`** – The two outbound player actions (`join`, `guess`), the
//!   inbound text notification, and their JSON text encoding.
//!
//! - **`session`** – The connection/session state machine.  It is a pure
//!   reducer: `(state, input) -> (state, effects)`.  The client crate executes
//!   the effects against the real transport.

pub mod domain;
pub mod protocol;
pub mod session;

// Re-export the most-used types at the crate root so callers can write
// `cast_core::SessionState` instead of `cast_core::session::state::SessionState`.
pub use domain::device::{Device, DeviceId};
pub use domain::registry::{DeviceRegistry, DiscoveryEvent};
pub use protocol::codec::{decode_inbound, encode_action, CodecError};
pub use protocol::messages::{ApplicationMetadata, ChannelAction, InboundNotification, PlayerName};
pub use session::affordance::{Affordances, CastButton};
pub use session::connection::{ConnectionId, ConnectionPhase};
pub use session::state::{
    DeviceChoice, SessionEffect, SessionError, SessionEvent, SessionIntent, SessionState,
    Transition,
};
