//! Message-channel protocol: player actions and their text encoding.
//!
//! Framing, encryption, and multiplexing belong to the casting transport.  What
//! this module owns is the *shape* of what travels over our channel:
//!
//! - two outbound actions, [`messages::ChannelAction::Join`] and
//!   [`messages::ChannelAction::Guess`];
//! - one inbound shape, [`messages::InboundNotification`] (free text).

pub mod codec;
pub mod messages;

pub use codec::{decode_action, decode_inbound, encode_action, CodecError};
