//! Application layer use cases for the client application.
//!
//! # What use cases does the client have?
//!
//! - **`ports`** – The traits the application depends on: receiver discovery,
//!   the casting transport, and the presentation layer.  Infrastructure
//!   provides the implementations.
//!
//! - **`message_channel`** – The player-facing protocol channel.  Encodes
//!   `join` / `guess` actions and hands them to the transport.
//!
//! - **`session_controller`** – Runs the `cast_core` session reducer and
//!   executes the effects it returns against the ports.  This is the single
//!   owner of the connection and the message channel.

pub mod message_channel;
pub mod ports;
pub mod session_controller;
