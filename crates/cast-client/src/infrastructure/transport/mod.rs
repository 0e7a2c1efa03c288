//! Cast transport implementations.
//!
//! The production transport is the platform casting SDK, bound at the
//! application shell.  This crate ships two in-process implementations of
//! [`CastTransport`](crate::application::ports::CastTransport):
//!
//! - **`mock`** – `RecordingTransport`: records every request, never calls
//!   back.  Used by unit and integration tests to assert exactly which
//!   requests the session issued.
//!
//! - **`simulated`** – `SimulatedReceiver`: behaves like a receiver running
//!   the trivia application.  It acknowledges connects and launches and
//!   answers `join` / `guess` with a text message, all delivered as
//!   `SessionEvent`s.  Used by the binary and by end-to-end tests of the
//!   session loop.

pub mod mock;
pub mod simulated;
