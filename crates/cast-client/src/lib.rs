//! cast-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does cast-client do? (for beginners)
//!
//! The client is the phone side of the Just Pete trivia game.  The game runs
//! on a casting receiver; the phone is a controller:
//!
//! 1. Scans the local network for receivers that can run the Just Pete
//!    receiver application.
//! 2. Lets the player pick one, connects to it, and launches the application.
//! 3. Opens a message channel to the application.
//! 4. Sends the player's name (`join`) and then numeric answers (`guess`).
//!
//! The casting SDK and the widgets are platform code.  This crate talks to
//! them through three traits in [`application::ports`], so the whole flow runs
//! (and is tested) against in-process doubles.

/// Application layer: the session controller use case and its ports.
pub mod application;

/// Infrastructure layer: discovery, transports, runtime loop, config, and UI bridge.
pub mod infrastructure;
