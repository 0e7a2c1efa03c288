//! Session state machine.
//!
//! # How the pieces fit (for beginners)
//!
//! ```text
//!   SessionEvent (from discovery / transport) ─┐
//!                                              ├─► SessionState::handle_* ─► Transition
//!   SessionIntent (from the player) ───────────┘                              ├─ state   (next SessionState)
//!                                                                             └─ effects (Vec<SessionEffect>)
//! ```
//!
//! The state machine never performs I/O.  It returns a list of
//! [`state::SessionEffect`]s ("connect to this device", "send this action",
//! "clear the guess field") and the caller executes them.  Because every
//! transition is a pure function, the whole connect/launch/join/guess flow can
//! be unit-tested without a receiver.
//!
//! - **`connection`** – The per-connection status enum and its identifier.
//! - **`affordance`** – Which UI controls are enabled, derived from the state.
//! - **`state`** – The reducer itself.

pub mod affordance;
pub mod connection;
pub mod state;
