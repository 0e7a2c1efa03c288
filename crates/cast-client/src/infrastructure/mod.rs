//! Infrastructure layer for the client application.
//!
//! Contains the adapters behind the application-layer ports, the session
//! loop, configuration persistence, and the UI command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and `cast_core`,
//! but MUST NOT be imported by the `application` or domain layers.
//!
//! # Sub-modules
//!
//! - **`discovery`** – `RegistryDiscovery`, the live receiver registry fed by
//!   the platform scanner's callbacks.
//!
//! - **`transport`** – In-process `CastTransport` implementations: a recording
//!   transport for tests and a simulated trivia receiver.
//!
//! - **`runtime`** – The single task that owns the `SessionController` and
//!   serialises every event and intent through it.
//!
//! - **`storage`** – TOML configuration file persistence.
//!
//! - **`ui_bridge`** – Async commands and presentation events for the UI shell.

pub mod discovery;
pub mod runtime;
pub mod storage;
pub mod transport;
pub mod ui_bridge;
