//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory, writes it back, and supplies defaults on
//! first run so the client works without any file at all.

pub mod config;
