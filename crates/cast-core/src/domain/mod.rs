//! Domain entities for the trivia cast client.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code has no imports from the casting
//! SDK, network libraries, or UI frameworks, and can be tested on any machine
//! without a receiver on the network.
//!
//! Here the domain is small: a receiver [`device::Device`] and the
//! [`registry::DeviceRegistry`] that tracks which receivers are online.

/// Receiver device identity.
pub mod device;

/// Ordered set of currently-online receivers.
pub mod registry;
