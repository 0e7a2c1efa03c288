//! Ports: the traits the application layer depends on.
//!
//! The casting SDK (scanner, device manager) and the widget toolkit are
//! platform code.  The application layer only sees these three traits; the
//! infrastructure layer provides implementations, and tests substitute
//! doubles.
//!
//! # Fire-and-forget (for beginners)
//!
//! None of these calls wait for the receiver.  `connect` returns as soon as
//! the request has been handed to the SDK; the outcome arrives later as a
//! [`SessionEvent`](cast_core::SessionEvent) on the session's event queue.  A
//! synchronous `Err` only means the request could not even be issued.

use cast_core::{Affordances, ConnectionId, Device, DeviceChoice};
use thiserror::Error;

/// Error type for transport requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The SDK refused to issue the request.
    #[error("transport rejected {operation}: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
    /// The connection the request names is not (or no longer) open.
    #[error("{0} is not open")]
    NotConnected(ConnectionId),
}

/// Receiver discovery service.
///
/// Arrivals and departures are delivered as
/// `SessionEvent::Discovery` on the session's event queue.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceDiscovery: Send + Sync {
    /// Begins scanning for receivers that can run `application_id`.
    /// Calling it again while scanning is a no-op.
    fn start_discovery(&self, application_id: &str);

    /// Currently-online receivers in discovery order.
    fn current_devices(&self) -> Vec<Device>;
}

/// Casting transport (the SDK's device manager).
///
/// Every request names the connection it belongs to, so a transport can route
/// late callbacks to the right session and the session can discard callbacks
/// for connections it already tore down.
#[cfg_attr(test, mockall::automock)]
pub trait CastTransport: Send + Sync {
    /// Starts connecting to `device`, identifying ourselves as `sender_id`.
    fn connect(
        &self,
        connection: ConnectionId,
        device: &Device,
        sender_id: &str,
    ) -> Result<(), TransportError>;

    /// Asks the receiver to launch (or join) the companion application.
    fn launch_application(
        &self,
        connection: ConnectionId,
        application_id: &str,
    ) -> Result<(), TransportError>;

    /// Registers a message channel for `namespace` on the connection.
    fn add_channel(&self, connection: ConnectionId, namespace: &str)
        -> Result<(), TransportError>;

    /// Sends one text message on a registered channel.
    fn send_text(
        &self,
        connection: ConnectionId,
        namespace: &str,
        text: &str,
    ) -> Result<(), TransportError>;

    /// Unregisters a message channel and releases its resources.
    fn remove_channel(
        &self,
        connection: ConnectionId,
        namespace: &str,
    ) -> Result<(), TransportError>;

    /// Leaves (releases) the companion application.
    fn leave_application(&self, connection: ConnectionId) -> Result<(), TransportError>;

    /// Tears down the link.
    fn disconnect(&self, connection: ConnectionId) -> Result<(), TransportError>;
}

/// The presentation layer.
#[cfg_attr(test, mockall::automock)]
pub trait Presenter: Send + Sync {
    /// Called after every transition with the recomputed affordances.
    fn render(&self, affordances: &Affordances);

    /// Shows the device picker or the disconnect confirmation.
    fn present_choice(&self, choice: &DeviceChoice);

    fn focus_name_input(&self);

    fn focus_guess_input(&self);

    fn clear_guess_input(&self);
}
