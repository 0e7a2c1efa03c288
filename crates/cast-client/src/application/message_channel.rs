//! MessageChannel: the player-facing protocol channel.
//!
//! A `MessageChannel` is bound to one connection whose companion application
//! is ready.  It knows exactly two outbound actions:
//!
//! ```text
//! join("Alice")  ──►  {"command":"join","name":"Alice"}
//! guess(42)      ──►  {"command":"guess","value":42}
//! ```
//!
//! Inbound text does not pass through here: the transport delivers it as a
//! `SessionEvent::TextMessage` so that it is ordered with every other event.
//!
//! [`MessageChannel::close`] consumes the channel, so using a channel after
//! it has been destroyed does not compile.

use std::sync::Arc;

use cast_core::{encode_action, ChannelAction, CodecError, ConnectionId, PlayerName};
use thiserror::Error;
use tracing::debug;

use crate::application::ports::{CastTransport, TransportError};

/// Error type for channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// An open message channel on a ready connection.
pub struct MessageChannel {
    connection: ConnectionId,
    namespace: String,
    transport: Arc<dyn CastTransport>,
}

impl MessageChannel {
    /// Registers the channel with the transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the transport refuses the registration.
    pub fn open(
        transport: Arc<dyn CastTransport>,
        connection: ConnectionId,
        namespace: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let namespace = namespace.into();
        transport.add_channel(connection, &namespace)?;
        debug!("{connection}: channel {namespace} open");
        Ok(Self {
            connection,
            namespace,
            transport,
        })
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Sends the join action.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if encoding or sending fails.
    pub fn join(&self, name: &PlayerName) -> Result<(), ChannelError> {
        self.send(&ChannelAction::join(name))
    }

    /// Sends a guess.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if encoding or sending fails.
    pub fn guess(&self, value: i32) -> Result<(), ChannelError> {
        self.send(&ChannelAction::guess(value))
    }

    fn send(&self, action: &ChannelAction) -> Result<(), ChannelError> {
        let text = encode_action(action)?;
        debug!("{}: sending {text}", self.connection);
        self.transport
            .send_text(self.connection, &self.namespace, &text)?;
        Ok(())
    }

    /// Unregisters the channel.  The channel is gone even if this errors.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the transport reports a failure.
    pub fn close(self) -> Result<(), TransportError> {
        debug!("{}: closing channel {}", self.connection, self.namespace);
        self.transport
            .remove_channel(self.connection, &self.namespace)
    }
}

impl std::fmt::Debug for MessageChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageChannel")
            .field("connection", &self.connection)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockCastTransport;
    use mockall::predicate::{always, eq};

    const NS: &str = "urn:x-cast:test";

    fn open_with(mut transport: MockCastTransport) -> MessageChannel {
        transport
            .expect_add_channel()
            .with(eq(ConnectionId::new(1)), eq(NS))
            .times(1)
            .returning(|_, _| Ok(()));
        MessageChannel::open(Arc::new(transport), ConnectionId::new(1), NS).unwrap()
    }

    #[test]
    fn test_join_sends_encoded_action() {
        // Arrange
        let mut transport = MockCastTransport::new();
        transport
            .expect_send_text()
            .with(always(), eq(NS), eq(r#"{"command":"join","name":"Alice"}"#))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let channel = open_with(transport);

        // Act
        let result = channel.join(&PlayerName::parse("Alice").unwrap());

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_guess_sends_encoded_action() {
        let mut transport = MockCastTransport::new();
        transport
            .expect_send_text()
            .with(always(), eq(NS), eq(r#"{"command":"guess","value":42}"#))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let channel = open_with(transport);

        assert!(channel.guess(42).is_ok());
    }

    #[test]
    fn test_send_failure_is_reported() {
        let mut transport = MockCastTransport::new();
        transport.expect_send_text().returning(|c, _, _| {
            Err(TransportError::NotConnected(c))
        });
        let channel = open_with(transport);

        let result = channel.guess(1);

        assert!(matches!(
            result,
            Err(ChannelError::Transport(TransportError::NotConnected(_)))
        ));
    }

    #[test]
    fn test_open_failure_returns_error() {
        let mut transport = MockCastTransport::new();
        transport.expect_add_channel().returning(|_, _| {
            Err(TransportError::Rejected {
                operation: "add_channel",
                reason: "no session".into(),
            })
        });

        let result = MessageChannel::open(Arc::new(transport), ConnectionId::new(1), NS);

        assert!(result.is_err());
    }

    #[test]
    fn test_close_removes_channel() {
        let mut transport = MockCastTransport::new();
        transport
            .expect_remove_channel()
            .with(eq(ConnectionId::new(1)), eq(NS))
            .times(1)
            .returning(|_, _| Ok(()));
        let channel = open_with(transport);

        assert!(channel.close().is_ok());
    }
}
