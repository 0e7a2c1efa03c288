//! An in-process receiver running the trivia application.
//!
//! `SimulatedReceiver` implements the transport the way a real receiver
//! behaves from the sender's point of view, minus the network:
//!
//! | request              | callback (queued as a `SessionEvent`)          |
//! |----------------------|------------------------------------------------|
//! | `connect`            | `Connected`                                    |
//! | `launch_application` | `ApplicationReady` (`launched = false` if the  |
//! |                      | application was already running)               |
//! | `send_text` join     | `TextMessage` `{"type":"welcome",...}`         |
//! | `send_text` guess    | `TextMessage` `{"type":"guess",...}`           |
//!
//! [`SimulatedReceiver::drop_link`] simulates the receiver vanishing from the
//! network, which produces `ConnectionLost`.
//!
//! Callbacks are queued, never delivered re-entrantly: the session handles
//! them after it finishes the effect batch that triggered them, exactly as
//! it would with a real SDK calling back on another thread.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cast_core::protocol::decode_action;
use cast_core::{ApplicationMetadata, ChannelAction, ConnectionId, Device, DeviceId, SessionEvent};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::application::ports::{CastTransport, TransportError};
use crate::infrastructure::runtime::EventSink;

#[derive(Debug)]
struct Link {
    device_id: DeviceId,
    joined_application: bool,
    channels: HashSet<String>,
}

#[derive(Debug, Default)]
struct ReceiverState {
    links: HashMap<ConnectionId, Link>,
    /// Application id running on the receiver, if any.
    running_application: Option<String>,
    sessions_started: u64,
}

/// A transport that plays the part of a trivia receiver.
pub struct SimulatedReceiver {
    application_name: String,
    events: Arc<dyn EventSink>,
    state: Mutex<ReceiverState>,
}

impl SimulatedReceiver {
    /// Creates a receiver whose application reports `application_name`.
    pub fn new(
        application_name: impl Into<String>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            events,
            state: Mutex::new(ReceiverState::default()),
        }
    }

    /// Number of open links.
    pub fn open_links(&self) -> usize {
        self.lock().links.len()
    }

    /// Simulates the link failing underneath the session.
    pub fn drop_link(&self, connection: ConnectionId, reason: &str) {
        if self.lock().links.remove(&connection).is_none() {
            debug!("{connection}: drop requested for unknown link");
            return;
        }
        warn!("{connection}: simulated link failure ({reason})");
        self.emit(SessionEvent::ConnectionLost {
            connection,
            reason: reason.to_string(),
        });
    }

    fn lock(&self) -> MutexGuard<'_, ReceiverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        if !self.events.emit(event) {
            debug!("session loop gone; receiver callback dropped");
        }
    }

    /// The reply the trivia application sends for an action.
    fn reply_to(action: &ChannelAction) -> String {
        match action {
            ChannelAction::Join { name } => json!({
                "type": "welcome",
                "message": format!("Welcome, {name}!"),
            })
            .to_string(),
            ChannelAction::Guess { value } => json!({
                "type": "guess",
                "message": format!("Guess {value} received"),
            })
            .to_string(),
        }
    }
}

impl CastTransport for SimulatedReceiver {
    fn connect(
        &self,
        connection: ConnectionId,
        device: &Device,
        sender_id: &str,
    ) -> Result<(), TransportError> {
        info!("{connection}: {sender_id} connecting to {device}");
        self.lock().links.insert(
            connection,
            Link {
                device_id: device.id.clone(),
                joined_application: false,
                channels: HashSet::new(),
            },
        );
        self.emit(SessionEvent::Connected { connection });
        Ok(())
    }

    fn launch_application(
        &self,
        connection: ConnectionId,
        application_id: &str,
    ) -> Result<(), TransportError> {
        let (session_id, launched) = {
            let mut state = self.lock();
            let ReceiverState {
                links,
                running_application,
                sessions_started,
            } = &mut *state;
            let link = links
                .get_mut(&connection)
                .ok_or(TransportError::NotConnected(connection))?;
            link.joined_application = true;

            let launched = running_application.as_deref() != Some(application_id);
            if launched {
                *running_application = Some(application_id.to_string());
                *sessions_started += 1;
            }
            (format!("sim-session-{sessions_started}"), launched)
        };

        info!("{connection}: application {application_id} ready (launched: {launched})");
        self.emit(SessionEvent::ApplicationReady {
            connection,
            session_id,
            metadata: ApplicationMetadata {
                application_id: application_id.to_string(),
                application_name: self.application_name.clone(),
            },
            launched,
        });
        Ok(())
    }

    fn add_channel(&self, connection: ConnectionId, namespace: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        let link = state
            .links
            .get_mut(&connection)
            .ok_or(TransportError::NotConnected(connection))?;
        if !link.joined_application {
            return Err(TransportError::Rejected {
                operation: "add_channel",
                reason: "application not joined".to_string(),
            });
        }
        link.channels.insert(namespace.to_string());
        Ok(())
    }

    fn send_text(
        &self,
        connection: ConnectionId,
        namespace: &str,
        text: &str,
    ) -> Result<(), TransportError> {
        {
            let state = self.lock();
            let link = state
                .links
                .get(&connection)
                .ok_or(TransportError::NotConnected(connection))?;
            if !link.channels.contains(namespace) {
                return Err(TransportError::Rejected {
                    operation: "send_text",
                    reason: format!("no channel for {namespace} on {}", link.device_id),
                });
            }
        }

        match decode_action(text) {
            Ok(action) => {
                debug!("{connection}: receiver got {action:?}");
                self.emit(SessionEvent::TextMessage {
                    connection,
                    text: Self::reply_to(&action),
                });
            }
            Err(err) => warn!("{connection}: receiver ignored message: {err}"),
        }
        Ok(())
    }

    fn remove_channel(
        &self,
        connection: ConnectionId,
        namespace: &str,
    ) -> Result<(), TransportError> {
        if let Some(link) = self.lock().links.get_mut(&connection) {
            link.channels.remove(namespace);
        }
        Ok(())
    }

    fn leave_application(&self, connection: ConnectionId) -> Result<(), TransportError> {
        let mut state = self.lock();
        let link = state
            .links
            .get_mut(&connection)
            .ok_or(TransportError::NotConnected(connection))?;
        link.joined_application = false;
        link.channels.clear();
        Ok(())
    }

    fn disconnect(&self, connection: ConnectionId) -> Result<(), TransportError> {
        match self.lock().links.remove(&connection) {
            Some(link) => {
                info!("{connection}: disconnected from {}", link.device_id);
                Ok(())
            }
            None => Err(TransportError::NotConnected(connection)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const NS: &str = "urn:x-cast:test";

    fn make_receiver() -> (SimulatedReceiver, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SimulatedReceiver::new("Just Pete", Arc::new(tx)), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_connect_emits_connected() {
        // Arrange
        let (receiver, mut rx) = make_receiver();
        let conn = ConnectionId::new(0);

        // Act
        receiver
            .connect(conn, &Device::new("tv", "Living Room"), "sender")
            .unwrap();

        // Assert
        assert_eq!(drain(&mut rx), vec![SessionEvent::Connected { connection: conn }]);
        assert_eq!(receiver.open_links(), 1);
    }

    #[test]
    fn test_second_launch_joins_running_application() {
        let (receiver, mut rx) = make_receiver();
        let tv = Device::new("tv", "Living Room");
        receiver.connect(ConnectionId::new(0), &tv, "s").unwrap();
        receiver.launch_application(ConnectionId::new(0), "APP").unwrap();
        receiver.connect(ConnectionId::new(1), &tv, "s").unwrap();
        drain(&mut rx);

        receiver.launch_application(ConnectionId::new(1), "APP").unwrap();

        match drain(&mut rx).as_slice() {
            [SessionEvent::ApplicationReady {
                launched,
                session_id,
                metadata,
                ..
            }] => {
                assert!(!launched);
                assert_eq!(session_id, "sim-session-1");
                assert_eq!(metadata.application_name, "Just Pete");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_launch_without_link_is_rejected() {
        let (receiver, _rx) = make_receiver();

        let result = receiver.launch_application(ConnectionId::new(9), "APP");

        assert_eq!(result, Err(TransportError::NotConnected(ConnectionId::new(9))));
    }

    #[test]
    fn test_join_gets_welcome_reply() {
        // Arrange
        let (receiver, mut rx) = make_receiver();
        let conn = ConnectionId::new(0);
        receiver.connect(conn, &Device::new("tv", "TV"), "s").unwrap();
        receiver.launch_application(conn, "APP").unwrap();
        receiver.add_channel(conn, NS).unwrap();
        drain(&mut rx);

        // Act
        receiver
            .send_text(conn, NS, r#"{"command":"join","name":"Alice"}"#)
            .unwrap();

        // Assert
        match drain(&mut rx).as_slice() {
            [SessionEvent::TextMessage { text, .. }] => {
                let note = cast_core::decode_inbound(text);
                assert_eq!(note.kind.as_deref(), Some("welcome"));
                assert_eq!(note.message.as_deref(), Some("Welcome, Alice!"));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_send_without_channel_is_rejected() {
        let (receiver, _rx) = make_receiver();
        let conn = ConnectionId::new(0);
        receiver.connect(conn, &Device::new("tv", "TV"), "s").unwrap();

        let result = receiver.send_text(conn, NS, "{}");

        assert!(matches!(result, Err(TransportError::Rejected { .. })));
    }

    #[test]
    fn test_drop_link_emits_connection_lost() {
        let (receiver, mut rx) = make_receiver();
        let conn = ConnectionId::new(0);
        receiver.connect(conn, &Device::new("tv", "TV"), "s").unwrap();
        drain(&mut rx);

        receiver.drop_link(conn, "wifi");

        assert_eq!(
            drain(&mut rx),
            vec![SessionEvent::ConnectionLost {
                connection: conn,
                reason: "wifi".to_string(),
            }]
        );
        assert_eq!(receiver.open_links(), 0);
    }

    #[test]
    fn test_disconnect_closes_link() {
        let (receiver, _rx) = make_receiver();
        let conn = ConnectionId::new(0);
        receiver.connect(conn, &Device::new("tv", "TV"), "s").unwrap();

        receiver.disconnect(conn).unwrap();

        assert_eq!(receiver.open_links(), 0);
        assert!(receiver.disconnect(conn).is_err());
    }
}
