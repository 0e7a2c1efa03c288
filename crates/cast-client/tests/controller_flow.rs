//! End-to-end controller flows driven by hand-fed transport callbacks.
//!
//! The recording transport never calls back, so each test plays the receiver
//! by feeding `SessionEvent`s to the controller, and checks the exact
//! requests and presentation calls that come out.

use std::sync::Arc;

use cast_client::application::ports::{CastTransport, DeviceDiscovery};
use cast_client::application::session_controller::{
    ControllerError, SessionController, SessionSettings,
};
use cast_client::infrastructure::discovery::RegistryDiscovery;
use cast_client::infrastructure::transport::mock::{RecordingTransport, TransportCall};
use cast_client::infrastructure::ui_bridge::{BridgePresenter, PresentationEvent};
use cast_core::{
    ApplicationMetadata, ConnectionId, ConnectionPhase, Device, DeviceId, SessionError,
    SessionEvent,
};
use tokio::sync::mpsc;

const NS: &str = "urn:x-cast:com.justpete.trivia";

struct Harness {
    controller: SessionController,
    discovery: Arc<RegistryDiscovery>,
    discovery_events: mpsc::UnboundedReceiver<SessionEvent>,
    transport: Arc<RecordingTransport>,
    presented: mpsc::UnboundedReceiver<PresentationEvent>,
}

impl Harness {
    fn new() -> Self {
        let (events_tx, discovery_events) = mpsc::unbounded_channel();
        let discovery = Arc::new(RegistryDiscovery::new(Arc::new(events_tx)));
        let transport = Arc::new(RecordingTransport::new());
        let (presenter, presented) = BridgePresenter::new();
        let controller = SessionController::new(
            SessionSettings {
                application_id: "A487EF70".to_string(),
                sender_id: "com.justpete.touch".to_string(),
                channel_namespace: NS.to_string(),
            },
            Arc::clone(&discovery) as Arc<dyn DeviceDiscovery>,
            Arc::clone(&transport) as Arc<dyn CastTransport>,
            Arc::new(presenter),
        );
        controller.start();
        Self {
            controller,
            discovery,
            discovery_events,
            transport,
            presented,
        }
    }

    /// Forwards queued discovery events to the controller.
    fn pump_discovery(&mut self) {
        while let Ok(event) = self.discovery_events.try_recv() {
            self.controller.handle_event(event);
        }
        self.check_channel_invariant();
    }

    fn feed(&mut self, event: SessionEvent) {
        self.controller.handle_event(event);
        self.check_channel_invariant();
    }

    /// Presentation events since the last call, without renders.
    fn shown(&mut self) -> Vec<PresentationEvent> {
        std::iter::from_fn(|| self.presented.try_recv().ok())
            .filter(|e| !matches!(e, PresentationEvent::Render { .. }))
            .collect()
    }

    fn check_channel_invariant(&self) {
        let ready = self.controller.state().phase() == ConnectionPhase::ApplicationReady;
        assert_eq!(self.controller.has_channel(), ready);
        assert_eq!(self.controller.state().has_channel(), ready);
    }

    /// Device online, picked, connected, application ready.
    fn connect_to(&mut self, id: &str, name: &str) -> ConnectionId {
        self.discovery.device_came_online(Device::new(id, name));
        self.pump_discovery();
        self.controller.request_device_choice().unwrap();
        let index = self
            .discovery
            .current_devices()
            .iter()
            .position(|d| d.id.as_str() == id)
            .unwrap();
        self.controller.select_device(index).unwrap();
        let connection = self.controller.state().connection().unwrap().id;
        self.feed(SessionEvent::Connected { connection });
        self.feed(SessionEvent::ApplicationReady {
            connection,
            session_id: "session-1".to_string(),
            metadata: ApplicationMetadata {
                application_id: "A487EF70".to_string(),
                application_name: "Just Pete".to_string(),
            },
            launched: true,
        });
        connection
    }
}

#[test]
fn test_full_game_scenario() {
    // Arrange
    let mut h = Harness::new();

    // Act: connect
    let conn = h.connect_to("tv", "Living Room");

    // Assert: connect, launch, open channel, in that order
    assert_eq!(
        h.transport.calls(),
        vec![
            TransportCall::Connect {
                connection: conn,
                device_id: DeviceId::from("tv"),
                sender_id: "com.justpete.touch".to_string(),
            },
            TransportCall::LaunchApplication {
                connection: conn,
                application_id: "A487EF70".to_string(),
            },
            TransportCall::AddChannel {
                connection: conn,
                namespace: NS.to_string(),
            },
        ]
    );
    assert!(h.shown().contains(&PresentationEvent::FocusNameInput));
    assert!(h.controller.affordances().join_enabled);

    // Act: join and guess
    h.controller.submit_join("Alice").unwrap();
    h.controller.submit_guess("42").unwrap();
    h.controller.submit_guess("abc").unwrap();

    // Assert: join once, one guess, field cleared twice
    assert_eq!(
        h.transport.sent_texts(),
        vec![
            r#"{"command":"join","name":"Alice"}"#.to_string(),
            r#"{"command":"guess","value":42}"#.to_string(),
        ]
    );
    assert_eq!(
        h.shown(),
        vec![
            PresentationEvent::FocusGuessInput,
            PresentationEvent::ClearGuessInput,
            PresentationEvent::ClearGuessInput,
        ]
    );

    // Inbound text is accepted without side effects.
    h.transport.clear();
    h.feed(SessionEvent::TextMessage {
        connection: conn,
        text: r#"{"type":"score","text":"Alice 10"}"#.to_string(),
    });
    assert!(h.transport.calls().is_empty());
}

#[test]
fn test_join_is_sent_at_most_once() {
    let mut h = Harness::new();
    h.connect_to("tv", "Living Room");
    h.controller.submit_join("Alice").unwrap();

    let second = h.controller.submit_join("Bob");

    assert!(matches!(
        second,
        Err(ControllerError::Session(SessionError::AlreadyJoined))
    ));
    assert_eq!(h.transport.sent_texts().len(), 1);
}

#[test]
fn test_disconnect_from_every_phase_returns_to_idle() {
    // Each closure advances a fresh harness to one phase.
    type Setup = fn(&mut Harness);
    let setups: [(ConnectionPhase, Setup); 4] = [
        (ConnectionPhase::Connecting, |h| {
            h.discovery.device_came_online(Device::new("tv", "TV"));
            h.pump_discovery();
            h.controller.request_device_choice().unwrap();
            h.controller.select_device(0).unwrap();
        }),
        (ConnectionPhase::ApplicationLaunching, |h| {
            h.discovery.device_came_online(Device::new("tv", "TV"));
            h.pump_discovery();
            h.controller.request_device_choice().unwrap();
            h.controller.select_device(0).unwrap();
            h.feed(SessionEvent::Connected {
                connection: ConnectionId::new(0),
            });
        }),
        (ConnectionPhase::ApplicationReady, |h| {
            h.connect_to("tv", "TV");
        }),
        (ConnectionPhase::ApplicationReady, |h| {
            h.connect_to("tv", "TV");
            h.controller.submit_join("Alice").unwrap();
        }),
    ];

    for (phase, setup) in setups {
        // Arrange
        let mut h = Harness::new();
        setup(&mut h);
        assert_eq!(h.controller.state().phase(), phase);
        h.controller.request_device_choice().unwrap();
        h.transport.clear();

        // Act
        h.controller.confirm_disconnect().unwrap();

        // Assert
        assert_eq!(h.controller.state().phase(), ConnectionPhase::Idle);
        assert!(!h.controller.has_channel());
        assert_eq!(
            h.transport.calls().last(),
            Some(&TransportCall::Disconnect {
                connection: ConnectionId::new(0),
            }),
            "disconnect from {phase:?}"
        );
        let affordances = h.controller.affordances();
        assert!(affordances.prompt_cast_enabled);
        assert!(!affordances.join_enabled);
        assert!(!affordances.guess_enabled);
    }
}

#[test]
fn test_reconnect_uses_new_connection_and_ignores_old_callbacks() {
    // Arrange
    let mut h = Harness::new();
    let first = h.connect_to("tv", "Living Room");
    h.controller.request_device_choice().unwrap();
    h.controller.confirm_disconnect().unwrap();

    // Act
    h.controller.request_device_choice().unwrap();
    h.controller.select_device(0).unwrap();
    let second = h.controller.state().connection().unwrap().id;
    h.transport.clear();
    h.feed(SessionEvent::Connected { connection: first });

    // Assert
    assert_ne!(first, second);
    assert!(h.transport.calls().is_empty());
    assert_eq!(h.controller.state().phase(), ConnectionPhase::Connecting);
}

#[test]
fn test_receiver_vanishing_mid_game_resets_controls() {
    // Arrange
    let mut h = Harness::new();
    let conn = h.connect_to("tv", "Living Room");
    h.controller.submit_join("Alice").unwrap();
    h.transport.clear();

    // Act
    h.feed(SessionEvent::ConnectionLost {
        connection: conn,
        reason: "receiver went away".to_string(),
    });
    h.discovery.device_went_offline(&DeviceId::from("tv"));
    h.pump_discovery();

    // Assert: channel released, nothing else sent
    assert_eq!(
        h.transport.calls(),
        vec![TransportCall::RemoveChannel {
            connection: conn,
            namespace: NS.to_string(),
        }]
    );
    let affordances = h.controller.affordances();
    assert!(affordances.prompt_cast_enabled);
    assert!(!affordances.guess_enabled);
    assert_eq!(affordances.cast_button, cast_core::CastButton::Hidden);
}

#[test]
fn test_picker_lists_devices_in_discovery_order() {
    let mut h = Harness::new();
    for (id, name) in [("a", "Attic"), ("b", "Bedroom"), ("c", "Cellar")] {
        h.discovery.device_came_online(Device::new(id, name));
    }
    h.discovery.device_went_offline(&DeviceId::from("b"));
    h.pump_discovery();
    h.shown();

    h.controller.request_device_choice().unwrap();

    match h.shown().as_slice() {
        [PresentationEvent::ChooseDevice { devices, .. }] => {
            let names: Vec<_> = devices.iter().map(|d| d.name.as_str()).collect();
            assert_eq!(names, vec!["Attic", "Cellar"]);
        }
        other => panic!("expected the device picker, got {other:?}"),
    }
}
