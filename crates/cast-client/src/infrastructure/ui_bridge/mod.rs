//! Command bridge between the session loop and the UI shell.
//!
//! Follows the same split as the rest of the client: only this module knows
//! both the application layer and the shape the UI consumes.
//!
//! # Two directions
//!
//! ```text
//!  UI shell                        ui_bridge                      session loop
//!  ──────────────────────────────────────────────────────────────────────────
//!  tap "cast"    ── request_device_choice() ── SessionHandle::dispatch ──►
//!                ◄── PresentationEvent::ChooseDevice ── BridgePresenter ◄──
//! ```
//!
//! - **Commands** are async functions taking `Arc<CastAppState>`.  Each one
//!   dispatches a `SessionIntent` and returns a `ClientCommandResult<T>`.
//! - **Presentation events** are what the session asks the UI to do (show the
//!   picker, focus a field, re-enable controls).  `BridgePresenter`
//!   implements the `Presenter` port by turning each call into a serializable
//!   [`PresentationEvent`] on a channel the shell drains.
//!
//! # `ClientCommandResult<T>`
//!
//! All commands return a unified envelope:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```

use std::sync::Arc;

use cast_core::{Affordances, CastButton, Device, DeviceChoice, SessionIntent};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::ports::Presenter;
use crate::infrastructure::runtime::SessionHandle;

/// Title of the device picker.
const DEVICE_PICKER_TITLE: &str = "Cast to";

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Control enablement as the UI sees it.
///
/// `cast_button` is the variant name: `"Hidden"`, `"Available"` or `"Connected"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffordancesDto {
    pub cast_button: String,
    pub prompt_cast_enabled: bool,
    pub join_enabled: bool,
    pub guess_enabled: bool,
}

impl From<Affordances> for AffordancesDto {
    fn from(affordances: Affordances) -> Self {
        let cast_button = match affordances.cast_button {
            CastButton::Hidden => "Hidden",
            CastButton::Available => "Available",
            CastButton::Connected => "Connected",
        };
        Self {
            cast_button: cast_button.to_string(),
            prompt_cast_enabled: affordances.prompt_cast_enabled,
            join_enabled: affordances.join_enabled,
            guess_enabled: affordances.guess_enabled,
        }
    }
}

/// One row of the device picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDto {
    pub id: String,
    pub name: String,
}

impl From<&Device> for DeviceDto {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.to_string(),
            name: device.friendly_name.clone(),
        }
    }
}

/// Snapshot returned by `get_session_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatusDto {
    pub title: String,
    pub affordances: AffordancesDto,
}

/// Something the session asks the UI to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresentationEvent {
    /// Re-enable / disable controls.
    Render { affordances: AffordancesDto },
    /// Show the device picker; the answer is `select_device(index)` or
    /// `cancel_device_choice()`.
    ChooseDevice {
        title: String,
        devices: Vec<DeviceDto>,
    },
    /// Show the disconnect confirmation titled with the device name; the
    /// answer is `confirm_disconnect()` or `cancel_device_choice()`.
    ConfirmDisconnect { title: String },
    FocusNameInput,
    FocusGuessInput,
    ClearGuessInput,
}

/// Unified response wrapper for bridge commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientCommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> ClientCommandResult<T> {
    /// Constructs a successful result containing `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Constructs an error result containing the given message.
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Presenter ─────────────────────────────────────────────────────────────────

/// `Presenter` that forwards every call as a [`PresentationEvent`].
pub struct BridgePresenter {
    events: mpsc::UnboundedSender<PresentationEvent>,
}

impl BridgePresenter {
    /// Creates the presenter and the receiver the UI shell drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresentationEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { events }, rx)
    }

    fn emit(&self, event: PresentationEvent) {
        debug!("presentation: {event:?}");
        if self.events.send(event).is_err() {
            debug!("UI shell gone; presentation event dropped");
        }
    }
}

impl Presenter for BridgePresenter {
    fn render(&self, affordances: &Affordances) {
        self.emit(PresentationEvent::Render {
            affordances: (*affordances).into(),
        });
    }

    fn present_choice(&self, choice: &DeviceChoice) {
        let event = match choice {
            DeviceChoice::SelectDevice { devices } => PresentationEvent::ChooseDevice {
                title: DEVICE_PICKER_TITLE.to_string(),
                devices: devices.iter().map(DeviceDto::from).collect(),
            },
            DeviceChoice::ConfirmDisconnect { device_name } => {
                PresentationEvent::ConfirmDisconnect {
                    title: device_name.clone(),
                }
            }
        };
        self.emit(event);
    }

    fn focus_name_input(&self) {
        self.emit(PresentationEvent::FocusNameInput);
    }

    fn focus_guess_input(&self) {
        self.emit(PresentationEvent::FocusGuessInput);
    }

    fn clear_guess_input(&self) {
        self.emit(PresentationEvent::ClearGuessInput);
    }
}

// ── Shared state ──────────────────────────────────────────────────────────────

/// State shared between bridge commands.
pub struct CastAppState {
    /// Navigation-bar title.
    pub title: String,
    pub session: SessionHandle,
}

impl CastAppState {
    pub fn new(title: impl Into<String>, session: SessionHandle) -> Arc<Self> {
        Arc::new(Self {
            title: title.into(),
            session,
        })
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn run(state: &CastAppState, intent: SessionIntent) -> ClientCommandResult<()> {
    match state.session.dispatch(intent).await {
        Ok(()) => ClientCommandResult::ok(()),
        Err(e) => ClientCommandResult::err(e.to_string()),
    }
}

/// Returns the title and the current affordances.
pub async fn get_session_status(state: Arc<CastAppState>) -> ClientCommandResult<SessionStatusDto> {
    ClientCommandResult::ok(SessionStatusDto {
        title: state.title.clone(),
        affordances: state.session.affordances().into(),
    })
}

/// Cast button tapped.
pub async fn request_device_choice(state: Arc<CastAppState>) -> ClientCommandResult<()> {
    run(&state, SessionIntent::RequestDeviceChoice).await
}

/// A picker row was chosen.
pub async fn select_device(state: Arc<CastAppState>, index: usize) -> ClientCommandResult<()> {
    run(&state, SessionIntent::SelectDevice { index }).await
}

/// The picker or the disconnect confirmation was dismissed.
pub async fn cancel_device_choice(state: Arc<CastAppState>) -> ClientCommandResult<()> {
    run(&state, SessionIntent::CancelChoice).await
}

/// "Disconnect" confirmed.
pub async fn confirm_disconnect(state: Arc<CastAppState>) -> ClientCommandResult<()> {
    run(&state, SessionIntent::ConfirmDisconnect).await
}

/// Join pressed.
///
/// A blank name is rejected here, without reaching the session: the join
/// button is only meaningful with a name in the field.
pub async fn submit_join(state: Arc<CastAppState>, name: String) -> ClientCommandResult<()> {
    if name.trim().is_empty() {
        return ClientCommandResult::err("name must not be empty");
    }
    run(&state, SessionIntent::SubmitJoin { name }).await
}

/// Guess pressed.  Any text is forwarded; non-numeric text only clears the field.
pub async fn submit_guess(state: Arc<CastAppState>, text: String) -> ClientCommandResult<()> {
    run(&state, SessionIntent::SubmitGuess { text }).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use cast_core::{ConnectionPhase, DeviceId};

    use crate::application::ports::{CastTransport, DeviceDiscovery};
    use crate::application::session_controller::{SessionController, SessionSettings};
    use crate::infrastructure::discovery::RegistryDiscovery;
    use crate::infrastructure::runtime::{session_queue, spawn_session};
    use crate::infrastructure::transport::simulated::SimulatedReceiver;

    struct Shell {
        state: Arc<CastAppState>,
        discovery: Arc<RegistryDiscovery>,
        presented: mpsc::UnboundedReceiver<PresentationEvent>,
    }

    impl Shell {
        /// Drains presentation events, skipping renders.
        fn shown(&mut self) -> Vec<PresentationEvent> {
            std::iter::from_fn(|| self.presented.try_recv().ok())
                .filter(|e| !matches!(e, PresentationEvent::Render { .. }))
                .collect()
        }
    }

    fn make_shell() -> Shell {
        let (events, inbox) = session_queue();
        let discovery = Arc::new(RegistryDiscovery::new(Arc::new(events.clone())));
        let receiver = Arc::new(SimulatedReceiver::new("Just Pete", Arc::new(events)));
        let (presenter, presented) = BridgePresenter::new();
        let controller = SessionController::new(
            SessionSettings {
                application_id: "APP".to_string(),
                sender_id: "sender".to_string(),
                channel_namespace: "urn:x-cast:test".to_string(),
            },
            Arc::clone(&discovery) as Arc<dyn DeviceDiscovery>,
            receiver as Arc<dyn CastTransport>,
            Arc::new(presenter),
        );
        let (handle, _task) = spawn_session(controller, inbox);
        Shell {
            state: CastAppState::new("Just Pete", handle),
            discovery,
            presented,
        }
    }

    async fn wait_for_join(state: &CastAppState) {
        let mut rx = state.session.subscribe();
        tokio::time::timeout(Duration::from_secs(2), async move {
            while !rx.borrow_and_update().join_enabled {
                rx.changed().await.expect("session loop exited");
            }
        })
        .await
        .expect("timed out waiting for join");
    }

    #[tokio::test]
    async fn test_get_session_status_returns_title_and_hidden_button() {
        // Arrange
        let shell = make_shell();

        // Act
        let result = get_session_status(Arc::clone(&shell.state)).await;

        // Assert
        assert!(result.success);
        let dto = result.data.unwrap();
        assert_eq!(dto.title, "Just Pete");
        assert_eq!(dto.affordances.cast_button, "Hidden");
        assert!(dto.affordances.prompt_cast_enabled);
    }

    #[tokio::test]
    async fn test_request_device_choice_presents_picker() {
        // Arrange
        let mut shell = make_shell();
        shell
            .discovery
            .device_came_online(Device::new("tv", "Living Room"));

        // Act
        let result = request_device_choice(Arc::clone(&shell.state)).await;

        // Assert
        assert!(result.success);
        assert_eq!(
            shell.shown(),
            vec![PresentationEvent::ChooseDevice {
                title: DEVICE_PICKER_TITLE.to_string(),
                devices: vec![DeviceDto {
                    id: "tv".to_string(),
                    name: "Living Room".to_string(),
                }],
            }]
        );
    }

    #[tokio::test]
    async fn test_connected_choice_offers_disconnect_titled_with_device() {
        // Arrange
        let mut shell = make_shell();
        shell
            .discovery
            .device_came_online(Device::new("tv", "Living Room"));
        request_device_choice(Arc::clone(&shell.state)).await;
        select_device(Arc::clone(&shell.state), 0).await;
        wait_for_join(&shell.state).await;
        shell.shown();

        // Act
        request_device_choice(Arc::clone(&shell.state)).await;

        // Assert
        assert_eq!(
            shell.shown(),
            vec![PresentationEvent::ConfirmDisconnect {
                title: "Living Room".to_string(),
            }]
        );
        let result = confirm_disconnect(Arc::clone(&shell.state)).await;
        assert!(result.success);
        let status = get_session_status(Arc::clone(&shell.state)).await.data.unwrap();
        assert!(status.affordances.prompt_cast_enabled);
    }

    #[tokio::test]
    async fn test_submit_join_rejects_blank_name() {
        let shell = make_shell();

        let result = submit_join(Arc::clone(&shell.state), "   ".to_string()).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("name must not be empty"));
    }

    #[tokio::test]
    async fn test_submit_guess_before_joining_reports_error() {
        let shell = make_shell();

        let result = submit_guess(Arc::clone(&shell.state), "5".to_string()).await;

        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_join_then_guess_focuses_and_clears() {
        // Arrange
        let mut shell = make_shell();
        shell
            .discovery
            .device_came_online(Device::new("tv", "Living Room"));
        request_device_choice(Arc::clone(&shell.state)).await;
        select_device(Arc::clone(&shell.state), 0).await;
        wait_for_join(&shell.state).await;
        shell.shown();

        // Act
        let joined = submit_join(Arc::clone(&shell.state), "Alice".to_string()).await;
        let guessed = submit_guess(Arc::clone(&shell.state), "abc".to_string()).await;

        // Assert
        assert!(joined.success);
        assert!(guessed.success);
        assert_eq!(
            shell.shown(),
            vec![
                PresentationEvent::FocusGuessInput,
                PresentationEvent::ClearGuessInput,
            ]
        );
    }

    #[tokio::test]
    async fn test_selecting_vanished_device_reports_error() {
        let shell = make_shell();
        shell
            .discovery
            .device_came_online(Device::new("tv", "Living Room"));
        request_device_choice(Arc::clone(&shell.state)).await;
        shell.discovery.device_went_offline(&DeviceId::from("tv"));

        let result = select_device(Arc::clone(&shell.state), 0).await;

        assert!(!result.success);
        let status = get_session_status(Arc::clone(&shell.state)).await.data.unwrap();
        assert_eq!(status.affordances.cast_button, "Hidden");
    }

    #[test]
    fn test_presentation_event_serializes_with_kind_tag() {
        let json = serde_json::to_string(&PresentationEvent::FocusNameInput).unwrap();
        assert_eq!(json, r#"{"kind":"focus_name_input"}"#);
    }

    #[test]
    fn test_affordances_dto_names_cast_button_variant() {
        let dto = AffordancesDto::from(Affordances::derive(
            true,
            ConnectionPhase::ApplicationReady,
            false,
        ));
        assert_eq!(dto.cast_button, "Connected");
        assert!(dto.join_enabled);
    }

    #[test]
    fn test_client_command_result_err_sets_success_false() {
        let r: ClientCommandResult<u32> = ClientCommandResult::err("oops");
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.error.unwrap(), "oops");
    }
}
