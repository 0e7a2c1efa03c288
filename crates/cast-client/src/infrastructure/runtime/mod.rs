//! The session loop: one task that owns the `SessionController`.
//!
//! # Why a single task? (for beginners)
//!
//! Inputs reach the session from three directions at once: the scanner
//! (receivers coming and going), the transport (connect / launch / text
//! callbacks), and the player (button taps).  The session state machine must
//! see them one at a time, in the order they happened.  Instead of sharing
//! the controller behind a lock, every input is posted to one mailbox that a
//! single task drains:
//!
//! ```text
//!  RegistryDiscovery ──┐
//!                      ├─ EventSender ──┐
//!  CastTransport ──────┘                │
//!                                       ▼
//!                          mpsc<SessionInput>  ──►  session loop  ──► watch<Affordances>
//!                                       ▲                │
//!  SessionHandle ──── Intent + oneshot ─┘                │
//!        ▲                                               │
//!        └──────────────── oneshot reply ────────────────┘
//! ```
//!
//! Because callbacks and intents share the mailbox, an intent posted after a
//! callback is always handled after it.  The loop handles one input to
//! completion (transition and every effect) before it looks at the next.  It
//! stops when every `SessionHandle` has been dropped, releasing the receiver
//! on the way out.

use std::sync::Arc;

use cast_core::{Affordances, SessionEvent, SessionIntent};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::application::session_controller::{ControllerError, SessionController};

/// Maximum number of player intents waiting for the session at once.
const MAX_PENDING_INTENTS: usize = 32;

/// Error type for session-handle operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The session loop has exited.
    #[error("session loop is not running")]
    Stopped,
    /// The session handled the intent and reported an error.
    #[error(transparent)]
    Rejected(#[from] ControllerError),
}

/// Where discovery and transport callbacks are queued for the session.
pub trait EventSink: Send + Sync {
    /// Queues `event`.  Returns `false` if nothing is listening any more.
    fn emit(&self, event: SessionEvent) -> bool;
}

impl EventSink for mpsc::UnboundedSender<SessionEvent> {
    fn emit(&self, event: SessionEvent) -> bool {
        self.send(event).is_ok()
    }
}

enum SessionInput {
    Event(SessionEvent),
    Intent {
        intent: SessionIntent,
        reply: oneshot::Sender<Result<(), ControllerError>>,
    },
    Stop,
}

/// Posts callbacks into the session mailbox.  Never blocks.
#[derive(Clone)]
pub struct EventSender {
    inputs: mpsc::UnboundedSender<SessionInput>,
}

impl EventSink for EventSender {
    fn emit(&self, event: SessionEvent) -> bool {
        self.inputs.send(SessionInput::Event(event)).is_ok()
    }
}

/// The receiving end of the session mailbox; consumed by [`spawn_session`].
pub struct SessionInbox {
    inputs: mpsc::UnboundedReceiver<SessionInput>,
    sender: mpsc::UnboundedSender<SessionInput>,
}

/// Creates the session mailbox.
///
/// Hand clones of the [`EventSender`] to the discovery service and the
/// transport, then pass the [`SessionInbox`] to [`spawn_session`].
pub fn session_queue() -> (EventSender, SessionInbox) {
    let (sender, inputs) = mpsc::unbounded_channel();
    (
        EventSender {
            inputs: sender.clone(),
        },
        SessionInbox { inputs, sender },
    )
}

/// Queues `Stop` when the last `SessionHandle` clone goes away.
struct StopOnDrop(mpsc::UnboundedSender<SessionInput>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        if self.0.send(SessionInput::Stop).is_err() {
            debug!("session loop already stopped");
        }
    }
}

/// Cloneable handle for talking to the session loop.
#[derive(Clone)]
pub struct SessionHandle {
    inputs: mpsc::UnboundedSender<SessionInput>,
    permits: Arc<Semaphore>,
    affordances: watch::Receiver<Affordances>,
    _stop: Arc<StopOnDrop>,
}

impl SessionHandle {
    /// Sends a player intent and waits until the session has handled it.
    ///
    /// The intent is handled after every callback queued before this call.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::Stopped`] if the loop has exited.
    /// - [`RuntimeError::Rejected`] if the session rejected the intent or
    ///   could not send the resulting message.
    pub async fn dispatch(&self, intent: SessionIntent) -> Result<(), RuntimeError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        let (reply, response) = oneshot::channel();
        self.inputs
            .send(SessionInput::Intent { intent, reply })
            .map_err(|_| RuntimeError::Stopped)?;
        response.await.map_err(|_| RuntimeError::Stopped)??;
        Ok(())
    }

    /// The affordances published after the most recent input.
    pub fn affordances(&self) -> Affordances {
        *self.affordances.borrow()
    }

    /// A receiver that is notified every time the affordances are republished.
    pub fn subscribe(&self) -> watch::Receiver<Affordances> {
        self.affordances.clone()
    }
}

/// Starts discovery and spawns the session loop.
pub fn spawn_session(
    mut controller: SessionController,
    inbox: SessionInbox,
) -> (SessionHandle, JoinHandle<()>) {
    controller.start();

    let SessionInbox { mut inputs, sender } = inbox;
    let (affordance_tx, affordance_rx) = watch::channel(controller.affordances());

    let task = tokio::spawn(async move {
        info!("session loop started");
        while let Some(input) = inputs.recv().await {
            match input {
                SessionInput::Event(event) => {
                    debug!("event: {event:?}");
                    controller.handle_event(event);
                }
                SessionInput::Intent { intent, reply } => {
                    debug!("intent: {intent:?}");
                    let result = controller.handle_intent(intent);
                    if reply.send(result).is_err() {
                        debug!("intent caller went away before the reply");
                    }
                }
                SessionInput::Stop => break,
            }
            affordance_tx.send_replace(controller.affordances());
        }
        controller.shutdown();
        info!("session loop stopped");
    });

    (
        SessionHandle {
            inputs: sender.clone(),
            permits: Arc::new(Semaphore::new(MAX_PENDING_INTENTS)),
            affordances: affordance_rx,
            _stop: Arc::new(StopOnDrop(sender)),
        },
        task,
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
