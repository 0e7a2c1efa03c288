//! Recording cast transport for testing.
//!
//! # Why a recording transport?
//!
//! The real transport talks to a receiver over the local network.  Tests
//! cannot observe what a real receiver got, and there may not be one.
//!
//! `RecordingTransport` replaces every request with an in-memory record.
//! Each successful request is pushed into one `Mutex<Vec<TransportCall>>`, so
//! assertions can check exactly which requests were issued and in what order.
//! It never emits callbacks; tests drive those by feeding `SessionEvent`s to
//! the controller directly.
//!
//! # Usage in tests
//!
//! ```ignore
//! let transport = Arc::new(RecordingTransport::new());
//! let controller = SessionController::new(settings, discovery, transport.clone(), presenter);
//!
//! controller.select_device(0)?;
//! assert!(matches!(transport.calls()[0], TransportCall::Connect { .. }));
//! ```
//!
//! # Failure injection
//!
//! Set `should_fail = true` to make every request return
//! `TransportError::Rejected`, or set `fail_operation` to fail only requests
//! of one kind (`"connect"`, `"launch_application"`, `"add_channel"`,
//! `"send_text"`, `"remove_channel"`, `"leave_application"`,
//! `"disconnect"`).  Failed requests are not recorded.

use std::sync::{Mutex, PoisonError};

use cast_core::{ConnectionId, Device, DeviceId};

use crate::application::ports::{CastTransport, TransportError};

/// One request issued to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect {
        connection: ConnectionId,
        device_id: DeviceId,
        sender_id: String,
    },
    LaunchApplication {
        connection: ConnectionId,
        application_id: String,
    },
    AddChannel {
        connection: ConnectionId,
        namespace: String,
    },
    SendText {
        connection: ConnectionId,
        namespace: String,
        text: String,
    },
    RemoveChannel {
        connection: ConnectionId,
        namespace: String,
    },
    LeaveApplication {
        connection: ConnectionId,
    },
    Disconnect {
        connection: ConnectionId,
    },
}

/// A transport that records requests instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Every successful request, in issue order.
    pub calls: Mutex<Vec<TransportCall>>,
    /// When `true`, every request fails.
    pub should_fail: bool,
    /// When set, only requests of this kind fail.
    pub fail_operation: Option<&'static str>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose `operation` requests fail.
    pub fn failing_on(operation: &'static str) -> Self {
        Self {
            fail_operation: Some(operation),
            ..Self::default()
        }
    }

    /// Snapshot of the recorded requests.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Texts passed to `send_text`, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::SendText { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, operation: &'static str, call: TransportCall) -> Result<(), TransportError> {
        if self.should_fail || self.fail_operation == Some(operation) {
            return Err(TransportError::Rejected {
                operation,
                reason: "injected failure".to_string(),
            });
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        Ok(())
    }
}

impl CastTransport for RecordingTransport {
    fn connect(
        &self,
        connection: ConnectionId,
        device: &Device,
        sender_id: &str,
    ) -> Result<(), TransportError> {
        self.record(
            "connect",
            TransportCall::Connect {
                connection,
                device_id: device.id.clone(),
                sender_id: sender_id.to_string(),
            },
        )
    }

    fn launch_application(
        &self,
        connection: ConnectionId,
        application_id: &str,
    ) -> Result<(), TransportError> {
        self.record(
            "launch_application",
            TransportCall::LaunchApplication {
                connection,
                application_id: application_id.to_string(),
            },
        )
    }

    fn add_channel(&self, connection: ConnectionId, namespace: &str) -> Result<(), TransportError> {
        self.record(
            "add_channel",
            TransportCall::AddChannel {
                connection,
                namespace: namespace.to_string(),
            },
        )
    }

    fn send_text(
        &self,
        connection: ConnectionId,
        namespace: &str,
        text: &str,
    ) -> Result<(), TransportError> {
        self.record(
            "send_text",
            TransportCall::SendText {
                connection,
                namespace: namespace.to_string(),
                text: text.to_string(),
            },
        )
    }

    fn remove_channel(
        &self,
        connection: ConnectionId,
        namespace: &str,
    ) -> Result<(), TransportError> {
        self.record(
            "remove_channel",
            TransportCall::RemoveChannel {
                connection,
                namespace: namespace.to_string(),
            },
        )
    }

    fn leave_application(&self, connection: ConnectionId) -> Result<(), TransportError> {
        self.record(
            "leave_application",
            TransportCall::LeaveApplication { connection },
        )
    }

    fn disconnect(&self, connection: ConnectionId) -> Result<(), TransportError> {
        self.record("disconnect", TransportCall::Disconnect { connection })
    }
}
