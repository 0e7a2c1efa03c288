//! Registry-backed receiver discovery.
//!
//! The platform scanner (mDNS, the casting SDK's media router, ...) calls
//! [`RegistryDiscovery::device_came_online`] and
//! [`RegistryDiscovery::device_went_offline`] from its own callback thread.
//! Each call:
//!
//! 1. Updates the shared [`DeviceRegistry`] under a write lock.
//! 2. If the registry actually changed, emits a
//!    `SessionEvent::Discovery` into the session mailbox so the session
//!    loop recomputes affordances.
//!
//! The session reads the registry through [`DeviceDiscovery::current_devices`],
//! which takes a snapshot under a read lock.  Because the registry is updated
//! *before* the event is queued, a snapshot taken while handling that event
//! always includes the change.
//!
//! # Why `std::sync::RwLock`?
//!
//! The lock is never held across an `.await`, and the scanner callbacks are
//! plain synchronous functions, so a blocking lock is the right tool.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, PoisonError, RwLock,
};

use cast_core::{Device, DeviceId, DeviceRegistry, DiscoveryEvent, SessionEvent};
use tracing::{debug, info};

use crate::application::ports::DeviceDiscovery;
use crate::infrastructure::runtime::EventSink;

/// Discovery service that keeps the live registry.
pub struct RegistryDiscovery {
    registry: RwLock<DeviceRegistry>,
    events: Arc<dyn EventSink>,
    scanning: AtomicBool,
}

impl RegistryDiscovery {
    /// Creates an idle discovery service that reports changes on `events`.
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            registry: RwLock::new(DeviceRegistry::new()),
            events,
            scanning: AtomicBool::new(false),
        }
    }

    /// Whether `start_discovery` has been called.
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Scanner callback: a receiver appeared (or its details changed).
    pub fn device_came_online(&self, device: Device) {
        self.apply(DiscoveryEvent::DeviceAppeared(device));
    }

    /// Scanner callback: a receiver disappeared.
    pub fn device_went_offline(&self, id: &DeviceId) {
        self.apply(DiscoveryEvent::DeviceDisappeared(id.clone()));
    }

    fn apply(&self, event: DiscoveryEvent) {
        if !self.is_scanning() {
            debug!("discovery not started; ignoring {event:?}");
            return;
        }

        let changed = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(&event);
        if !changed {
            return;
        }

        match &event {
            DiscoveryEvent::DeviceAppeared(device) => info!("receiver online: {device}"),
            DiscoveryEvent::DeviceDisappeared(id) => info!("receiver offline: {id}"),
        }
        if !self.events.emit(SessionEvent::Discovery(event)) {
            debug!("session loop gone; discovery event dropped");
        }
    }
}

impl DeviceDiscovery for RegistryDiscovery {
    fn start_discovery(&self, application_id: &str) {
        if self.scanning.swap(true, Ordering::AcqRel) {
            debug!("discovery already running; ignoring start for {application_id}");
            return;
        }
        info!("scanning for receivers supporting {application_id}");
    }

    fn current_devices(&self) -> Vec<Device> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current_devices()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
