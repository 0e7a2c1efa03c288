//! DeviceRegistry: the live set of receivers that can run our application.
//!
//! The discovery service reports receivers coming online and going offline.
//! The registry keeps the currently-online ones in **discovery order**:
//!
//! ```text
//! appeared(A)  appeared(B)  appeared(C)  disappeared(B)
//!    [A]          [A, B]      [A, B, C]      [A, C]
//! ```
//!
//! # Why a `Vec` and not a `HashMap`?
//!
//! The device picker lists receivers by position and the user answers with an
//! index.  A `HashMap` has no stable iteration order, so the same registry
//! could be shown in two different orders on two consecutive openings of the
//! picker.  The registry is tiny (a handful of receivers on a home network),
//! so a linear scan by id is cheaper than keeping a separate index.

use serde::{Deserialize, Serialize};

use super::device::{Device, DeviceId};

/// A change reported by the discovery service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryEvent {
    /// A receiver matching the application filter came online.
    DeviceAppeared(Device),
    /// A previously reported receiver went offline.
    DeviceDisappeared(DeviceId),
}

/// Ordered, in-memory registry of currently-online receivers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a receiver, or refreshes it in place if its id is already known.
    ///
    /// A refresh keeps the original position so that index-based selection
    /// stays stable.
    pub fn upsert(&mut self, device: Device) {
        match self.devices.iter_mut().find(|d| d.id == device.id) {
            Some(existing) => *existing = device,
            None => self.devices.push(device),
        }
    }

    /// Removes a receiver.  Returns `true` if it was present.
    pub fn remove(&mut self, id: &DeviceId) -> bool {
        let before = self.devices.len();
        self.devices.retain(|d| &d.id != id);
        self.devices.len() != before
    }

    /// Applies a discovery event.  Returns `true` if the snapshot changed.
    pub fn apply(&mut self, event: &DiscoveryEvent) -> bool {
        match event {
            DiscoveryEvent::DeviceAppeared(device) => {
                if self.get(&device.id) == Some(device) {
                    return false;
                }
                self.upsert(device.clone());
                true
            }
            DiscoveryEvent::DeviceDisappeared(id) => self.remove(id),
        }
    }

    /// Returns the receiver with the given id, if it is online.
    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// Returns a snapshot of all online receivers in discovery order.
    pub fn current_devices(&self) -> Vec<Device> {
        self.devices.clone()
    }

    /// Borrowed view of the online receivers in discovery order.
    pub fn as_slice(&self) -> &[Device] {
        &self.devices
    }
}
