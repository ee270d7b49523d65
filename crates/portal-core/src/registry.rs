//! Connected-station registry.
//!
//! The registry tracks the stations currently associated with the access
//! point, at most [`MAX_TRACKED_STATIONS`] of them. It is rebuilt from the
//! driver's station list on every refresh; name/comment annotations applied
//! through the device-info endpoint are keyed by MAC and survive rebuilds
//! for the life of the process. They are never persisted.

use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Capacity of the registry; stations past this are dropped in list order.
pub const MAX_TRACKED_STATIONS: usize = 10;

/// One entry of the driver's associated-station list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationInfo {
    pub ip: Ipv4Addr,
    pub mac: String,
}

/// A tracked station with its in-memory annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedDevice {
    pub ip: Ipv4Addr,
    pub mac: String,
    pub device_name: String,
    pub device_comment: String,
}

#[derive(Debug, Clone, Default)]
struct Annotation {
    name: String,
    comment: String,
}

/// MAC addresses act as join keys; normalize so `aa:bb..` and `AA:BB..`
/// refer to the same station.
pub fn normalize_mac(mac: &str) -> String {
    mac.trim().to_ascii_uppercase()
}

/// Registry of currently associated stations.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<ConnectedDevice>,
    annotations: HashMap<String, Annotation>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the registry from the driver's station list, in list order.
    ///
    /// Returns how many stations were dropped past capacity so the caller
    /// can log the truncation.
    pub fn rebuild(&mut self, stations: &[StationInfo]) -> usize {
        self.devices.clear();
        for station in stations.iter().take(MAX_TRACKED_STATIONS) {
            let mac = normalize_mac(&station.mac);
            let annotation = self.annotations.get(&mac).cloned().unwrap_or_default();
            self.devices.push(ConnectedDevice {
                ip: station.ip,
                mac,
                device_name: annotation.name,
                device_comment: annotation.comment,
            });
        }
        stations.len().saturating_sub(MAX_TRACKED_STATIONS)
    }

    /// Apply a name/comment annotation to a currently associated station.
    ///
    /// Returns false when no station with that MAC is associated; nothing is
    /// recorded in that case.
    pub fn annotate(&mut self, mac: &str, name: &str, comment: &str) -> bool {
        let mac = normalize_mac(mac);
        let Some(device) = self.devices.iter_mut().find(|d| d.mac == mac) else {
            return false;
        };
        device.device_name = name.to_string();
        device.device_comment = comment.to_string();
        self.annotations.insert(
            mac,
            Annotation {
                name: name.to_string(),
                comment: comment.to_string(),
            },
        );
        true
    }

    pub fn devices(&self) -> &[ConnectedDevice] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
