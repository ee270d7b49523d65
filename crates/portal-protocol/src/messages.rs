//! Response and request documents for the HTTP API.
//!
//! Messages are serialized as JSON. Key names match the device's historical
//! wire format (`ap_ssid`, `client_mode_enabled`, ...), which is what the
//! shipped web UIs expect.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use portal_core::registry::ConnectedDevice;
use portal_core::Settings;

// ============================================================================
// Settings
// ============================================================================

/// Settings document served by `GET /api/settings`.
///
/// Contains every settings field except the station password, which never
/// leaves the device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsView {
    pub ap_ssid: String,
    pub ap_password: String,
    pub device_name: String,
    pub device_comment: String,
    pub subnet: u8,
    pub ap_mode_enabled: bool,
    pub client_mode_enabled: bool,
    pub sta_ssid: String,
}

impl From<&Settings> for SettingsView {
    fn from(settings: &Settings) -> Self {
        Self {
            ap_ssid: settings.ap_ssid().to_string(),
            ap_password: settings.ap_password().to_string(),
            device_name: settings.device_name().to_string(),
            device_comment: settings.device_comment().to_string(),
            subnet: settings.subnet(),
            ap_mode_enabled: settings.ap_mode_enabled(),
            client_mode_enabled: settings.client_mode_enabled(),
            sta_ssid: settings.sta_ssid().to_string(),
        }
    }
}

// ============================================================================
// Generic status/error documents
// ============================================================================

/// The `{"status":"..."}` documents the write endpoints respond with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn connecting() -> Self {
        Self {
            status: "connecting".to_string(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            status: "disconnected".to_string(),
        }
    }

    pub fn restarting() -> Self {
        Self {
            status: "restarting".to_string(),
        }
    }
}

/// The `{"error":"..."}` documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    /// The fixed document for a missing request body.
    pub fn no_data() -> Self {
        Self {
            error: "No data".to_string(),
        }
    }

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

// ============================================================================
// WiFi scan & status
// ============================================================================

/// Security mode of a scanned network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    Open,
    Wep,
    Wpa,
    Wpa2,
    Wpa3,
}

impl Encryption {
    pub fn is_open(self) -> bool {
        matches!(self, Encryption::Open)
    }
}

/// One network from a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkEntry {
    pub ssid: String,
    /// Signal strength in dBm (negative; closer to zero is stronger).
    pub rssi: i32,
    pub encryption: Encryption,
}

/// Response of `GET /api/wifi-scan`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResponse {
    pub networks: Vec<NetworkEntry>,
}

/// Response of `GET /api/wifi-status`.
///
/// The link details are present only while connected, so the disconnected
/// document stays the bare `{"connected":false}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WifiStatusResponse {
    pub connected: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
}

impl WifiStatusResponse {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ssid: None,
            ip: None,
            rssi: None,
        }
    }

    pub fn connected(ssid: impl Into<String>, ip: Ipv4Addr, rssi: i32) -> Self {
        Self {
            connected: true,
            ssid: Some(ssid.into()),
            ip: Some(ip.to_string()),
            rssi: Some(rssi),
        }
    }
}

// ============================================================================
// Connected devices
// ============================================================================

/// One tracked station in `GET /api/connected-devices`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceEntry {
    pub ip: String,
    pub mac: String,
    pub device_name: String,
    pub device_comment: String,
}

impl From<&ConnectedDevice> for DeviceEntry {
    fn from(device: &ConnectedDevice) -> Self {
        Self {
            ip: device.ip.to_string(),
            mac: device.mac.clone(),
            device_name: device.device_name.clone(),
            device_comment: device.device_comment.clone(),
        }
    }
}

/// Response of `GET /api/connected-devices`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DevicesResponse {
    pub devices: Vec<DeviceEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_view_omits_station_password() {
        let settings = Settings::default()
            .with_station_credentials("UplinkNet", "s3cr3t")
            .unwrap();
        let view = SettingsView::from(&settings);
        let json = serde_json::to_string(&view).unwrap();

        assert!(json.contains("\"ap_ssid\":\"VR_APP_ESP\""));
        assert!(json.contains("\"sta_ssid\":\"UplinkNet\""));
        assert!(json.contains("\"client_mode_enabled\":true"));
        assert!(!json.contains("s3cr3t"));
        assert!(!json.contains("sta_password"));
    }

    #[test]
    fn status_documents_match_wire_format() {
        assert_eq!(
            serde_json::to_string(&StatusResponse::connecting()).unwrap(),
            r#"{"status":"connecting"}"#
        );
        assert_eq!(
            serde_json::to_string(&ErrorResponse::no_data()).unwrap(),
            r#"{"error":"No data"}"#
        );
    }

    #[test]
    fn disconnected_status_is_bare() {
        let json = serde_json::to_string(&WifiStatusResponse::disconnected()).unwrap();
        assert_eq!(json, r#"{"connected":false}"#);
    }

    #[test]
    fn connected_status_carries_link_details() {
        let status =
            WifiStatusResponse::connected("HomeNet", Ipv4Addr::new(192, 168, 1, 23), -61);
        let json = serde_json::to_string(&status).unwrap();

        assert!(json.contains("\"connected\":true"));
        assert!(json.contains("\"ssid\":\"HomeNet\""));
        assert!(json.contains("\"ip\":\"192.168.1.23\""));
        assert!(json.contains("\"rssi\":-61"));
    }

    #[test]
    fn scan_response_serialization() {
        let response = ScanResponse {
            networks: vec![NetworkEntry {
                ssid: "CafeGuest".to_string(),
                rssi: -70,
                encryption: Encryption::Open,
            }],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"networks":[{"ssid":"CafeGuest","rssi":-70,"encryption":"open"}]}"#
        );
    }

    #[test]
    fn device_entry_from_registry_record() {
        let device = ConnectedDevice {
            ip: Ipv4Addr::new(192, 168, 4, 2),
            mac: "AA:BB:CC:DD:EE:FF".to_string(),
            device_name: "printer".to_string(),
            device_comment: String::new(),
        };
        let entry = DeviceEntry::from(&device);
        let json = serde_json::to_string(&DevicesResponse {
            devices: vec![entry],
        })
        .unwrap();

        assert!(json.contains("\"ip\":\"192.168.4.2\""));
        assert!(json.contains("\"mac\":\"AA:BB:CC:DD:EE:FF\""));
        assert!(json.contains("\"device_comment\":\"\""));
    }
}
