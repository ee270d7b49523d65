//! WiFi driver abstraction.
//!
//! The vendor WiFi stack is wrapped behind a trait so the session
//! controller, the HTTP handlers and the tests all talk to the same
//! surface. All methods are synchronous to support embedded platforms;
//! the session controller adds the async polling on top.

use std::net::Ipv4Addr;

use thiserror::Error;

use portal_core::registry::StationInfo;
use portal_core::Settings;
use portal_protocol::NetworkEntry;

/// Errors surfaced by a driver implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("access point start failed: {0}")]
    ApStart(String),

    #[error("scan failed: {0}")]
    Scan(String),

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("disconnect failed: {0}")]
    Disconnect(String),
}

/// Soft-AP parameters derived from the settings record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApConfig {
    pub ssid: String,
    pub password: String,
    /// Third octet of the AP network: the gateway is 192.168.`subnet`.1.
    pub subnet: u8,
}

impl ApConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            ssid: settings.ap_ssid().to_string(),
            password: settings.ap_password().to_string(),
            subnet: settings.subnet(),
        }
    }

    pub fn gateway(&self) -> Ipv4Addr {
        Ipv4Addr::new(192, 168, self.subnet, 1)
    }
}

/// Details of an established station link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub ssid: String,
    pub ip: Ipv4Addr,
    pub rssi: i32,
}

/// Station link state as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// No connect attempt in progress.
    Idle,
    /// Association/DHCP still in progress.
    Connecting,
    /// Link is up.
    Connected(LinkInfo),
    /// The last attempt was rejected (bad credentials, AP refused).
    Failed,
}

/// Abstract WiFi backend.
///
/// `begin_connect` starts an attempt and returns immediately; progress is
/// observed through `poll_link`. An unreachable SSID keeps reporting
/// `Connecting` — bounding the wait is the session controller's job.
pub trait WifiDriver: Send + Sync {
    fn start_access_point(&mut self, config: &ApConfig) -> Result<(), DriverError>;

    fn stop_access_point(&mut self) -> Result<(), DriverError>;

    fn scan(&mut self) -> Result<Vec<NetworkEntry>, DriverError>;

    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), DriverError>;

    fn poll_link(&mut self) -> LinkStatus;

    fn disconnect(&mut self) -> Result<(), DriverError>;

    /// Stations currently associated with the soft AP, in vendor order.
    fn stations(&mut self) -> Vec<StationInfo>;
}
