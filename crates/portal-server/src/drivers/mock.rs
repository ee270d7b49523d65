//! Mock WiFi driver.
//!
//! Simulates scanning, connecting and the associated-station list without
//! any hardware. Connection attempts resolve after a configurable number of
//! status polls; an SSID that was never added stays `Connecting` forever,
//! which is how an unreachable network looks to the poll loop.

use std::net::Ipv4Addr;

use tracing::{debug, info};

use portal_core::registry::StationInfo;
use portal_protocol::{Encryption, NetworkEntry};

use crate::driver::{ApConfig, DriverError, LinkInfo, LinkStatus, WifiDriver};

#[derive(Debug, Clone)]
struct MockNetwork {
    ssid: String,
    rssi: i32,
    encryption: Encryption,
    password: String,
}

#[derive(Debug, Clone)]
enum MockLink {
    Idle,
    Connecting {
        ssid: String,
        remaining: u32,
        outcome: Outcome,
    },
    Connected(LinkInfo),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Accept,
    Reject,
    /// Never resolves; the caller's poll budget decides when to give up.
    Unreachable,
}

/// A configurable in-memory WiFi backend.
#[derive(Debug)]
pub struct MockWifiDriver {
    networks: Vec<MockNetwork>,
    stations: Vec<StationInfo>,
    ap: Option<ApConfig>,
    link: MockLink,
    connect_polls: u32,
}

impl Default for MockWifiDriver {
    fn default() -> Self {
        Self {
            networks: Vec::new(),
            stations: Vec::new(),
            ap: None,
            link: MockLink::Idle,
            connect_polls: 2,
        }
    }
}

impl MockWifiDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reachable network. An `Open` network ignores the password.
    pub fn with_network(
        mut self,
        ssid: &str,
        rssi: i32,
        encryption: Encryption,
        password: &str,
    ) -> Self {
        self.networks.push(MockNetwork {
            ssid: ssid.to_string(),
            rssi,
            encryption,
            password: password.to_string(),
        });
        self
    }

    /// Add an associated station to the soft-AP list.
    pub fn with_station(mut self, ip: Ipv4Addr, mac: &str) -> Self {
        self.stations.push(StationInfo {
            ip,
            mac: mac.to_string(),
        });
        self
    }

    /// Number of `poll_link` calls a connect attempt stays `Connecting`
    /// before resolving.
    pub fn with_connect_polls(mut self, polls: u32) -> Self {
        self.connect_polls = polls;
        self
    }

    pub fn ap_config(&self) -> Option<&ApConfig> {
        self.ap.as_ref()
    }
}

impl WifiDriver for MockWifiDriver {
    fn start_access_point(&mut self, config: &ApConfig) -> Result<(), DriverError> {
        info!(ssid = %config.ssid, gateway = %config.gateway(), "mock AP up");
        self.ap = Some(config.clone());
        Ok(())
    }

    fn stop_access_point(&mut self) -> Result<(), DriverError> {
        self.ap = None;
        Ok(())
    }

    fn scan(&mut self) -> Result<Vec<NetworkEntry>, DriverError> {
        Ok(self
            .networks
            .iter()
            .map(|network| NetworkEntry {
                ssid: network.ssid.clone(),
                rssi: network.rssi,
                encryption: network.encryption,
            })
            .collect())
    }

    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), DriverError> {
        let outcome = match self.networks.iter().find(|n| n.ssid == ssid) {
            None => Outcome::Unreachable,
            Some(network) if network.encryption.is_open() => Outcome::Accept,
            Some(network) if network.password == password => Outcome::Accept,
            Some(_) => Outcome::Reject,
        };
        debug!(ssid, ?outcome, "mock connect attempt");
        self.link = MockLink::Connecting {
            ssid: ssid.to_string(),
            remaining: self.connect_polls,
            outcome,
        };
        Ok(())
    }

    fn poll_link(&mut self) -> LinkStatus {
        match &mut self.link {
            MockLink::Idle => LinkStatus::Idle,
            MockLink::Connected(info) => LinkStatus::Connected(info.clone()),
            MockLink::Failed => LinkStatus::Failed,
            MockLink::Connecting {
                ssid,
                remaining,
                outcome,
            } => {
                if *outcome == Outcome::Unreachable {
                    return LinkStatus::Connecting;
                }
                if *remaining > 0 {
                    *remaining -= 1;
                    return LinkStatus::Connecting;
                }
                match outcome {
                    Outcome::Accept => {
                        let rssi = self
                            .networks
                            .iter()
                            .find(|n| &n.ssid == ssid)
                            .map(|n| n.rssi)
                            .unwrap_or(-70);
                        let info = LinkInfo {
                            ssid: ssid.clone(),
                            ip: Ipv4Addr::new(192, 168, 1, 100),
                            rssi,
                        };
                        self.link = MockLink::Connected(info.clone());
                        LinkStatus::Connected(info)
                    }
                    _ => {
                        self.link = MockLink::Failed;
                        LinkStatus::Failed
                    }
                }
            }
        }
    }

    fn disconnect(&mut self) -> Result<(), DriverError> {
        self.link = MockLink::Idle;
        Ok(())
    }

    fn stations(&mut self) -> Vec<StationInfo> {
        self.stations.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_reports_configured_networks_in_order() {
        let mut driver = MockWifiDriver::new()
            .with_network("HomeNet", -55, Encryption::Wpa2, "pw")
            .with_network("CafeGuest", -70, Encryption::Open, "");
        let networks = driver.scan().unwrap();
        assert_eq!(networks.len(), 2);
        assert_eq!(networks[0].ssid, "HomeNet");
        assert_eq!(networks[1].encryption, Encryption::Open);
    }

    #[test]
    fn connect_resolves_after_configured_polls() {
        let mut driver = MockWifiDriver::new()
            .with_network("HomeNet", -55, Encryption::Wpa2, "pw")
            .with_connect_polls(2);
        driver.begin_connect("HomeNet", "pw").unwrap();

        assert_eq!(driver.poll_link(), LinkStatus::Connecting);
        assert_eq!(driver.poll_link(), LinkStatus::Connecting);
        assert!(matches!(driver.poll_link(), LinkStatus::Connected(_)));
    }

    #[test]
    fn wrong_password_fails_after_polls() {
        let mut driver = MockWifiDriver::new()
            .with_network("HomeNet", -55, Encryption::Wpa2, "pw")
            .with_connect_polls(1);
        driver.begin_connect("HomeNet", "wrong").unwrap();
        assert_eq!(driver.poll_link(), LinkStatus::Connecting);
        assert_eq!(driver.poll_link(), LinkStatus::Failed);
    }

    #[test]
    fn unknown_ssid_stays_connecting() {
        let mut driver = MockWifiDriver::new().with_connect_polls(1);
        driver.begin_connect("Nowhere", "").unwrap();
        for _ in 0..50 {
            assert_eq!(driver.poll_link(), LinkStatus::Connecting);
        }
    }

    #[test]
    fn open_network_ignores_password() {
        let mut driver = MockWifiDriver::new()
            .with_network("CafeGuest", -70, Encryption::Open, "")
            .with_connect_polls(0);
        driver.begin_connect("CafeGuest", "whatever").unwrap();
        assert!(matches!(driver.poll_link(), LinkStatus::Connected(_)));
    }
}
