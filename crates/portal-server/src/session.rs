//! WiFi session controller.
//!
//! Owns the driver and the two independent state machines:
//!
//! - access point: `Idle -> Starting -> Active`
//! - station link: `Disconnected -> Connecting -> Connected | Failed`
//!
//! A connect attempt polls the driver at a fixed interval for a fixed
//! maximum number of polls before declaring failure. There is no backoff
//! and no background retry; a failed attempt stays failed until a caller
//! issues a new one.

use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use portal_core::registry::StationInfo;
use portal_core::Settings;
use portal_protocol::NetworkEntry;

use crate::driver::{ApConfig, DriverError, LinkInfo, LinkStatus, WifiDriver};

/// Status polls per connect attempt.
pub const CONNECT_MAX_POLLS: u32 = 20;

/// Spacing between status polls.
pub const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Cadence of the station-list refresh.
pub const STATION_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Access point state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApState {
    Idle,
    Starting,
    Active,
}

/// Station link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Why a connect attempt did not produce a link.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The poll budget ran out with the link still down.
    #[error("no link after {attempts} status polls")]
    Timeout { attempts: u32 },

    /// The driver reported the attempt rejected (bad credentials, AP
    /// refused the association).
    #[error("association rejected")]
    Rejected,

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// The session controller. Shared across handlers behind an `Arc`; the
/// driver lock is held only for individual driver calls, never across a
/// poll sleep, so status queries stay responsive during a connect attempt.
pub struct WifiSession {
    driver: Mutex<Box<dyn WifiDriver>>,
    ap_state: RwLock<ApState>,
    sta_state: RwLock<StaState>,
}

impl WifiSession {
    pub fn new(driver: Box<dyn WifiDriver>) -> Self {
        Self {
            driver: Mutex::new(driver),
            ap_state: RwLock::new(ApState::Idle),
            sta_state: RwLock::new(StaState::Disconnected),
        }
    }

    /// Bring up the soft AP if the settings enable it.
    pub async fn start_access_point(&self, settings: &Settings) -> Result<(), DriverError> {
        if !settings.ap_mode_enabled() {
            info!("AP mode disabled; not starting access point");
            return Ok(());
        }

        *self.ap_state.write().await = ApState::Starting;
        let config = ApConfig::from_settings(settings);
        {
            let mut driver = self.driver.lock().await;
            driver.start_access_point(&config)?;
        }
        *self.ap_state.write().await = ApState::Active;
        info!(ssid = %config.ssid, gateway = %config.gateway(), "access point active");
        Ok(())
    }

    /// Attempt to join a network, polling the driver until the link is up,
    /// the driver reports a rejection, or the poll budget runs out.
    pub async fn connect(&self, ssid: &str, password: &str) -> Result<LinkInfo, ConnectError> {
        {
            let mut driver = self.driver.lock().await;
            driver.begin_connect(ssid, password)?;
        }
        *self.sta_state.write().await = StaState::Connecting;
        info!(ssid, "connecting to network");

        for attempt in 1..=CONNECT_MAX_POLLS {
            tokio::time::sleep(CONNECT_POLL_INTERVAL).await;
            let status = {
                let mut driver = self.driver.lock().await;
                driver.poll_link()
            };
            match status {
                LinkStatus::Connected(link) => {
                    *self.sta_state.write().await = StaState::Connected;
                    info!(ssid, ip = %link.ip, rssi = link.rssi, "connected");
                    return Ok(link);
                }
                LinkStatus::Failed => {
                    *self.sta_state.write().await = StaState::Failed;
                    warn!(ssid, attempt, "association rejected");
                    return Err(ConnectError::Rejected);
                }
                LinkStatus::Connecting | LinkStatus::Idle => {}
            }
        }

        *self.sta_state.write().await = StaState::Failed;
        warn!(ssid, polls = CONNECT_MAX_POLLS, "connect attempt timed out");
        Err(ConnectError::Timeout {
            attempts: CONNECT_MAX_POLLS,
        })
    }

    /// Drop the station link.
    pub async fn disconnect(&self) -> Result<(), DriverError> {
        {
            let mut driver = self.driver.lock().await;
            driver.disconnect()?;
        }
        *self.sta_state.write().await = StaState::Disconnected;
        info!("disconnected from network");
        Ok(())
    }

    pub async fn scan(&self) -> Result<Vec<NetworkEntry>, DriverError> {
        let mut driver = self.driver.lock().await;
        driver.scan()
    }

    /// Current link status straight from the driver.
    pub async fn link_status(&self) -> LinkStatus {
        let mut driver = self.driver.lock().await;
        driver.poll_link()
    }

    /// Stations currently associated with the soft AP.
    pub async fn stations(&self) -> Vec<StationInfo> {
        let mut driver = self.driver.lock().await;
        driver.stations()
    }

    pub async fn ap_state(&self) -> ApState {
        *self.ap_state.read().await
    }

    pub async fn sta_state(&self) -> StaState {
        *self.sta_state.read().await
    }
}
