//! # portal-server
//!
//! WiFi session controller and WebSocket command hub for the configuration
//! portal.
//!
//! The vendor WiFi stack sits behind the [`WifiDriver`] trait; the crate
//! ships a configurable mock driver for the Linux binary and for tests.

pub mod driver;
pub mod drivers;
pub mod hub;
pub mod session;

pub use driver::{ApConfig, DriverError, LinkInfo, LinkStatus, WifiDriver};
pub use drivers::mock::MockWifiDriver;
pub use hub::{CommandHub, HubConfig, HubHandle};
pub use session::{
    ApState, ConnectError, StaState, WifiSession, CONNECT_MAX_POLLS, CONNECT_POLL_INTERVAL,
    STATION_REFRESH_INTERVAL,
};
