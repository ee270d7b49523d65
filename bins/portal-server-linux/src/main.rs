use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_core::{FileRegion, SettingsOrigin, SettingsStore};
use portal_protocol::Encryption;
use portal_server::{
    CommandHub, HubConfig, MockWifiDriver, WifiSession, STATION_REFRESH_INTERVAL,
};
use portal_web::{create_router, AppState, ControlEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,portal_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("WiFi portal server starting...");

    let http_addr: SocketAddr = "0.0.0.0:8080".parse()?;
    let hub_addr: SocketAddr = "0.0.0.0:8081".parse()?;

    // Settings live in a file-backed EEPROM region.
    let region_path =
        std::env::var("PORTAL_EEPROM_PATH").unwrap_or_else(|_| "portal-eeprom.bin".into());
    let store = SettingsStore::new(Box::new(FileRegion::new(&region_path)));
    let (settings, origin) = store.load()?;
    match &origin {
        SettingsOrigin::Stored => {
            tracing::info!("settings loaded from {}", region_path);
        }
        SettingsOrigin::FactoryDefault(reason) => {
            tracing::warn!("using factory defaults ({})", reason);
        }
    }

    // The Linux build runs against the mock driver; real hardware backends
    // are platform-specific and wired in their own binaries.
    let driver = MockWifiDriver::new()
        .with_network("HomeNet", -58, Encryption::Wpa2, "hunter22")
        .with_network("CafeGuest", -74, Encryption::Open, "")
        .with_network("Warehouse-IoT", -81, Encryption::Wpa2, "forklift")
        .with_station(Ipv4Addr::new(192, 168, 4, 2), "02:00:00:00:00:01")
        .with_station(Ipv4Addr::new(192, 168, 4, 3), "02:00:00:00:00:02");

    let session = Arc::new(WifiSession::new(Box::new(driver)));
    session.start_access_point(&settings).await?;

    // Reconnect with stored credentials, off the critical path.
    if settings.has_station_credentials() {
        let session = session.clone();
        let ssid = settings.sta_ssid().to_string();
        let password = settings.sta_password().to_string();
        tokio::spawn(async move {
            if let Err(e) = session.connect(&ssid, &password).await {
                tracing::warn!(ssid, "stored-credential connect failed: {}", e);
            }
        });
    }

    let (state, mut control_rx) = AppState::new(store, settings, session.clone());

    // Command hub: an echo-style command channel plus a periodic broadcast
    // of the station count.
    let station_count = Arc::new(AtomicUsize::new(0));
    let mut hub = CommandHub::new(HubConfig {
        bind_addr: hub_addr,
        ..Default::default()
    });
    hub.on_command("/ws", |command| Some(format!("ack: {}", command)));
    {
        let handle = hub.handle();
        let station_count = station_count.clone();
        hub.on_loop("/ws", move || {
            let count = station_count.load(Ordering::Relaxed);
            handle.broadcast(format!("stations: {}", count));
        });
    }

    let hub_handle = tokio::spawn(async move {
        if let Err(e) = hub.run().await {
            tracing::error!("command hub error: {}", e);
        }
    });

    // Station-list refresh on the usual cadence.
    {
        let state = state.clone();
        let session = session.clone();
        let station_count = station_count.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STATION_REFRESH_INTERVAL);
            loop {
                ticker.tick().await;
                let stations = session.stations().await;
                station_count.store(stations.len(), Ordering::Relaxed);
                let mut registry = state.registry.lock().await;
                let dropped = registry.rebuild(&stations);
                if dropped > 0 {
                    tracing::debug!(dropped, "station list truncated to registry capacity");
                }
            }
        });
    }

    // HTTP API server.
    let app = create_router(state);
    let http_handle = tokio::spawn(async move {
        match tokio::net::TcpListener::bind(http_addr).await {
            Ok(listener) => {
                tracing::info!("HTTP server listening on {}", http_addr);
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!("HTTP server error: {}", e);
                }
            }
            Err(e) => tracing::error!("failed to bind {}: {}", http_addr, e),
        }
    });

    tracing::info!("WiFi portal ready");
    tracing::info!("   HTTP API:    http://localhost:8080/api/settings");
    tracing::info!("   Command hub: ws://localhost:8081/ws");

    // Wait for shutdown
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        event = control_rx.recv() => {
            if let Some(ControlEvent::Restart) = event {
                tracing::info!("restart requested; exiting for the supervisor to relaunch");
            }
        }
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = hub_handle => {
            tracing::warn!("command hub stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
