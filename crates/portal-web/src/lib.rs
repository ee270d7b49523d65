//! # portal-web
//!
//! HTTP configuration API for the WiFi portal.
//!
//! This crate provides the `/api` route table the device has always
//! served: settings read/write, WiFi scan/connect/disconnect/status, the
//! connected-device listing and annotation, and the clear-settings and
//! restart controls.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use portal_web::{create_router, AppState};
//!
//! let (state, control_rx) = AppState::new(store, settings, session);
//! let app = create_router(state);
//!
//! let listener = TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod routes;

// Re-exports
pub use routes::create_router;

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};

use portal_core::{DeviceRegistry, Settings, SettingsStore, StorageError};
use portal_server::WifiSession;

/// Control events the handlers emit toward the binary's main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// A user-requested restart (`POST /api/restart`).
    Restart,
}

/// Shared server state for all route handlers.
pub struct AppState {
    /// The current settings value; replaced wholesale on accepted writes.
    pub settings: RwLock<Settings>,
    /// Persistence behind the settings value.
    pub store: Mutex<SettingsStore>,
    /// WiFi session controller.
    pub session: Arc<WifiSession>,
    /// Connected-station registry.
    pub registry: Mutex<DeviceRegistry>,
    /// Channel toward the main loop.
    pub control: mpsc::Sender<ControlEvent>,
}

impl AppState {
    /// Create the shared state and the control-event receiver the binary
    /// listens on.
    pub fn new(
        store: SettingsStore,
        settings: Settings,
        session: Arc<WifiSession>,
    ) -> (SharedState, mpsc::Receiver<ControlEvent>) {
        let (control, control_rx) = mpsc::channel(4);
        let state = Arc::new(Self {
            settings: RwLock::new(settings),
            store: Mutex::new(store),
            session,
            registry: Mutex::new(DeviceRegistry::new()),
            control,
        });
        (state, control_rx)
    }

    /// Persist a new settings value, then publish it.
    ///
    /// The store write happens first: if it fails the in-memory value stays
    /// on the old generation and the caller reports the error.
    pub async fn commit_settings(&self, next: Settings) -> Result<(), StorageError> {
        self.store.lock().await.save(&next)?;
        *self.settings.write().await = next;
        Ok(())
    }
}

/// Type alias for shared state in Axum handlers.
pub type SharedState = Arc<AppState>;
