//! HTTP route handlers for the configuration portal.
//!
//! The route table matches the device's historical API surface so shipped
//! clients keep working. The embedded HTML UI the firmware used to serve is
//! intentionally not reproduced; this server is API-only.

pub mod devices;
pub mod settings;
pub mod system;
pub mod wifi;

use axum::http::{Method, StatusCode, Uri};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::SharedState;

/// Create the main Axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    // The device listing has always been served with open CORS so
    // dashboards on other hosts can poll it.
    let device_routes = Router::new()
        .route("/api/connected-devices", get(devices::connected_devices))
        .layer(CorsLayer::permissive());

    Router::new()
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::post_settings),
        )
        .route("/api/wifi-scan", get(wifi::scan))
        .route("/api/wifi-connect", post(wifi::connect))
        .route("/api/wifi-disconnect", post(wifi::disconnect))
        .route("/api/wifi-status", get(wifi::status))
        .route("/api/device-info", post(devices::device_info))
        .route("/api/clear-settings", post(system::clear_settings))
        .route("/api/restart", post(system::restart))
        .merge(device_routes)
        .fallback(not_found)
        .with_state(state)
}

/// Fallback for unknown routes, in the firmware's plain-text shape.
async fn not_found(method: Method, uri: Uri) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("File Not Found\n\nURI: {}\nMethod: {}\n", uri, method),
    )
}
