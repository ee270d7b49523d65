//! Connected-device routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::debug;

use portal_core::decode;
use portal_protocol::{DeviceEntry, DevicesResponse, ErrorResponse, StatusResponse};

use crate::SharedState;

/// GET /api/connected-devices
///
/// Rebuilds the registry from the live station list on every request, the
/// same as the firmware's handler did on top of its 5-second refresh.
pub async fn connected_devices(State(state): State<SharedState>) -> Json<DevicesResponse> {
    let stations = state.session.stations().await;
    let mut registry = state.registry.lock().await;
    let dropped = registry.rebuild(&stations);
    if dropped > 0 {
        debug!(dropped, "station list truncated to registry capacity");
    }

    let devices = registry.devices().iter().map(DeviceEntry::from).collect();
    Json(DevicesResponse { devices })
}

/// POST /api/device-info
///
/// Applies a name/comment annotation keyed by MAC. The firmware replied ok
/// whether or not the MAC was currently associated; that shape is kept, and
/// the miss is only logged.
pub async fn device_info(State(state): State<SharedState>, body: String) -> Response {
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::no_data())).into_response();
    }

    let update = match decode::device_info(&body) {
        Ok(update) => update,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response();
        }
    };

    let mut registry = state.registry.lock().await;
    if !registry.annotate(&update.mac, &update.device_name, &update.device_comment) {
        debug!(mac = %update.mac, "device-info for a MAC not currently associated");
    }

    (StatusCode::OK, Json(StatusResponse::ok())).into_response()
}
