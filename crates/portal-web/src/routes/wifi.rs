//! WiFi routes: scan, connect, disconnect, status.
//!
//! Connect persists the credentials before attempting the link, the way
//! the firmware always has — a power cycle right after the request still
//! knows the network. The bounded connect attempt itself runs as a
//! background task; its outcome is logged and observable through
//! `/api/wifi-status` once the link is up.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::{error, warn};

use portal_core::decode;
use portal_protocol::{ErrorResponse, ScanResponse, StatusResponse, WifiStatusResponse};
use portal_server::LinkStatus;

use crate::SharedState;

/// GET /api/wifi-scan
pub async fn scan(State(state): State<SharedState>) -> Response {
    match state.session.scan().await {
        Ok(networks) => (StatusCode::OK, Json(ScanResponse { networks })).into_response(),
        Err(e) => {
            error!("wifi scan failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/wifi-connect
pub async fn connect(State(state): State<SharedState>, body: String) -> Response {
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::no_data())).into_response();
    }

    let request = match decode::connect_request(&body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response();
        }
    };

    let next = {
        let current = state.settings.read().await;
        match current.with_station_credentials(&request.ssid, &request.password) {
            Ok(next) => next,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(e.to_string())),
                )
                    .into_response();
            }
        }
    };
    if let Err(e) = state.commit_settings(next).await {
        error!("failed to persist station credentials: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response();
    }

    let session = state.session.clone();
    tokio::spawn(async move {
        if let Err(e) = session.connect(&request.ssid, &request.password).await {
            warn!(ssid = %request.ssid, "connect attempt failed: {}", e);
        }
    });

    (StatusCode::OK, Json(StatusResponse::connecting())).into_response()
}

/// POST /api/wifi-disconnect
///
/// Also clears the stored station credentials and turns client mode off:
/// the next boot will not try to reconnect.
pub async fn disconnect(State(state): State<SharedState>) -> Response {
    if let Err(e) = state.session.disconnect().await {
        error!("wifi disconnect failed: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response();
    }

    let next = {
        let current = state.settings.read().await;
        current.without_station_credentials()
    };
    match state.commit_settings(next).await {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::disconnected())).into_response(),
        Err(e) => {
            error!("failed to clear station credentials: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /api/wifi-status
pub async fn status(State(state): State<SharedState>) -> Json<WifiStatusResponse> {
    match state.session.link_status().await {
        LinkStatus::Connected(link) => {
            Json(WifiStatusResponse::connected(link.ssid, link.ip, link.rssi))
        }
        _ => Json(WifiStatusResponse::disconnected()),
    }
}
