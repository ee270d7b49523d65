//! System routes: clear-settings and restart.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::{error, info};

use portal_core::Settings;
use portal_protocol::{ErrorResponse, StatusResponse};

use crate::{ControlEvent, SharedState};

/// POST /api/clear-settings
///
/// Resets the settings record to the compiled-in defaults and persists it.
pub async fn clear_settings(State(state): State<SharedState>) -> Response {
    match state.commit_settings(Settings::default()).await {
        Ok(()) => {
            info!("settings cleared to factory defaults");
            (StatusCode::OK, Json(StatusResponse::ok())).into_response()
        }
        Err(e) => {
            error!("failed to clear settings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/restart
///
/// Responds first, then emits the restart control event a second later so
/// the response reaches the client — the same ordering as the firmware's
/// reply-then-reboot.
pub async fn restart(State(state): State<SharedState>) -> Response {
    let control = state.control.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if control.send(ControlEvent::Restart).await.is_err() {
            error!("restart requested but the control channel is closed");
        }
    });

    (StatusCode::OK, Json(StatusResponse::restarting())).into_response()
}
