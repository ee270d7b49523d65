//! Settings routes.
//!
//! # Endpoints
//!
//! ### `GET /api/settings`
//! Returns the current settings, excluding the station password.
//!
//! ### `POST /api/settings`
//! Applies a flat-JSON patch. A missing body is a 400 with the fixed
//! `{"error":"No data"}` document; a malformed or invalid body rejects the
//! whole payload and leaves the stored settings untouched.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::{error, info};

use portal_core::decode;
use portal_protocol::{ErrorResponse, SettingsView, StatusResponse};

use crate::SharedState;

/// GET /api/settings
pub async fn get_settings(State(state): State<SharedState>) -> Json<SettingsView> {
    let settings = state.settings.read().await;
    Json(SettingsView::from(&*settings))
}

/// POST /api/settings
pub async fn post_settings(State(state): State<SharedState>, body: String) -> Response {
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::no_data())).into_response();
    }

    let patch = match decode::settings_patch(&body) {
        Ok(patch) => patch,
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
        match current.with_patch(&patch) {
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

    match state.commit_settings(next).await {
        Ok(()) => {
            info!("settings updated");
            (StatusCode::OK, Json(StatusResponse::ok())).into_response()
        }
        Err(e) => {
            error!("failed to persist settings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}
