//! Integration tests for the HTTP configuration API.
//!
//! Each test drives the full router with `tower::ServiceExt::oneshot`
//! against an in-memory EEPROM region and the mock WiFi driver.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use portal_core::{MemoryRegion, SettingsOrigin, SettingsStore};
use portal_protocol::Encryption;
use portal_server::{MockWifiDriver, WifiSession};
use portal_web::{create_router, AppState, ControlEvent, SharedState};

fn mock_driver() -> MockWifiDriver {
    let mut driver = MockWifiDriver::new()
        .with_network("HomeNet", -58, Encryption::Wpa2, "hunter22")
        .with_network("CafeGuest", -74, Encryption::Open, "");
    for n in 0..12u8 {
        driver = driver.with_station(
            Ipv4Addr::new(192, 168, 4, n + 2),
            &format!("02:00:00:00:00:{:02X}", n),
        );
    }
    driver
}

fn build_app() -> (
    Router,
    SharedState,
    tokio::sync::mpsc::Receiver<ControlEvent>,
) {
    let store = SettingsStore::new(Box::new(MemoryRegion::new()));
    let (settings, _) = store.load().unwrap();
    let session = Arc::new(WifiSession::new(Box::new(mock_driver())));
    let (state, control_rx) = AppState::new(store, settings, session);
    (create_router(state.clone()), state, control_rx)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn get_settings_serves_all_fields_but_the_station_password() {
    let (app, _state, _rx) = build_app();
    let (status, json) = get(&app, "/api/settings").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ap_ssid"], "VR_APP_ESP");
    assert_eq!(json["ap_password"], "12345678");
    assert_eq!(json["device_name"], "ESP8266_Device");
    assert_eq!(json["subnet"], 4);
    assert_eq!(json["ap_mode_enabled"], true);
    assert_eq!(json["client_mode_enabled"], false);
    assert_eq!(json["sta_ssid"], "");
    assert!(json.get("sta_password").is_none());
}

#[tokio::test]
async fn post_settings_applies_partial_patch_and_persists() {
    let (app, state, _rx) = build_app();

    let (status, json) = post(
        &app,
        "/api/settings",
        r#"{"ap_mode_enabled":true,"subnet":7}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    let (_, settings) = get(&app, "/api/settings").await;
    assert_eq!(settings["subnet"], 7);
    // Unmentioned fields stay untouched.
    assert_eq!(settings["device_name"], "ESP8266_Device");

    // And the new value made it into storage.
    let store = state.store.lock().await;
    let (stored, origin) = store.load().unwrap();
    assert_eq!(origin, SettingsOrigin::Stored);
    assert_eq!(stored.subnet(), 7);
}

#[tokio::test]
async fn post_settings_without_body_is_a_400() {
    let (app, _state, _rx) = build_app();
    let (status, json) = post(&app, "/api/settings", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No data");
}

#[tokio::test]
async fn malformed_settings_body_changes_nothing() {
    let (app, state, _rx) = build_app();

    let (status, _) = post(&app, "/api/settings", r#"{"subnet":7,"device_name":"x"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The whole payload was rejected, including the well-formed prefix.
    assert_eq!(state.settings.read().await.subnet(), 4);
}

#[tokio::test]
async fn out_of_range_subnet_is_rejected() {
    let (app, state, _rx) = build_app();
    let (status, _) = post(&app, "/api/settings", r#"{"subnet":300}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.settings.read().await.subnet(), 4);
}

#[tokio::test]
async fn wifi_connect_without_body_leaves_credentials_unchanged() {
    let (app, state, _rx) = build_app();

    let (status, json) = post(&app, "/api/wifi-connect", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No data");

    let settings = state.settings.read().await;
    assert_eq!(settings.sta_ssid(), "");
    assert!(!settings.client_mode_enabled());

    let store = state.store.lock().await;
    let (_, origin) = store.load().unwrap();
    // Nothing was ever written.
    assert!(matches!(origin, SettingsOrigin::FactoryDefault(_)));
}

#[tokio::test]
async fn wifi_connect_persists_credentials_and_reports_connecting() {
    let (app, state, _rx) = build_app();

    let (status, json) = post(
        &app,
        "/api/wifi-connect",
        r#"{"ssid":"HomeNet","password":"hunter22"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "connecting");

    // Credentials were persisted before the attempt resolved.
    let settings = state.settings.read().await;
    assert_eq!(settings.sta_ssid(), "HomeNet");
    assert_eq!(settings.sta_password(), "hunter22");
    assert!(settings.client_mode_enabled());
}

#[tokio::test]
async fn wifi_status_starts_disconnected() {
    let (app, _state, _rx) = build_app();
    let (status, json) = get(&app, "/api/wifi-status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"connected": false}));
}

#[tokio::test]
async fn wifi_scan_lists_networks() {
    let (app, _state, _rx) = build_app();
    let (status, json) = get(&app, "/api/wifi-scan").await;

    assert_eq!(status, StatusCode::OK);
    let networks = json["networks"].as_array().unwrap();
    assert_eq!(networks.len(), 2);
    assert_eq!(networks[0]["ssid"], "HomeNet");
    assert_eq!(networks[1]["encryption"], "open");
}

#[tokio::test]
async fn wifi_disconnect_clears_stored_credentials() {
    let (app, state, _rx) = build_app();

    let _ = post(
        &app,
        "/api/wifi-connect",
        r#"{"ssid":"HomeNet","password":"hunter22"}"#,
    )
    .await;

    let (status, json) = post(&app, "/api/wifi-disconnect", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "disconnected");

    let settings = state.settings.read().await;
    assert_eq!(settings.sta_ssid(), "");
    assert_eq!(settings.sta_password(), "");
    assert!(!settings.client_mode_enabled());
}

#[tokio::test]
async fn connected_devices_never_exceed_capacity() {
    let (app, _state, _rx) = build_app();
    let (status, json) = get(&app, "/api/connected-devices").await;

    assert_eq!(status, StatusCode::OK);
    // The mock driver reports 12 stations; the registry caps at 10.
    let devices = json["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 10);
    assert_eq!(devices[0]["ip"], "192.168.4.2");
    assert_eq!(devices[0]["mac"], "02:00:00:00:00:00");
    assert_eq!(devices[0]["device_name"], "");
}

#[tokio::test]
async fn device_info_annotation_survives_list_refresh() {
    let (app, _state, _rx) = build_app();

    // Populate the registry first, as a UI would by loading the list.
    let _ = get(&app, "/api/connected-devices").await;

    let (status, json) = post(
        &app,
        "/api/device-info",
        r#"{"mac":"02:00:00:00:00:03","device_name":"printer","device_comment":"upstairs"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    // The next listing rebuilds from the station list; the annotation must
    // still be attached.
    let (_, json) = get(&app, "/api/connected-devices").await;
    let devices = json["devices"].as_array().unwrap();
    let annotated = devices
        .iter()
        .find(|d| d["mac"] == "02:00:00:00:00:03")
        .unwrap();
    assert_eq!(annotated["device_name"], "printer");
    assert_eq!(annotated["device_comment"], "upstairs");
}

#[tokio::test]
async fn device_info_without_body_is_a_400() {
    let (app, _state, _rx) = build_app();
    let (status, json) = post(&app, "/api/device-info", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No data");
}

#[tokio::test]
async fn clear_settings_restores_factory_defaults() {
    let (app, state, _rx) = build_app();

    let _ = post(&app, "/api/settings", r#"{"device_name":"bench"}"#).await;
    let (status, json) = post(&app, "/api/clear-settings", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    let settings = state.settings.read().await;
    assert_eq!(settings.device_name(), "ESP8266_Device");

    let store = state.store.lock().await;
    let (stored, origin) = store.load().unwrap();
    assert_eq!(origin, SettingsOrigin::Stored);
    assert_eq!(stored.device_name(), "ESP8266_Device");
}

#[tokio::test]
async fn restart_replies_then_emits_the_control_event() {
    let (app, _state, mut control_rx) = build_app();

    let (status, json) = post(&app, "/api/restart", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "restarting");

    // The event is delayed a second so the response flushes first.
    let event = tokio::time::timeout(Duration::from_secs(3), control_rx.recv())
        .await
        .expect("control event should arrive")
        .expect("channel should stay open");
    assert_eq!(event, ControlEvent::Restart);
}

#[tokio::test]
async fn unknown_route_is_a_plain_404() {
    let (app, _state, _rx) = build_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("File Not Found"));
    assert!(text.contains("/api/nope"));
}
