//! Typed decoders for the configuration request bodies.
//!
//! Each decoder runs the flat-JSON scanner over the body and maps the
//! recognized keys into a typed request. Unrecognized keys are ignored (the
//! UI has always been free to send extras); a recognized key carrying the
//! wrong value type rejects the payload.

use thiserror::Error;

use crate::flatjson::{scan_object, Scalar, ScanError};
use crate::settings::{SettingsError, SettingsPatch};

/// Errors produced while decoding a request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("field {key} has the wrong type")]
    TypeMismatch { key: &'static str },

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

/// Body of `POST /api/wifi-connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub ssid: String,
    /// Empty for open networks.
    pub password: String,
}

/// Body of `POST /api/device-info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfoUpdate {
    pub mac: String,
    pub device_name: String,
    pub device_comment: String,
}

/// Decode a settings patch from `POST /api/settings`.
///
/// Only the keys the settings endpoint has ever accepted are mapped;
/// station credentials in particular are not settable here. The subnet is
/// range-checked during decoding so an out-of-range document never reaches
/// the settings value.
pub fn settings_patch(body: &str) -> Result<SettingsPatch, DecodeError> {
    let mut patch = SettingsPatch::default();
    for (key, value) in scan_object(body)? {
        match key.as_str() {
            "ap_ssid" => patch.ap_ssid = Some(expect_str("ap_ssid", value)?),
            "ap_password" => patch.ap_password = Some(expect_str("ap_password", value)?),
            "device_name" => patch.device_name = Some(expect_str("device_name", value)?),
            "device_comment" => {
                patch.device_comment = Some(expect_str("device_comment", value)?)
            }
            "subnet" => patch.subnet = Some(expect_subnet(value)?),
            "ap_mode_enabled" => {
                patch.ap_mode_enabled = Some(expect_bool("ap_mode_enabled", value)?)
            }
            "client_mode_enabled" => {
                patch.client_mode_enabled = Some(expect_bool("client_mode_enabled", value)?)
            }
            _ => {} // unknown keys are ignored
        }
    }
    Ok(patch)
}

/// Decode the body of `POST /api/wifi-connect`.
pub fn connect_request(body: &str) -> Result<ConnectRequest, DecodeError> {
    let mut ssid = None;
    let mut password = None;
    for (key, value) in scan_object(body)? {
        match key.as_str() {
            "ssid" => ssid = Some(expect_str("ssid", value)?),
            "password" => password = Some(expect_str("password", value)?),
            _ => {}
        }
    }
    Ok(ConnectRequest {
        ssid: ssid.ok_or(DecodeError::MissingField("ssid"))?,
        password: password.unwrap_or_default(),
    })
}

/// Decode the body of `POST /api/device-info`.
pub fn device_info(body: &str) -> Result<DeviceInfoUpdate, DecodeError> {
    let mut mac = None;
    let mut device_name = None;
    let mut device_comment = None;
    for (key, value) in scan_object(body)? {
        match key.as_str() {
            "mac" => mac = Some(expect_str("mac", value)?),
            "device_name" => device_name = Some(expect_str("device_name", value)?),
            "device_comment" => device_comment = Some(expect_str("device_comment", value)?),
            _ => {}
        }
    }
    Ok(DeviceInfoUpdate {
        mac: mac.ok_or(DecodeError::MissingField("mac"))?,
        device_name: device_name.unwrap_or_default(),
        device_comment: device_comment.unwrap_or_default(),
    })
}

fn expect_str(key: &'static str, value: Scalar) -> Result<String, DecodeError> {
    match value {
        Scalar::Str(s) => Ok(s),
        _ => Err(DecodeError::TypeMismatch { key }),
    }
}

fn expect_bool(key: &'static str, value: Scalar) -> Result<bool, DecodeError> {
    match value {
        Scalar::Bool(b) => Ok(b),
        _ => Err(DecodeError::TypeMismatch { key }),
    }
}

fn expect_subnet(value: Scalar) -> Result<u8, DecodeError> {
    match value {
        Scalar::Int(n) if (1..=255).contains(&n) => Ok(n as u8),
        Scalar::Int(n) => Err(SettingsError::SubnetOutOfRange(n).into()),
        _ => Err(DecodeError::TypeMismatch { key: "subnet" }),
    }
}
