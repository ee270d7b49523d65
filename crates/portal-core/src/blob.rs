//! Persisted settings blob.
//!
//! The settings record is stored as a fixed 256-byte blob at offset 0 of
//! the EEPROM region. The blob carries a magic, a format version and a
//! trailing CRC-32 so a torn write or a foreign layout falls back to the
//! compiled-in defaults instead of decoding into garbage.
//!
//! Layout:
//!
//! ```text
//! 0..4     magic "WPCF"
//! 4        format version (u8)
//! 5        flags (bit0 = AP mode, bit1 = client mode)
//! 6        subnet octet
//! 7        reserved
//! 8..40    ap_ssid        (NUL-padded)
//! 40..72   ap_password    (NUL-padded)
//! 72..104  device_name    (NUL-padded)
//! 104..168 device_comment (NUL-padded)
//! 168..200 sta_ssid       (NUL-padded)
//! 200..232 sta_password   (NUL-padded)
//! 232..252 reserved
//! 252..256 crc32 (u32 LE) over 0..252
//! ```

use thiserror::Error;

use crate::settings::{Settings, SUBNET_DEFAULT, SUBNET_MIN};

pub const SETTINGS_BLOB_LEN: usize = 256;
pub const BLOB_FORMAT_VERSION: u8 = 1;

const MAGIC: [u8; 4] = *b"WPCF";

const OFF_MAGIC: usize = 0;
const OFF_VERSION: usize = 4;
const OFF_FLAGS: usize = 5;
const OFF_SUBNET: usize = 6;
const OFF_AP_SSID: usize = 8;
const OFF_AP_PASSWORD: usize = 40;
const OFF_DEVICE_NAME: usize = 72;
const OFF_DEVICE_COMMENT: usize = 104;
const OFF_STA_SSID: usize = 168;
const OFF_STA_PASSWORD: usize = 200;
const OFF_CRC: usize = SETTINGS_BLOB_LEN - 4;

const SLOT_SHORT: usize = 32;
const SLOT_LONG: usize = 64;

const FLAG_AP_MODE: u8 = 1 << 0;
const FLAG_CLIENT_MODE: u8 = 1 << 1;

/// Reasons a stored blob cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    #[error("settings blob magic mismatch")]
    BadMagic,

    #[error("unsupported settings blob version {0}")]
    UnsupportedVersion(u8),

    #[error("settings blob CRC mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    CrcMismatch { stored: u32, computed: u32 },

    #[error("settings blob field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}

/// Serialize settings into the fixed blob layout.
pub fn serialize_settings(settings: &Settings) -> [u8; SETTINGS_BLOB_LEN] {
    let mut out = [0u8; SETTINGS_BLOB_LEN];
    out[OFF_MAGIC..OFF_MAGIC + 4].copy_from_slice(&MAGIC);
    out[OFF_VERSION] = BLOB_FORMAT_VERSION;

    let mut flags = 0u8;
    if settings.ap_mode_enabled {
        flags |= FLAG_AP_MODE;
    }
    if settings.client_mode_enabled {
        flags |= FLAG_CLIENT_MODE;
    }
    out[OFF_FLAGS] = flags;
    out[OFF_SUBNET] = settings.subnet;

    put_str(&mut out, OFF_AP_SSID, SLOT_SHORT, &settings.ap_ssid);
    put_str(&mut out, OFF_AP_PASSWORD, SLOT_SHORT, &settings.ap_password);
    put_str(&mut out, OFF_DEVICE_NAME, SLOT_SHORT, &settings.device_name);
    put_str(&mut out, OFF_DEVICE_COMMENT, SLOT_LONG, &settings.device_comment);
    put_str(&mut out, OFF_STA_SSID, SLOT_SHORT, &settings.sta_ssid);
    put_str(&mut out, OFF_STA_PASSWORD, SLOT_SHORT, &settings.sta_password);

    let crc = crc32_ieee(&out[..OFF_CRC]);
    out[OFF_CRC..].copy_from_slice(&crc.to_le_bytes());
    out
}

/// Deserialize settings from the fixed blob layout.
///
/// A stored subnet of 0 — the only encoding of the 1..=255 invariant a byte
/// slot can violate — is silently normalized to the default.
pub fn deserialize_settings(bytes: &[u8; SETTINGS_BLOB_LEN]) -> Result<Settings, BlobError> {
    if bytes[OFF_MAGIC..OFF_MAGIC + 4] != MAGIC {
        return Err(BlobError::BadMagic);
    }
    let version = bytes[OFF_VERSION];
    if version != BLOB_FORMAT_VERSION {
        return Err(BlobError::UnsupportedVersion(version));
    }

    let stored = u32::from_le_bytes(bytes[OFF_CRC..].try_into().unwrap());
    let computed = crc32_ieee(&bytes[..OFF_CRC]);
    if stored != computed {
        return Err(BlobError::CrcMismatch { stored, computed });
    }

    let flags = bytes[OFF_FLAGS];
    let subnet = if bytes[OFF_SUBNET] < SUBNET_MIN {
        SUBNET_DEFAULT
    } else {
        bytes[OFF_SUBNET]
    };

    Ok(Settings {
        ap_ssid: get_str(bytes, OFF_AP_SSID, SLOT_SHORT, "ap_ssid")?,
        ap_password: get_str(bytes, OFF_AP_PASSWORD, SLOT_SHORT, "ap_password")?,
        device_name: get_str(bytes, OFF_DEVICE_NAME, SLOT_SHORT, "device_name")?,
        device_comment: get_str(bytes, OFF_DEVICE_COMMENT, SLOT_LONG, "device_comment")?,
        subnet,
        ap_mode_enabled: flags & FLAG_AP_MODE != 0,
        client_mode_enabled: flags & FLAG_CLIENT_MODE != 0,
        sta_ssid: get_str(bytes, OFF_STA_SSID, SLOT_SHORT, "sta_ssid")?,
        sta_password: get_str(bytes, OFF_STA_PASSWORD, SLOT_SHORT, "sta_password")?,
    })
}

/// Write a string into its NUL-padded slot. Settings invariants keep every
/// field at least one byte shorter than its slot.
fn put_str(out: &mut [u8], offset: usize, slot: usize, value: &str) {
    let bytes = value.as_bytes();
    debug_assert!(bytes.len() < slot);
    let len = bytes.len().min(slot - 1);
    out[offset..offset + len].copy_from_slice(&bytes[..len]);
    for b in &mut out[offset + len..offset + slot] {
        *b = 0;
    }
}

/// Read a NUL-padded slot back into a string.
fn get_str(
    bytes: &[u8; SETTINGS_BLOB_LEN],
    offset: usize,
    slot: usize,
    field: &'static str,
) -> Result<String, BlobError> {
    let slice = &bytes[offset..offset + slot];
    let len = slice.iter().position(|&b| b == 0).unwrap_or(slot);
    std::str::from_utf8(&slice[..len])
        .map(str::to_string)
        .map_err(|_| BlobError::InvalidUtf8(field))
}

/// CRC-32 (IEEE 802.3, reflected, bitwise).
pub fn crc32_ieee(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in bytes {
        crc ^= b as u32;
        for _ in 0..8 {
            let mask = 0u32.wrapping_sub(crc & 1);
            crc = (crc >> 1) ^ (0xEDB8_8320u32 & mask);
        }
    }
    !crc
}
