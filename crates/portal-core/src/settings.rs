//! Device settings value object.
//!
//! [`Settings`] is the single persisted configuration record: access point
//! credentials, device identity, the AP subnet octet and the two mode
//! toggles. The record is immutable — every accepted write builds a new
//! value from the old one plus a validated [`SettingsPatch`], so a rejected
//! update never leaves the record half-applied.
//!
//! Station credentials are deliberately not part of the patch: they are
//! only set by the connect endpoint and cleared by the disconnect endpoint,
//! through the dedicated constructors below.

use thiserror::Error;

/// Maximum lengths (in bytes of UTF-8) for the bounded string fields.
///
/// These match the NUL-terminated slots of the persisted blob layout in
/// [`crate::blob`]: a 32-byte slot holds at most 31 bytes of content.
pub const AP_SSID_MAX: usize = 31;
pub const AP_PASSWORD_MAX: usize = 31;
pub const DEVICE_NAME_MAX: usize = 31;
pub const DEVICE_COMMENT_MAX: usize = 63;
pub const STA_SSID_MAX: usize = 31;
pub const STA_PASSWORD_MAX: usize = 31;

/// The AP network is 192.168.`subnet`.1/24; the octet must stay in 1..=255.
pub const SUBNET_MIN: u8 = 1;
pub const SUBNET_DEFAULT: u8 = 4;

/// Validation errors for settings updates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{field} exceeds {max} bytes (got {len})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("access point SSID cannot be empty")]
    EmptyApSsid,

    #[error("station SSID cannot be empty")]
    EmptyStaSsid,

    #[error("subnet {0} outside 1..=255")]
    SubnetOutOfRange(i64),
}

/// The persisted device configuration.
///
/// Fields are private; reads go through the accessors and writes through
/// [`Settings::with_patch`], [`Settings::with_station_credentials`] and
/// [`Settings::without_station_credentials`], which validate before
/// constructing the replacement value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub(crate) ap_ssid: String,
    pub(crate) ap_password: String,
    pub(crate) device_name: String,
    pub(crate) device_comment: String,
    pub(crate) subnet: u8,
    pub(crate) ap_mode_enabled: bool,
    pub(crate) client_mode_enabled: bool,
    pub(crate) sta_ssid: String,
    pub(crate) sta_password: String,
}

impl Default for Settings {
    /// Compiled-in factory defaults.
    fn default() -> Self {
        Self {
            ap_ssid: "VR_APP_ESP".to_string(),
            ap_password: "12345678".to_string(),
            device_name: "ESP8266_Device".to_string(),
            device_comment: "Default Comment".to_string(),
            subnet: SUBNET_DEFAULT,
            ap_mode_enabled: true,
            client_mode_enabled: false,
            sta_ssid: String::new(),
            sta_password: String::new(),
        }
    }
}

impl Settings {
    pub fn ap_ssid(&self) -> &str {
        &self.ap_ssid
    }

    pub fn ap_password(&self) -> &str {
        &self.ap_password
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn device_comment(&self) -> &str {
        &self.device_comment
    }

    pub fn subnet(&self) -> u8 {
        self.subnet
    }

    pub fn ap_mode_enabled(&self) -> bool {
        self.ap_mode_enabled
    }

    pub fn client_mode_enabled(&self) -> bool {
        self.client_mode_enabled
    }

    pub fn sta_ssid(&self) -> &str {
        &self.sta_ssid
    }

    pub fn sta_password(&self) -> &str {
        &self.sta_password
    }

    /// True when station mode should be attempted at boot.
    pub fn has_station_credentials(&self) -> bool {
        self.client_mode_enabled && !self.sta_ssid.is_empty()
    }

    /// Build the replacement settings value for a validated patch.
    ///
    /// Every field in the patch is validated before anything is applied;
    /// on error `self` is untouched and no partial state escapes.
    pub fn with_patch(&self, patch: &SettingsPatch) -> Result<Settings, SettingsError> {
        if let Some(ap_ssid) = &patch.ap_ssid {
            if ap_ssid.is_empty() {
                return Err(SettingsError::EmptyApSsid);
            }
            check_len("ap_ssid", ap_ssid, AP_SSID_MAX)?;
        }
        if let Some(ap_password) = &patch.ap_password {
            check_len("ap_password", ap_password, AP_PASSWORD_MAX)?;
        }
        if let Some(device_name) = &patch.device_name {
            check_len("device_name", device_name, DEVICE_NAME_MAX)?;
        }
        if let Some(device_comment) = &patch.device_comment {
            check_len("device_comment", device_comment, DEVICE_COMMENT_MAX)?;
        }
        if let Some(subnet) = patch.subnet {
            if subnet < SUBNET_MIN {
                return Err(SettingsError::SubnetOutOfRange(subnet as i64));
            }
        }

        let mut next = self.clone();
        if let Some(ap_ssid) = &patch.ap_ssid {
            next.ap_ssid = ap_ssid.clone();
        }
        if let Some(ap_password) = &patch.ap_password {
            next.ap_password = ap_password.clone();
        }
        if let Some(device_name) = &patch.device_name {
            next.device_name = device_name.clone();
        }
        if let Some(device_comment) = &patch.device_comment {
            next.device_comment = device_comment.clone();
        }
        if let Some(subnet) = patch.subnet {
            next.subnet = subnet;
        }
        if let Some(ap_mode_enabled) = patch.ap_mode_enabled {
            next.ap_mode_enabled = ap_mode_enabled;
        }
        if let Some(client_mode_enabled) = patch.client_mode_enabled {
            next.client_mode_enabled = client_mode_enabled;
        }
        Ok(next)
    }

    /// Store station credentials and enable client mode.
    ///
    /// An empty password means an open network.
    pub fn with_station_credentials(
        &self,
        ssid: &str,
        password: &str,
    ) -> Result<Settings, SettingsError> {
        if ssid.is_empty() {
            return Err(SettingsError::EmptyStaSsid);
        }
        check_len("sta_ssid", ssid, STA_SSID_MAX)?;
        check_len("sta_password", password, STA_PASSWORD_MAX)?;

        let mut next = self.clone();
        next.sta_ssid = ssid.to_string();
        next.sta_password = password.to_string();
        next.client_mode_enabled = true;
        Ok(next)
    }

    /// Clear station credentials and disable client mode.
    ///
    /// After this value is persisted the next boot will not attempt to
    /// reconnect; the caller must provide fresh credentials.
    pub fn without_station_credentials(&self) -> Settings {
        let mut next = self.clone();
        next.sta_ssid.clear();
        next.sta_password.clear();
        next.client_mode_enabled = false;
        next
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), SettingsError> {
    if value.len() > max {
        return Err(SettingsError::FieldTooLong {
            field,
            max,
            len: value.len(),
        });
    }
    Ok(())
}

/// A partial settings update, one `Option` per settable field.
///
/// Produced by [`crate::decode::settings_patch`]; fields left `None` are
/// carried over unchanged from the current settings value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub ap_ssid: Option<String>,
    pub ap_password: Option<String>,
    pub device_name: Option<String>,
    pub device_comment: Option<String>,
    pub subnet: Option<u8>,
    pub ap_mode_enabled: Option<bool>,
    pub client_mode_enabled: Option<bool>,
}

impl SettingsPatch {
    /// True when the patch mentions no field at all.
    pub fn is_empty(&self) -> bool {
        self.ap_ssid.is_none()
            && self.ap_password.is_none()
            && self.device_name.is_none()
            && self.device_comment.is_none()
            && self.subnet.is_none()
            && self.ap_mode_enabled.is_none()
            && self.client_mode_enabled.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_factory_values() {
        let settings = Settings::default();
        assert_eq!(settings.ap_ssid(), "VR_APP_ESP");
        assert_eq!(settings.ap_password(), "12345678");
        assert_eq!(settings.device_name(), "ESP8266_Device");
        assert_eq!(settings.device_comment(), "Default Comment");
        assert_eq!(settings.subnet(), 4);
        assert!(settings.ap_mode_enabled());
        assert!(!settings.client_mode_enabled());
        assert_eq!(settings.sta_ssid(), "");
        assert_eq!(settings.sta_password(), "");
    }

    #[test]
    fn patch_applies_only_mentioned_fields() {
        let settings = Settings::default();
        let patch = SettingsPatch {
            ap_mode_enabled: Some(false),
            subnet: Some(7),
            ..Default::default()
        };

        let next = settings.with_patch(&patch).unwrap();
        assert!(!next.ap_mode_enabled());
        assert_eq!(next.subnet(), 7);
        // Unmentioned fields are carried over untouched.
        assert_eq!(next.device_name(), settings.device_name());
        assert_eq!(next.ap_ssid(), settings.ap_ssid());
    }

    #[test]
    fn overlong_field_rejects_whole_patch() {
        let settings = Settings::default();
        let patch = SettingsPatch {
            device_name: Some("x".repeat(DEVICE_NAME_MAX + 1)),
            subnet: Some(9),
            ..Default::default()
        };

        let err = settings.with_patch(&patch).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::FieldTooLong {
                field: "device_name",
                ..
            }
        ));
        // Nothing was applied, not even the valid subnet.
        assert_eq!(settings.subnet(), SUBNET_DEFAULT);
    }

    #[test]
    fn empty_ap_ssid_is_rejected() {
        let settings = Settings::default();
        let patch = SettingsPatch {
            ap_ssid: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            settings.with_patch(&patch).unwrap_err(),
            SettingsError::EmptyApSsid
        );
    }

    #[test]
    fn subnet_zero_is_rejected() {
        let settings = Settings::default();
        let patch = SettingsPatch {
            subnet: Some(0),
            ..Default::default()
        };
        assert_eq!(
            settings.with_patch(&patch).unwrap_err(),
            SettingsError::SubnetOutOfRange(0)
        );
    }

    #[test]
    fn station_credentials_enable_client_mode() {
        let settings = Settings::default();
        let next = settings.with_station_credentials("HomeNet", "hunter22").unwrap();
        assert_eq!(next.sta_ssid(), "HomeNet");
        assert_eq!(next.sta_password(), "hunter22");
        assert!(next.client_mode_enabled());
        assert!(next.has_station_credentials());

        let cleared = next.without_station_credentials();
        assert_eq!(cleared.sta_ssid(), "");
        assert_eq!(cleared.sta_password(), "");
        assert!(!cleared.client_mode_enabled());
    }

    #[test]
    fn empty_station_ssid_is_rejected() {
        let settings = Settings::default();
        assert_eq!(
            settings.with_station_credentials("", "pw").unwrap_err(),
            SettingsError::EmptyStaSsid
        );
    }
}
