//! EEPROM-region storage.
//!
//! This module provides the storage abstraction for the settings record:
//! a fixed 512-byte byte region read and written whole, the way the
//! firmware treats its emulated EEPROM. Implementations:
//! - `FileRegion` for Linux (one small file holds the region)
//! - `MemoryRegion` for tests and mock deployments
//!
//! All methods are synchronous to support embedded platforms. Async
//! wrappers can be added at the framework layer.

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::blob::{deserialize_settings, serialize_settings, BlobError, SETTINGS_BLOB_LEN};
use crate::settings::Settings;

/// Size of the emulated non-volatile region.
pub const EEPROM_REGION_LEN: usize = 512;

/// Offset of the settings blob inside the region.
pub const SETTINGS_BLOB_OFFSET: usize = 0;

/// Errors raised by region implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed: {0}")]
    Read(String),

    #[error("storage write failed: {0}")]
    Write(String),
}

/// A fixed-size non-volatile byte region, read and written whole.
pub trait EepromRegion: Send + Sync {
    fn read_region(&self) -> Result<[u8; EEPROM_REGION_LEN], StorageError>;
    fn write_region(&mut self, region: &[u8; EEPROM_REGION_LEN]) -> Result<(), StorageError>;
}

/// In-memory region for tests and mock deployments.
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    bytes: [u8; EEPROM_REGION_LEN],
}

impl Default for MemoryRegion {
    fn default() -> Self {
        Self {
            bytes: [0u8; EEPROM_REGION_LEN],
        }
    }
}

impl MemoryRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from specific region contents (e.g. a crafted blob).
    pub fn from_bytes(bytes: [u8; EEPROM_REGION_LEN]) -> Self {
        Self { bytes }
    }
}

impl EepromRegion for MemoryRegion {
    fn read_region(&self) -> Result<[u8; EEPROM_REGION_LEN], StorageError> {
        Ok(self.bytes)
    }

    fn write_region(&mut self, region: &[u8; EEPROM_REGION_LEN]) -> Result<(), StorageError> {
        self.bytes = *region;
        Ok(())
    }
}

/// File-backed region for Linux.
///
/// A missing or short file reads as an erased region (zeroes), which fails
/// the blob magic and therefore loads factory defaults — the same first-boot
/// behavior as a blank part.
#[derive(Debug, Clone)]
pub struct FileRegion {
    path: PathBuf,
}

impl FileRegion {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl EepromRegion for FileRegion {
    fn read_region(&self) -> Result<[u8; EEPROM_REGION_LEN], StorageError> {
        let mut region = [0u8; EEPROM_REGION_LEN];
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(region),
            Err(e) => return Err(StorageError::Read(e.to_string())),
        };

        let mut data = Vec::with_capacity(EEPROM_REGION_LEN);
        file.read_to_end(&mut data)
            .map_err(|e| StorageError::Read(e.to_string()))?;
        let len = data.len().min(EEPROM_REGION_LEN);
        region[..len].copy_from_slice(&data[..len]);
        Ok(region)
    }

    fn write_region(&mut self, region: &[u8; EEPROM_REGION_LEN]) -> Result<(), StorageError> {
        let mut file =
            File::create(&self.path).map_err(|e| StorageError::Write(e.to_string()))?;
        file.write_all(region)
            .map_err(|e| StorageError::Write(e.to_string()))?;
        // The firmware commits after every put; flush so a crash right after
        // an accepted mutation cannot lose it.
        file.sync_all()
            .map_err(|e| StorageError::Write(e.to_string()))
    }
}

/// Where the loaded settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsOrigin {
    /// Decoded from the stored blob.
    Stored,
    /// The blob was missing or untrustworthy; compiled-in defaults used.
    FactoryDefault(BlobError),
}

/// Settings persistence over an [`EepromRegion`].
pub struct SettingsStore {
    region: Box<dyn EepromRegion>,
}

impl SettingsStore {
    pub fn new(region: Box<dyn EepromRegion>) -> Self {
        Self { region }
    }

    /// Load the settings record, falling back to factory defaults when the
    /// stored blob cannot be trusted. Only an I/O failure is an error.
    pub fn load(&self) -> Result<(Settings, SettingsOrigin), StorageError> {
        let region = self.region.read_region()?;
        let blob: &[u8; SETTINGS_BLOB_LEN] = region
            [SETTINGS_BLOB_OFFSET..SETTINGS_BLOB_OFFSET + SETTINGS_BLOB_LEN]
            .try_into()
            .unwrap();
        match deserialize_settings(blob) {
            Ok(settings) => Ok((settings, SettingsOrigin::Stored)),
            Err(reason) => Ok((Settings::default(), SettingsOrigin::FactoryDefault(reason))),
        }
    }

    /// Persist the settings record: whole-region read-modify-write so bytes
    /// outside the blob are preserved.
    pub fn save(&mut self, settings: &Settings) -> Result<(), StorageError> {
        let mut region = self.region.read_region()?;
        let blob = serialize_settings(settings);
        region[SETTINGS_BLOB_OFFSET..SETTINGS_BLOB_OFFSET + SETTINGS_BLOB_LEN]
            .copy_from_slice(&blob);
        self.region.write_region(&region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_region_loads_factory_defaults() {
        let store = SettingsStore::new(Box::new(MemoryRegion::new()));
        let (settings, origin) = store.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            origin,
            SettingsOrigin::FactoryDefault(BlobError::BadMagic)
        );
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = SettingsStore::new(Box::new(MemoryRegion::new()));
        let settings = Settings::default()
            .with_station_credentials("UplinkNet", "pw")
            .unwrap();
        store.save(&settings).unwrap();

        let (loaded, origin) = store.load().unwrap();
        assert_eq!(origin, SettingsOrigin::Stored);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn decode_save_load_round_trips_exact_strings() {
        // The full write path: flat-JSON body -> patch -> new value ->
        // persisted blob -> reloaded value.
        let body = r#"{"ap_ssid":"Attic AP","device_comment":"rafter 3","subnet":9}"#;
        let patch = decode::settings_patch(body).unwrap();
        let settings = Settings::default().with_patch(&patch).unwrap();

        let mut store = SettingsStore::new(Box::new(MemoryRegion::new()));
        store.save(&settings).unwrap();
        let (loaded, _) = store.load().unwrap();

        assert_eq!(loaded.ap_ssid(), "Attic AP");
        assert_eq!(loaded.device_comment(), "rafter 3");
        assert_eq!(loaded.subnet(), 9);
        // Fields the body never mentioned keep their defaults.
        assert_eq!(loaded.device_name(), "ESP8266_Device");
    }

    #[test]
    fn corrupted_blob_loads_factory_defaults() {
        let mut store = SettingsStore::new(Box::new(MemoryRegion::new()));
        let settings = Settings::default();
        store.save(&settings).unwrap();

        let mut region = store.region.read_region().unwrap();
        region[20] ^= 0xA5;
        store.region.write_region(&region).unwrap();

        let (loaded, origin) = store.load().unwrap();
        assert_eq!(loaded, Settings::default());
        assert!(matches!(
            origin,
            SettingsOrigin::FactoryDefault(BlobError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn save_preserves_bytes_outside_the_blob() {
        let mut region = [0u8; EEPROM_REGION_LEN];
        region[EEPROM_REGION_LEN - 1] = 0x5A;
        let mut store = SettingsStore::new(Box::new(MemoryRegion::from_bytes(region)));

        store.save(&Settings::default()).unwrap();
        let after = store.region.read_region().unwrap();
        assert_eq!(after[EEPROM_REGION_LEN - 1], 0x5A);
    }

    #[test]
    fn file_region_round_trips() {
        let dir = std::env::temp_dir().join("portal-core-storage-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("region-{}.bin", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut store = SettingsStore::new(Box::new(FileRegion::new(&path)));
        // Missing file reads as erased -> defaults.
        let (_, origin) = store.load().unwrap();
        assert!(matches!(origin, SettingsOrigin::FactoryDefault(_)));

        let settings = Settings::default()
            .with_station_credentials("UplinkNet", "pw")
            .unwrap();
        store.save(&settings).unwrap();

        let reopened = SettingsStore::new(Box::new(FileRegion::new(&path)));
        let (loaded, origin) = reopened.load().unwrap();
        assert_eq!(origin, SettingsOrigin::Stored);
        assert_eq!(loaded, settings);

        let _ = std::fs::remove_file(&path);
    }
}
