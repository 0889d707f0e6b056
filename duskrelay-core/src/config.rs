//! Persisted settings: record layout, bounds and integrity helpers
//!
//! The durable record is 18 bytes, little-endian:
//!
//! ```text
//! offset  size  field
//! 0       2     crc16 over bytes 2..18 (CRC-16/IBM-3740, init 0xFFFF)
//! 2       4     latitude  (f32, degrees)
//! 6       4     longitude (f32, degrees)
//! 10      4     hdop ratchet (f32, negative = no position ever accepted)
//! 14      2     trigger altitude offset (i16, tenths of a degree)
//! 16      2     settle delay (u16, seconds)
//! ```
//!
//! Where the record lives (EEPROM, flash page, file) is the store
//! collaborator's business; this module only defines what the bytes mean
//! and whether they can be trusted.

use crc::{Crc, CRC_16_IBM_3740};

use crate::constants::{
    SETTLE_DELAY_SECS_MAX, TRIGGER_ALTITUDE_TENTHS_MAX, TRIGGER_ALTITUDE_TENTHS_MIN,
};
use crate::errors::StoreError;
use crate::traits::SettingsStore;

const RECORD_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Size of the durable record in bytes.
pub const RECORD_LEN: usize = 18;

/// Operator-adjustable and sync-maintained settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Stored latitude, degrees north.
    pub latitude: f32,
    /// Stored longitude, degrees east.
    pub longitude: f32,
    /// Best fix quality ever accepted for the stored position. Negative
    /// means no position was ever accepted; only the sync engine's rules
    /// may replace this.
    pub hdop_ratchet: f32,
    /// Switch the lights on when the sun drops below the standard horizon
    /// plus this offset, tenths of a degree.
    pub trigger_altitude_tenths: i16,
    /// How long a desired switch state must persist before it is
    /// committed to the output, seconds.
    pub settle_delay_secs: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            hdop_ratchet: -1.0,
            trigger_altitude_tenths: -20,
            settle_delay_secs: 0,
        }
    }
}

impl Settings {
    /// Whether a position has ever been accepted into this record.
    pub fn has_position(&self) -> bool {
        self.hdop_ratchet >= 0.0
    }

    /// Trigger altitude offset in degrees.
    pub fn trigger_altitude_deg(&self) -> f64 {
        f64::from(self.trigger_altitude_tenths) / 10.0
    }

    /// Force every field into its accepted range.
    pub fn clamp_in_place(&mut self) {
        self.latitude = self.latitude.clamp(-90.0, 90.0);
        self.longitude = self.longitude.clamp(-180.0, 180.0);
        self.trigger_altitude_tenths = self
            .trigger_altitude_tenths
            .clamp(TRIGGER_ALTITUDE_TENTHS_MIN, TRIGGER_ALTITUDE_TENTHS_MAX);
        self.settle_delay_secs = self.settle_delay_secs.min(SETTLE_DELAY_SECS_MAX);
    }

    /// Serialize into the durable record, checksum included.
    pub fn to_record(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[2..6].copy_from_slice(&self.latitude.to_le_bytes());
        buf[6..10].copy_from_slice(&self.longitude.to_le_bytes());
        buf[10..14].copy_from_slice(&self.hdop_ratchet.to_le_bytes());
        buf[14..16].copy_from_slice(&self.trigger_altitude_tenths.to_le_bytes());
        buf[16..18].copy_from_slice(&self.settle_delay_secs.to_le_bytes());
        let crc = RECORD_CRC.checksum(&buf[2..]);
        buf[0..2].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Deserialize a durable record, verifying its checksum.
    pub fn from_record(record: &[u8; RECORD_LEN]) -> Result<Self, StoreError> {
        let stored = u16::from_le_bytes([record[0], record[1]]);
        if stored != RECORD_CRC.checksum(&record[2..]) {
            return Err(StoreError::Corrupt);
        }
        Ok(Self {
            latitude: f32::from_le_bytes([record[2], record[3], record[4], record[5]]),
            longitude: f32::from_le_bytes([record[6], record[7], record[8], record[9]]),
            hdop_ratchet: f32::from_le_bytes([record[10], record[11], record[12], record[13]]),
            trigger_altitude_tenths: i16::from_le_bytes([record[14], record[15]]),
            settle_delay_secs: u16::from_le_bytes([record[16], record[17]]),
        })
    }
}

/// In-memory settings store. Reference implementation of the record
/// handling for tests and host-side tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Option<[u8; RECORD_LEN]>,
}

impl MemoryStore {
    /// A store with nothing in it, as after first power-up.
    pub fn empty() -> Self {
        Self { record: None }
    }

    /// A store already holding the given settings.
    pub fn holding(settings: &Settings) -> Self {
        Self {
            record: Some(settings.to_record()),
        }
    }

    /// Flip one bit of the stored record, if any.
    pub fn corrupt(&mut self) {
        if let Some(record) = self.record.as_mut() {
            record[RECORD_LEN - 1] ^= 0x01;
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&mut self) -> Result<Settings, StoreError> {
        match &self.record {
            None => Err(StoreError::Unavailable),
            Some(record) => Settings::from_record(record),
        }
    }

    fn save(&mut self, settings: &Settings) -> Result<(), StoreError> {
        self.record = Some(settings.to_record());
        Ok(())
    }
}
