//! Collaborator contracts
//!
//! The core never talks to hardware. Each external device is abstracted
//! behind a small trait so the decision logic runs identically against
//! the real drivers and against the fakes in the test suite. Keep these
//! minimal; a trait method the core does not call is driver API, not a
//! contract.

use chrono::NaiveDateTime;

use crate::config::Settings;
use crate::errors::{ClockWriteError, StoreError};
use crate::time::clock_sentinel;

/// One positional sample as handed over by the receiver driver.
///
/// `valid` reflects the driver's own parse state; a valid sample can
/// still be rejected by the decision engine as implausible or stale.
#[derive(Debug, Clone, Copy)]
pub struct FixSample {
    /// Degrees, north positive.
    pub latitude: f64,
    /// Degrees, east positive.
    pub longitude: f64,
    /// Horizontal dilution of precision, lower is better.
    pub hdop: f32,
    /// Satellites used in the solution.
    pub satellites: u8,
    /// Age of the sample when read, milliseconds.
    pub age_ms: u32,
    /// Driver-side validity of the sample.
    pub valid: bool,
}

impl FixSample {
    /// A sample carrying no information, as emitted before the first fix.
    pub fn none() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            hdop: -1.0,
            satellites: 0,
            age_ms: u32::MAX,
            valid: false,
        }
    }
}

/// One date/time sample from the receiver.
#[derive(Debug, Clone, Copy)]
pub struct TimeSample {
    /// UTC date and time of the sample.
    pub stamp: NaiveDateTime,
    /// Age of the sample when read, milliseconds.
    pub age_ms: u32,
    /// Driver-side validity of the sample.
    pub valid: bool,
}

impl TimeSample {
    /// A sample carrying no information.
    pub fn none() -> Self {
        Self {
            stamp: clock_sentinel(),
            age_ms: u32::MAX,
            valid: false,
        }
    }
}

/// The battery-backed real-time clock.
pub trait Clock {
    /// Current UTC reading; the sentinel value when never set.
    fn now(&self) -> NaiveDateTime;

    /// Rewrite the clock.
    fn set(&mut self, stamp: NaiveDateTime) -> Result<(), ClockWriteError>;

    /// Clear the power-lost flag after a successful write.
    fn clear_power_lost(&mut self);
}

/// The streaming position/time receiver.
///
/// The driver drains the receiver between control ticks; these calls only
/// hand over the most recent decoded samples.
pub trait FixSource {
    /// Most recent positional sample.
    fn fix(&self) -> FixSample;

    /// Most recent date/time sample.
    fn time_of_fix(&self) -> TimeSample;
}

/// The physical switch driver. The core emits the logical state;
/// active-high or active-low mapping is the driver's concern.
pub trait SwitchOutput {
    /// Drive the switch to the given logical state.
    fn set_switch(&mut self, on: bool);
}

/// Durable storage for [`Settings`]. Integrity checking of the stored
/// record is the store's concern; [`crate::config`] provides the record
/// layout and checksum helpers for implementations.
pub trait SettingsStore {
    /// Load the persisted settings, or report why they are unusable.
    fn load(&mut self) -> Result<Settings, StoreError>;

    /// Persist the settings.
    fn save(&mut self, settings: &Settings) -> Result<(), StoreError>;
}
