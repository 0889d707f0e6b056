//! Shared fakes for whole-loop integration tests
//!
//! Each fake implements one collaborator contract with scripted behavior
//! and enough recording to assert on afterwards.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};

use duskrelay_core::errors::{ClockWriteError, StoreError};
use duskrelay_core::time::clock_sentinel;
use duskrelay_core::{
    config::MemoryStore, Clock, FixSample, FixSource, Settings, SettingsStore, SwitchOutput,
    TimeSample,
};

/// Battery-backed clock under test control.
pub struct ManualClock {
    pub now: NaiveDateTime,
    pub power_lost: bool,
    pub refuse_writes: bool,
    pub writes: usize,
}

impl ManualClock {
    pub fn unset() -> Self {
        Self {
            now: clock_sentinel(),
            power_lost: true,
            refuse_writes: false,
            writes: 0,
        }
    }

    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now,
            power_lost: false,
            refuse_writes: false,
            writes: 0,
        }
    }

    pub fn advance_secs(&mut self, secs: i64) {
        self.now = self.now + Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }

    fn set(&mut self, stamp: NaiveDateTime) -> Result<(), ClockWriteError> {
        if self.refuse_writes {
            return Err(ClockWriteError);
        }
        self.now = stamp;
        self.writes += 1;
        Ok(())
    }

    fn clear_power_lost(&mut self) {
        self.power_lost = false;
    }
}

/// Receiver whose samples the test scripts directly.
pub struct ScriptedReceiver {
    pub fix: FixSample,
    pub time: TimeSample,
}

impl ScriptedReceiver {
    /// A receiver that has decoded nothing, as when disconnected.
    pub fn silent() -> Self {
        Self {
            fix: FixSample::none(),
            time: TimeSample::none(),
        }
    }

    /// A receiver with a fresh, healthy fix at the given position.
    pub fn locked(latitude: f64, longitude: f64, hdop: f32, stamp: NaiveDateTime) -> Self {
        Self {
            fix: FixSample {
                latitude,
                longitude,
                hdop,
                satellites: 9,
                age_ms: 150,
                valid: true,
            },
            time: TimeSample {
                stamp,
                age_ms: 150,
                valid: true,
            },
        }
    }

    pub fn lose_lock(&mut self) {
        self.fix = FixSample::none();
        self.time = TimeSample::none();
    }
}

impl FixSource for ScriptedReceiver {
    fn fix(&self) -> FixSample {
        self.fix
    }

    fn time_of_fix(&self) -> TimeSample {
        self.time
    }
}

/// Relay driver recording every commit.
#[derive(Default)]
pub struct RelayPin {
    pub on: bool,
    pub transitions: Vec<bool>,
}

impl RelayPin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SwitchOutput for RelayPin {
    fn set_switch(&mut self, on: bool) {
        self.on = on;
        self.transitions.push(on);
    }
}

/// Settings store that can be told to fail either direction.
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_load: bool,
    pub fail_save: bool,
    pub saves: usize,
}

impl FlakyStore {
    pub fn empty() -> Self {
        Self {
            inner: MemoryStore::empty(),
            fail_load: false,
            fail_save: false,
            saves: 0,
        }
    }

    pub fn holding(settings: &Settings) -> Self {
        Self {
            inner: MemoryStore::holding(settings),
            fail_load: false,
            fail_save: false,
            saves: 0,
        }
    }
}

impl SettingsStore for FlakyStore {
    fn load(&mut self) -> Result<Settings, StoreError> {
        if self.fail_load {
            return Err(StoreError::Unavailable);
        }
        self.inner.load()
    }

    fn save(&mut self, settings: &Settings) -> Result<(), StoreError> {
        if self.fail_save {
            return Err(StoreError::Unavailable);
        }
        self.saves += 1;
        self.inner.save(settings)
    }
}

/// 2025-06-21 at the given UTC time.
pub fn midsummer(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 21)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// Prague.
pub const LATITUDE: f64 = 50.0755;
/// Prague.
pub const LONGITUDE: f64 = 14.4378;
