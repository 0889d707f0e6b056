//! Control core for a GNSS/RTC disciplined dusk-to-dawn switch
//!
//! Turns night lighting on between sunset and sunrise at the device's
//! actual position. Current time comes from a battery-backed RTC,
//! position and reference time from a satellite receiver; both drift and
//! both lie, each in its own way, so every piece of incoming data is
//! weighed before it may overwrite persisted state.
//!
//! Key constraints:
//! - Runs on small MCUs: no heap in the control path, no blocking waits
//! - Single-threaded cooperative loop, one tick per iteration
//! - Collaborators (clock, receiver, output, storage) behind traits so
//!   the logic tests on the host with fakes
//!
//! The moving parts, in tick order:
//! - [`sync::SyncDecisionEngine`] decides whether a receiver sample may
//!   rewrite the clock or the stored position
//! - [`solar::SolarScheduler`] computes the nightly switch window from
//!   position, date and the configured trigger altitude
//! - [`switch::SwitchController`] drives the output through a settle
//!   delay so the relay does not chatter near a threshold
//! - [`control::ControlContext`] owns all of it and runs the tick
//!
//! ```no_run
//! use chrono::NaiveDateTime;
//! use duskrelay_core::{
//!     config::MemoryStore, time::clock_sentinel, Clock, ClockWriteError, ControlContext,
//!     FixSample, FixSource, SwitchOutput, TimeSample,
//! };
//!
//! struct Rtc(NaiveDateTime);
//! impl Clock for Rtc {
//!     fn now(&self) -> NaiveDateTime { self.0 }
//!     fn set(&mut self, stamp: NaiveDateTime) -> Result<(), ClockWriteError> {
//!         self.0 = stamp;
//!         Ok(())
//!     }
//!     fn clear_power_lost(&mut self) {}
//! }
//!
//! struct Receiver;
//! impl FixSource for Receiver {
//!     fn fix(&self) -> FixSample { FixSample::none() }
//!     fn time_of_fix(&self) -> TimeSample { TimeSample::none() }
//! }
//!
//! struct Relay;
//! impl SwitchOutput for Relay {
//!     fn set_switch(&mut self, _on: bool) { /* drive the pin */ }
//! }
//!
//! let mut store = MemoryStore::empty();
//! let mut ctx = ControlContext::boot(&mut store);
//! let mut rtc = Rtc(clock_sentinel());
//! let receiver = Receiver;
//! let mut relay = Relay;
//!
//! loop {
//!     let tick_ms = 0; // read the platform's millisecond counter here
//!     ctx.tick(&mut rtc, &receiver, &mut relay, &mut store, tick_ms);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod control;
pub mod errors;
pub mod solar;
pub mod switch;
pub mod sync;
pub mod time;
pub mod traits;
pub mod tz;

// Public API
pub use config::Settings;
pub use control::{ControlContext, Health, StatusReport, TickSummary};
pub use errors::{ClockWriteError, ControlError, StoreError};
pub use solar::{Recompute, SolarScheduler, SwitchWindow};
pub use switch::{SwitchController, SwitchEvaluation};
pub use sync::{ClockSync, PositionSync, SyncDecisionEngine, SyncEvent, SyncEventKind, SyncOutcome};
pub use traits::{Clock, FixSample, FixSource, SettingsStore, SwitchOutput, TimeSample};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
