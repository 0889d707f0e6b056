//! Calendar and tick-counter arithmetic
//!
//! Two clocks exist in this system and they must not be confused:
//!
//! - The **calendar clock** is the battery-backed RTC reading, UTC, second
//!   resolution, represented as [`chrono::NaiveDateTime`]. It can jump
//!   when a sync decision rewrites it. A reading in the sentinel year
//!   means the clock was never set.
//! - The **tick counter** is a free-running millisecond counter
//!   ([`TickMs`]) that starts at zero on boot and wraps at `2^32`
//!   (about 49.7 days). It never jumps, which makes it the only safe base
//!   for elapsed-time measurements.
//!
//! Every "time since X" computation goes through [`ticks_between`], which
//! is exact across the wrap. Comparing raw tick values with `>` is how
//! wrap bugs are born; don't.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::constants::SENTINEL_YEAR;

/// Free-running millisecond counter, wraps at `2^32`.
pub type TickMs = u32;

/// Milliseconds elapsed from `earlier` to `later`, exact across the
/// counter wrap.
#[inline]
pub fn ticks_between(earlier: TickMs, later: TickMs) -> u32 {
    later.wrapping_sub(earlier)
}

/// The power-on reset value of the RTC: midnight entering year 2000.
pub fn clock_sentinel() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(SENTINEL_YEAR, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Whether a clock reading holds a real time rather than the reset value.
pub fn clock_is_set(stamp: &NaiveDateTime) -> bool {
    stamp.year() > SENTINEL_YEAR
}

/// Signed seconds from `earlier` to `later`; negative when `later` is in
/// fact the earlier instant.
pub fn seconds_between(earlier: NaiveDateTime, later: NaiveDateTime) -> i64 {
    later.signed_duration_since(earlier).num_seconds()
}

/// Place a fractional-hours instant onto a calendar date, rounded to the
/// nearest second. Hours outside `[0, 24)` carry into adjacent days.
pub fn date_at_hours(date: NaiveDate, hours: f64) -> NaiveDateTime {
    let total_secs = libm::round(hours * 3600.0) as i64;
    let carry_days = total_secs.div_euclid(86_400);
    let in_day = total_secs.rem_euclid(86_400);
    let date = date + Duration::days(carry_days);
    date.and_hms_opt(
        (in_day / 3600) as u32,
        ((in_day / 60) % 60) as u32,
        (in_day % 60) as u32,
    )
    .unwrap_or(NaiveDateTime::MIN)
}
