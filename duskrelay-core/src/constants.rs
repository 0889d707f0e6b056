//! Tuning constants for the control core
//!
//! Every threshold the decision logic relies on lives here with its source
//! and rationale. The quality tiers mirror what consumer GNSS modules
//! actually report during acquisition: HDOP starts absurdly high, drops in
//! bursts, and settles somewhere below 2 with a clear sky.

// ===== FIX QUALITY TIERS =====

/// HDOP above this carries no positional information at all.
///
/// Receivers emit values in the hundreds while still searching for
/// satellites. Discard outright, do not even log.
pub const HDOP_NOISE_CEILING: f32 = 80.0;

/// HDOP at or below this is implausibly good for a consumer module.
///
/// Real-world floor is around 0.5; anything at 0.1 or below is a decoding
/// glitch, not a precise fix.
pub const HDOP_PLAUSIBLE_FLOOR: f32 = 0.1;

/// Fewer satellites than this cannot produce a trustworthy 3D fix.
pub const SATELLITES_MIN: u8 = 3;

/// More satellites than this exceeds what the constellation can deliver
/// to a single receiver; the count is corrupt.
pub const SATELLITES_MAX: u8 = 30;

/// Below this HDOP a fix is good enough for routine clock resync and for
/// the first position store of a session.
pub const HDOP_SUFFICIENT: f32 = 4.0;

/// Below this HDOP the fix is good enough to rewrite the clock outright.
pub const HDOP_EXCELLENT: f32 = 2.0;

/// Below this HDOP a fix may still bootstrap a never-initialized clock or
/// position, e.g. during indoor setup.
pub const HDOP_USABLE: f32 = 50.0;

// ===== SAMPLE FRESHNESS =====

/// Receiver samples older than this are stale; the stream has moved on.
pub const SAMPLE_MAX_AGE_MS: u32 = 1000;

// ===== CLOCK DISCIPLINE =====

/// Clock drift below this is within RTC tolerance; rewriting the clock
/// for it would only wear the I2C bus and the backup domain.
pub const CLOCK_DRIFT_TOLERANCE_SECS: i64 = 3;

/// Minimum spacing between forced clock rewrites on an excellent fix.
pub const CLOCK_RESYNC_MIN_HOURS: u32 = 1;

/// After this long without an accepted sync the clock is considered
/// stale enough to rewrite on any sufficient fix.
pub const CLOCK_RESYNC_STALE_HOURS: u32 = 168;

// ===== SCHEDULING =====

/// Switch instants barely move within an hour; recomputing faster than
/// this is wasted work unless a setting changed.
pub const RECOMPUTE_INTERVAL_MS: u32 = 3_600_000;

/// Standard sunrise/sunset horizon: solar disc radius plus mean
/// atmospheric refraction, -50 arc minutes.
pub const HORIZON_STD_ALTITUDE_DEG: f64 = -50.0 / 60.0;

// ===== TIMEZONE =====

/// Base UTC offset of the target region (CET).
pub const TZ_BASE_OFFSET_HOURS: i64 = 1;

/// Additional shift while the EU daylight-saving rule holds (CEST).
pub const DST_OFFSET_HOURS: i64 = 1;

// ===== SETTINGS BOUNDS =====

/// Trigger altitude offset range, tenths of a degree.
pub const TRIGGER_ALTITUDE_TENTHS_MIN: i16 = -900;

/// See [`TRIGGER_ALTITUDE_TENTHS_MIN`].
pub const TRIGGER_ALTITUDE_TENTHS_MAX: i16 = 900;

/// Largest accepted settle delay, seconds.
pub const SETTLE_DELAY_SECS_MAX: u16 = 990;

// ===== TIME UNITS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u32 = 1000;

/// Milliseconds per hour.
pub const MS_PER_HOUR: u32 = 3_600_000;

// ===== BOOKKEEPING =====

/// Depth of the sync event journal kept for the UI.
pub const JOURNAL_DEPTH: usize = 8;

/// Clock year meaning "never set". The RTC stores years as an offset from
/// 2000; a zero offset is the power-on reset value.
pub const SENTINEL_YEAR: i32 = 2000;
