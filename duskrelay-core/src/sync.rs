//! Trust decisions for incoming receiver samples
//!
//! The receiver emits a continuous stream of position/time samples whose
//! confidence swings wildly during acquisition. The engine decides, per
//! sample, whether to rewrite the battery-backed clock and whether to
//! replace the persisted position, without ever letting a worse fix
//! degrade an already-good position.
//!
//! The policy is tiered on HDOP, first match wins:
//!
//! 1. Unusable quality: nothing happens.
//! 2. Strictly better than the persisted ratchet: best fix this device
//!    has ever seen, rewrite clock and position unconditionally.
//! 3. Sufficient (< 4.0): rewrite the clock outright on an excellent fix
//!    at most once an hour; otherwise only when the clock was never
//!    synced this session or has gone a week without one, and then only
//!    when it meaningfully drifted. Store the position once per session.
//! 4. Poor but usable (< 50.0): only bootstrap a clock or position that
//!    was never initialized at all, e.g. during indoor setup.
//! 5. Anything else: nothing happens.
//!
//! A decision is cancelled at the last moment when the sample backing it
//! is stale or invalid; the stream has moved on and the numbers no
//! longer describe the present.

use heapless::HistoryBuffer;
use log::{debug, info, warn};

use crate::config::Settings;
use crate::constants::{
    CLOCK_DRIFT_TOLERANCE_SECS, CLOCK_RESYNC_MIN_HOURS, CLOCK_RESYNC_STALE_HOURS, HDOP_EXCELLENT,
    HDOP_NOISE_CEILING, HDOP_PLAUSIBLE_FLOOR, HDOP_SUFFICIENT, HDOP_USABLE, JOURNAL_DEPTH,
    MS_PER_HOUR, MS_PER_SECOND, SAMPLE_MAX_AGE_MS, SATELLITES_MAX, SATELLITES_MIN,
};
use crate::errors::ControlError;
use crate::time::{clock_is_set, seconds_between, ticks_between, TickMs};
use crate::traits::{Clock, FixSample, TimeSample};

/// What happened to the clock on one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSync {
    /// No rewrite was warranted.
    Untouched,
    /// Drift was within tolerance; recorded as synced without a write.
    Marked,
    /// The clock was rewritten from the sample.
    Set,
    /// A rewrite was warranted but the sample failed the freshness guard
    /// or the hardware refused the write.
    Rejected,
}

/// What happened to the persisted position on one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSync {
    /// No replacement was warranted.
    Untouched,
    /// The position and quality ratchet were replaced.
    Stored,
    /// A store was warranted but the sample failed the freshness guard.
    Rejected,
}

/// Per-axis result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Clock axis.
    pub clock: ClockSync,
    /// Position axis.
    pub position: PositionSync,
}

impl SyncOutcome {
    fn idle() -> Self {
        Self {
            clock: ClockSync::Untouched,
            position: PositionSync::Untouched,
        }
    }
}

/// Kind of an accepted sync action, for the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEventKind {
    /// The clock was rewritten.
    ClockSet,
    /// The clock was confirmed within tolerance.
    ClockMarked,
    /// The position was replaced.
    PositionStored,
}

/// One accepted sync action.
#[derive(Debug, Clone, Copy)]
pub struct SyncEvent {
    /// Tick at which the action happened.
    pub tick: TickMs,
    /// Quality of the sample that triggered it.
    pub hdop: f32,
    /// What was done.
    pub kind: SyncEventKind,
}

/// Planned clock action while a sample is being weighed.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ClockPlan {
    Leave,
    IfDifferent,
    Force,
}

/// Decides whether receiver samples may overwrite persisted state.
pub struct SyncDecisionEngine {
    clock_synced_at: Option<TickMs>,
    position_stored_at: Option<TickMs>,
    journal: HistoryBuffer<SyncEvent, JOURNAL_DEPTH>,
}

impl Default for SyncDecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncDecisionEngine {
    /// An engine that has accepted nothing yet this session.
    pub fn new() -> Self {
        Self {
            clock_synced_at: None,
            position_stored_at: None,
            journal: HistoryBuffer::new(),
        }
    }

    /// Seconds since the last accepted clock sync, if any.
    pub fn last_sync_age_secs(&self, tick: TickMs) -> Option<u32> {
        self.clock_synced_at
            .map(|at| ticks_between(at, tick) / MS_PER_SECOND)
    }

    /// Accepted sync actions, oldest first.
    pub fn journal(&self) -> impl Iterator<Item = &SyncEvent> {
        self.journal.oldest_ordered()
    }

    /// Most recent accepted sync action.
    pub fn last_event(&self) -> Option<&SyncEvent> {
        self.journal.recent()
    }

    /// Weigh one pair of receiver samples against the current clock and
    /// settings, applying whatever they earn.
    ///
    /// A position store replaces `settings.latitude`, `longitude` and the
    /// quality ratchet; persisting the mutated settings is the caller's
    /// job.
    pub fn evaluate<C: Clock>(
        &mut self,
        fix: &FixSample,
        time_sample: &TimeSample,
        tick: TickMs,
        clock: &mut C,
        settings: &mut Settings,
    ) -> SyncOutcome {
        let mut outcome = SyncOutcome::idle();

        let Ok(quality) = screen_quality(fix) else {
            return outcome;
        };

        let clock_now = clock.now();
        let hours_since_clock = match self.clock_synced_at {
            Some(at) => ticks_between(at, tick) / MS_PER_HOUR,
            // Never synced this session: hours of uptime.
            None => tick / MS_PER_HOUR,
        };

        let mut clock_plan = ClockPlan::Leave;
        let mut store_position = false;

        if quality < settings.hdop_ratchet {
            // Best fix ever seen by this device.
            clock_plan = ClockPlan::Force;
            store_position = true;
        } else if quality < HDOP_SUFFICIENT {
            if quality < HDOP_EXCELLENT && hours_since_clock >= CLOCK_RESYNC_MIN_HOURS {
                clock_plan = ClockPlan::Force;
            } else if self.clock_synced_at.is_none()
                || hours_since_clock >= CLOCK_RESYNC_STALE_HOURS
            {
                clock_plan = ClockPlan::IfDifferent;
            }
            if self.position_stored_at.is_none() {
                store_position = true;
            }
        } else if quality < HDOP_USABLE {
            if !clock_is_set(&clock_now) {
                clock_plan = ClockPlan::IfDifferent;
            }
            if !settings.has_position() {
                store_position = true;
            }
        }

        // Freshness guards. The decision was made on quality; the data
        // behind it must still describe the present.
        if clock_plan != ClockPlan::Leave
            && (!time_sample.valid || time_sample.age_ms > SAMPLE_MAX_AGE_MS)
        {
            warn!("sync: clock rewrite cancelled, time sample stale or invalid");
            clock_plan = ClockPlan::Leave;
            outcome.clock = ClockSync::Rejected;
        }
        if store_position && (!fix.valid || fix.age_ms > SAMPLE_MAX_AGE_MS) {
            warn!("sync: position store cancelled, fix stale or invalid");
            store_position = false;
            outcome.position = PositionSync::Rejected;
        }

        if clock_plan != ClockPlan::Leave {
            let drift = seconds_between(clock_now, time_sample.stamp);
            if clock_plan == ClockPlan::IfDifferent && drift.abs() < CLOCK_DRIFT_TOLERANCE_SECS {
                // Within RTC tolerance. Counts as a sync, skips the write.
                debug!("sync: clock within {}s, not rewritten", drift);
                self.clock_synced_at = Some(tick);
                self.journal.write(SyncEvent {
                    tick,
                    hdop: quality,
                    kind: SyncEventKind::ClockMarked,
                });
                outcome.clock = ClockSync::Marked;
            } else {
                match clock.set(time_sample.stamp) {
                    Ok(()) => {
                        clock.clear_power_lost();
                        info!("sync: clock set, drift was {}s", drift);
                        self.clock_synced_at = Some(tick);
                        self.journal.write(SyncEvent {
                            tick,
                            hdop: quality,
                            kind: SyncEventKind::ClockSet,
                        });
                        outcome.clock = ClockSync::Set;
                    }
                    Err(_) => {
                        warn!("sync: clock write failed");
                        outcome.clock = ClockSync::Rejected;
                    }
                }
            }
        }

        if store_position {
            info!(
                "sync: position stored, hdop {} -> {}",
                settings.hdop_ratchet, quality
            );
            settings.latitude = fix.latitude as f32;
            settings.longitude = fix.longitude as f32;
            settings.hdop_ratchet = quality;
            self.position_stored_at = Some(tick);
            self.journal.write(SyncEvent {
                tick,
                hdop: quality,
                kind: SyncEventKind::PositionStored,
            });
            outcome.position = PositionSync::Stored;
        }

        outcome
    }
}

/// Extract a usable quality value from a sample, or say why there is
/// none. Screening only; the tier policy is the engine's.
pub fn screen_quality(fix: &FixSample) -> Result<f32, ControlError> {
    if !fix.valid {
        return Err(ControlError::InvalidInput { reason: "no fix" });
    }
    if fix.hdop > HDOP_NOISE_CEILING {
        // Acquisition noise, not worth a log line.
        return Err(ControlError::InvalidInput {
            reason: "acquisition noise",
        });
    }
    if fix.hdop <= HDOP_PLAUSIBLE_FLOOR
        || fix.satellites < SATELLITES_MIN
        || fix.satellites > SATELLITES_MAX
    {
        warn!(
            "sync: implausible receiver sample, hdop {} sats {}",
            fix.hdop, fix.satellites
        );
        return Err(ControlError::InvalidInput {
            reason: "implausible quality or satellite count",
        });
    }
    Ok(fix.hdop)
}
