//! Daily switch-window computation
//!
//! The scheduler owns the current [`SwitchWindow`]: the UTC instants at
//! which the lights go on (sun drops through the trigger altitude in the
//! evening) and off again (sun climbs back through it the next morning).
//!
//! The window always describes the dark period the current instant
//! belongs to. Before local solar noon the relevant evening is
//! yesterday's; after it, today's. Anchoring the choice to the computed
//! transit rather than to 12:00 UTC keeps the bucket correct at
//! longitudes far from the timezone's central meridian.
//!
//! Near the poles, or with an extreme trigger offset, the sun may never
//! cross the trigger altitude on a given date. The fallback is
//! deliberately simple: a positive offset substitutes a long-past instant
//! (the lights stay off), a non-positive offset substitutes the transit
//! instant (the lights stay on, with a momentary off at noon). Exact
//! polar behavior would need the daily minimum and maximum solar
//! altitude and is out of scope.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};
use solar_positioning::{spa, time::DeltaT, SunriseResult};

use crate::config::Settings;
use crate::constants::{HORIZON_STD_ALTITUDE_DEG, RECOMPUTE_INTERVAL_MS};
use crate::errors::ControlError;
use crate::time::{clock_is_set, clock_sentinel, ticks_between, TickMs};
use crate::tz;

/// The switch instants for the dark period the current instant belongs
/// to, plus the display-only local times derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchWindow {
    /// Lights-on instant, UTC. Drives the controller.
    pub switch_on_utc: NaiveDateTime,
    /// Lights-off instant, UTC. Drives the controller.
    pub switch_off_utc: NaiveDateTime,
    /// Lights-on instant in regional wall-clock time.
    pub switch_on_local: NaiveDateTime,
    /// Lights-off instant in regional wall-clock time.
    pub switch_off_local: NaiveDateTime,
    /// Standard-horizon sunset of the window's evening, local time.
    pub sunset_local: NaiveDateTime,
    /// Standard-horizon sunrise of the window's morning, local time.
    pub sunrise_local: NaiveDateTime,
}

/// What a scheduler evaluation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recompute {
    /// A new window was computed and stored.
    Updated,
    /// The existing window is recent enough; nothing was done.
    StillFresh,
}

/// Solar events of one calendar date at one horizon altitude, UTC.
#[derive(Debug, Clone, Copy)]
struct SolarDay {
    transit: NaiveDateTime,
    sunrise: Option<NaiveDateTime>,
    sunset: Option<NaiveDateTime>,
}

/// Owns the switch window and recomputes it at most hourly.
#[derive(Debug, Default)]
pub struct SolarScheduler {
    window: Option<SwitchWindow>,
    computed_at: Option<TickMs>,
    stale: bool,
}

impl SolarScheduler {
    /// A scheduler with no window yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current window, if one was ever computed.
    pub fn window(&self) -> Option<&SwitchWindow> {
        self.window.as_ref()
    }

    /// Request a recomputation on the next evaluation regardless of the
    /// throttle. Called after a relevant settings change.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Recompute the window unless the existing one is recent enough.
    ///
    /// `NotYetAvailable` is returned while the clock or the position is
    /// uninitialized; the previous window, if any, stays in force.
    pub fn evaluate(
        &mut self,
        now: NaiveDateTime,
        tick: TickMs,
        settings: &Settings,
    ) -> Result<Recompute, ControlError> {
        let recent = self
            .computed_at
            .map(|at| ticks_between(at, tick) < RECOMPUTE_INTERVAL_MS)
            .unwrap_or(false);
        if !self.stale && clock_is_set(&now) && self.window.is_some() && recent {
            return Ok(Recompute::StillFresh);
        }

        if !clock_is_set(&now) {
            return Err(ControlError::NotYetAvailable { what: "clock" });
        }
        if !settings.has_position() {
            return Err(ControlError::NotYetAvailable { what: "position" });
        }

        let lat = f64::from(settings.latitude);
        let lon = f64::from(settings.longitude);
        let today = now.date();

        let today_std = solar_day(today, lat, lon, HORIZON_STD_ALTITUDE_DEG)?;

        // Evening date of the dark period now belongs to.
        let (on_date, off_date) = if now >= today_std.transit {
            (today, today + Duration::days(1))
        } else {
            (today - Duration::days(1), today)
        };

        let on_std = if on_date == today {
            today_std
        } else {
            solar_day(on_date, lat, lon, HORIZON_STD_ALTITUDE_DEG)?
        };
        let off_std = solar_day(off_date, lat, lon, HORIZON_STD_ALTITUDE_DEG)?;

        // Events at the trigger altitude. A date where the sun never
        // crosses it yields no event and takes the fallback below.
        let trigger_deg = HORIZON_STD_ALTITUDE_DEG + settings.trigger_altitude_deg();
        let on_trigger = solar_day(on_date, lat, lon, trigger_deg).ok();
        let off_trigger = solar_day(off_date, lat, lon, trigger_deg).ok();

        let positive_offset = settings.trigger_altitude_tenths > 0;
        let switch_on_utc = on_trigger
            .and_then(|d| d.sunset)
            .unwrap_or_else(|| undefined_event_fallback(positive_offset, on_std.transit));
        let switch_off_utc = off_trigger
            .and_then(|d| d.sunrise)
            .unwrap_or_else(|| undefined_event_fallback(positive_offset, off_std.transit));

        let window = SwitchWindow {
            switch_on_utc,
            switch_off_utc,
            switch_on_local: tz::local_from_utc(switch_on_utc),
            switch_off_local: tz::local_from_utc(switch_off_utc),
            sunset_local: tz::local_from_utc(on_std.sunset.unwrap_or(on_std.transit)),
            sunrise_local: tz::local_from_utc(off_std.sunrise.unwrap_or(off_std.transit)),
        };
        info!(
            "switch window: on {} utc, off {} utc",
            window.switch_on_utc, window.switch_off_utc
        );

        self.window = Some(window);
        self.computed_at = Some(tick);
        self.stale = false;
        Ok(Recompute::Updated)
    }
}

/// Instant substituted for an event the sun never produces on that date.
fn undefined_event_fallback(positive_offset: bool, transit: NaiveDateTime) -> NaiveDateTime {
    if positive_offset {
        // Trigger above the reachable sky: treat the event as long past,
        // the lights stay off.
        clock_sentinel()
    } else {
        // Trigger below the reachable sky: the dark period spans the
        // whole day, bounded by the transits.
        transit
    }
}

fn solar_day(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    horizon_deg: f64,
) -> Result<SolarDay, ControlError> {
    use chrono::Datelike;

    let delta_t = DeltaT::estimate_from_date(date.year(), date.month())
        .map_err(|_| ControlError::Implausible)?;
    let day_start = DateTime::<Utc>::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0).unwrap_or(NaiveDateTime::MIN),
        Utc,
    );
    let result = spa::sunrise_sunset(day_start, latitude, longitude, delta_t, horizon_deg)
        .map_err(|_| ControlError::Implausible)?;

    Ok(match result {
        SunriseResult::RegularDay {
            sunrise,
            transit,
            sunset,
        } => SolarDay {
            transit: transit.naive_utc(),
            sunrise: Some(sunrise.naive_utc()),
            sunset: Some(sunset.naive_utc()),
        },
        SunriseResult::AllDay { transit } | SunriseResult::AllNight { transit } => {
            debug!("no sun crossing at {} deg on {}", horizon_deg, date);
            SolarDay {
                transit: transit.naive_utc(),
                sunrise: None,
                sunset: None,
            }
        }
    })
}
