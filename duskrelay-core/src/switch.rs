//! Debounced output state machine
//!
//! Near a switch instant the comparison `now >= threshold` can flap: a
//! clock rewrite or a freshly recomputed window may move the threshold
//! across the present moment in either direction. The controller
//! therefore commits a change only after the desired state has held
//! continuously for the configured settle delay.
//!
//! The settle timer restarts on every new desired-state transition. Two
//! rapid opposite crossings must not collapse into one wrong toggle: if
//! the target flips back while a change is pending, the pending change is
//! cancelled outright, and if it flips forward again the wait starts
//! over.

use chrono::NaiveDateTime;
use log::info;

use crate::constants::MS_PER_SECOND;
use crate::solar::SwitchWindow;
use crate::time::{seconds_between, ticks_between, TickMs};
use crate::traits::SwitchOutput;

/// What one controller evaluation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchEvaluation {
    /// No window has ever been computed; the output holds its state.
    NoWindow,
    /// Output already matches the window.
    Held,
    /// A change is wanted but its settle delay has not elapsed.
    SettlePending,
    /// The change was committed and driven to the output.
    Committed(bool),
}

/// Drives the physical switch from the current window.
#[derive(Debug)]
pub struct SwitchController {
    /// Authoritative output state.
    current: bool,
    /// Latest computed target state.
    desired: bool,
    /// Tick at which `desired` last diverged from `current`.
    pending_since: TickMs,
}

impl Default for SwitchController {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchController {
    /// A controller with the output assumed off.
    pub fn new() -> Self {
        Self {
            current: false,
            desired: false,
            pending_since: 0,
        }
    }

    /// Authoritative output state.
    pub fn is_on(&self) -> bool {
        self.current
    }

    /// Whether a state change is waiting out its settle delay.
    pub fn change_pending(&self) -> bool {
        self.desired != self.current
    }

    /// Evaluate the window against the present and drive the output once
    /// a change has settled.
    pub fn evaluate<O: SwitchOutput>(
        &mut self,
        now: NaiveDateTime,
        window: Option<&SwitchWindow>,
        tick: TickMs,
        settle_delay_secs: u16,
        output: &mut O,
    ) -> SwitchEvaluation {
        let Some(window) = window else {
            return SwitchEvaluation::NoWindow;
        };

        let desired = now >= window.switch_on_utc && now < window.switch_off_utc;

        if desired != self.current {
            if desired != self.desired {
                // New transition: the settle wait starts over.
                self.pending_since = tick;
                self.desired = desired;
            }
        } else {
            // Already where the window wants us; cancel anything pending.
            self.desired = desired;
        }

        if self.desired != self.current {
            let waited_ms = ticks_between(self.pending_since, tick);
            let delay_ms = u32::from(settle_delay_secs) * MS_PER_SECOND;
            if waited_ms < delay_ms {
                return SwitchEvaluation::SettlePending;
            }
            self.current = self.desired;
            output.set_switch(self.current);
            info!("switch {}", if self.current { "on" } else { "off" });
            return SwitchEvaluation::Committed(self.current);
        }

        SwitchEvaluation::Held
    }

    /// Signed seconds until the next switch-on. Negative once the ON edge
    /// has been committed; the remaining settle time while an ON change
    /// is pending; otherwise the distance to the window edge plus the
    /// settle delay, since a crossing only takes effect after the delay.
    pub fn seconds_to_on(
        &self,
        now: NaiveDateTime,
        window: Option<&SwitchWindow>,
        tick: TickMs,
        settle_delay_secs: u16,
    ) -> Option<i64> {
        if self.current {
            return Some(-1);
        }
        if self.desired && !self.current {
            return Some(self.remaining_settle_secs(tick, settle_delay_secs));
        }
        let window = window?;
        Some(seconds_between(now, window.switch_on_utc) + i64::from(settle_delay_secs))
    }

    /// Signed seconds until the next switch-off; mirror of
    /// [`Self::seconds_to_on`].
    pub fn seconds_to_off(
        &self,
        now: NaiveDateTime,
        window: Option<&SwitchWindow>,
        tick: TickMs,
        settle_delay_secs: u16,
    ) -> Option<i64> {
        if !self.current {
            return Some(-1);
        }
        if !self.desired && self.current {
            return Some(self.remaining_settle_secs(tick, settle_delay_secs));
        }
        let window = window?;
        Some(seconds_between(now, window.switch_off_utc) + i64::from(settle_delay_secs))
    }

    fn remaining_settle_secs(&self, tick: TickMs, settle_delay_secs: u16) -> i64 {
        let waited = i64::from(ticks_between(self.pending_since, tick) / MS_PER_SECOND);
        i64::from(settle_delay_secs) - waited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::clock_sentinel;
    use chrono::{Duration, NaiveDate};

    struct Relay {
        on: bool,
        transitions: usize,
    }

    impl Relay {
        fn new() -> Self {
            Self {
                on: false,
                transitions: 0,
            }
        }
    }

    impl SwitchOutput for Relay {
        fn set_switch(&mut self, on: bool) {
            self.on = on;
            self.transitions += 1;
        }
    }

    fn utc(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 21)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    /// Window covering 20:00 to 04:00 the next morning.
    fn night_window() -> SwitchWindow {
        let on = utc(20, 0, 0);
        let off = on + Duration::hours(8);
        SwitchWindow {
            switch_on_utc: on,
            switch_off_utc: off,
            switch_on_local: on,
            switch_off_local: off,
            sunset_local: on,
            sunrise_local: off,
        }
    }

    #[test]
    fn no_window_holds_output() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();
        let result = ctl.evaluate(utc(21, 0, 0), None, 0, 0, &mut relay);
        assert_eq!(result, SwitchEvaluation::NoWindow);
        assert_eq!(relay.transitions, 0);
    }

    #[test]
    fn zero_delay_commits_same_tick() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();
        let w = night_window();

        let result = ctl.evaluate(utc(20, 0, 0), Some(&w), 1000, 0, &mut relay);
        assert_eq!(result, SwitchEvaluation::Committed(true));
        assert!(relay.on);
        assert!(ctl.is_on());
    }

    #[test]
    fn change_waits_out_the_settle_delay() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();
        let w = night_window();

        assert_eq!(
            ctl.evaluate(utc(20, 0, 0), Some(&w), 0, 10, &mut relay),
            SwitchEvaluation::SettlePending
        );
        assert_eq!(
            ctl.evaluate(utc(20, 0, 5), Some(&w), 5_000, 10, &mut relay),
            SwitchEvaluation::SettlePending
        );
        assert!(!relay.on);
        assert_eq!(
            ctl.evaluate(utc(20, 0, 10), Some(&w), 10_000, 10, &mut relay),
            SwitchEvaluation::Committed(true)
        );
        assert!(relay.on);
    }

    #[test]
    fn reversal_restarts_the_settle_timer() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();

        // Narrow window makes the desire flip true at t=0 and false at
        // t=5; the replacement window makes it true again from t=6.
        let mut narrow = night_window();
        narrow.switch_off_utc = utc(20, 0, 5);
        let wide = night_window();

        assert_eq!(
            ctl.evaluate(utc(20, 0, 0), Some(&narrow), 0, 10, &mut relay),
            SwitchEvaluation::SettlePending
        );
        // Desire flips back before the delay elapses: pending cancelled.
        assert_eq!(
            ctl.evaluate(utc(20, 0, 5), Some(&narrow), 5_000, 10, &mut relay),
            SwitchEvaluation::Held
        );
        // Desire flips on again: the wait starts over at t=6.
        assert_eq!(
            ctl.evaluate(utc(20, 0, 6), Some(&wide), 6_000, 10, &mut relay),
            SwitchEvaluation::SettlePending
        );
        // A stale timer would fire here, ten seconds after the first
        // flip. It must not.
        assert_eq!(
            ctl.evaluate(utc(20, 0, 10), Some(&wide), 10_000, 10, &mut relay),
            SwitchEvaluation::SettlePending
        );
        assert_eq!(
            ctl.evaluate(utc(20, 0, 15), Some(&wide), 15_000, 10, &mut relay),
            SwitchEvaluation::SettlePending
        );
        // Sixteen seconds in, ten after the second flip: commit.
        assert_eq!(
            ctl.evaluate(utc(20, 0, 16), Some(&wide), 16_000, 10, &mut relay),
            SwitchEvaluation::Committed(true)
        );
    }

    #[test]
    fn settle_timer_spans_counter_wrap() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();
        let w = night_window();

        let before_wrap: TickMs = u32::MAX - 1_999;
        assert_eq!(
            ctl.evaluate(utc(20, 0, 0), Some(&w), before_wrap, 5, &mut relay),
            SwitchEvaluation::SettlePending
        );
        // 5000 ms later the counter has wrapped to 3000.
        let after_wrap = before_wrap.wrapping_add(5_000);
        assert_eq!(
            ctl.evaluate(utc(20, 0, 5), Some(&w), after_wrap, 5, &mut relay),
            SwitchEvaluation::Committed(true)
        );
    }

    #[test]
    fn off_commit_at_window_end() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();
        let w = night_window();

        ctl.evaluate(utc(21, 0, 0), Some(&w), 0, 0, &mut relay);
        assert!(relay.on);
        let result = ctl.evaluate(
            utc(4, 0, 0) + Duration::days(1),
            Some(&w),
            1_000,
            0,
            &mut relay,
        );
        assert_eq!(result, SwitchEvaluation::Committed(false));
        assert!(!relay.on);
    }

    #[test]
    fn edge_queries_follow_the_state_machine() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();
        let w = night_window();
        let delay = 60u16;

        // An hour before the window: distance plus the settle delay.
        let now = utc(19, 0, 0);
        assert_eq!(
            ctl.seconds_to_on(now, Some(&w), 0, delay),
            Some(3600 + 60)
        );

        // Crossing starts the settle wait; the query counts it down.
        ctl.evaluate(utc(20, 0, 0), Some(&w), 0, delay, &mut relay);
        assert_eq!(
            ctl.seconds_to_on(utc(20, 0, 20), Some(&w), 20_000, delay),
            Some(40)
        );

        // Committed: the ON edge is in the past.
        ctl.evaluate(utc(20, 1, 0), Some(&w), 60_000, delay, &mut relay);
        assert!(ctl.is_on());
        assert_eq!(
            ctl.seconds_to_on(utc(20, 1, 0), Some(&w), 60_000, delay),
            Some(-1)
        );
        // And the OFF edge is hours away.
        assert_eq!(
            ctl.seconds_to_off(utc(20, 1, 0), Some(&w), 60_000, delay),
            Some(7 * 3600 + 59 * 60 + 60)
        );
    }

    #[test]
    fn edges_never_both_imminent() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();
        let w = night_window();
        let delay = 30u16;

        // Probe the whole cycle at one-minute resolution.
        let mut now = utc(12, 0, 0);
        let mut tick: TickMs = 0;
        for _ in 0..(24 * 60) {
            ctl.evaluate(now, Some(&w), tick, delay, &mut relay);
            let to_on = ctl.seconds_to_on(now, Some(&w), tick, delay).unwrap();
            let to_off = ctl.seconds_to_off(now, Some(&w), tick, delay).unwrap();
            let on_imminent = to_on > 0 && to_on <= 300;
            let off_imminent = to_off > 0 && to_off <= 300;
            assert!(
                !(on_imminent && off_imminent),
                "both edges imminent at {}",
                now
            );
            now = now + Duration::minutes(1);
            tick = tick.wrapping_add(60_000);
        }
    }

    #[test]
    fn sentinel_window_never_switches_on() {
        let mut ctl = SwitchController::new();
        let mut relay = Relay::new();
        let w = SwitchWindow {
            switch_on_utc: clock_sentinel(),
            switch_off_utc: clock_sentinel(),
            switch_on_local: clock_sentinel(),
            switch_off_local: clock_sentinel(),
            sunset_local: clock_sentinel(),
            sunrise_local: clock_sentinel(),
        };
        let result = ctl.evaluate(utc(22, 0, 0), Some(&w), 0, 0, &mut relay);
        assert_eq!(result, SwitchEvaluation::Held);
        assert!(!relay.on);
    }
}
