//! The per-tick control context
//!
//! One [`ControlContext`] owns all mutable core state: the settings and
//! their dirty flag, the sync engine, the scheduler and the switch
//! controller. Collaborators are passed into [`ControlContext::tick`]
//! each iteration, so nothing in the core holds a device handle and
//! nothing is process-global.
//!
//! Tick order matters and is fixed: sync first (it may rewrite the clock
//! the rest of the tick reads), then settings persistence, then the
//! window, then the output. A collaborator failure never stops the
//! sequence; the affected step degrades and the loop carries on with the
//! last good state.

use chrono::NaiveDateTime;
use log::warn;

use crate::config::Settings;
use crate::errors::ControlError;
use crate::solar::{Recompute, SolarScheduler, SwitchWindow};
use crate::switch::{SwitchController, SwitchEvaluation};
use crate::sync::{PositionSync, SyncDecisionEngine, SyncEvent, SyncOutcome};
use crate::time::{clock_is_set, TickMs};
use crate::traits::{Clock, FixSource, SettingsStore, SwitchOutput};

/// Per-collaborator liveness, as observed by the most recent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    /// Clock holds a real time.
    pub clock_ok: bool,
    /// Receiver delivered a valid sample on the last tick.
    pub receiver_ok: bool,
    /// Last settings store operation succeeded.
    pub store_ok: bool,
}

/// Everything one control tick did.
#[derive(Debug, Clone, Copy)]
pub struct TickSummary {
    /// Sync engine result.
    pub sync: SyncOutcome,
    /// Scheduler result.
    pub schedule: Result<Recompute, ControlError>,
    /// Switch controller result.
    pub switch: SwitchEvaluation,
}

/// Snapshot of core state for the UI collaborator.
#[derive(Debug, Clone, Copy)]
pub struct StatusReport {
    /// Current switch window, if one was ever computed.
    pub window: Option<SwitchWindow>,
    /// Authoritative output state.
    pub relay_on: bool,
    /// A state change is waiting out its settle delay.
    pub change_pending: bool,
    /// Signed seconds to the next switch-on.
    pub seconds_to_on: Option<i64>,
    /// Signed seconds to the next switch-off.
    pub seconds_to_off: Option<i64>,
    /// Seconds since the last accepted clock sync.
    pub last_sync_age_secs: Option<u32>,
    /// Most recent accepted sync action.
    pub last_sync: Option<SyncEvent>,
    /// Collaborator liveness.
    pub health: Health,
}

/// Owns the core state machines and runs one control iteration at a time.
pub struct ControlContext {
    settings: Settings,
    settings_dirty: bool,
    sync: SyncDecisionEngine,
    scheduler: SolarScheduler,
    switch: SwitchController,
    health: Health,
}

impl ControlContext {
    /// Bring up the context from persisted settings. A store that cannot
    /// produce a valid record falls back to built-in defaults, which are
    /// written back so the next boot finds a valid record.
    pub fn boot<S: SettingsStore>(store: &mut S) -> Self {
        let mut settings_dirty = false;
        let mut store_ok = true;
        let settings = match store.load() {
            Ok(mut loaded) => {
                loaded.clamp_in_place();
                loaded
            }
            Err(err) => {
                warn!("settings load failed ({}), using defaults", err);
                settings_dirty = true;
                Settings::default()
            }
        };
        if settings_dirty {
            match store.save(&settings) {
                Ok(()) => settings_dirty = false,
                Err(_) => store_ok = false,
            }
        }

        Self {
            settings,
            settings_dirty,
            sync: SyncDecisionEngine::new(),
            scheduler: SolarScheduler::new(),
            switch: SwitchController::new(),
            health: Health {
                clock_ok: false,
                receiver_ok: false,
                store_ok,
            },
        }
    }

    /// Run one control iteration.
    pub fn tick<C, F, O, S>(
        &mut self,
        clock: &mut C,
        receiver: &F,
        output: &mut O,
        store: &mut S,
        tick: TickMs,
    ) -> TickSummary
    where
        C: Clock,
        F: FixSource,
        O: SwitchOutput,
        S: SettingsStore,
    {
        let fix = receiver.fix();
        let time_sample = receiver.time_of_fix();
        self.health.receiver_ok = fix.valid || time_sample.valid;

        let sync = self
            .sync
            .evaluate(&fix, &time_sample, tick, clock, &mut self.settings);
        if sync.position == PositionSync::Stored {
            self.settings_dirty = true;
            self.scheduler.mark_stale();
        }

        if self.settings_dirty {
            match store.save(&self.settings) {
                Ok(()) => {
                    self.settings_dirty = false;
                    self.health.store_ok = true;
                }
                Err(err) => {
                    // Keep the dirty flag; the save is retried next tick.
                    warn!("settings save failed ({})", err);
                    self.health.store_ok = false;
                }
            }
        }

        let now = clock.now();
        self.health.clock_ok = clock_is_set(&now);

        let schedule = self.scheduler.evaluate(now, tick, &self.settings);
        let switch = self.switch.evaluate(
            now,
            self.scheduler.window(),
            tick,
            self.settings.settle_delay_secs,
            output,
        );

        TickSummary {
            sync,
            schedule,
            switch,
        }
    }

    /// Apply an operator settings change: clamp to bounds, persist on the
    /// next tick, recompute the window on the next tick.
    pub fn update_settings(&mut self, apply: impl FnOnce(&mut Settings)) {
        apply(&mut self.settings);
        self.settings.clamp_in_place();
        self.settings_dirty = true;
        self.scheduler.mark_stale();
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current switch window.
    pub fn window(&self) -> Option<&SwitchWindow> {
        self.scheduler.window()
    }

    /// Whether the relay is on.
    pub fn relay_on(&self) -> bool {
        self.switch.is_on()
    }

    /// Accepted sync actions, oldest first, for the UI journal page.
    pub fn sync_journal(&self) -> impl Iterator<Item = &SyncEvent> {
        self.sync.journal()
    }

    /// Snapshot for the UI collaborator.
    pub fn report(&self, now: NaiveDateTime, tick: TickMs) -> StatusReport {
        let delay = self.settings.settle_delay_secs;
        let window = self.scheduler.window();
        StatusReport {
            window: window.copied(),
            relay_on: self.switch.is_on(),
            change_pending: self.switch.change_pending(),
            seconds_to_on: self.switch.seconds_to_on(now, window, tick, delay),
            seconds_to_off: self.switch.seconds_to_off(now, window, tick, delay),
            last_sync_age_secs: self.sync.last_sync_age_secs(tick),
            last_sync: self.sync.last_event().copied(),
            health: self.health,
        }
    }
}
