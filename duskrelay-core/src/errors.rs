//! Error types for the control core
//!
//! The rules match the constraints of the target hardware:
//!
//! 1. **Small and `Copy`**: errors are returned on every control tick and
//!    may be stored in status snapshots, so variants stay within a couple
//!    of machine words.
//!
//! 2. **No heap**: payloads are `&'static str` reasons only.
//!
//! 3. **Never fatal**: nothing here may halt the control loop. An error is
//!    a per-tick status, and "unavailable" always means "keep running on
//!    the last good schedule", never "force the switch off".

use thiserror_no_std::Error;

/// Non-fatal status for scheduling and input handling.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// Input data is outside plausible bounds and was discarded.
    #[error("input rejected: {reason}")]
    InvalidInput {
        /// What made the input unusable.
        reason: &'static str,
    },

    /// A prerequisite (clock or position) has never been initialized.
    /// Scheduling is deferred, the previous window stays in force.
    #[error("{what} not available yet")]
    NotYetAvailable {
        /// The missing prerequisite.
        what: &'static str,
    },

    /// The solar computation has no solution for this date, position and
    /// trigger altitude. Resolved by the documented fallback policy.
    #[error("solar event undefined for this date and position")]
    Implausible,
}

/// The clock hardware refused a write.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("clock rejected the write")]
pub struct ClockWriteError;

/// Failures of the settings store collaborator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The stored record failed its integrity check. The caller proceeds
    /// with built-in defaults.
    #[error("stored settings failed the integrity check")]
    Corrupt,

    /// The storage device did not respond.
    #[error("settings store did not respond")]
    Unavailable,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ControlError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidInput { reason } => defmt::write!(fmt, "input rejected: {}", reason),
            Self::NotYetAvailable { what } => defmt::write!(fmt, "{} not available yet", what),
            Self::Implausible => defmt::write!(fmt, "solar event undefined"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockWriteError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "clock rejected the write");
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StoreError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Corrupt => defmt::write!(fmt, "settings record corrupt"),
            Self::Unavailable => defmt::write!(fmt, "settings store unavailable"),
        }
    }
}
