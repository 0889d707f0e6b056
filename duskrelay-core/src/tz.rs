//! UTC to local-time conversion for the CET/CEST target region
//!
//! A fixed +1 h base offset plus the EU daylight-saving rule. The rule is
//! evaluated on the already base-shifted time, matching how wall clocks
//! in the region actually move:
//!
//! - April through September: always DST.
//! - March: DST begins on the last Sunday at 02:00 local.
//! - October: DST ends on the last Sunday at 02:00 local.
//!
//! "Last Sunday" falls on or after the 25th in both months. Subtracting
//! the day-of-week index (0 = Sunday) from the day-of-month gives the
//! date of the most recent Sunday; when that lands at 25 or later, the
//! last Sunday has been reached.
//!
//! These functions are pure and feed the day-boundary math of the solar
//! scheduler; the rule must hold exactly, including both 02:00 edges.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

use crate::constants::{DST_OFFSET_HOURS, TZ_BASE_OFFSET_HOURS};

/// Convert a UTC instant to regional wall-clock time.
pub fn local_from_utc(utc: NaiveDateTime) -> NaiveDateTime {
    let shifted = utc + Duration::hours(TZ_BASE_OFFSET_HOURS);
    if is_eu_dst(shifted) {
        shifted + Duration::hours(DST_OFFSET_HOURS)
    } else {
        shifted
    }
}

/// Whether the EU daylight-saving rule holds for a base-shifted (CET)
/// wall-clock time.
pub fn is_eu_dst(local: NaiveDateTime) -> bool {
    let month = local.month();
    if month > 3 && month < 10 {
        return true;
    }

    let day = local.day() as i32;
    let weekday = local.weekday().num_days_from_sunday() as i32;
    // Day-of-month of the most recent Sunday; >= 25 means the last
    // Sunday of a 31-day month has been reached.
    let previous_sunday = day - weekday;

    match month {
        3 => {
            if weekday == 0 {
                previous_sunday >= 25 && local.hour() >= 2
            } else {
                previous_sunday >= 25
            }
        }
        10 => {
            if weekday == 0 {
                (previous_sunday >= 25 && local.hour() < 2) || previous_sunday < 25
            } else {
                previous_sunday < 25
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn plain_summer_and_winter() {
        assert!(is_eu_dst(local(2025, 7, 15, 12, 0, 0)));
        assert!(is_eu_dst(local(2025, 4, 1, 0, 0, 0)));
        assert!(is_eu_dst(local(2025, 9, 30, 23, 59, 59)));
        assert!(!is_eu_dst(local(2025, 1, 10, 12, 0, 0)));
        assert!(!is_eu_dst(local(2025, 12, 24, 18, 0, 0)));
        assert!(!is_eu_dst(local(2025, 11, 1, 0, 0, 0)));
    }

    #[test]
    fn spring_boundary_2025() {
        // Last Sunday of March 2025 is the 30th; DST begins 02:00 local.
        assert!(!is_eu_dst(local(2025, 3, 30, 1, 59, 59)));
        assert!(is_eu_dst(local(2025, 3, 30, 2, 0, 0)));
        assert!(!is_eu_dst(local(2025, 3, 29, 12, 0, 0)));
        assert!(is_eu_dst(local(2025, 3, 31, 0, 0, 0)));
    }

    #[test]
    fn autumn_boundary_2025() {
        // Last Sunday of October 2025 is the 26th; DST ends 02:00 local.
        assert!(is_eu_dst(local(2025, 10, 26, 1, 59, 59)));
        assert!(!is_eu_dst(local(2025, 10, 26, 2, 0, 0)));
        assert!(is_eu_dst(local(2025, 10, 20, 12, 0, 0)));
        assert!(!is_eu_dst(local(2025, 10, 27, 12, 0, 0)));
    }

    #[test]
    fn conversion_through_spring_boundary() {
        // 00:59:59 UTC is 01:59:59 CET, still winter time.
        let before = local_from_utc(local(2025, 3, 30, 0, 59, 59));
        assert_eq!(before, local(2025, 3, 30, 1, 59, 59));

        // One second later the shifted time reaches 02:00 and the rule
        // engages; wall clocks jump to 03:00.
        let after = local_from_utc(local(2025, 3, 30, 1, 0, 0));
        assert_eq!(after, local(2025, 3, 30, 3, 0, 0));
    }

    #[test]
    fn conversion_plain_offsets() {
        assert_eq!(
            local_from_utc(local(2025, 1, 15, 12, 0, 0)),
            local(2025, 1, 15, 13, 0, 0)
        );
        assert_eq!(
            local_from_utc(local(2025, 7, 15, 12, 0, 0)),
            local(2025, 7, 15, 14, 0, 0)
        );
    }
}
