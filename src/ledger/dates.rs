use chrono::{DateTime, Datelike, Utc};

use crate::limits::*;
use crate::model::Day;

use super::LedgerError;

// ── Stay expansion ────────────────────────────────────────────────

/// Expand a (check-in, check-out) pair into every day of the stay,
/// inclusive and ascending. An inverted pair expands to nothing — the
/// caller rejects that as a validation error, not this function. A
/// same-day pair occupies exactly one day.
pub fn expand_stay(check_in: Day, check_out: Day) -> Vec<Day> {
    if check_out < check_in {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = check_in;
    while current <= check_out {
        days.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break, // end of the calendar
        }
    }
    days
}

/// Truncate a timestamp to its calendar day. Stored dates may carry
/// incidental clock time; two timestamps naming the same day must expand
/// identically, so boundary callers normalize through this.
pub fn day_of(ts: DateTime<Utc>) -> Day {
    ts.date_naive()
}

/// Reject inverted, out-of-range, or over-long stays before expansion.
/// The width check runs on calendar arithmetic so a hostile range is
/// refused without materializing it.
pub(crate) fn validate_stay(check_in: Day, check_out: Day) -> Result<(), LedgerError> {
    if check_out < check_in {
        return Err(LedgerError::Validation("check-out precedes check-in"));
    }
    if check_in.year() < MIN_YEAR || check_out.year() > MAX_YEAR {
        return Err(LedgerError::LimitExceeded("day out of range"));
    }
    let width = check_out.signed_duration_since(check_in).num_days() as u64 + 1;
    if width > MAX_STAY_DAYS {
        return Err(LedgerError::LimitExceeded("stay too long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(s: &str) -> Day {
        s.parse().unwrap()
    }

    // ── expand_stay ────────────────────────────────────────

    #[test]
    fn expand_three_days() {
        let days = expand_stay(d("2024-06-01"), d("2024-06-03"));
        assert_eq!(
            days,
            vec![d("2024-06-01"), d("2024-06-02"), d("2024-06-03")]
        );
    }

    #[test]
    fn expand_same_day_is_one_day() {
        assert_eq!(
            expand_stay(d("2024-06-01"), d("2024-06-01")),
            vec![d("2024-06-01")]
        );
    }

    #[test]
    fn expand_inverted_is_empty() {
        assert!(expand_stay(d("2024-06-03"), d("2024-06-01")).is_empty());
    }

    #[test]
    fn expand_crosses_month_boundary() {
        let days = expand_stay(d("2024-06-29"), d("2024-07-02"));
        assert_eq!(days.len(), 4);
        assert_eq!(days[1], d("2024-06-30"));
        assert_eq!(days[2], d("2024-07-01"));
    }

    #[test]
    fn expand_handles_leap_day() {
        let days = expand_stay(d("2024-02-28"), d("2024-03-01"));
        assert_eq!(
            days,
            vec![d("2024-02-28"), d("2024-02-29"), d("2024-03-01")]
        );
    }

    #[test]
    fn expand_count_matches_calendar_width() {
        let check_in = d("2024-06-01");
        let check_out = d("2024-09-13");
        let days = expand_stay(check_in, check_out);
        let width = check_out.signed_duration_since(check_in).num_days();
        assert_eq!(days.len() as i64, width + 1);
    }

    #[test]
    fn expand_is_pure() {
        let a = expand_stay(d("2024-06-01"), d("2024-06-05"));
        let b = expand_stay(d("2024-06-01"), d("2024-06-05"));
        assert_eq!(a, b);
    }

    #[test]
    fn expand_sorted_no_duplicates() {
        let days = expand_stay(d("2024-06-01"), d("2024-06-10"));
        for pair in days.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    // ── day_of ─────────────────────────────────────────────

    #[test]
    fn day_of_strips_clock_time() {
        let morning = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap();
        assert_eq!(day_of(morning), day_of(night));
        assert_eq!(day_of(morning), d("2024-06-01"));
    }

    #[test]
    fn same_day_timestamps_expand_identically() {
        let a = day_of(Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap());
        let b = day_of(Utc.with_ymd_and_hms(2024, 6, 1, 22, 0, 0).unwrap());
        assert_eq!(
            expand_stay(a, d("2024-06-03")),
            expand_stay(b, d("2024-06-03"))
        );
    }

    // ── validate_stay ──────────────────────────────────────

    #[test]
    fn validate_accepts_same_day() {
        assert!(validate_stay(d("2024-06-01"), d("2024-06-01")).is_ok());
    }

    #[test]
    fn validate_rejects_inverted() {
        let err = validate_stay(d("2024-06-02"), d("2024-06-01"));
        assert!(matches!(err, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn validate_rejects_ancient_day() {
        let err = validate_stay(d("1999-12-31"), d("2024-06-01"));
        assert!(matches!(err, Err(LedgerError::LimitExceeded(_))));
    }

    #[test]
    fn validate_rejects_overlong_stay() {
        let err = validate_stay(d("2024-01-01"), d("2026-01-01"));
        assert!(matches!(err, Err(LedgerError::LimitExceeded(_))));
    }

    #[test]
    fn validate_accepts_year_long_stay() {
        assert!(validate_stay(d("2024-01-01"), d("2024-12-30")).is_ok());
    }
}
