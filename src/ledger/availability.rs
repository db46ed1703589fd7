use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::model::Day;

// ── Availability Checker ──────────────────────────────────────────

/// Days of a candidate stay already claimed on the listing, ascending.
/// Empty means the stay may be committed. Day equality is exact calendar
/// match — the `Day` type carries no clock or zone to disagree on.
pub fn conflicting_days(candidate: &[Day], committed: &BTreeSet<Day>) -> Vec<Day> {
    candidate
        .iter()
        .copied()
        .filter(|day| committed.contains(day))
        .collect()
}

/// Price of a stay: occupied-day count × the listing's daily rate.
/// `day_count` is the length of the inclusive expansion.
pub fn stay_price(day_count: u64, daily_rate: Decimal) -> Decimal {
    Decimal::from(day_count) * daily_rate
}

/// Days within the window claimed by nobody, ascending.
pub fn free_days(window: &[Day], committed: &BTreeSet<Day>) -> Vec<Day> {
    window
        .iter()
        .copied()
        .filter(|day| !committed.contains(day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::expand_stay;

    fn d(s: &str) -> Day {
        s.parse().unwrap()
    }

    fn committed(ranges: &[(&str, &str)]) -> BTreeSet<Day> {
        let mut set = BTreeSet::new();
        for (from, to) in ranges {
            set.extend(expand_stay(d(from), d(to)));
        }
        set
    }

    // ── conflicting_days ───────────────────────────────────

    #[test]
    fn disjoint_stays_do_not_conflict() {
        let booked = committed(&[("2024-06-01", "2024-06-03")]);
        let candidate = expand_stay(d("2024-06-04"), d("2024-06-05"));
        assert!(conflicting_days(&candidate, &booked).is_empty());
    }

    #[test]
    fn shared_turnover_day_conflicts() {
        let booked = committed(&[("2024-06-01", "2024-06-03")]);
        let candidate = expand_stay(d("2024-06-03"), d("2024-06-05"));
        assert_eq!(
            conflicting_days(&candidate, &booked),
            vec![d("2024-06-03")]
        );
    }

    #[test]
    fn full_overlap_reports_every_day() {
        let booked = committed(&[("2024-06-01", "2024-06-05")]);
        let candidate = expand_stay(d("2024-06-02"), d("2024-06-04"));
        assert_eq!(conflicting_days(&candidate, &booked).len(), 3);
    }

    #[test]
    fn conflicts_reported_ascending() {
        let booked = committed(&[("2024-06-01", "2024-06-02"), ("2024-06-08", "2024-06-09")]);
        let candidate = expand_stay(d("2024-06-01"), d("2024-06-09"));
        let conflicts = conflicting_days(&candidate, &booked);
        assert_eq!(
            conflicts,
            vec![d("2024-06-01"), d("2024-06-02"), d("2024-06-08"), d("2024-06-09")]
        );
    }

    #[test]
    fn empty_candidate_never_conflicts() {
        let booked = committed(&[("2024-06-01", "2024-06-03")]);
        assert!(conflicting_days(&[], &booked).is_empty());
    }

    #[test]
    fn non_conflicting_sets_can_coexist() {
        // If two day sets don't intersect, committing both leaves every day
        // claimed exactly once.
        let a = expand_stay(d("2024-06-01"), d("2024-06-03"));
        let b = expand_stay(d("2024-06-04"), d("2024-06-06"));
        let a_set: BTreeSet<Day> = a.iter().copied().collect();
        assert!(conflicting_days(&b, &a_set).is_empty());

        let mut both = a_set.clone();
        both.extend(b.iter().copied());
        assert_eq!(both.len(), a.len() + b.len());
    }

    // ── stay_price ─────────────────────────────────────────

    #[test]
    fn price_is_count_times_rate() {
        assert_eq!(stay_price(3, Decimal::from(100)), Decimal::from(300));
    }

    #[test]
    fn price_of_empty_stay_is_zero() {
        assert_eq!(stay_price(0, Decimal::from(100)), Decimal::ZERO);
    }

    #[test]
    fn price_keeps_cents_exact() {
        // 3 days at 99.95
        let rate = Decimal::new(9995, 2);
        assert_eq!(stay_price(3, rate), Decimal::new(29985, 2));
    }

    #[test]
    fn price_uses_inclusive_count() {
        // A 06-01..06-03 stay occupies three days, not checkOut - checkIn = 2.
        let days = expand_stay(d("2024-06-01"), d("2024-06-03"));
        assert_eq!(
            stay_price(days.len() as u64, Decimal::from(100)),
            Decimal::from(300)
        );
    }

    // ── free_days ──────────────────────────────────────────

    #[test]
    fn free_days_excludes_booked() {
        let booked = committed(&[("2024-06-02", "2024-06-03")]);
        let window = expand_stay(d("2024-06-01"), d("2024-06-04"));
        assert_eq!(
            free_days(&window, &booked),
            vec![d("2024-06-01"), d("2024-06-04")]
        );
    }

    #[test]
    fn free_days_of_empty_listing_is_whole_window() {
        let window = expand_stay(d("2024-06-01"), d("2024-06-05"));
        assert_eq!(free_days(&window, &BTreeSet::new()), window);
    }
}
