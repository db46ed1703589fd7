use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Calendar day — the only time type. Year/month/day, no clock, no zone.
pub type Day = NaiveDate;

/// Inclusive stay `[check_in, check_out]` in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: Day,
    pub check_out: Day,
}

impl StayRange {
    pub fn new(check_in: Day, check_out: Day) -> Self {
        debug_assert!(
            check_in <= check_out,
            "StayRange check-in must not follow check-out"
        );
        Self {
            check_in,
            check_out,
        }
    }

    /// Every day of the stay, ascending. A same-day stay occupies one day.
    pub fn days(&self) -> Vec<Day> {
        crate::ledger::expand_stay(self.check_in, self.check_out)
    }

    /// Number of occupied days — the length of the inclusive expansion,
    /// never raw calendar subtraction.
    pub fn day_count(&self) -> u64 {
        self.days().len() as u64
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in <= other.check_out && other.check_in <= self.check_out
    }

    pub fn contains_day(&self, day: Day) -> bool {
        self.check_in <= day && day <= self.check_out
    }
}

/// Who is asking. Admins may act on any booking or listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Ulid,
    pub admin: bool,
}

impl Actor {
    pub fn user(id: Ulid) -> Self {
        Self { id, admin: false }
    }

    pub fn admin(id: Ulid) -> Self {
        Self { id, admin: true }
    }

    /// Owners act for themselves; admins act for anyone.
    pub fn may_act_for(&self, owner: Ulid) -> bool {
        self.admin || self.id == owner
    }
}

/// A confirmed booking as held by its listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayRecord {
    pub id: Ulid,
    pub range: StayRange,
    /// Priced when the stay was committed; never recomputed afterwards.
    pub total_price: Decimal,
    pub created_by: Ulid,
}

#[derive(Debug, Clone)]
pub struct ListingState {
    pub id: Ulid,
    pub title: String,
    pub daily_rate: Decimal,
    pub created_by: Ulid,
    /// Union of all live bookings' days. The ledger is the only writer.
    pub booked_days: BTreeSet<Day>,
    /// Live bookings, sorted by check-in.
    pub bookings: Vec<StayRecord>,
}

impl ListingState {
    pub fn new(id: Ulid, title: String, daily_rate: Decimal, created_by: Ulid) -> Self {
        Self {
            id,
            title,
            daily_rate,
            created_by,
            booked_days: BTreeSet::new(),
            bookings: Vec::new(),
        }
    }

    /// Insert a booking maintaining check-in order.
    pub fn insert_booking(&mut self, record: StayRecord) {
        let pos = self
            .bookings
            .binary_search_by_key(&record.range.check_in, |b| b.range.check_in)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, record);
    }

    /// Remove a booking by id.
    pub fn remove_booking(&mut self, id: Ulid) -> Option<StayRecord> {
        if let Some(pos) = self.bookings.iter().position(|b| b.id == id) {
            Some(self.bookings.remove(pos))
        } else {
            None
        }
    }

    pub fn get_booking(&self, id: Ulid) -> Option<&StayRecord> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// Bookings whose stay touches the window.
    /// Binary search skips bookings checking in after the window closes.
    pub fn bookings_in(&self, window: &StayRange) -> impl Iterator<Item = &StayRecord> {
        // Everything at index >= right checks in after window.check_out → can't touch it.
        let right = self
            .bookings
            .partition_point(|b| b.range.check_in <= window.check_out);
        self.bookings[..right]
            .iter()
            .filter(move |b| b.range.check_out >= window.check_in)
    }

    /// Claim a booking's days.
    pub fn commit_days(&mut self, days: &[Day]) {
        for day in days {
            self.booked_days.insert(*day);
        }
    }

    /// Release a booking's days.
    pub fn release_days(&mut self, days: &[Day]) {
        for day in days {
            self.booked_days.remove(day);
        }
    }
}

/// The event types — flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ListingCreated {
        id: Ulid,
        title: String,
        daily_rate: Decimal,
        created_by: Ulid,
    },
    ListingUpdated {
        id: Ulid,
        title: String,
        daily_rate: Decimal,
    },
    ListingDeleted {
        id: Ulid,
    },
    BookingConfirmed {
        id: Ulid,
        listing_id: Ulid,
        range: StayRange,
        total_price: Decimal,
        created_by: Ulid,
    },
    BookingRevised {
        id: Ulid,
        listing_id: Ulid,
        range: StayRange,
        total_price: Decimal,
    },
    BookingCancelled {
        id: Ulid,
        listing_id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingInfo {
    pub id: Ulid,
    pub title: String,
    pub daily_rate: Decimal,
    pub created_by: Ulid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingInfo {
    pub id: Ulid,
    pub listing_id: Ulid,
    pub check_in: Day,
    pub check_out: Day,
    pub total_price: Decimal,
    pub created_by: Ulid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Day {
        s.parse().unwrap()
    }

    fn rate(n: u32) -> Decimal {
        Decimal::from(n)
    }

    fn stay(id: Ulid, check_in: &str, check_out: &str) -> StayRecord {
        StayRecord {
            id,
            range: StayRange::new(d(check_in), d(check_out)),
            total_price: rate(100),
            created_by: Ulid::new(),
        }
    }

    #[test]
    fn stay_range_basics() {
        let r = StayRange::new(d("2024-06-01"), d("2024-06-03"));
        assert_eq!(r.day_count(), 3);
        assert!(r.contains_day(d("2024-06-01")));
        assert!(r.contains_day(d("2024-06-03"))); // inclusive
        assert!(!r.contains_day(d("2024-06-04")));
    }

    #[test]
    fn stay_range_overlap() {
        let a = StayRange::new(d("2024-06-01"), d("2024-06-03"));
        let b = StayRange::new(d("2024-06-03"), d("2024-06-05"));
        let c = StayRange::new(d("2024-06-04"), d("2024-06-05"));
        assert!(a.overlaps(&b)); // shared turnover day conflicts at day granularity
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn booking_ordering() {
        let mut ls = ListingState::new(Ulid::new(), "Cabin".into(), rate(100), Ulid::new());
        ls.insert_booking(stay(Ulid::new(), "2024-06-10", "2024-06-12"));
        ls.insert_booking(stay(Ulid::new(), "2024-06-01", "2024-06-03"));
        ls.insert_booking(stay(Ulid::new(), "2024-06-05", "2024-06-07"));
        assert_eq!(ls.bookings[0].range.check_in, d("2024-06-01"));
        assert_eq!(ls.bookings[1].range.check_in, d("2024-06-05"));
        assert_eq!(ls.bookings[2].range.check_in, d("2024-06-10"));
    }

    #[test]
    fn booking_remove() {
        let mut ls = ListingState::new(Ulid::new(), "Cabin".into(), rate(100), Ulid::new());
        let id = Ulid::new();
        ls.insert_booking(stay(id, "2024-06-01", "2024-06-03"));
        assert_eq!(ls.bookings.len(), 1);
        assert!(ls.remove_booking(id).is_some());
        assert!(ls.bookings.is_empty());
    }

    #[test]
    fn remove_nonexistent_returns_none() {
        let mut ls = ListingState::new(Ulid::new(), "Cabin".into(), rate(100), Ulid::new());
        ls.insert_booking(stay(Ulid::new(), "2024-06-01", "2024-06-03"));
        assert!(ls.remove_booking(Ulid::new()).is_none());
        assert_eq!(ls.bookings.len(), 1); // original still there
    }

    #[test]
    fn remove_middle_preserves_order() {
        let mut ls = ListingState::new(Ulid::new(), "Cabin".into(), rate(100), Ulid::new());
        let ids: Vec<Ulid> = (0..3).map(|_| Ulid::new()).collect();
        ls.insert_booking(stay(ids[0], "2024-06-01", "2024-06-02"));
        ls.insert_booking(stay(ids[1], "2024-06-05", "2024-06-06"));
        ls.insert_booking(stay(ids[2], "2024-06-09", "2024-06-10"));
        ls.remove_booking(ids[1]); // remove middle
        assert_eq!(ls.bookings.len(), 2);
        assert_eq!(ls.bookings[0].id, ids[0]);
        assert_eq!(ls.bookings[1].id, ids[2]);
    }

    #[test]
    fn bookings_in_window() {
        let mut ls = ListingState::new(Ulid::new(), "Cabin".into(), rate(100), Ulid::new());
        ls.insert_booking(stay(Ulid::new(), "2024-05-01", "2024-05-03")); // past
        ls.insert_booking(stay(Ulid::new(), "2024-06-02", "2024-06-04")); // inside
        ls.insert_booking(stay(Ulid::new(), "2024-07-01", "2024-07-03")); // future

        let window = StayRange::new(d("2024-06-01"), d("2024-06-30"));
        let hits: Vec<_> = ls.bookings_in(&window).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].range.check_in, d("2024-06-02"));
    }

    #[test]
    fn bookings_in_window_inclusive_edges() {
        let mut ls = ListingState::new(Ulid::new(), "Cabin".into(), rate(100), Ulid::new());
        // Checks out on the day the window opens — still touches it.
        ls.insert_booking(stay(Ulid::new(), "2024-05-28", "2024-06-01"));
        let window = StayRange::new(d("2024-06-01"), d("2024-06-30"));
        assert_eq!(ls.bookings_in(&window).count(), 1);
    }

    #[test]
    fn commit_and_release_days() {
        let mut ls = ListingState::new(Ulid::new(), "Cabin".into(), rate(100), Ulid::new());
        let days = vec![d("2024-06-01"), d("2024-06-02"), d("2024-06-03")];
        ls.commit_days(&days);
        assert_eq!(ls.booked_days.len(), 3);
        ls.release_days(&days[..2]);
        assert_eq!(ls.booked_days.len(), 1);
        assert!(ls.booked_days.contains(&d("2024-06-03")));
    }

    #[test]
    fn actor_permissions() {
        let owner = Ulid::new();
        assert!(Actor::user(owner).may_act_for(owner));
        assert!(!Actor::user(Ulid::new()).may_act_for(owner));
        assert!(Actor::admin(Ulid::new()).may_act_for(owner));
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::BookingConfirmed {
            id: Ulid::new(),
            listing_id: Ulid::new(),
            range: StayRange::new(d("2024-06-01"), d("2024-06-03")),
            total_price: Decimal::new(30000, 2),
            created_by: Ulid::new(),
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
