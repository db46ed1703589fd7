use rust_decimal::Decimal;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::availability::{conflicting_days, free_days, stay_price};
use super::dates::{expand_stay, validate_stay};
use super::{Ledger, LedgerError, SharedListingState};

fn booking_info(listing_id: Ulid, b: &StayRecord) -> BookingInfo {
    BookingInfo {
        id: b.id,
        listing_id,
        check_in: b.range.check_in,
        check_out: b.range.check_out,
        total_price: b.total_price,
        created_by: b.created_by,
    }
}

impl Ledger {
    /// Snapshot of a listing's committed days, ascending. May be stale by
    /// the time a write is attempted; the write-side check-and-commit
    /// resolves that, not the reader.
    pub async fn booked_days(&self, listing_id: Ulid) -> Result<Vec<Day>, LedgerError> {
        let ls = self
            .get_listing(&listing_id)
            .ok_or(LedgerError::NotFound(listing_id))?;
        let guard = ls.read().await;
        Ok(guard.booked_days.iter().copied().collect())
    }

    pub async fn get_booking(&self, id: Ulid) -> Result<BookingInfo, LedgerError> {
        let listing_id = self
            .listing_for_booking(&id)
            .ok_or(LedgerError::NotFound(id))?;
        let ls = self
            .get_listing(&listing_id)
            .ok_or(LedgerError::NotFound(listing_id))?;
        let guard = ls.read().await;
        let record = guard.get_booking(id).ok_or(LedgerError::NotFound(id))?;
        Ok(booking_info(listing_id, record))
    }

    /// A listing's live bookings, in check-in order.
    pub async fn bookings_for_listing(
        &self,
        listing_id: Ulid,
    ) -> Result<Vec<BookingInfo>, LedgerError> {
        let ls = self
            .get_listing(&listing_id)
            .ok_or(LedgerError::NotFound(listing_id))?;
        let guard = ls.read().await;
        Ok(guard
            .bookings
            .iter()
            .map(|b| booking_info(listing_id, b))
            .collect())
    }

    /// Every live booking created by `user`, across all listings.
    pub async fn bookings_for_user(&self, user: Ulid) -> Vec<BookingInfo> {
        let listings: Vec<SharedListingState> =
            self.state.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::new();
        for ls in listings {
            let guard = ls.read().await;
            for b in guard.bookings.iter().filter(|b| b.created_by == user) {
                out.push(booking_info(guard.id, b));
            }
        }
        out
    }

    pub async fn list_listings(&self) -> Vec<ListingInfo> {
        let listings: Vec<SharedListingState> =
            self.state.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::with_capacity(listings.len());
        for ls in listings {
            let guard = ls.read().await;
            out.push(ListingInfo {
                id: guard.id,
                title: guard.title.clone(),
                daily_rate: guard.daily_rate,
                created_by: guard.created_by,
            });
        }
        out
    }

    /// A listing's bookings touching `[from, to]`, in check-in order.
    pub async fn bookings_in_window(
        &self,
        listing_id: Ulid,
        from: Day,
        to: Day,
    ) -> Result<Vec<BookingInfo>, LedgerError> {
        if to < from {
            return Err(LedgerError::Validation("window end precedes start"));
        }
        let ls = self
            .get_listing(&listing_id)
            .ok_or(LedgerError::NotFound(listing_id))?;
        let guard = ls.read().await;
        let window = StayRange::new(from, to);
        Ok(guard
            .bookings_in(&window)
            .map(|b| booking_info(listing_id, b))
            .collect())
    }

    /// Days in `[from, to]` with no booking, for calendar rendering.
    pub async fn compute_free_days(
        &self,
        listing_id: Ulid,
        from: Day,
        to: Day,
    ) -> Result<Vec<Day>, LedgerError> {
        if to < from {
            return Err(LedgerError::Validation("window end precedes start"));
        }
        let width = to.signed_duration_since(from).num_days() as u64 + 1;
        if width > MAX_QUERY_WINDOW_DAYS {
            return Err(LedgerError::LimitExceeded("query window too wide"));
        }
        let ls = self
            .get_listing(&listing_id)
            .ok_or(LedgerError::NotFound(listing_id))?;
        let guard = ls.read().await;
        let window = expand_stay(from, to);
        Ok(free_days(&window, &guard.booked_days))
    }

    /// Price a prospective stay without committing it. Conflicting days
    /// are reported the same way a create would report them.
    pub async fn quote_stay(
        &self,
        listing_id: Ulid,
        check_in: Day,
        check_out: Day,
    ) -> Result<Decimal, LedgerError> {
        validate_stay(check_in, check_out)?;
        let ls = self
            .get_listing(&listing_id)
            .ok_or(LedgerError::NotFound(listing_id))?;
        let guard = ls.read().await;
        let days = expand_stay(check_in, check_out);
        let conflicts = conflicting_days(&days, &guard.booked_days);
        if !conflicts.is_empty() {
            return Err(LedgerError::Conflict { days: conflicts });
        }
        Ok(stay_price(days.len() as u64, guard.daily_rate))
    }
}
