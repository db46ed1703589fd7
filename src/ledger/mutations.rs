use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{RwLock, oneshot};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::availability::{conflicting_days, stay_price};
use super::dates::validate_stay;
use super::{Ledger, LedgerError, WalCommand};

impl Ledger {
    // ── Listing lifecycle ────────────────────────────────────

    pub async fn create_listing(
        &self,
        id: Ulid,
        title: String,
        daily_rate: Decimal,
        actor: Actor,
    ) -> Result<ListingInfo, LedgerError> {
        if self.state.len() >= MAX_LISTINGS {
            return Err(LedgerError::LimitExceeded("too many listings"));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(LedgerError::LimitExceeded("listing title too long"));
        }
        if daily_rate <= Decimal::ZERO {
            return Err(LedgerError::Validation("daily rate must be positive"));
        }
        if self.state.contains_key(&id) {
            return Err(LedgerError::AlreadyExists(id));
        }

        let event = Event::ListingCreated {
            id,
            title: title.clone(),
            daily_rate,
            created_by: actor.id,
        };
        self.wal_append(&event).await?;
        let ls = ListingState::new(id, title.clone(), daily_rate, actor.id);
        self.state.insert(id, Arc::new(RwLock::new(ls)));
        self.notify.send(id, &event);
        metrics::gauge!(crate::observability::LISTINGS_ACTIVE).set(self.state.len() as f64);
        Ok(ListingInfo {
            id,
            title,
            daily_rate,
            created_by: actor.id,
        })
    }

    /// Retitle or reprice a listing. Stored booking totals keep the rate
    /// they were committed under.
    pub async fn update_listing(
        &self,
        id: Ulid,
        title: String,
        daily_rate: Decimal,
        actor: Actor,
    ) -> Result<(), LedgerError> {
        if title.len() > MAX_TITLE_LEN {
            return Err(LedgerError::LimitExceeded("listing title too long"));
        }
        if daily_rate <= Decimal::ZERO {
            return Err(LedgerError::Validation("daily rate must be positive"));
        }
        let ls = self
            .get_listing(&id)
            .ok_or(LedgerError::NotFound(id))?;
        let mut guard = ls.write().await;
        if !actor.may_act_for(guard.created_by) {
            return Err(LedgerError::Forbidden(id));
        }

        let event = Event::ListingUpdated {
            id,
            title,
            daily_rate,
        };
        self.persist_and_apply(id, &mut guard, &event).await
    }

    pub async fn delete_listing(&self, id: Ulid, actor: Actor) -> Result<(), LedgerError> {
        let ls = self
            .get_listing(&id)
            .ok_or(LedgerError::NotFound(id))?;
        let guard = ls.write().await;
        if !actor.may_act_for(guard.created_by) {
            return Err(LedgerError::Forbidden(id));
        }
        if !guard.bookings.is_empty() {
            return Err(LedgerError::HasBookings(id));
        }

        let event = Event::ListingDeleted { id };
        self.wal_append(&event).await?;
        self.state.remove(&id);
        drop(guard);
        self.notify.send(id, &event);
        metrics::gauge!(crate::observability::LISTINGS_ACTIVE).set(self.state.len() as f64);
        Ok(())
    }

    // ── Booking lifecycle ────────────────────────────────────

    /// Commit a stay. The conflict check and the commit run under the
    /// listing's write lock, so two racing requests for overlapping days
    /// can never both succeed.
    pub async fn create_booking(
        &self,
        id: Ulid,
        listing_id: Ulid,
        check_in: Day,
        check_out: Day,
        actor: Actor,
    ) -> Result<BookingInfo, LedgerError> {
        validate_stay(check_in, check_out)?;
        let ls = self
            .get_listing(&listing_id)
            .ok_or(LedgerError::NotFound(listing_id))?;
        let mut guard = ls.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_LISTING {
            return Err(LedgerError::LimitExceeded("too many bookings on listing"));
        }

        let range = StayRange::new(check_in, check_out);
        let days = range.days();
        let conflicts = conflicting_days(&days, &guard.booked_days);
        if !conflicts.is_empty() {
            metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(LedgerError::Conflict { days: conflicts });
        }
        let total_price = stay_price(days.len() as u64, guard.daily_rate);

        let event = Event::BookingConfirmed {
            id,
            listing_id,
            range,
            total_price,
            created_by: actor.id,
        };
        self.persist_and_apply(listing_id, &mut guard, &event).await?;
        metrics::counter!(crate::observability::BOOKINGS_CONFIRMED_TOTAL).increment(1);
        Ok(BookingInfo {
            id,
            listing_id,
            check_in,
            check_out,
            total_price,
            created_by: actor.id,
        })
    }

    /// Move or resize a stay. The booking's own claim must not count
    /// against its new dates, so the new days are checked against the
    /// committed set minus the current range — shrinking a stay or
    /// shifting it onto its own days always passes. Nothing is mutated
    /// unless the whole revision goes through.
    pub async fn update_booking(
        &self,
        id: Ulid,
        check_in: Day,
        check_out: Day,
        actor: Actor,
    ) -> Result<BookingInfo, LedgerError> {
        validate_stay(check_in, check_out)?;
        let (listing_id, mut guard) = self.resolve_booking_write(&id).await?;
        let (current_range, created_by) = match guard.get_booking(id) {
            Some(b) => (b.range, b.created_by),
            None => return Err(LedgerError::NotFound(id)),
        };
        if !actor.may_act_for(created_by) {
            return Err(LedgerError::Forbidden(id));
        }

        let range = StayRange::new(check_in, check_out);
        let days = range.days();
        let conflicts: Vec<Day> = days
            .iter()
            .copied()
            .filter(|day| guard.booked_days.contains(day) && !current_range.contains_day(*day))
            .collect();
        if !conflicts.is_empty() {
            metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(LedgerError::Conflict { days: conflicts });
        }
        let total_price = stay_price(days.len() as u64, guard.daily_rate);

        let event = Event::BookingRevised {
            id,
            listing_id,
            range,
            total_price,
        };
        self.persist_and_apply(listing_id, &mut guard, &event).await?;
        Ok(BookingInfo {
            id,
            listing_id,
            check_in,
            check_out,
            total_price,
            created_by,
        })
    }

    /// Release a stay's days and drop the record. Terminal: the id is
    /// never reused; later operations on it get NotFound.
    pub async fn cancel_booking(&self, id: Ulid, actor: Actor) -> Result<Ulid, LedgerError> {
        let (listing_id, mut guard) = self.resolve_booking_write(&id).await?;
        let created_by = match guard.get_booking(id) {
            Some(b) => b.created_by,
            None => return Err(LedgerError::NotFound(id)),
        };
        if !actor.may_act_for(created_by) {
            return Err(LedgerError::Forbidden(id));
        }

        let event = Event::BookingCancelled { id, listing_id };
        self.persist_and_apply(listing_id, &mut guard, &event).await?;
        Ok(listing_id)
    }

    // ── WAL maintenance ──────────────────────────────────────

    /// Compact the WAL by rewriting it with only the events needed to
    /// recreate the current state.
    pub async fn compact_wal(&self) -> Result<(), LedgerError> {
        let mut events = Vec::new();
        let listings: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();
        for ls in listings {
            let guard = ls.read().await;
            events.push(Event::ListingCreated {
                id: guard.id,
                title: guard.title.clone(),
                daily_rate: guard.daily_rate,
                created_by: guard.created_by,
            });
            for b in &guard.bookings {
                events.push(Event::BookingConfirmed {
                    id: b.id,
                    listing_id: guard.id,
                    range: b.range,
                    total_price: b.total_price,
                    created_by: b.created_by,
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| LedgerError::Storage("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| LedgerError::Storage("WAL writer dropped response".into()))?
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
