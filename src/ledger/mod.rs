mod availability;
mod dates;
mod error;
mod mutations;
mod queries;

pub use availability::{conflicting_days, free_days, stay_price};
pub use dates::{day_of, expand_stay};
pub use error::LedgerError;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};
use ulid::Ulid;

use crate::model::*;
use crate::notify::NotifyHub;
use crate::wal::Wal;

pub type SharedListingState = Arc<RwLock<ListingState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task owning the WAL. Appends are batched for group commit:
/// take the first waiting append, drain everything already queued behind
/// it, fsync the lot once, then answer every caller.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(first) = rx.recv().await {
        let mut batch = Vec::new();
        match first {
            WalCommand::Append { event, response } => batch.push((event, response)),
            other => {
                handle_non_append(&mut wal, other);
                continue;
            }
        }

        // Everything already queued rides the same fsync. A non-append
        // command ends the batch window and runs after the flush.
        let mut deferred = None;
        while let Ok(cmd) = rx.try_recv() {
            match cmd {
                WalCommand::Append { event, response } => batch.push((event, response)),
                other => {
                    deferred = Some(other);
                    break;
                }
            }
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
            .record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut wal, &batch);
        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());

        for (_, tx) in batch {
            let outcome = match &result {
                Ok(()) => Ok(()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            };
            let _ = tx.send(outcome);
        }

        if let Some(cmd) = deferred {
            handle_non_append(&mut wal, cmd);
        }
    }
}

fn flush_batch(
    wal: &mut Wal,
    batch: &[(Event, oneshot::Sender<io::Result<()>>)],
) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush — even on append error — so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

// ── The ledger ───────────────────────────────────────────

pub struct Ledger {
    pub state: DashMap<Ulid, SharedListingState>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    pub notify: Arc<NotifyHub>,
    /// Reverse lookup: booking id → listing id.
    pub(super) booking_to_listing: DashMap<Ulid, Ulid>,
}

/// Apply an event directly to a ListingState (no locking — caller holds
/// the listing's write lock). Keeps `booked_days` the union of the live
/// bookings' day ranges.
fn apply_to_listing(ls: &mut ListingState, event: &Event, bookings: &DashMap<Ulid, Ulid>) {
    match event {
        Event::BookingConfirmed {
            id,
            listing_id,
            range,
            total_price,
            created_by,
        } => {
            ls.commit_days(&range.days());
            ls.insert_booking(StayRecord {
                id: *id,
                range: *range,
                total_price: *total_price,
                created_by: *created_by,
            });
            bookings.insert(*id, *listing_id);
        }
        Event::BookingRevised {
            id,
            listing_id,
            range,
            total_price,
        } => {
            if let Some(old) = ls.remove_booking(*id) {
                ls.release_days(&old.range.days());
                ls.commit_days(&range.days());
                ls.insert_booking(StayRecord {
                    id: *id,
                    range: *range,
                    total_price: *total_price,
                    created_by: old.created_by,
                });
            }
            bookings.insert(*id, *listing_id);
        }
        Event::BookingCancelled { id, .. } => {
            if let Some(old) = ls.remove_booking(*id) {
                ls.release_days(&old.range.days());
            }
            bookings.remove(id);
        }
        Event::ListingUpdated {
            title, daily_rate, ..
        } => {
            ls.title = title.clone();
            ls.daily_rate = *daily_rate;
        }
        // ListingCreated/Deleted are handled at the DashMap level, not here
        Event::ListingCreated { .. } | Event::ListingDeleted { .. } => {}
    }
}

impl Ledger {
    pub fn new(wal_path: PathBuf, notify: Arc<NotifyHub>) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let ledger = Self {
            state: DashMap::new(),
            wal_tx,
            notify,
            booking_to_listing: DashMap::new(),
        };

        // Replay events — we're the sole owner of these Arcs, so try_write
        // always succeeds instantly (no contention). Never use blocking_write
        // here because this may run inside an async context.
        for event in &events {
            match event {
                Event::ListingCreated {
                    id,
                    title,
                    daily_rate,
                    created_by,
                } => {
                    let ls = ListingState::new(*id, title.clone(), *daily_rate, *created_by);
                    ledger.state.insert(*id, Arc::new(RwLock::new(ls)));
                }
                Event::ListingDeleted { id } => {
                    ledger.state.remove(id);
                }
                other => {
                    if let Some(listing_id) = event_listing_id(other)
                        && let Some(entry) = ledger.state.get(&listing_id)
                    {
                        let ls_arc = entry.clone();
                        let mut guard = ls_arc.try_write().expect("replay: uncontended write");
                        apply_to_listing(&mut guard, other, &ledger.booking_to_listing);
                    }
                }
            }
        }

        Ok(ledger)
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), LedgerError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| LedgerError::Storage("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| LedgerError::Storage("WAL writer dropped response".into()))?
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    pub fn get_listing(&self, id: &Ulid) -> Option<SharedListingState> {
        self.state.get(id).map(|e| e.value().clone())
    }

    pub fn listing_for_booking(&self, booking_id: &Ulid) -> Option<Ulid> {
        self.booking_to_listing.get(booking_id).map(|e| *e.value())
    }

    /// WAL-append + apply + notify in one call. The append runs first: if
    /// the log rejects the event, in-memory state is untouched and no
    /// partial mutation is ever observable.
    pub(super) async fn persist_and_apply(
        &self,
        listing_id: Ulid,
        ls: &mut ListingState,
        event: &Event,
    ) -> Result<(), LedgerError> {
        self.wal_append(event).await?;
        apply_to_listing(ls, event, &self.booking_to_listing);
        self.notify.send(listing_id, event);
        Ok(())
    }

    /// Lookup booking → listing, get the listing, acquire its write lock.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<ListingState>), LedgerError> {
        let listing_id = self
            .listing_for_booking(booking_id)
            .ok_or(LedgerError::NotFound(*booking_id))?;
        let ls = self
            .get_listing(&listing_id)
            .ok_or(LedgerError::NotFound(listing_id))?;
        let guard = ls.write_owned().await;
        Ok((listing_id, guard))
    }
}

/// Extract the listing_id from an event (for non-Create/Delete events).
fn event_listing_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::BookingConfirmed { listing_id, .. }
        | Event::BookingRevised { listing_id, .. }
        | Event::BookingCancelled { listing_id, .. } => Some(*listing_id),
        Event::ListingUpdated { id, .. } => Some(*id),
        Event::ListingCreated { .. } | Event::ListingDeleted { .. } => None,
    }
}
