use ulid::Ulid;

use crate::model::Day;

#[derive(Debug)]
pub enum LedgerError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// Requested days are already claimed by another booking.
    /// Carries the exact offending days for user-facing messaging.
    Conflict { days: Vec<Day> },
    /// Requester is neither the record's creator nor an admin.
    Forbidden(Ulid),
    /// Listing still has live bookings and cannot be deleted.
    HasBookings(Ulid),
    Validation(&'static str),
    LimitExceeded(&'static str),
    /// The durable log failed mid-operation. The only retryable class:
    /// a failed attempt leaves no partial state behind.
    Storage(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::NotFound(id) => write!(f, "not found: {id}"),
            LedgerError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            LedgerError::Conflict { days } => {
                write!(f, "days already booked: ")?;
                for (i, day) in days.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{day}")?;
                }
                Ok(())
            }
            LedgerError::Forbidden(id) => write!(f, "not allowed to modify: {id}"),
            LedgerError::HasBookings(id) => {
                write!(f, "cannot delete listing {id}: has live bookings")
            }
            LedgerError::Validation(msg) => write!(f, "invalid request: {msg}"),
            LedgerError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            LedgerError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for LedgerError {}
