pub mod compactor;
pub mod ledger;
pub mod limits;
pub mod marketplace;
pub mod model;
pub mod notify;
pub mod observability;
pub mod wal;

pub use ledger::{Ledger, LedgerError};
pub use marketplace::{LedgerConfig, Marketplace};
pub use model::{Actor, BookingInfo, Day, ListingInfo, StayRange};
