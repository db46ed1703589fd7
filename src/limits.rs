//! Hard limits. Every mutation validates against these before touching state.

/// Max listings held by one ledger.
pub const MAX_LISTINGS: usize = 100_000;

/// Max live bookings on a single listing.
pub const MAX_BOOKINGS_PER_LISTING: usize = 10_000;

/// Max length of a listing title in bytes.
pub const MAX_TITLE_LEN: usize = 200;

/// Longest accepted stay, in occupied days.
pub const MAX_STAY_DAYS: u64 = 365;

/// Widest calendar window a free-day query may scan.
pub const MAX_QUERY_WINDOW_DAYS: u64 = 1_100;

/// Accepted year range for any check-in/check-out day.
pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;
