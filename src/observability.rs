use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: bookings committed (create only, not revisions).
pub const BOOKINGS_CONFIRMED_TOTAL: &str = "lodgebook_bookings_confirmed_total";

/// Counter: create/update attempts rejected for conflicting days.
pub const BOOKING_CONFLICTS_TOTAL: &str = "lodgebook_booking_conflicts_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: listings currently live in the ledger.
pub const LISTINGS_ACTIVE: &str = "lodgebook_listings_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "lodgebook_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "lodgebook_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Install the fmt tracing subscriber. Safe to call repeatedly; only the
/// first caller wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
