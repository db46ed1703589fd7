use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::ledger::Ledger;

/// Background task that rewrites the WAL once enough appends accumulate.
pub async fn run_compactor(ledger: Arc<Ledger>, threshold: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let appended = ledger.wal_appends_since_compact().await;
        if appended < threshold {
            continue;
        }
        match ledger.compact_wal().await {
            Ok(()) => info!("compacted WAL after {appended} appends"),
            Err(e) => {
                // The writer may be mid-shutdown — retry next tick
                tracing::debug!("compaction skipped: {e}");
            }
        }
    }
}
