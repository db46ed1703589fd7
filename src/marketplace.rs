use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::compactor;
use crate::ledger::Ledger;
use crate::notify::NotifyHub;

/// Runtime configuration. Read from `LODGEBOOK_*` env vars or built directly.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    /// WAL appends between background compactions.
    pub compact_threshold: u64,
    pub metrics_port: Option<u16>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            compact_threshold: 1000,
            metrics_port: None,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("LODGEBOOK_DATA_DIR").unwrap_or_else(|_| "./data".into());
        let compact_threshold = std::env::var("LODGEBOOK_COMPACT_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000);
        let metrics_port = std::env::var("LODGEBOOK_METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok());
        Self {
            data_dir: PathBuf::from(data_dir),
            compact_threshold,
            metrics_port,
        }
    }
}

/// The marketplace: one ledger, one WAL, one background compactor.
/// Constructed explicitly and passed around — never a process-wide global.
pub struct Marketplace {
    ledger: Arc<Ledger>,
}

impl Marketplace {
    pub fn open(config: &LedgerConfig) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        crate::observability::init(config.metrics_port);

        let wal_path = config.data_dir.join("marketplace.wal");
        let notify = Arc::new(NotifyHub::new());
        let ledger = Arc::new(Ledger::new(wal_path, notify)?);

        let compactor_ledger = ledger.clone();
        let threshold = config.compact_threshold;
        tokio::spawn(async move {
            compactor::run_compactor(compactor_ledger, threshold).await;
        });

        info!("marketplace open, data_dir: {}", config.data_dir.display());
        Ok(Self { ledger })
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        self.ledger.clone()
    }
}
