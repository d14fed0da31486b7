use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use livestock_store::config::Settings;
use livestock_store::storage::{MemoryStore, MinioStore, SalesLedger};
use livestock_store::utils::init_tracing;

/// Uploads delivered orders from the store snapshot to MinIO as a Parquet ledger.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let settings = Settings::new()?;

    let path = settings
        .store
        .snapshot_path
        .clone()
        .context("store.snapshot_path must be set to export sales")?;
    let store = MemoryStore::open(&path).await?;
    let orders = store.read(|db| db.orders.values().cloned().collect::<Vec<_>>()).await;

    let minio = MinioStore::new(&settings.minio).await?;
    let started = Utc::now();
    let key = SalesLedger::export(&orders, &minio, started).await?;

    info!(
        key = %key,
        orders = orders.len(),
        elapsed_ms = (Utc::now() - started).num_milliseconds(),
        "Sales export complete"
    );
    Ok(())
}
