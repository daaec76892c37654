use anyhow::{bail, Result};
use billing_service::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::ReadingStoreSink,
    sources::{ImportedReading, ReadingCsvFileSource},
    transform,
};
use meter_client::db;
use std::{env, sync::Arc};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: backfill_readings <csv_file_path>");
    }
    let file_path = &args[1];

    // Point BILLING_CONFIG at the ledger the readings should land in.
    let cfg = AppConfig::load()?;
    let pool = db::connect(&cfg.database.url, cfg.database.max_connections).await?;

    let pipeline: Pipeline<_, ImportedReading, _> = Pipeline {
        source: ReadingCsvFileSource::new(file_path),
        transforms: vec![Arc::new(transform::ReadingValidation::new(cfg.blocks.rule()))],
        sink: ReadingStoreSink::new(pool, cfg.backfill.batch_size),
    };

    let stored = pipeline.run().await?;
    tracing::info!(stored, file = %file_path, "backfill complete");

    Ok(())
}
