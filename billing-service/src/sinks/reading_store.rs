use futures::StreamExt;
use meter_client::{
    db,
    domain::{format_date, format_time, NewReading},
};
use sqlx::SqlitePool;

use crate::billing;
use crate::pipeline::{Envelope, PipelineError, Sink};
use crate::sources::ImportedReading;

/// Writes imported readings into the ledger, one transaction per batch.
pub struct ReadingStoreSink {
    pool: SqlitePool,
    batch_size: usize,
}

impl ReadingStoreSink {
    pub fn new(pool: SqlitePool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
        }
    }

    async fn flush_batch(&self, batch: &[Envelope<ImportedReading>]) -> Result<(), PipelineError> {
        if batch.is_empty() {
            return Ok(());
        }

        match self.insert_batch(batch).await {
            Ok(()) => {
                metrics::counter!("backfill_ingested_records_total").increment(batch.len() as u64);
                tracing::debug!(records = batch.len(), "backfill batch committed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, records = batch.len(), "backfill batch failed");
                metrics::counter!("backfill_sink_errors_total").increment(1);
                Err(PipelineError::Sink(e.to_string()))
            }
        }
    }

    async fn insert_batch(&self, batch: &[Envelope<ImportedReading>]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for env in batch {
            let r = &env.payload;
            let final_payment = match r.final_payment {
                Some(v) => v,
                None => {
                    // Priced against what precedes it, including earlier rows of this batch.
                    let previous = db::previous_reading(
                        &mut *tx,
                        &r.block_id,
                        &format_date(r.recorded_at.date()),
                        &format_time(r.recorded_at.time()),
                    )
                    .await?;
                    billing::compute_bill(
                        r.meter_reading,
                        previous,
                        r.tariff_rate,
                        r.vat_percent,
                        r.additional_fee,
                    )
                    .final_payment
                }
            };

            db::insert_reading(
                &mut *tx,
                &NewReading {
                    block_id: r.block_id.clone(),
                    meter_reading: r.meter_reading,
                    vat_percent: r.vat_percent,
                    additional_fee: r.additional_fee,
                    final_payment,
                    tariff_rate: r.tariff_rate,
                    recorded_at: r.recorded_at,
                },
            )
            .await?;
        }

        tx.commit().await
    }
}

#[async_trait::async_trait]
impl Sink<ImportedReading> for ReadingStoreSink {
    async fn run<S>(&self, mut input: S) -> Result<usize, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<ImportedReading>, PipelineError>>
            + Send
            + Unpin
            + 'static,
    {
        let mut buffer: Vec<Envelope<ImportedReading>> = Vec::with_capacity(self.batch_size);
        let mut stored = 0;

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping record rejected upstream");
                    continue;
                }
            };

            buffer.push(env);
            if buffer.len() >= self.batch_size {
                self.flush_batch(&buffer).await?;
                stored += buffer.len();
                buffer.clear();
            }
        }

        if !buffer.is_empty() {
            self.flush_batch(&buffer).await?;
            stored += buffer.len();
        }

        Ok(stored)
    }
}
