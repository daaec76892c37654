use meter_client::{
    db,
    domain::{BlockRule, Locale, NewReading, Reading, WindowKind},
};
use sqlx::SqlitePool;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{
    billing::{self, BillBreakdown},
    history::{self, HistoricalBreakdown},
    validation::{self, BillingForm, ValidationErrors},
};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("invalid form: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub reading: Reading,
    pub previous_reading: f64,
    pub bill: BillBreakdown,
}

/// Wall-clock time in the local offset, falling back to UTC when the offset
/// cannot be determined (e.g. once other threads are running).
pub fn local_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| {
        tracing::warn!("local UTC offset unavailable, recording times in UTC");
        OffsetDateTime::now_utc()
    });
    PrimitiveDateTime::new(now.date(), now.time())
}

pub struct BillingService {
    pool: SqlitePool,
    rule: BlockRule,
}

impl BillingService {
    pub fn new(pool: SqlitePool, rule: BlockRule) -> Self {
        Self { pool, rule }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn rule(&self) -> &BlockRule {
        &self.rule
    }

    /// Validate, price against the block's latest reading, and store.
    pub async fn submit(
        &self,
        form: &BillingForm,
        now: PrimitiveDateTime,
    ) -> Result<Submission, ServiceError> {
        let valid = match validation::validate(form, &self.rule) {
            Ok(v) => v,
            Err(e) => {
                metrics::counter!("validation_rejected_total").increment(1);
                tracing::info!(errors = %e, "submission rejected");
                return Err(e.into());
            }
        };

        let previous = db::most_recent_reading(&self.pool, valid.block.as_str()).await?;
        let bill = billing::compute_bill(
            valid.meter_reading,
            previous,
            valid.tariff_rate,
            valid.vat_percent,
            valid.additional_fee,
        );

        let reading = db::insert_reading(
            &self.pool,
            &NewReading {
                block_id: valid.block.into_inner(),
                meter_reading: valid.meter_reading,
                vat_percent: valid.vat_percent,
                additional_fee: valid.additional_fee,
                final_payment: bill.final_payment,
                tariff_rate: valid.tariff_rate,
                recorded_at: now,
            },
        )
        .await?;

        metrics::counter!("readings_recorded_total").increment(1);
        tracing::info!(
            id = reading.id,
            block_id = %reading.block_id,
            consumption = bill.consumption,
            final_payment = bill.final_payment,
            "reading recorded"
        );

        Ok(Submission {
            reading,
            previous_reading: previous,
            bill,
        })
    }

    /// Readings of one block, newest first, with display-time VAT breakdowns.
    pub async fn history(
        &self,
        block_id: &str,
    ) -> Result<Vec<(Reading, HistoricalBreakdown)>, ServiceError> {
        let rows = db::readings_for_block(&self.pool, block_id.trim()).await?;
        Ok(history::breakdowns_for(&self.pool, rows).await?)
    }

    pub async fn all(&self) -> Result<Vec<Reading>, ServiceError> {
        Ok(db::all_readings(&self.pool).await?)
    }

    pub async fn window(
        &self,
        window: WindowKind,
        now: PrimitiveDateTime,
    ) -> Result<Vec<Reading>, ServiceError> {
        Ok(db::readings_in_window(&self.pool, window, now).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let deleted = db::delete_reading(&self.pool, id).await?;
        if deleted {
            metrics::counter!("readings_deleted_total").increment(1);
            tracing::info!(id, "reading deleted");
        } else {
            tracing::warn!(id, "no reading with this id");
        }
        Ok(deleted)
    }

    pub async fn locale(&self) -> Result<Locale, ServiceError> {
        Ok(db::load_locale(&self.pool).await?)
    }

    /// Switch between the two display languages and persist the choice.
    pub async fn toggle_locale(&self) -> Result<Locale, ServiceError> {
        let next = db::load_locale(&self.pool).await?.toggled();
        db::store_locale(&self.pool, next).await?;
        tracing::info!(locale = next.code(), "display language changed");
        Ok(next)
    }
}
