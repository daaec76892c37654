use meter_client::{db, domain::Reading};
use sqlx::SqlitePool;

use crate::billing;

const PAYMENT_EPSILON: f64 = 0.005;

/// Display-time view of a stored reading.
///
/// The VAT amount is recomputed against whatever reading currently precedes
/// the row, while `stored_final_payment` is the amount fixed at submission.
/// The two can drift apart when an earlier reading is deleted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalBreakdown {
    pub previous_reading: f64,
    pub consumption: f64,
    pub vat_amount: f64,
    pub recomputed_final_payment: f64,
    pub stored_final_payment: f64,
}

impl HistoricalBreakdown {
    pub fn diverges(&self) -> bool {
        (self.recomputed_final_payment - self.stored_final_payment).abs() > PAYMENT_EPSILON
    }
}

pub fn recompute(row: &Reading, previous_reading: f64) -> HistoricalBreakdown {
    let bill = billing::compute_bill(
        row.meter_reading,
        previous_reading,
        row.tariff_rate,
        row.vat_percent,
        row.additional_fee,
    );

    HistoricalBreakdown {
        previous_reading,
        consumption: bill.consumption,
        vat_amount: bill.vat_amount,
        recomputed_final_payment: bill.final_payment,
        stored_final_payment: row.final_payment,
    }
}

/// Pair each row with its recomputed breakdown, looking up the reading that
/// strictly precedes it for the same block.
pub async fn breakdowns_for(
    pool: &SqlitePool,
    rows: Vec<Reading>,
) -> Result<Vec<(Reading, HistoricalBreakdown)>, sqlx::Error> {
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let previous = db::previous_reading(pool, &row.block_id, &row.date, &row.time).await?;
        let breakdown = recompute(&row, previous);
        if breakdown.diverges() {
            tracing::debug!(
                id = row.id,
                block_id = %row.block_id,
                stored = breakdown.stored_final_payment,
                recomputed = breakdown.recomputed_final_payment,
                "stored payment differs from recomputed breakdown"
            );
        }
        out.push((row, breakdown));
    }

    Ok(out)
}
