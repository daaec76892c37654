use meter_client::domain::BlockRule;

use crate::pipeline::{Envelope, PipelineError, Transform};
use crate::sources::ImportedReading;

/// Pure validation of an imported reading.
///
/// Rules:
/// - block id must satisfy the block rule (and is normalised to its trimmed form).
/// - meter reading, tariff, VAT and fee must be finite and non-negative.
/// - a given final payment must be finite and non-negative.
pub fn validate_imported_reading(
    env: Envelope<ImportedReading>,
    rule: &BlockRule,
) -> Result<Envelope<ImportedReading>, PipelineError> {
    let reject = |message: String| PipelineError::Transform {
        position: env.position,
        message,
    };

    let block = rule
        .parse(&env.payload.block_id)
        .map_err(|e| reject(e.to_string()))?;

    let r = &env.payload;
    let amounts = [
        ("meter_reading", Some(r.meter_reading)),
        ("tariff_rate", Some(r.tariff_rate)),
        ("vat_percent", Some(r.vat_percent)),
        ("additional_fee", Some(r.additional_fee)),
        ("final_payment", r.final_payment),
    ];
    for (name, value) in amounts {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(reject(format!("{name} must be a non-negative number")));
            }
        }
    }

    let position = env.position;
    let mut payload = env.payload;
    payload.block_id = block.into_inner();
    Ok(Envelope { payload, position })
}

#[derive(Clone, Default)]
pub struct ReadingValidation {
    rule: BlockRule,
}

impl ReadingValidation {
    pub fn new(rule: BlockRule) -> Self {
        Self { rule }
    }
}

#[async_trait::async_trait]
impl Transform<ImportedReading, ImportedReading> for ReadingValidation {
    async fn apply(
        &self,
        input: Envelope<ImportedReading>,
    ) -> Result<Envelope<ImportedReading>, PipelineError> {
        match validate_imported_reading(input, &self.rule) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
