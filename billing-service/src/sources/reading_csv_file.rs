use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use meter_client::domain::parse_recorded_at;

use super::ImportedReading;
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// CSV backfill source for readings.
///
/// Expected header columns (by name):
/// - block_id
/// - meter_reading
/// - tariff_rate
/// - vat_percent
/// - additional_fee
/// - date (`YYYY-MM-DD`)
/// - time (`HH:MM:SS`)
/// - final_payment (optional; computed on import when blank or absent)
///
/// A missing file or a header row lacking a required column fails the whole
/// import before any record is read.
pub struct ReadingCsvFileSource {
    path: PathBuf,
}

impl ReadingCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

const REQUIRED_COLUMNS: [&str; 7] = [
    "block_id",
    "meter_reading",
    "tariff_rate",
    "vat_percent",
    "additional_fee",
    "date",
    "time",
];

pub(crate) fn check_headers(headers: &StringRecord) -> Result<(), PipelineError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| !headers.iter().any(|h| h.trim() == *name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Source(format!(
            "CSV header is missing required columns: {}",
            missing.join(", ")
        )))
    }
}

fn parse_optional_f64(s: &str) -> Result<Option<f64>, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|e| format!("invalid final_payment '{trimmed}': {e}"))
}

fn column<'r>(record: &'r StringRecord, headers: &StringRecord, name: &str) -> Option<&'r str> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .and_then(|idx| record.get(idx))
}

pub(crate) fn record_to_reading(
    record: &StringRecord,
    headers: &StringRecord,
    position: u64,
) -> Result<ImportedReading, PipelineError> {
    let err = |msg: String| PipelineError::Source(format!("record {position}: {msg}"));

    let required = |name: &str| {
        column(record, headers, name).ok_or_else(|| err(format!("missing column '{name}'")))
    };
    let number = |name: &str| -> Result<f64, PipelineError> {
        let raw = required(name)?;
        raw.trim()
            .parse()
            .map_err(|e| err(format!("invalid {name} '{raw}': {e}")))
    };

    let date = required("date")?;
    let time = required("time")?;
    let recorded_at = parse_recorded_at(date, time)
        .ok_or_else(|| err(format!("invalid timestamp '{date} {time}'")))?;

    let final_payment = match column(record, headers, "final_payment") {
        Some(raw) => parse_optional_f64(raw).map_err(err)?,
        None => None,
    };

    Ok(ImportedReading {
        block_id: required("block_id")?.trim().to_string(),
        meter_reading: number("meter_reading")?,
        tariff_rate: number("tariff_rate")?,
        vat_percent: number("vat_percent")?,
        additional_fee: number("additional_fee")?,
        recorded_at,
        final_payment,
    })
}

#[async_trait::async_trait]
impl Source<ImportedReading> for ReadingCsvFileSource {
    async fn stream(&self) -> Result<EnvelopeStream<ImportedReading>, PipelineError> {
        // Blocking CSV reads inside one task; backfill files are small.
        let file = File::open(&self.path).map_err(|e| {
            PipelineError::Source(format!("failed to open {}: {e}", self.path.display()))
        })?;
        let mut rdr = csv::Reader::from_reader(file);
        let headers = rdr
            .headers()
            .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
            .clone();
        check_headers(&headers)?;

        // A malformed record is yielded as an error and reading continues.
        let s = async_stream::stream! {
            let mut position: u64 = 0;
            for result in rdr.records() {
                position += 1;
                let parsed = result
                    .map_err(|e| PipelineError::Source(format!("failed to read CSV record {position}: {e}")))
                    .and_then(|record| record_to_reading(&record, &headers, position));

                match parsed {
                    Ok(reading) => {
                        yield Ok(Envelope { payload: reading, position });
                    }
                    Err(e) => {
                        metrics::counter!("backfill_parse_errors_total").increment(1);
                        yield Err(e);
                    }
                }
            }
        };

        Ok(Box::pin(s))
    }
}
