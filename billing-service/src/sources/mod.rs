pub mod reading_csv_file;

pub use reading_csv_file::ReadingCsvFileSource;

use time::PrimitiveDateTime;

/// A historical reading read from an external file, not yet stored.
///
/// `final_payment` is optional: when absent the sink prices the reading
/// against whatever precedes it in the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedReading {
    pub block_id: String,
    pub meter_reading: f64,
    pub tariff_rate: f64,
    pub vat_percent: f64,
    pub additional_fee: f64,
    pub recorded_at: PrimitiveDateTime,
    pub final_payment: Option<f64>,
}
