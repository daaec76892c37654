use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, PrimitiveDateTime,
    Time,
};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]:[second]");
const TIME_12H_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[hour repr:12]:[minute] [period]");

/// One stored bill for a block, as laid out in the `readings` table.
///
/// `date` and `time` are kept as the stored text (`YYYY-MM-DD`, `HH:MM:SS`)
/// so that ordering and "strictly before" lookups compare exactly what the
/// database compares.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    pub id: i64,
    pub block_id: String,
    pub meter_reading: f64,
    pub vat_percent: f64,
    pub additional_fee: f64,
    pub final_payment: f64,
    pub tariff_rate: f64,
    pub date: String,
    pub time: String,
}

impl Reading {
    /// Parsed `(date, time)` pair, `None` when the stored text is malformed.
    pub fn recorded_at(&self) -> Option<PrimitiveDateTime> {
        parse_recorded_at(&self.date, &self.time)
    }
}

/// A reading that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub block_id: String,
    pub meter_reading: f64,
    pub vat_percent: f64,
    pub additional_fee: f64,
    pub final_payment: f64,
    pub tariff_rate: f64,
    pub recorded_at: PrimitiveDateTime,
}

impl NewReading {
    pub fn date_text(&self) -> String {
        format_date(self.recorded_at.date())
    }

    pub fn time_text(&self) -> String {
        format_time(self.recorded_at.time())
    }
}

// Formatting only fails for components the value lacks, which these
// descriptions never ask for.

/// Zero-padded `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Zero-padded `HH:MM:SS`; sub-second precision is dropped.
pub fn format_time(time: Time) -> String {
    time.format(TIME_FORMAT).unwrap_or_default()
}

/// Stored `HH:MM:SS` text as `hh:mm AM`. Unparsable text is returned as is.
pub fn format_12_hour(time_text: &str) -> String {
    Time::parse(time_text.trim(), TIME_FORMAT)
        .ok()
        .and_then(|t| t.format(TIME_12H_FORMAT).ok())
        .unwrap_or_else(|| time_text.to_string())
}

pub fn parse_recorded_at(date: &str, time: &str) -> Option<PrimitiveDateTime> {
    let date = Date::parse(date.trim(), DATE_FORMAT).ok()?;
    let time = Time::parse(time.trim(), TIME_FORMAT).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}
