pub mod layout;
pub mod render;

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use meter_client::{
    db,
    domain::{Locale, Reading, WindowKind},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use time::{format_description::BorrowedFormatItem, macros::format_description, PrimitiveDateTime};

const FILE_STAMP: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");

use crate::history;

pub use layout::{format_number, Page, ReportRow};
pub use render::{renderer_for, CsvRenderer, ReportRenderer, TextRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Csv,
}

impl std::str::FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("No data found")]
    NoData,
    #[error("unknown report format '{0}'")]
    UnknownFormat(String),
    #[error("Error exporting report: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("Error exporting report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error exporting report: {0}")]
    Csv(#[from] csv::Error),
}

/// Which readings go into a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportFilter {
    All,
    Window(WindowKind),
    Block(String),
}

impl ExportFilter {
    /// `all` (or empty), a window name, otherwise a block id.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        match raw.parse::<WindowKind>() {
            Ok(w) => Self::Window(w),
            Err(_) => Self::Block(raw.to_string()),
        }
    }

    /// Label used in the file name, with path-hostile characters replaced.
    pub fn file_label(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Window(w) => w.as_str().to_string(),
            Self::Block(b) => sanitize(b),
        }
    }

    pub async fn select(
        &self,
        pool: &SqlitePool,
        now: PrimitiveDateTime,
    ) -> Result<Vec<Reading>, sqlx::Error> {
        match self {
            Self::All => db::all_readings(pool).await,
            Self::Window(w) => db::readings_in_window(pool, *w, now).await,
            Self::Block(b) => db::readings_for_block(pool, b).await,
        }
    }
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

pub fn file_name(filter: &ExportFilter, now: PrimitiveDateTime, extension: &str) -> String {
    // A PrimitiveDateTime carries every component the stamp asks for.
    let stamp = now.format(FILE_STAMP).unwrap_or_default();
    format!("property_data_{}_{stamp}.{extension}", filter.file_label())
}

/// Lay out readings (already paired with their recomputed breakdowns) as pages.
pub fn build_pages(
    rows: &[(Reading, history::HistoricalBreakdown)],
    locale: Locale,
) -> Vec<Page> {
    layout::paginate(
        layout::header_row(locale),
        rows.iter().map(|(r, b)| layout::data_row(r, b)),
    )
}

/// Select, lay out and write a report into `dir`. Returns the written path.
pub async fn export_report(
    pool: &SqlitePool,
    filter: &ExportFilter,
    now: PrimitiveDateTime,
    locale: Locale,
    renderer: &dyn ReportRenderer,
    dir: &Path,
) -> Result<PathBuf, ReportError> {
    let rows = filter.select(pool, now).await?;
    if rows.is_empty() {
        return Err(ReportError::NoData);
    }

    let rows = history::breakdowns_for(pool, rows).await?;
    let pages = build_pages(&rows, locale);

    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(filter, now, renderer.extension()));
    let mut out = BufWriter::new(File::create(&path)?);
    renderer.render(&pages, &mut out)?;

    metrics::counter!("report_rows_exported_total").increment(rows.len() as u64);
    tracing::info!(
        path = %path.display(),
        rows = rows.len(),
        pages = pages.len(),
        "report exported"
    );

    Ok(path)
}
