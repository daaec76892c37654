use meter_client::domain::{Locale, Reading};

use crate::history::HistoricalBreakdown;

pub const PAGE_WIDTH: u32 = 595;
pub const PAGE_HEIGHT: u32 = 842;
pub const LEFT_MARGIN: u32 = 10;
pub const FIRST_ROW_Y: u32 = 40;
pub const ROW_HEIGHT: u32 = 40;
pub const BOTTOM_MARGIN: u32 = 50;
pub const COLUMN_WIDTHS: [u32; COLUMNS] = [70, 70, 60, 80, 90, 90, 70, 80];
pub const COLUMNS: usize = 8;

pub fn table_width() -> u32 {
    COLUMN_WIDTHS.iter().sum()
}

/// One table line: block, energy, tariff, VAT, additional fee, total, date, time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub cells: [String; COLUMNS],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedRow {
    /// Baseline, in points from the top of the page.
    pub y: u32,
    pub is_header: bool,
    pub row: ReportRow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub rows: Vec<PlacedRow>,
}

pub fn header_row(locale: Locale) -> ReportRow {
    let cells = match locale {
        Locale::En => [
            "Block", "Energy", "Tariff", "VAT", "Additional", "Total", "Date", "Time",
        ],
        Locale::Am => [
            "የቤት ቁጥር",
            "የሀይል መጠን",
            "ታርፍ",
            "ቫት",
            "ወርሃዊ መዋጮ",
            "ጠቅላላ ክፍያ",
            "ቀን",
            "ሰአት",
        ],
    };
    ReportRow {
        cells: cells.map(str::to_string),
    }
}

pub fn data_row(reading: &Reading, breakdown: &HistoricalBreakdown) -> ReportRow {
    ReportRow {
        cells: [
            reading.block_id.clone(),
            format_number(reading.meter_reading),
            format_number(reading.tariff_rate),
            format!(
                "{}({})",
                format_number(reading.vat_percent),
                format_number(breakdown.vat_amount)
            ),
            format_number(reading.additional_fee),
            format_number(reading.final_payment),
            reading.date.clone(),
            reading.time.clone(),
        ],
    }
}

/// Two decimals with trailing zeros trimmed, but always one decimal digit:
/// `12.50 -> 12.5`, `3 -> 3.0`, `0 -> 0.0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }

    let mut s = format!("{value:.2}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.push('0');
    }
    s
}

/// Place the header and data rows top to bottom, starting a new page once the
/// next baseline would pass `PAGE_HEIGHT - BOTTOM_MARGIN`. The header appears
/// on the first page only; no trailing empty page is produced.
pub fn paginate(header: ReportRow, rows: impl IntoIterator<Item = ReportRow>) -> Vec<Page> {
    let limit = PAGE_HEIGHT - BOTTOM_MARGIN;
    let mut pages = Vec::new();
    let mut page = Page::default();
    let mut y = FIRST_ROW_Y;

    page.rows.push(PlacedRow {
        y,
        is_header: true,
        row: header,
    });
    y += ROW_HEIGHT;

    for row in rows {
        page.rows.push(PlacedRow {
            y,
            is_header: false,
            row,
        });
        y += ROW_HEIGHT;

        if y > limit {
            pages.push(std::mem::take(&mut page));
            y = FIRST_ROW_Y;
        }
    }

    if !page.rows.is_empty() {
        pages.push(page);
    }
    pages
}
