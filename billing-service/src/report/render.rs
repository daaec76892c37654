use std::io::Write;

use super::{
    layout::{Page, COLUMN_WIDTHS},
    ReportError, ReportFormat,
};

/// Turns laid-out pages into bytes. A canvas-based PDF writer plugs in here too.
pub trait ReportRenderer: Send + Sync {
    fn extension(&self) -> &'static str;

    fn render(&self, pages: &[Page], out: &mut dyn Write) -> Result<(), ReportError>;
}

pub fn renderer_for(format: ReportFormat) -> Box<dyn ReportRenderer> {
    match format {
        ReportFormat::Text => Box::new(TextRenderer::default()),
        ReportFormat::Csv => Box::new(CsvRenderer),
    }
}

/// Fixed-width plain text, one form feed between pages.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    /// Points per character cell when converting column widths.
    pub points_per_char: u32,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self { points_per_char: 6 }
    }
}

impl TextRenderer {
    fn column_chars(&self, idx: usize) -> usize {
        (COLUMN_WIDTHS[idx] / self.points_per_char.max(1)) as usize
    }
}

impl ReportRenderer for TextRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, pages: &[Page], out: &mut dyn Write) -> Result<(), ReportError> {
        let rule_len: usize = (0..COLUMN_WIDTHS.len()).map(|i| self.column_chars(i) + 1).sum();

        for (n, page) in pages.iter().enumerate() {
            if n > 0 {
                out.write_all(b"\x0c\n")?;
            }
            for placed in &page.rows {
                let mut line = String::new();
                for (i, cell) in placed.row.cells.iter().enumerate() {
                    line.push_str(&format!("{:<width$}|", cell, width = self.column_chars(i)));
                }
                writeln!(out, "{}", line.trim_end())?;
                if placed.is_header {
                    writeln!(out, "{}", "-".repeat(rule_len))?;
                }
            }
        }

        out.flush()?;
        Ok(())
    }
}

/// One CSV record per table row; page breaks are not represented.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

impl ReportRenderer for CsvRenderer {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, pages: &[Page], out: &mut dyn Write) -> Result<(), ReportError> {
        let mut wtr = csv::Writer::from_writer(out);
        for placed in pages.iter().flat_map(|p| p.rows.iter()) {
            wtr.write_record(placed.row.cells.iter())?;
        }
        wtr.flush()?;
        Ok(())
    }
}
