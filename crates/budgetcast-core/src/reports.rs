//! Year report rendering: an aligned text table or a CSV file

use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::aggregate::{AggregateSummary, Bucket};
use crate::error::CoreResult;

/// Header line of the CSV report
pub const CSV_HEADER: &str = "Month, income, expenses, net";

/// One row of a year report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

impl ReportRow {
    fn new(label: String, bucket: &Bucket) -> Self {
        Self {
            label,
            income: bucket.income,
            expense: bucket.expense,
            net: bucket.net(),
        }
    }
}

/// Twelve month rows followed by the year total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearReport {
    pub year: i32,
    pub months: Vec<ReportRow>,
    pub total: ReportRow,
}

impl YearReport {
    pub fn from_summary(year: i32, summary: &AggregateSummary) -> Self {
        let months = summary
            .months
            .iter()
            .enumerate()
            .map(|(idx, bucket)| ReportRow::new(month_name(idx), bucket))
            .collect();

        Self {
            year,
            months,
            total: ReportRow::new(year.to_string(), &summary.annual),
        }
    }

    /// All thirteen rows, year total last
    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.months.iter().chain(std::iter::once(&self.total))
    }

    /// Aligned table for terminals. Numeric columns are at least
    /// `min_width` wide, and wider than the year's income figure.
    pub fn render_text(&self, min_width: usize) -> String {
        let width = (format!("{:.2}", self.total.income).len() + 1).max(min_width);
        let line = |label: &str, income: &str, expense: &str, net: &str| {
            format!("{:<9} | {:<width$} | {:<width$} | {}\n", label, income, expense, net)
        };

        let mut out = line("Month", "Income", "Expenses", "Net");
        out.push('\n');
        for row in self.rows() {
            out.push_str(&line(
                &row.label,
                &format!("{:.2}", row.income),
                &format!("{:.2}", row.expense),
                &format!("{:.2}", row.net),
            ));
        }
        out
    }

    /// CSV text: a header, one line per month, then a `Year` line
    pub fn render_csv(&self) -> String {
        let line = |label: &str, row: &ReportRow| {
            format!("{}, {:.2}, {:.2}, {:.2}\n", label, row.income, row.expense, row.net)
        };

        let mut out = format!("{}\n", CSV_HEADER);
        for row in &self.months {
            out.push_str(&line(&row.label, row));
        }
        out.push_str(&line("Year", &self.total));
        out
    }

    pub fn write_csv(&self, path: &Path) -> CoreResult<()> {
        std::fs::write(path, self.render_csv())?;
        log::info!(target: "budgetcast::ledger", "report for {} written to {}", self.year, path.display());
        Ok(())
    }
}

/// English name of the month at zero-based `idx`
pub(crate) fn month_name(idx: usize) -> String {
    u8::try_from(idx + 1)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| format!("Month {}", idx + 1))
}

// ==================== Tests ====================
