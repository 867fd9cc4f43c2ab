//! Core ledger processing and business logic
//!
//! A [`Ledger`] is one year of transactions read leniently from a
//! [`LedgerSource`], aggregated by month. Reports and the prediction engine
//! are built on top of it.

pub mod aggregate;
pub mod error;
pub mod prediction;
pub mod reports;

use budgetcast_parser::{Diagnostic, DiagnosticSink, LedgerParser, LedgerSource, RuleSet, Transaction};
use rust_decimal::Decimal;

pub use aggregate::{aggregate, parse_and_aggregate_lenient, AggregateSummary, Bucket};
pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity, SimulationError};
pub use prediction::{
    AdjustmentResult, BudgetStatus, CategoryContribution, PendingRemainder, PredictionState, PriorityOutcome,
    SavingsProjection, SimulationPhase,
};
pub use reports::{ReportRow, YearReport};

/// One loaded ledger
#[derive(Debug, Clone)]
pub struct Ledger {
    name: String,
    year: Option<i32>,
    transactions: Vec<Transaction>,
    summary: AggregateSummary,
    diagnostics: Vec<Diagnostic>,
}

impl Ledger {
    /// Verify, read and aggregate `source`.
    ///
    /// Structural problems, mixed years and totals out of range fail the
    /// load. Malformed records are skipped, reported to `sink` and kept in
    /// [`Ledger::diagnostics`].
    pub fn load(
        rules: RuleSet,
        expected_year: Option<i32>,
        source: &dyn LedgerSource,
        sink: &mut dyn DiagnosticSink,
    ) -> CoreResult<Self> {
        let name = source.name();
        source.verify()?;
        let lines = source.read_lines()?;

        let parsed = LedgerParser::new(rules).parse_lenient(expected_year, &lines, sink)?;
        let summary = aggregate(&parsed.transactions)?;

        log::info!(
            target: "budgetcast::ledger",
            "{}: loaded {} transactions, skipped {}",
            name,
            parsed.transactions.len(),
            parsed.diagnostics.len()
        );

        Ok(Self {
            name,
            year: parsed.year,
            transactions: parsed.transactions,
            summary,
            diagnostics: parsed.diagnostics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Year of the ledger; `None` only for a ledger with no dated record
    /// loaded without an expected year
    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn summary(&self) -> &AggregateSummary {
        &self.summary
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Distinct categories in the order they first appear
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for tx in &self.transactions {
            if !seen.contains(&tx.category.as_str()) {
                seen.push(&tx.category);
            }
        }
        seen
    }

    /// Expense magnitude per category, in first-seen order. Categories with
    /// income only show up with zero. Each total is at most the annual
    /// expense total, which [`aggregate`] has already range-checked.
    pub fn category_totals(&self) -> Vec<(String, Decimal)> {
        let mut totals: Vec<(String, Decimal)> = Vec::new();
        for tx in &self.transactions {
            let spent = if tx.is_expense() { tx.magnitude() } else { Decimal::ZERO };
            match totals.iter_mut().find(|(category, _)| *category == tx.category) {
                Some((_, total)) => *total += spent,
                None => totals.push((tx.category.clone(), spent)),
            }
        }
        totals
    }

    pub fn report(&self) -> Option<YearReport> {
        self.year.map(|year| YearReport::from_summary(year, &self.summary))
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use budgetcast_parser::{CsvFile, InMemoryLedger};
    use rust_decimal_macros::dec;

    const LEDGER: &str = "Date,Category,Amount\n\
                          01/05/2023,Food,-50\n\
                          01/10/2023,Salary,2000\n\
                          02/14/2023,Food,-25\n\
                          02/30/2023,Food,-10\n\
                          03/01/2023,Rent,-900\n";

    fn load(text: &str, expected_year: Option<i32>) -> CoreResult<Ledger> {
        let source = InMemoryLedger::from_text("2023.csv", text);
        Ledger::load(RuleSet::default(), expected_year, &source, &mut Vec::new())
    }

    #[test]
    fn test_load_two_record_ledger() {
        let ledger = load("01/05/2023,Food,-50\n01/10/2023,Salary,2000\n", Some(2023)).unwrap();
        let january = ledger.summary().month(1).unwrap();
        assert_eq!((january.income, january.expense, january.net()), (dec!(2000), dec!(50), dec!(1950)));
        assert_eq!(ledger.summary().annual, *january);
        assert_eq!(ledger.year(), Some(2023));
    }

    #[test]
    fn test_load_skips_bad_records() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let source = InMemoryLedger::from_text("2023.csv", LEDGER);
        let ledger = Ledger::load(RuleSet::default(), None, &source, &mut sink).unwrap();

        assert_eq!(ledger.transactions().len(), 4);
        assert_eq!(ledger.diagnostics().len(), 1);
        assert_eq!(ledger.diagnostics()[0].line_number, Some(5));
        assert_eq!(sink.len(), 1);
        assert_eq!(ledger.name(), "2023.csv");
    }

    #[test]
    fn test_categories_and_totals() {
        let ledger = load(LEDGER, None).unwrap();
        assert_eq!(ledger.categories(), vec!["Food", "Salary", "Rent"]);
        assert_eq!(
            ledger.category_totals(),
            vec![
                ("Food".to_string(), dec!(75)),
                ("Salary".to_string(), Decimal::ZERO),
                ("Rent".to_string(), dec!(900)),
            ]
        );
    }

    #[test]
    fn test_load_mixed_years_fails() {
        let result = load("01/05/2023,Food,-50\n01/05/2024,Food,-50\n", None);
        assert!(matches!(result, Err(CoreError::YearMismatch { expected: 2023, found: 2024, line_number: 2 })));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvFile::new(dir.path().join("2023.csv"));
        let result = Ledger::load(RuleSet::default(), Some(2023), &source, &mut Vec::new());
        match result {
            Err(e) => {
                assert_eq!(e.code(), ErrorCode::InvalidSource);
                assert!(e.is_fatal());
            }
            Ok(_) => panic!("expected an invalid source error"),
        }
    }

    #[test]
    fn test_report_and_prediction() {
        let ledger = load(LEDGER, Some(2023)).unwrap();
        let report = ledger.report().unwrap();
        assert_eq!(report.months[2].expense, dec!(900));
        assert_eq!(report.total.net, dec!(1025));

        let state = PredictionState::from_ledger(&ledger, RuleSet::default().amount_mode);
        assert_eq!(state.status(), BudgetStatus::Surplus);
        assert_eq!(state.headroom(None), dec!(1025));
    }

    #[test]
    fn test_empty_ledger_has_no_report() {
        let ledger = load("", None).unwrap();
        assert_eq!(ledger.year(), None);
        assert!(ledger.report().is_none());
        assert!(load("", Some(2023)).unwrap().report().is_some());
    }

    #[test]
    fn test_load_overflowing_totals_fails() {
        let text = "01/05/2023,Salary,9999999999999999999999999999\n".repeat(10);
        match load(&text, Some(2023)) {
            Err(e) => {
                assert_eq!(e.code(), ErrorCode::TotalOverflow);
                assert!(e.is_fatal());
            }
            Ok(_) => panic!("expected an overflow error"),
        }
    }
}
