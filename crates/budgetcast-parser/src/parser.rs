//! Strict and lenient readers for whole ledgers

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{ParseError, RecordError};
use crate::rules::{record_year, RuleSet};
use crate::types::ParsedLedger;
use crate::LedgerSource;

/// Whether `line` is a column header such as `Date,Category,Amount`.
/// The first two fields must be exactly `date` and `category`, in any case.
pub fn is_header(line: &str) -> bool {
    let mut fields = line.split(',').map(str::trim);
    matches!(
        (fields.next(), fields.next()),
        (Some(date), Some(category))
            if date.eq_ignore_ascii_case("date") && category.eq_ignore_ascii_case("category")
    )
}

/// Reads ledgers under one [`RuleSet`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerParser {
    rules: RuleSet,
}

impl LedgerParser {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Strict, all-or-nothing check of a ledger for `expected_year`.
    ///
    /// Returns the number of records on success. Stops at the first
    /// structural problem or rejected record; the rejected record is also
    /// reported to `sink`.
    pub fn check_ledger(
        &self,
        expected_year: i32,
        source: &dyn LedgerSource,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<usize, ParseError> {
        source.verify()?;
        let lines = source.read_lines()?;

        let mut records = 0;
        for (idx, line) in lines.iter().enumerate() {
            if idx == 0 && is_header(line) {
                continue;
            }

            let line_number = idx + 1;
            match self.rules.parse_record(expected_year, line) {
                Ok(_) => records += 1,
                Err(reason) => {
                    sink.report(Diagnostic {
                        line_number: Some(line_number),
                        line: line.clone(),
                        reason: reason.clone(),
                    });
                    return Err(match reason {
                        RecordError::YearMismatch { expected, found } => ParseError::YearMismatch {
                            expected,
                            found,
                            line_number,
                        },
                        reason => ParseError::InvalidRecord {
                            line_number,
                            line: line.clone(),
                            reason,
                        },
                    });
                }
            }
        }

        log::debug!(
            target: "budgetcast::validation",
            "{}: {} records valid for {}",
            source.name(),
            records,
            expected_year
        );
        Ok(records)
    }

    /// Boolean gate over [`LedgerParser::check_ledger`]. Structural problems
    /// are logged since they have no record to attach a diagnostic to.
    pub fn validate_ledger(
        &self,
        expected_year: i32,
        source: &dyn LedgerSource,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        match self.check_ledger(expected_year, source, sink) {
            Ok(_) => true,
            Err(e @ ParseError::Structural { .. }) | Err(e @ ParseError::IoError(_)) => {
                log::warn!(target: "budgetcast::validation", "{}", e);
                false
            }
            Err(_) => false,
        }
    }

    /// Best-effort read: malformed records are skipped and reported, but a
    /// record from a different year aborts the whole read.
    ///
    /// The ledger year is `expected_year` when given, otherwise the year of
    /// the first record with a well-formed date. Blank lines and a leading
    /// header are skipped silently; each line is trimmed before it is read.
    pub fn parse_lenient<I, S>(
        &self,
        expected_year: Option<i32>,
        lines: I,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ParsedLedger, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = ParsedLedger {
            year: expected_year,
            ..ParsedLedger::default()
        };

        for (idx, raw) in lines.into_iter().enumerate() {
            let line = raw.as_ref().trim();
            if line.is_empty() || (idx == 0 && is_header(line)) {
                continue;
            }

            let line_number = idx + 1;
            if parsed.year.is_none() {
                parsed.year = record_year(line);
            }

            match self.rules.parse_fields(parsed.year, line) {
                Ok(tx) => parsed.transactions.push(tx),
                Err(RecordError::YearMismatch { expected, found }) => {
                    log::error!(
                        target: "budgetcast::validation",
                        "line {}: year {} in a ledger for {}, aborting",
                        line_number,
                        found,
                        expected
                    );
                    return Err(ParseError::YearMismatch {
                        expected,
                        found,
                        line_number,
                    });
                }
                Err(reason) => {
                    let diagnostic = Diagnostic {
                        line_number: Some(line_number),
                        line: line.to_string(),
                        reason,
                    };
                    sink.report(diagnostic.clone());
                    parsed.diagnostics.push(diagnostic);
                }
            }
        }

        log::debug!(
            target: "budgetcast::validation",
            "lenient read: {} records kept, {} skipped",
            parsed.transactions.len(),
            parsed.diagnostics.len()
        );
        Ok(parsed)
    }
}

// ==================== Tests ====================
