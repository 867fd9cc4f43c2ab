//! Diagnostics for rejected ledger records

use crate::error::RecordError;

/// A rejected record: where it was, what it said, and why it was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-indexed line number, when the record came from a ledger
    pub line_number: Option<usize>,
    pub line: String,
    pub reason: RecordError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(n) = self.line_number {
            write!(f, "line {}: ", n)?;
        }
        write!(f, "{}: {}", self.reason, self.line)
    }
}

/// Receiver for record-level diagnostics
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in line order
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Writes each diagnostic to the `log` facade
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!(target: "budgetcast::validation", "{}", diagnostic);
    }
}
