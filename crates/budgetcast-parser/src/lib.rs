//! Ledger parser and validation rules
//!
//! Reads per-year `date,category,amount` ledgers, either strictly (the
//! whole ledger must be valid) or leniently (bad records are skipped).

use once_cell::sync::OnceCell;
use regex::Regex;
use std::path::{Path, PathBuf};

pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod rules;
pub mod types;

pub use diagnostics::{Diagnostic, DiagnosticSink, LogSink};
pub use error::{ParseError, RecordError};
pub use parser::{is_header, LedgerParser};
pub use rules::{days_in_month, is_leap_year, parse_date, valid_date, RuleSet};
pub use types::{LedgerDate, ParsedLedger, Transaction};

// ==================== Utility Functions ====================

/// Year encoded in a ledger file name of the form `YYYY.csv`.
///
/// Only four-digit years without a leading zero are accepted; the
/// extension is matched case-insensitively.
pub fn year_from_file_name(path: &Path) -> Option<i32> {
    static LEDGER_NAME: OnceCell<Regex> = OnceCell::new();
    let name_regex = LEDGER_NAME.get_or_init(|| Regex::new(r"^([1-9][0-9]{3})\.(?i:csv)$").unwrap());

    let name = path.file_name()?.to_str()?;
    let caps = name_regex.captures(name)?;
    caps.get(1)?.as_str().parse().ok()
}

// ==================== Ledger Sources ====================

/// Something a ledger can be read from
pub trait LedgerSource {
    /// Name used in diagnostics
    fn name(&self) -> String;

    /// Check that this is a real, readable ledger before any line is read
    fn verify(&self) -> Result<(), ParseError>;

    /// All lines, in order
    fn read_lines(&self) -> Result<Vec<String>, ParseError>;
}

/// A ledger stored as a `.csv` file
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerSource for CsvFile {
    fn name(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn verify(&self) -> Result<(), ParseError> {
        let name = self.name();
        if name.is_empty() {
            return Err(ParseError::structural(&name, "no path given"));
        }
        if !self.path.exists() {
            return Err(ParseError::structural(&name, "file does not exist"));
        }
        if !self.path.is_file() {
            return Err(ParseError::structural(&name, "not a regular file"));
        }
        std::fs::File::open(&self.path)
            .map_err(|e| ParseError::structural(&name, format!("file is not readable ({})", e)))?;
        if !name.to_lowercase().ends_with(".csv") {
            return Err(ParseError::structural(&name, "expected a .csv file"));
        }
        Ok(())
    }

    fn read_lines(&self) -> Result<Vec<String>, ParseError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

/// A ledger already held in memory, e.g. an upload body
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    label: String,
    lines: Vec<String>,
}

impl InMemoryLedger {
    pub fn new(label: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            label: label.into(),
            lines,
        }
    }

    /// Split `content` into lines
    pub fn from_text(label: impl Into<String>, content: &str) -> Self {
        Self::new(label, content.lines().map(str::to_string).collect())
    }
}

impl LedgerSource for InMemoryLedger {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn verify(&self) -> Result<(), ParseError> {
        Ok(())
    }

    fn read_lines(&self) -> Result<Vec<String>, ParseError> {
        Ok(self.lines.clone())
    }
}

// ==================== Tests ====================
