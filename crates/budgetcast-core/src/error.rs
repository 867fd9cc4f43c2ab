//! Error types for budgetcast-core
//!
//! This module provides the error handling for ledger ingestion and the
//! prediction engine, including error codes, detailed messages, and
//! suggestions.

use budgetcast_config::ConfigError;
use budgetcast_parser::ParseError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Ledger source missing, unreadable or of the wrong type
    InvalidSource,
    /// A record failed strict validation
    InvalidRecord,
    /// Records from more than one year
    YearMismatch,
    /// A monthly or annual total left the decimal range
    TotalOverflow,
    /// IO error
    IoError,
    /// Configuration error
    ConfigError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidSource => write!(f, "INVALID_SOURCE"),
            ErrorCode::InvalidRecord => write!(f, "INVALID_RECORD"),
            ErrorCode::YearMismatch => write!(f, "YEAR_MISMATCH"),
            ErrorCode::TotalOverflow => write!(f, "TOTAL_OVERFLOW"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
        }
    }
}

/// Detailed error information for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Source ledger (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line number (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
            file: None,
            line: None,
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// Add source location
    pub fn with_location(mut self, file: Option<String>, line: usize) -> Self {
        self.file = file;
        self.line = Some(line);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "\nLocation: {}:{}", file, line)?,
            (None, Some(line)) => write!(f, "\nLocation: line {}", line)?,
            _ => {}
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Warning - the caller may override and continue
    Warning,
    /// Error - the workflow stops
    Error,
    /// Critical - the deployment is misconfigured
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for budgetcast-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid ledger source {name}: {reason}")]
    InvalidSource { name: String, reason: String },

    #[error("Invalid record at line {line_number}: {reason}")]
    InvalidRecord {
        line_number: usize,
        line: String,
        reason: String,
    },

    #[error("Ledger mixes years: found {found} at line {line_number}, expected {expected}")]
    YearMismatch {
        expected: i32,
        found: i32,
        line_number: usize,
    },

    #[error("{period} totals exceed the supported amount range")]
    TotalOverflow { period: String },

    #[error("IO error occurred: {message}")]
    IoError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::InvalidSource { .. } => ErrorCode::InvalidSource,
            CoreError::InvalidRecord { .. } => ErrorCode::InvalidRecord,
            CoreError::YearMismatch { .. } => ErrorCode::YearMismatch,
            CoreError::TotalOverflow { .. } => ErrorCode::TotalOverflow,
            CoreError::IoError { .. } => ErrorCode::IoError,
            CoreError::ConfigError(_) => ErrorCode::ConfigError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // A strict-mode rejection can be overridden by the caller
            CoreError::InvalidRecord { .. } => ErrorSeverity::Warning,
            CoreError::InvalidSource { .. } => ErrorSeverity::Error,
            CoreError::YearMismatch { .. } => ErrorSeverity::Error,
            CoreError::TotalOverflow { .. } => ErrorSeverity::Error,
            CoreError::IoError { .. } => ErrorSeverity::Error,
            CoreError::ConfigError(_) => ErrorSeverity::Critical,
        }
    }

    /// Whether this error stops the calling workflow
    pub fn is_fatal(&self) -> bool {
        self.severity() != ErrorSeverity::Warning
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::InvalidSource { name, reason } => {
                details = details.with_detail(serde_json::json!({ "source": name, "reason": reason }));
                details = details.with_suggestion(
                    "Check that the path exists and names a readable .csv file.".to_string()
                );
            }
            CoreError::InvalidRecord { line_number, line, .. } => {
                details = details.with_detail(serde_json::json!({ "record": line }));
                details = details.with_location(None, *line_number);
                details = details.with_suggestion(
                    "Records must read MM/DD/YYYY,Category,Amount.".to_string()
                );
                details = details.with_suggestion(
                    "Categories may only contain letters, underscores and ampersands.".to_string()
                );
            }
            CoreError::YearMismatch { expected, found, line_number } => {
                details = details.with_location(None, *line_number);
                details = details.with_suggestion(format!(
                    "Move the {} records into their own ledger; this one holds {}.",
                    found, expected
                ));
            }
            CoreError::TotalOverflow { period } => {
                details = details.with_detail(serde_json::json!({ "period": period }));
                details = details.with_suggestion(
                    "Check the ledger for mistyped amounts with too many digits.".to_string()
                );
            }
            CoreError::ConfigError(e) => {
                let config = e.to_details();
                details = details.with_detail(serde_json::json!({
                    "config_code": config.code.to_string(),
                    "field": config.field,
                }));
                if let Some(location) = config.location {
                    details = details.with_location(None, location.line);
                }
                for suggestion in config.suggestions {
                    details = details.with_suggestion(suggestion);
                }
            }
            CoreError::IoError { .. } => {
                details = details.with_suggestion(
                    "Ensure the file exists and is readable.".to_string()
                );
            }
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<io::Error> for CoreError {
    fn from(error: io::Error) -> Self {
        CoreError::IoError { message: error.to_string() }
    }
}

impl From<ParseError> for CoreError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::Structural { name, reason } => CoreError::InvalidSource { name, reason },
            ParseError::InvalidRecord { line_number, line, reason } => CoreError::InvalidRecord {
                line_number,
                line,
                reason: reason.to_string(),
            },
            ParseError::YearMismatch { expected, found, line_number } => CoreError::YearMismatch {
                expected,
                found,
                line_number,
            },
            ParseError::IoError(e) => e.into(),
        }
    }
}

/// A simulation request the engine refused. The state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Adjustment amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },

    #[error("{remainder} from '{category}' still needs another category")]
    ResolutionPending { category: String, remainder: Decimal },

    #[error("No remainder is waiting to be redistributed")]
    NothingPending,

    #[error("The remainder from '{category}' must go to a different category")]
    SameCategory { category: String },

    #[error("{amount} takes the budget totals past the supported amount range")]
    Overflow { amount: Decimal },
}

// ==================== Tests ====================
