//! Error types for budgetcast-parser

use thiserror::Error;
use std::io;

/// Why a single ledger line was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Invalid line format: expected 3 columns (date, category, amount), found {found}")]
    WrongFieldCount { found: usize },

    #[error("Invalid date format: {date}")]
    InvalidDate { date: String },

    #[error("Year mismatch: found {found}, expected {expected}")]
    YearMismatch { expected: i32, found: i32 },

    #[error("Invalid category: {category}")]
    InvalidCategory { category: String },

    #[error("Invalid dollar amount: {amount}")]
    InvalidAmount { amount: String },
}

/// Failure to read a ledger as a whole
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid ledger source {name}: {reason}")]
    Structural { name: String, reason: String },

    #[error("Invalid record at line {line_number}: {reason}")]
    InvalidRecord {
        line_number: usize,
        line: String,
        reason: RecordError,
    },

    #[error("Year mismatch at line {line_number}: found {found}, expected {expected}")]
    YearMismatch {
        expected: i32,
        found: i32,
        line_number: usize,
    },

    #[error("IO error")]
    IoError(#[from] io::Error),
}

impl ParseError {
    pub(crate) fn structural(name: &str, reason: impl Into<String>) -> Self {
        ParseError::Structural {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
