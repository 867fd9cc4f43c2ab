//! Common types for the ledger parser

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Calendar date of a ledger record, as written in `MM/DD/YYYY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl LedgerDate {
    /// Zero-based month index, for twelve-slot tables
    pub fn month0(&self) -> usize {
        (self.month - 1) as usize
    }
}

impl std::fmt::Display for LedgerDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.month, self.day, self.year)
    }
}

/// One valid ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: LedgerDate,
    pub category: String,
    /// Positive is income, negative is an expense
    pub amount: Decimal,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_expense(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Absolute value of the amount
    pub fn magnitude(&self) -> Decimal {
        self.amount.abs()
    }
}

/// Result of a lenient read
#[derive(Debug, Clone, Default)]
pub struct ParsedLedger {
    /// Year shared by every record, if any record carried a valid date
    pub year: Option<i32>,
    pub transactions: Vec<Transaction>,
    pub diagnostics: Vec<crate::Diagnostic>,
}
