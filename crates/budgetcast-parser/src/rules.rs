//! Field and record rules for `date,category,amount` ledger lines

use budgetcast_config::{AmountMode, CategoryCharset, ValidationConfig};
use once_cell::sync::OnceCell;
use regex::Regex;
use rust_decimal::Decimal;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::RecordError;
use crate::types::{LedgerDate, Transaction};

/// Number of columns in a ledger record
pub const FIELD_COUNT: usize = 3;

/// Gregorian leap year rule
pub fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Days in `month` of `year`, or `None` for a month outside 1..=12
pub fn days_in_month(month: u32, year: i32) -> Option<u32> {
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return None,
    };
    Some(days)
}

/// Parse `MM/DD/YYYY`. Each component may be padded with whitespace but
/// must otherwise be plain ASCII digits.
pub fn parse_date(date: &str) -> Option<LedgerDate> {
    let parts: Vec<&str> = date.split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let month: u32 = parts[0].parse().ok()?;
    let day: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;

    if year <= 0 {
        return None;
    }
    let last_day = days_in_month(month, year)?;
    if day == 0 || day > last_day {
        return None;
    }

    Some(LedgerDate { year, month, day })
}

/// Whether `date` is a real calendar date in `MM/DD/YYYY` form
pub fn valid_date(date: &str) -> bool {
    parse_date(date).is_some()
}

fn integer_amount_regex() -> &'static Regex {
    static INTEGER_AMOUNT: OnceCell<Regex> = OnceCell::new();
    INTEGER_AMOUNT.get_or_init(|| Regex::new(r"^[+-]?[0-9]+$").unwrap())
}

fn decimal_amount_regex() -> &'static Regex {
    static DECIMAL_AMOUNT: OnceCell<Regex> = OnceCell::new();
    DECIMAL_AMOUNT.get_or_init(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]{1,2})?$").unwrap())
}

/// The grammar a deployment validates ledgers against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleSet {
    pub amount_mode: AmountMode,
    pub category_charset: CategoryCharset,
}

impl From<&ValidationConfig> for RuleSet {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            amount_mode: config.amount_mode,
            category_charset: config.category_charset,
        }
    }
}

impl RuleSet {
    pub fn new(amount_mode: AmountMode, category_charset: CategoryCharset) -> Self {
        Self {
            amount_mode,
            category_charset,
        }
    }

    pub fn valid_date(&self, date: &str) -> bool {
        valid_date(date)
    }

    /// Non-empty and built only from the configured charset. Surrounding
    /// whitespace is not stripped, so `" Food"` is rejected.
    pub fn valid_category(&self, category: &str) -> bool {
        !category.is_empty() && category.chars().all(|c| self.category_charset.allows(c))
    }

    /// Optional sign and digits, plus up to two fractional digits in
    /// decimal mode. Surrounding whitespace is ignored.
    pub fn valid_amount(&self, amount: &str) -> bool {
        let amount = amount.trim();
        match self.amount_mode {
            AmountMode::Integer => integer_amount_regex().is_match(amount),
            AmountMode::Decimal => decimal_amount_regex().is_match(amount),
        }
    }

    /// Parse an amount accepted by [`RuleSet::valid_amount`]. Returns `None`
    /// for malformed text and for values too large to represent.
    pub fn parse_amount(&self, amount: &str) -> Option<Decimal> {
        if !self.valid_amount(amount) {
            return None;
        }
        let amount = amount.trim();
        let unsigned = amount.strip_prefix('+').unwrap_or(amount);
        unsigned.parse::<Decimal>().ok()
    }

    /// Parse one ledger line belonging to `expected_year`.
    ///
    /// Checks run in a fixed order (column count, date, year, category,
    /// amount) and the first failure is returned.
    pub fn parse_record(&self, expected_year: i32, line: &str) -> Result<Transaction, RecordError> {
        self.parse_fields(Some(expected_year), line)
    }

    /// Like [`RuleSet::parse_record`]; a `None` year accepts any year.
    pub(crate) fn parse_fields(
        &self,
        expected_year: Option<i32>,
        line: &str,
    ) -> Result<Transaction, RecordError> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(RecordError::WrongFieldCount { found: fields.len() });
        }
        let (date, category, amount) = (fields[0], fields[1], fields[2]);

        let date = parse_date(date).ok_or_else(|| RecordError::InvalidDate {
            date: date.to_string(),
        })?;

        if let Some(expected) = expected_year {
            if date.year != expected {
                return Err(RecordError::YearMismatch {
                    expected,
                    found: date.year,
                });
            }
        }

        if !self.valid_category(category) {
            return Err(RecordError::InvalidCategory {
                category: category.to_string(),
            });
        }

        let amount = self
            .parse_amount(amount)
            .ok_or_else(|| RecordError::InvalidAmount {
                amount: amount.to_string(),
            })?;

        Ok(Transaction {
            date,
            category: category.to_string(),
            amount,
        })
    }

    /// Check one line, reporting the reason for a rejection to `sink`
    pub fn validate_record(
        &self,
        expected_year: i32,
        line: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        match self.parse_record(expected_year, line) {
            Ok(_) => true,
            Err(reason) => {
                sink.report(Diagnostic {
                    line_number: None,
                    line: line.to_string(),
                    reason,
                });
                false
            }
        }
    }
}

/// Year of a record's date, when the line has a well-formed date column
pub(crate) fn record_year(line: &str) -> Option<i32> {
    let mut fields = line.split(',');
    let date = fields.next()?;
    let remaining = fields.count();
    if remaining != FIELD_COUNT - 1 {
        return None;
    }
    parse_date(date).map(|d| d.year)
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn integer_rules() -> RuleSet {
        RuleSet::new(AmountMode::Integer, CategoryCharset::LettersUnderscoreAmpersand)
    }

    fn decimal_rules() -> RuleSet {
        RuleSet::new(AmountMode::Decimal, CategoryCharset::LettersUnderscore)
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(days_in_month(2, 2024), Some(29));
        assert_eq!(days_in_month(2, 2100), Some(28));
        assert_eq!(days_in_month(13, 2024), None);
        assert_eq!(days_in_month(0, 2024), None);
    }

    #[test]
    fn test_valid_date() {
        assert!(valid_date("02/29/2024"));
        assert!(!valid_date("02/29/2023"));
        assert!(!valid_date("04/31/2020"));
        assert!(valid_date("12/31/2023"));
        assert!(valid_date("1/5/2023"));
        assert!(valid_date(" 01 / 05 / 2023 "));
    }

    #[test]
    fn test_invalid_date_shapes() {
        assert!(!valid_date("13/01/2023"));
        assert!(!valid_date("00/10/2023"));
        assert!(!valid_date("01/00/2023"));
        assert!(!valid_date("01/10/0000"));
        assert!(!valid_date("01/10"));
        assert!(!valid_date("01/10/2023/1"));
        assert!(!valid_date("-1/10/2023"));
        assert!(!valid_date("+1/10/2023"));
        assert!(!valid_date("01//2023"));
        assert!(!valid_date("2023-01-10"));
        assert!(!valid_date("01/10/99999999999"));
        assert!(!valid_date(""));
    }

    #[test]
    fn test_parse_date_fields() {
        let date = parse_date("03/09/2023").unwrap();
        assert_eq!(date, LedgerDate { year: 2023, month: 3, day: 9 });
    }

    #[test]
    fn test_valid_category() {
        let rules = integer_rules();
        assert!(rules.valid_category("Food"));
        assert!(rules.valid_category("Eating_Out"));
        assert!(rules.valid_category("Bills&Utilities"));
        assert!(!rules.valid_category(""));
        assert!(!rules.valid_category("Food2"));
        assert!(!rules.valid_category("Eating Out"));
        assert!(!rules.valid_category(" Food"));
        assert!(!rules.valid_category("Food-Stuff"));

        let strict = decimal_rules();
        assert!(!strict.valid_category("Bills&Utilities"));
        assert!(strict.valid_category("Bills_Utilities"));
    }

    #[test]
    fn test_valid_amount_integer_mode() {
        let rules = integer_rules();
        assert!(rules.valid_amount("-50"));
        assert!(rules.valid_amount("+2000"));
        assert!(rules.valid_amount(" 0 "));
        assert!(!rules.valid_amount("12.50"));
        assert!(!rules.valid_amount(""));
        assert!(!rules.valid_amount("--5"));
        assert!(!rules.valid_amount("5-"));
        assert!(!rules.valid_amount("1,000"));
    }

    #[test]
    fn test_valid_amount_decimal_mode() {
        let rules = decimal_rules();
        assert!(rules.valid_amount("-49.99"));
        assert!(rules.valid_amount("12.5"));
        assert!(rules.valid_amount("12"));
        assert!(!rules.valid_amount("12.345"));
        assert!(!rules.valid_amount("12."));
        assert!(!rules.valid_amount(".5"));
    }

    #[test]
    fn test_parse_amount() {
        let rules = integer_rules();
        assert_eq!(rules.parse_amount("+2000"), Some(dec!(2000)));
        assert_eq!(rules.parse_amount(" -50 "), Some(dec!(-50)));
        assert_eq!(rules.parse_amount("0"), Some(Decimal::ZERO));
        assert_eq!(rules.parse_amount("1.5"), None);
        // Too many digits for the decimal representation
        assert_eq!(rules.parse_amount("123456789012345678901234567890123"), None);

        assert_eq!(decimal_rules().parse_amount("-49.99"), Some(dec!(-49.99)));
    }

    #[test]
    fn test_parse_record() {
        let rules = integer_rules();
        let tx = rules.parse_record(2023, "01/05/2023,Food,-50").unwrap();
        assert_eq!(tx.date, LedgerDate { year: 2023, month: 1, day: 5 });
        assert_eq!(tx.category, "Food");
        assert_eq!(tx.amount, dec!(-50));
    }

    #[test]
    fn test_parse_record_reasons() {
        let rules = integer_rules();
        assert_eq!(
            rules.parse_record(2023, "01/05/2023,Food"),
            Err(RecordError::WrongFieldCount { found: 2 })
        );
        assert_eq!(
            rules.parse_record(2023, "01/05/2023,Food,-50,extra"),
            Err(RecordError::WrongFieldCount { found: 4 })
        );
        assert_eq!(
            rules.parse_record(2023, "02/29/2023,Food,-50"),
            Err(RecordError::InvalidDate { date: "02/29/2023".to_string() })
        );
        assert_eq!(
            rules.parse_record(2023, "01/05/2024,Food,-50"),
            Err(RecordError::YearMismatch { expected: 2023, found: 2024 })
        );
        assert_eq!(
            rules.parse_record(2023, "01/05/2023,Food 1,-50"),
            Err(RecordError::InvalidCategory { category: "Food 1".to_string() })
        );
        assert_eq!(
            rules.parse_record(2023, "01/05/2023,Food,-5.0"),
            Err(RecordError::InvalidAmount { amount: "-5.0".to_string() })
        );
    }

    #[test]
    fn test_year_checked_before_category() {
        let rules = integer_rules();
        assert_eq!(
            rules.parse_record(2023, "01/05/2022,Food 1,oops"),
            Err(RecordError::YearMismatch { expected: 2023, found: 2022 })
        );
    }

    #[test]
    fn test_validate_record_reports() {
        let rules = integer_rules();
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert!(rules.validate_record(2023, "01/10/2023,Salary,2000", &mut sink));
        assert!(sink.is_empty());

        assert!(!rules.validate_record(2023, "01/10/2023,Salary,lots", &mut sink));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].line, "01/10/2023,Salary,lots");
        assert_eq!(sink[0].line_number, None);
        assert!(matches!(sink[0].reason, RecordError::InvalidAmount { .. }));
    }

    #[test]
    fn test_record_year() {
        assert_eq!(record_year("01/05/2022,Food 1,oops"), Some(2022));
        assert_eq!(record_year("01/05/2022,Food"), None);
        assert_eq!(record_year("nope,Food,1"), None);
    }

    #[test]
    fn test_rules_from_config() {
        let config = ValidationConfig {
            amount_mode: AmountMode::Decimal,
            category_charset: CategoryCharset::LettersUnderscore,
        };
        assert_eq!(RuleSet::from(&config), decimal_rules());
        assert_eq!(RuleSet::default(), integer_rules());
    }
}
