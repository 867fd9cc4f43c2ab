//! Monthly and annual income/expense totals

use budgetcast_parser::{Diagnostic, DiagnosticSink, LedgerParser, RuleSet, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::reports::month_name;

/// Income and expense totals for one period. Both are magnitudes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub income: Decimal,
    pub expense: Decimal,
}

impl Bucket {
    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }

    /// `None` when a total would leave the range of [`Decimal`]
    pub fn checked_add(&self, other: &Bucket) -> Option<Bucket> {
        Some(Bucket {
            income: self.income.checked_add(other.income)?,
            expense: self.expense.checked_add(other.expense)?,
        })
    }

    fn checked_record(&self, tx: &Transaction) -> Option<Bucket> {
        let mut bucket = *self;
        if tx.is_income() {
            bucket.income = bucket.income.checked_add(tx.magnitude())?;
        } else if tx.is_expense() {
            bucket.expense = bucket.expense.checked_add(tx.magnitude())?;
        }
        Some(bucket)
    }
}

/// Twelve monthly buckets and their annual sum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// January is index 0
    pub months: [Bucket; 12],
    pub annual: Bucket,
}

impl AggregateSummary {
    /// Bucket for a 1-indexed month
    pub fn month(&self, month: u32) -> Option<&Bucket> {
        let idx = usize::try_from(month).ok()?.checked_sub(1)?;
        self.months.get(idx)
    }
}

/// Fold transactions into an [`AggregateSummary`]. The result does not
/// depend on the order of `transactions`.
///
/// Fails with [`CoreError::TotalOverflow`] if a monthly or annual total
/// does not fit in a [`Decimal`].
pub fn aggregate<'a, I>(transactions: I) -> CoreResult<AggregateSummary>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut summary = AggregateSummary::default();
    for tx in transactions {
        let idx = tx.date.month0();
        summary.months[idx] = summary.months[idx]
            .checked_record(tx)
            .ok_or_else(|| overflow(month_name(idx)))?;
    }
    for bucket in &summary.months {
        summary.annual = summary
            .annual
            .checked_add(bucket)
            .ok_or_else(|| overflow("Annual".to_string()))?;
    }
    Ok(summary)
}

fn overflow(period: String) -> CoreError {
    log::error!(target: "budgetcast::ledger", "{} totals overflow", period);
    CoreError::TotalOverflow { period }
}

/// Lenient read followed by aggregation.
///
/// Malformed records are skipped and returned as diagnostics (and reported
/// to `sink`); records from a second year abort with
/// [`CoreError::YearMismatch`]. Totals out of range abort with
/// [`CoreError::TotalOverflow`].
pub fn parse_and_aggregate_lenient<I, S>(
    rules: RuleSet,
    expected_year: Option<i32>,
    lines: I,
    sink: &mut dyn DiagnosticSink,
) -> CoreResult<(AggregateSummary, Vec<Diagnostic>)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed = LedgerParser::new(rules).parse_lenient(expected_year, lines, sink)?;
    let summary = aggregate(&parsed.transactions)?;
    Ok((summary, parsed.diagnostics))
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use budgetcast_parser::LedgerDate;
    use rust_decimal_macros::dec;

    fn tx(month: u32, amount: Decimal) -> Transaction {
        Transaction {
            date: LedgerDate { year: 2023, month, day: 1 },
            category: "Misc".to_string(),
            amount,
        }
    }

    #[test]
    fn test_aggregate_routes_by_sign() {
        let txs = vec![tx(1, dec!(-50)), tx(1, dec!(2000)), tx(3, dec!(-20)), tx(3, Decimal::ZERO)];
        let summary = aggregate(&txs).unwrap();

        let january = summary.month(1).unwrap();
        assert_eq!(january.income, dec!(2000));
        assert_eq!(january.expense, dec!(50));
        assert_eq!(january.net(), dec!(1950));

        let march = summary.month(3).unwrap();
        assert_eq!(march.income, Decimal::ZERO);
        assert_eq!(march.expense, dec!(20));
        assert_eq!(march.net(), dec!(-20));

        assert_eq!(summary.annual, Bucket { income: dec!(2000), expense: dec!(70) });
    }

    #[test]
    fn test_annual_is_sum_of_months() {
        let txs: Vec<Transaction> = (1..=12)
            .map(|m| tx(m, Decimal::from(m as i64 * 10)))
            .chain((1..=12).map(|m| tx(m, Decimal::from(-(m as i64)))))
            .collect();
        let summary = aggregate(&txs).unwrap();

        let total = summary
            .months
            .iter()
            .try_fold(Bucket::default(), |acc, bucket| acc.checked_add(bucket))
            .unwrap();
        assert_eq!(summary.annual, total);
        assert_eq!(summary.annual.income, dec!(780));
        assert_eq!(summary.annual.expense, dec!(78));
    }

    #[test]
    fn test_aggregate_order_independent() {
        let mut txs = vec![
            tx(2, dec!(-12.50)),
            tx(5, dec!(300)),
            tx(2, dec!(45)),
            tx(11, dec!(-7)),
            tx(5, dec!(-300)),
        ];
        let forward = aggregate(&txs).unwrap();
        txs.reverse();
        assert_eq!(aggregate(&txs).unwrap(), forward);
        txs.rotate_left(2);
        assert_eq!(aggregate(&txs).unwrap(), forward);
    }

    #[test]
    fn test_month_lookup_bounds() {
        let summary = AggregateSummary::default();
        assert!(summary.month(0).is_none());
        assert!(summary.month(13).is_none());
        assert!(summary.month(12).is_some());
    }

    #[test]
    fn test_parse_and_aggregate_lenient() {
        let lines = ["01/05/2023,Food,-50", "01/10/2023,Salary,2000", "01/12/2023,Oops"];
        let mut sink: Vec<Diagnostic> = Vec::new();
        let (summary, diagnostics) =
            parse_and_aggregate_lenient(RuleSet::default(), Some(2023), lines, &mut sink).unwrap();

        assert_eq!(summary.annual.net(), dec!(1950));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line_number, Some(3));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_parse_and_aggregate_lenient_year_mismatch() {
        let lines = ["01/05/2023,Food,-50", "01/10/2024,Salary,2000"];
        let result = parse_and_aggregate_lenient(RuleSet::default(), None, lines, &mut Vec::new());
        assert!(matches!(result, Err(CoreError::YearMismatch { expected: 2023, found: 2024, line_number: 2 })));
    }

    #[test]
    fn test_aggregate_month_overflow() {
        let huge = Decimal::MAX;
        let txs = vec![tx(4, huge), tx(4, huge)];
        match aggregate(&txs) {
            Err(CoreError::TotalOverflow { period }) => assert_eq!(period, "April"),
            other => panic!("expected overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_annual_overflow() {
        let txs = vec![tx(1, -Decimal::MAX), tx(2, -Decimal::MAX)];
        match aggregate(&txs) {
            Err(CoreError::TotalOverflow { period }) => assert_eq!(period, "Annual"),
            other => panic!("expected overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_and_aggregate_lenient_overflow_is_an_error() {
        let lines = vec!["01/05/2023,Salary,9999999999999999999999999999"; 10];
        let result = parse_and_aggregate_lenient(RuleSet::default(), Some(2023), lines, &mut Vec::new());
        assert!(matches!(result, Err(CoreError::TotalOverflow { .. })));
    }
}
