//! What-if spending simulation over one ledger's totals
//!
//! A [`PredictionState`] holds the annual income and expenses of a ledger
//! and up to three protected categories. Cutting spending in a protected
//! category only goes through partly (or not at all, for the top rank);
//! what is left over has to be taken from other categories before the
//! savings projection is produced.

use budgetcast_config::AmountMode;
use budgetcast_parser::{DiagnosticSink, LedgerSource, RuleSet};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateSummary;
use crate::error::{CoreResult, SimulationError};
use crate::Ledger;

/// Number of priority slots
pub const MAX_PRIORITIES: usize = 3;

const LOG_TARGET: &str = "budgetcast::prediction";

/// Where income stands against expenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Surplus,
    Deficit,
    Balanced,
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetStatus::Surplus => write!(f, "surplus"),
            BudgetStatus::Deficit => write!(f, "deficit"),
            BudgetStatus::Balanced => write!(f, "balanced"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationPhase {
    /// No priorities set
    Neutral,
    /// One to three priorities set
    Prioritized,
    /// A remainder is waiting for another category
    Simulating,
}

/// Outcome of [`PredictionState::set_priority`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityOutcome {
    Set { rank: usize },
    AlreadyPriority { rank: usize },
    /// All slots taken; nothing changed
    Full,
}

/// Part of a reduction that still has to be taken from another category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRemainder {
    /// Category the adjustment was first aimed at
    pub category: String,
    pub remainder: Decimal,
}

/// How much one category cut from expenses during a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryContribution {
    pub category: String,
    pub annual: Decimal,
    pub two_year: Decimal,
    pub five_year: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsProjection {
    pub annual: Decimal,
    pub two_year: Decimal,
    pub five_year: Decimal,
    pub breakdown: Vec<CategoryContribution>,
}

/// Result of one step of an adjustment cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentResult {
    pub category: String,
    pub applied: Decimal,
    /// Still to be taken from another category
    pub remainder: Decimal,
    /// The category is the top priority and was left alone
    pub blocked: bool,
    /// Present once the cycle has no remainder left
    pub projection: Option<SavingsProjection>,
}

/// One prediction session
#[derive(Debug, Clone)]
pub struct PredictionState {
    total_income: Decimal,
    total_expenses: Decimal,
    amount_mode: AmountMode,
    priorities: Vec<String>,
    pending: Option<PendingRemainder>,
    /// Effective reductions of the current cycle, in first-touched order
    cycle: Vec<(String, Decimal)>,
}

/// Expenses and cycle contributions after a reduction, before it is committed
struct Staged {
    expenses: Decimal,
    cycle: Vec<(String, Decimal)>,
}

impl PredictionState {
    /// Start a session. Both totals are taken as magnitudes.
    pub fn new(total_income: Decimal, total_expenses: Decimal, amount_mode: AmountMode) -> Self {
        Self {
            total_income: total_income.abs(),
            total_expenses: total_expenses.abs(),
            amount_mode,
            priorities: Vec::with_capacity(MAX_PRIORITIES),
            pending: None,
            cycle: Vec::new(),
        }
    }

    pub fn from_summary(summary: &AggregateSummary, amount_mode: AmountMode) -> Self {
        Self::new(summary.annual.income, summary.annual.expense, amount_mode)
    }

    pub fn from_ledger(ledger: &Ledger, amount_mode: AmountMode) -> Self {
        Self::from_summary(ledger.summary(), amount_mode)
    }

    /// Load `source` afresh and start a session on its totals
    pub fn from_source(
        rules: RuleSet,
        expected_year: Option<i32>,
        source: &dyn LedgerSource,
        sink: &mut dyn DiagnosticSink,
    ) -> CoreResult<Self> {
        let ledger = Ledger::load(rules, expected_year, source, sink)?;
        Ok(Self::from_ledger(&ledger, rules.amount_mode))
    }

    pub fn total_income(&self) -> Decimal {
        self.total_income
    }

    pub fn total_expenses(&self) -> Decimal {
        self.total_expenses
    }

    pub fn amount_mode(&self) -> AmountMode {
        self.amount_mode
    }

    // ==================== Status ====================

    pub fn status(&self) -> BudgetStatus {
        match self.total_income.cmp(&self.total_expenses) {
            std::cmp::Ordering::Greater => BudgetStatus::Surplus,
            std::cmp::Ordering::Less => BudgetStatus::Deficit,
            std::cmp::Ordering::Equal => BudgetStatus::Balanced,
        }
    }

    /// Smallest extra spend that turns a surplus into a deficit
    pub fn amount_to_tip_into_deficit(&self) -> Result<Decimal, SimulationError> {
        match self.status() {
            BudgetStatus::Surplus => self.one_unit_past(self.total_income - self.total_expenses),
            _ => Ok(Decimal::ZERO),
        }
    }

    /// Smallest cut that turns a deficit into a surplus
    pub fn amount_to_reach_surplus(&self) -> Result<Decimal, SimulationError> {
        match self.status() {
            BudgetStatus::Deficit => self.one_unit_past(self.total_expenses - self.total_income),
            _ => Ok(Decimal::ZERO),
        }
    }

    /// Spending room left before the budget goes into deficit.
    ///
    /// `_category` is accepted for callers that pass one; the figure is the
    /// same for every category.
    pub fn headroom(&self, _category: Option<&str>) -> Decimal {
        match self.status() {
            BudgetStatus::Deficit => Decimal::ZERO,
            _ => self.total_income - self.total_expenses,
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        if self.pending.is_some() {
            SimulationPhase::Simulating
        } else if self.priorities.is_empty() {
            SimulationPhase::Neutral
        } else {
            SimulationPhase::Prioritized
        }
    }

    pub fn pending(&self) -> Option<&PendingRemainder> {
        self.pending.as_ref()
    }

    // ==================== Priorities ====================

    pub fn priorities(&self) -> &[String] {
        &self.priorities
    }

    /// 1-indexed rank of `category`, if it is a priority
    pub fn priority_rank(&self, category: &str) -> Option<usize> {
        self.priorities.iter().position(|p| p == category).map(|idx| idx + 1)
    }

    pub fn set_priority(&mut self, category: &str) -> PriorityOutcome {
        if let Some(rank) = self.priority_rank(category) {
            log::warn!(target: LOG_TARGET, "'{}' is already priority {}", category, rank);
            return PriorityOutcome::AlreadyPriority { rank };
        }
        if self.priorities.len() >= MAX_PRIORITIES {
            log::warn!(target: LOG_TARGET, "priority slots are full, '{}' not added", category);
            return PriorityOutcome::Full;
        }

        self.priorities.push(category.to_string());
        let rank = self.priorities.len();
        log::info!(target: LOG_TARGET, "'{}' set as priority {}", category, rank);
        PriorityOutcome::Set { rank }
    }

    /// Remove `category`, moving lower ranks up. Returns the rank it held.
    pub fn remove_priority(&mut self, category: &str) -> Option<usize> {
        match self.priority_rank(category) {
            Some(rank) => {
                self.priorities.remove(rank - 1);
                log::info!(target: LOG_TARGET, "'{}' removed from priority {}", category, rank);
                Some(rank)
            }
            None => {
                log::warn!(target: LOG_TARGET, "'{}' is not a priority", category);
                None
            }
        }
    }

    pub fn clear_priorities(&mut self) {
        self.priorities.clear();
    }

    // ==================== Simulation ====================

    /// Raise expenses by `amount` and return the new status
    pub fn increase_spending(&mut self, category: &str, amount: Decimal) -> Result<BudgetStatus, SimulationError> {
        if amount <= Decimal::ZERO {
            return Err(SimulationError::NonPositiveAmount { amount });
        }
        self.total_expenses = self
            .total_expenses
            .checked_add(amount)
            .ok_or(SimulationError::Overflow { amount })?;
        log::debug!(target: LOG_TARGET, "spending on '{}' raised by {}", category, amount);
        Ok(self.status())
    }

    /// Cut spending on `category` by `amount`, weighted by its priority.
    ///
    /// | rank | applied |
    /// |------|---------|
    /// | 1 | nothing (blocked) |
    /// | 2 | half |
    /// | 3 | three quarters |
    /// | none | all |
    ///
    /// Divisions truncate at the scale of the amount mode. Whatever is not
    /// applied becomes a pending remainder for [`Self::resolve_remainder`].
    pub fn adjust_spending(&mut self, category: &str, amount: Decimal) -> Result<AdjustmentResult, SimulationError> {
        if amount <= Decimal::ZERO {
            return Err(SimulationError::NonPositiveAmount { amount });
        }
        if let Some(pending) = &self.pending {
            return Err(SimulationError::ResolutionPending {
                category: pending.category.clone(),
                remainder: pending.remainder,
            });
        }

        let rank = self.priority_rank(category);
        let applied = match rank {
            Some(1) => Decimal::ZERO,
            Some(2) => self.truncate(amount / Decimal::from(2)),
            Some(3) => self.truncate(amount / Decimal::from(4)) * Decimal::from(3),
            _ => amount,
        };
        let remainder = amount - applied;
        let blocked = rank == Some(1);

        let staged = if blocked {
            Staged {
                expenses: self.total_expenses,
                cycle: self.cycle.clone(),
            }
        } else {
            self.stage_reduction(category, applied)?
        };
        let projection = if remainder > Decimal::ZERO {
            None
        } else {
            Some(project(self.total_income, staged.expenses, &staged.cycle)?)
        };

        if blocked {
            log::warn!(
                target: LOG_TARGET,
                "'{}' is the top priority; {} must come from another category",
                category,
                amount
            );
        }
        self.commit(category, staged);
        if projection.is_some() {
            self.cycle.clear();
        } else {
            log::info!(target: LOG_TARGET, "{} of the cut on '{}' is pending", remainder, category);
            self.pending = Some(PendingRemainder {
                category: category.to_string(),
                remainder,
            });
        }

        Ok(AdjustmentResult {
            category: category.to_string(),
            applied,
            remainder,
            blocked,
            projection,
        })
    }

    /// Take up to `amount` of the pending remainder from `category`, unweighted.
    ///
    /// `category` must differ from the one the adjustment was aimed at.
    /// Anything not covered stays pending.
    pub fn resolve_remainder(&mut self, category: &str, amount: Decimal) -> Result<AdjustmentResult, SimulationError> {
        if amount <= Decimal::ZERO {
            return Err(SimulationError::NonPositiveAmount { amount });
        }
        let pending = self.pending.as_ref().ok_or(SimulationError::NothingPending)?;
        if pending.category == category {
            log::warn!(target: LOG_TARGET, "remainder of '{}' cannot go back to it", category);
            return Err(SimulationError::SameCategory {
                category: category.to_string(),
            });
        }

        let applied = amount.min(pending.remainder);
        let remainder = pending.remainder - applied;
        let staged = self.stage_reduction(category, applied)?;
        let projection = if remainder > Decimal::ZERO {
            None
        } else {
            Some(project(self.total_income, staged.expenses, &staged.cycle)?)
        };

        self.commit(category, staged);
        if projection.is_some() {
            self.pending = None;
            self.cycle.clear();
        } else if let Some(pending) = self.pending.as_mut() {
            pending.remainder = remainder;
        }

        Ok(AdjustmentResult {
            category: category.to_string(),
            applied,
            remainder,
            blocked: false,
            projection,
        })
    }

    /// Drop the pending remainder and close the cycle with what was applied
    pub fn abandon_remainder(&mut self) -> Result<SavingsProjection, SimulationError> {
        if self.pending.is_none() {
            return Err(SimulationError::NothingPending);
        }
        let projection = project(self.total_income, self.total_expenses, &self.cycle)?;

        if let Some(pending) = self.pending.take() {
            log::info!(
                target: LOG_TARGET,
                "{} left over from '{}' abandoned",
                pending.remainder,
                pending.category
            );
        }
        self.cycle.clear();
        Ok(projection)
    }

    /// Expenses lowered by `amount` (never below zero) and the cycle with
    /// the effective cut added to `category`. Nothing is changed yet.
    fn stage_reduction(&self, category: &str, amount: Decimal) -> Result<Staged, SimulationError> {
        let effective = amount.min(self.total_expenses);
        let mut cycle = self.cycle.clone();
        match cycle.iter_mut().find(|(name, _)| name == category) {
            Some((_, total)) => {
                *total = total
                    .checked_add(effective)
                    .ok_or(SimulationError::Overflow { amount })?;
            }
            None => cycle.push((category.to_string(), effective)),
        }

        Ok(Staged {
            expenses: self.total_expenses - effective,
            cycle,
        })
    }

    fn commit(&mut self, category: &str, staged: Staged) {
        let cut = self.total_expenses - staged.expenses;
        if !cut.is_zero() {
            log::debug!(target: LOG_TARGET, "spending on '{}' cut by {}", category, cut);
        }
        self.total_expenses = staged.expenses;
        self.cycle = staged.cycle;
    }

    fn one_unit_past(&self, gap: Decimal) -> Result<Decimal, SimulationError> {
        gap.checked_add(self.unit())
            .ok_or(SimulationError::Overflow { amount: gap })
    }

    /// One smallest unit of the amount mode
    fn unit(&self) -> Decimal {
        Decimal::new(1, self.amount_mode.scale())
    }

    fn truncate(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.amount_mode.scale(), RoundingStrategy::ToZero)
    }
}

/// Savings for the current totals, with each touched category's cut, over
/// one, two and five years
fn project(
    income: Decimal,
    expenses: Decimal,
    cycle: &[(String, Decimal)],
) -> Result<SavingsProjection, SimulationError> {
    let annual = income - expenses;
    let (two_year, five_year) = horizons(annual)?;
    let breakdown = cycle
        .iter()
        .map(|(category, cut)| {
            let (two_year, five_year) = horizons(*cut)?;
            Ok(CategoryContribution {
                category: category.clone(),
                annual: *cut,
                two_year,
                five_year,
            })
        })
        .collect::<Result<Vec<_>, SimulationError>>()?;

    Ok(SavingsProjection {
        annual,
        two_year,
        five_year,
        breakdown,
    })
}

fn horizons(annual: Decimal) -> Result<(Decimal, Decimal), SimulationError> {
    let over = |years: i64| {
        annual
            .checked_mul(Decimal::from(years))
            .ok_or(SimulationError::Overflow { amount: annual })
    };
    Ok((over(2)?, over(5)?))
}

// ==================== Tests ====================
