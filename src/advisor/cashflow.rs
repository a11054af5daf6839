//! Monthly cash-flow figures the advisor reasons over.
//!
//! Pay-period normalisation, current-month expense aggregation, and the
//! derived savings budgets. Everything here is arithmetic on snapshots.

use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;

use crate::models::{Expense, FinancialProfile, Goal};

/// Share of leftover cash the advisor is willing to commit
pub const SAFE_SHARE: f64 = 0.8;
/// Auto-transfer baseline as a share of leftover cash
pub const AUTO_TRANSFER_SHARE: f64 = 0.25;
/// Auto-transfer floor (before caps)
pub const AUTO_TRANSFER_FLOOR: f64 = 50.0;

/// Current-month spending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySpending {
    pub total: f64,
    /// Per-category totals in first-seen order
    pub by_category: Vec<(String, f64)>,
}

impl MonthlySpending {
    /// Single pass over the expense log, keeping only entries in `now`'s calendar month
    pub fn for_month(expenses: &[Expense], now: DateTime<Utc>) -> Self {
        let mut total = 0.0;
        let mut by_category: Vec<(String, f64)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for expense in expenses
            .iter()
            .filter(|e| e.date.year() == now.year() && e.date.month() == now.month())
        {
            total += expense.amount;

            match index.get(expense.category.as_str()) {
                Some(&slot) => by_category[slot].1 += expense.amount,
                None => {
                    index.insert(expense.category.as_str(), by_category.len());
                    by_category.push((expense.category.clone(), expense.amount));
                }
            }
        }

        Self { total, by_category }
    }

    /// Biggest categories first. Equal totals keep first-seen order.
    pub fn top_categories(&self, count: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .by_category
            .iter()
            .map(|(category, amount)| (category.as_str(), *amount))
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(count);
        ranked
    }
}

/// Monthly saving plan towards a deadline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadlinePlan {
    pub months: u32,
    pub required_monthly: f64,
    pub recommended_monthly: f64,
    pub recommended_per_pay: f64,
}

/// Standing auto-transfer suggestion when the goal has no deadline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoTransfer {
    pub monthly: f64,
    pub per_pay: f64,
}

/// Derived figures for one goal against one month of cash flow
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlow {
    pub monthly_income: f64,
    pub spending: MonthlySpending,
    /// Income minus this month's spending (may be negative)
    pub remaining: f64,
    pub amount_needed: f64,
    pub periods_per_month: f64,
    pub per_pay_leftover: f64,
    pub safe_per_pay: f64,
    pub safe_save_budget: f64,
    pub months_until_deadline: Option<u32>,
}

impl CashFlow {
    pub fn compute(
        goal: &Goal,
        profile: &FinancialProfile,
        expenses: &[Expense],
        now: DateTime<Utc>,
    ) -> Self {
        let spending = MonthlySpending::for_month(expenses, now);
        let monthly_income = profile.monthly_income;
        let remaining = monthly_income - spending.total;
        let periods_per_month = profile.income_frequency.periods_per_month();

        let per_pay_leftover = per_pay(remaining, periods_per_month);
        let safe_per_pay = per_pay_leftover.max(0.0) * SAFE_SHARE;
        let safe_save_budget = if remaining > 0.0 {
            (remaining * SAFE_SHARE).min(safe_per_pay * periods_per_month)
        } else {
            0.0
        };

        Self {
            monthly_income,
            spending,
            remaining,
            amount_needed: goal.amount_needed(),
            periods_per_month,
            per_pay_leftover,
            safe_per_pay,
            safe_save_budget,
            months_until_deadline: goal.deadline.map(|deadline| months_until(deadline, now)),
        }
    }

    pub fn monthly_expenses(&self) -> f64 {
        self.spending.total
    }

    /// Most the advisor will suggest per month while staying inside each paycheck
    pub fn max_monthly_within_paycheck(&self) -> f64 {
        self.safe_per_pay * self.periods_per_month
    }

    /// Share of income left over, in percent
    pub fn savings_rate(&self) -> f64 {
        if self.remaining > 0.0 && self.monthly_income > 0.0 {
            self.remaining / self.monthly_income * 100.0
        } else {
            0.0
        }
    }

    pub fn deadline_plan(&self, months: u32) -> DeadlinePlan {
        let required_monthly = self.amount_needed / f64::from(months.max(1));
        let recommended_monthly = required_monthly
            .min(self.safe_save_budget)
            .min(self.max_monthly_within_paycheck());

        DeadlinePlan {
            months,
            required_monthly,
            recommended_monthly,
            recommended_per_pay: per_pay(recommended_monthly, self.periods_per_month),
        }
    }

    pub fn auto_transfer(&self) -> AutoTransfer {
        let base = (self.remaining * AUTO_TRANSFER_SHARE)
            .max(self.remaining.min(AUTO_TRANSFER_FLOOR));
        let monthly = base
            .min(self.safe_save_budget)
            .min(self.max_monthly_within_paycheck());

        AutoTransfer {
            monthly,
            per_pay: per_pay(monthly, self.periods_per_month),
        }
    }
}

fn per_pay(monthly: f64, periods_per_month: f64) -> f64 {
    if periods_per_month > 0.0 {
        monthly / periods_per_month
    } else {
        monthly
    }
}

/// Whole calendar months from `now` to `deadline`, floored at 1.
///
/// Same-month and past deadlines both count as one month.
pub fn months_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let diff = (i64::from(deadline.year()) - i64::from(now.year())) * 12
        + i64::from(deadline.month())
        - i64::from(now.month());
    u32::try_from(diff.max(1)).unwrap_or(u32::MAX)
}
