//! Goal advisor
//!
//! Deterministic savings advice for a single goal. Takes snapshots of the
//! goal, the user's survey answers and expense log plus an explicit `now`,
//! and returns ordered advice lines. No I/O, no shared state.
//!
//! PIPELINE:
//! FUNDED? → MISSING DATA? → CASH FLOW → GOAL PLAN → CATEGORY CUTS → HEALTH TIP
//!
//! Any stage may finish the report early.

pub mod cashflow;
pub mod format;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{AdviceReport, Expense, FinancialProfile, Goal};
use cashflow::CashFlow;
use format::{grouped, money, percent};

pub use cashflow::{months_until, AutoTransfer, DeadlinePlan, MonthlySpending};

/// Share of a category the advisor suggests trimming
const CATEGORY_CUT_SHARE: f64 = 0.15;
/// Categories listed under savings opportunities
const TOP_CATEGORY_COUNT: usize = 3;
/// Variable spending above this share of fixed costs triggers the focus tip
const VARIABLE_SPEND_RATIO: f64 = 0.5;

pub const FULLY_FUNDED: &str =
    "🎉 Goal is fully funded. Consider marking it complete or setting a new target.";
pub const MISSING_DATA: &str =
    "⚠️ Add your income and expenses to get tailored guidance. Complete the survey first.";
pub const ADD_INCOME: &str =
    "⚠️ **Add your income information** to get personalized savings recommendations.";
pub const NO_DEADLINE_HEADER: &str = "🚀 No deadline set. Focus on consistent habits:";
pub const SAVINGS_OPPORTUNITIES_HEADER: &str = "**💡 Savings Opportunities:**";
pub const FOCUS_AREA_TIP: &str = "**🎯 Focus Area**: Your variable expenses are high. Small changes in daily spending (dining out, entertainment, shopping) can significantly boost your savings.";
pub const GENERIC_NUDGE: &str =
    "Add income and expenses to get personalized savings recommendations.";

/// Whether the pipeline keeps going after a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Continue,
    Done,
}

/// Inputs shared by every stage
struct AdviceContext<'a> {
    profile: &'a FinancialProfile,
    has_expenses: bool,
    flow: CashFlow,
}

type StageFn = fn(&AdviceContext<'_>, &mut Vec<String>) -> Stage;

/// Ordered stages. Order is part of the contract.
const STAGES: &[StageFn] = &[
    funded_guard,
    missing_data_guard,
    cash_flow_commentary,
    goal_recommendation,
    savings_opportunities,
    financial_health_tip,
];

/// Goal advisor
pub struct GoalAdvisor;

impl GoalAdvisor {
    /// Compute advice for `goal`. An absent profile counts as an empty survey.
    pub fn compute_advice(
        goal: &Goal,
        profile: Option<&FinancialProfile>,
        expenses: &[Expense],
        now: DateTime<Utc>,
    ) -> AdviceReport {
        let empty_profile;
        let profile = match profile {
            Some(profile) => profile,
            None => {
                empty_profile = FinancialProfile::default();
                &empty_profile
            }
        };

        let ctx = AdviceContext {
            profile,
            has_expenses: !expenses.is_empty(),
            flow: CashFlow::compute(goal, profile, expenses, now),
        };

        let mut lines = Vec::new();
        for stage in STAGES {
            if stage(&ctx, &mut lines) == Stage::Done {
                break;
            }
        }

        if lines.is_empty() {
            lines.push(GENERIC_NUDGE.to_string());
        }

        debug!(
            goal_id = %goal.id,
            remaining = ctx.flow.remaining,
            amount_needed = ctx.flow.amount_needed,
            periods_per_month = ctx.flow.periods_per_month,
            months_until_deadline = ?ctx.flow.months_until_deadline,
            line_count = lines.len(),
            "Goal advice computed"
        );

        AdviceReport::new(lines)
    }
}

//
// ================= Stages =================
//

fn funded_guard(ctx: &AdviceContext<'_>, lines: &mut Vec<String>) -> Stage {
    if ctx.flow.amount_needed <= 0.0 {
        lines.push(FULLY_FUNDED.to_string());
        return Stage::Done;
    }
    Stage::Continue
}

fn missing_data_guard(ctx: &AdviceContext<'_>, lines: &mut Vec<String>) -> Stage {
    if ctx.flow.monthly_income == 0.0 && !ctx.has_expenses {
        lines.push(MISSING_DATA.to_string());
        return Stage::Done;
    }
    Stage::Continue
}

fn cash_flow_commentary(ctx: &AdviceContext<'_>, lines: &mut Vec<String>) -> Stage {
    let flow = &ctx.flow;

    if flow.monthly_income == 0.0 {
        lines.push(ADD_INCOME.to_string());
        return Stage::Continue;
    }

    if flow.remaining <= 0.0 {
        lines.push(format!(
            "⚠️ **Your monthly expenses (${}) exceed your income (${})**. Pause contributions and focus on reducing expenses.",
            grouped(flow.monthly_expenses()),
            grouped(flow.monthly_income),
        ));
        return Stage::Done;
    }

    lines.push(format!(
        "💰 You currently have **${}** left after monthly expenses, which is {}% of your income.",
        grouped(flow.remaining),
        percent(flow.savings_rate()),
    ));
    Stage::Continue
}

fn goal_recommendation(ctx: &AdviceContext<'_>, lines: &mut Vec<String>) -> Stage {
    let flow = &ctx.flow;

    // Only reachable with no income, where nothing is left to plan with
    if flow.remaining <= 0.0 {
        return Stage::Continue;
    }

    match flow.months_until_deadline {
        Some(months) => {
            let plan = flow.deadline_plan(months);
            if plan.required_monthly <= flow.remaining {
                lines.push(format!(
                    "✅ **You can reach this goal!** Save ${} per month (~${} each paycheck) for the next {} months.",
                    money(plan.recommended_monthly),
                    money(plan.recommended_per_pay),
                    plan.months,
                ));
            } else {
                let shortfall = plan.required_monthly - flow.remaining;
                lines.push(format!(
                    "⚠️ You need ${}/month to reach this goal by the deadline, but only have ${} available. Consider extending the deadline or finding ways to save an additional ${}/month.",
                    money(plan.required_monthly),
                    money(flow.remaining),
                    money(shortfall),
                ));
            }
        }
        None => {
            let auto = flow.auto_transfer();
            lines.push(NO_DEADLINE_HEADER.to_string());
            lines.push(format!(
                "• Auto-transfer ${} each paycheck (about ${} per month) into this goal.",
                money(auto.per_pay),
                money(auto.monthly),
            ));
            lines.push(
                "• Use round-ups or a weekly sweep of leftover checking balance into this goal."
                    .to_string(),
            );
            lines.push("• Trim 1-2 categories by 10-15% and move the difference here.".to_string());
        }
    }

    Stage::Continue
}

fn savings_opportunities(ctx: &AdviceContext<'_>, lines: &mut Vec<String>) -> Stage {
    let flow = &ctx.flow;
    let top = flow.spending.top_categories(TOP_CATEGORY_COUNT);

    if top.is_empty() || flow.remaining <= 0.0 || flow.amount_needed <= flow.remaining {
        return Stage::Continue;
    }

    lines.push(SAVINGS_OPPORTUNITIES_HEADER.to_string());
    for (category, amount) in top {
        lines.push(format!(
            "• **{}**: ${}/month - Consider reducing by 15% to save an extra ${}",
            category,
            money(amount),
            money(amount * CATEGORY_CUT_SHARE),
        ));
    }

    Stage::Continue
}

fn financial_health_tip(ctx: &AdviceContext<'_>, lines: &mut Vec<String>) -> Stage {
    if !ctx.profile.survey_completed {
        return Stage::Done;
    }

    let fixed = ctx.profile.fixed_costs();
    let variable = ctx.flow.monthly_expenses() - fixed;

    if variable > fixed * VARIABLE_SPEND_RATIO && ctx.flow.remaining > 0.0 {
        lines.push(FOCUS_AREA_TIP.to_string());
    }

    Stage::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomeFrequency;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
    }

    fn months_from_now(months: u32) -> DateTime<Utc> {
        now().checked_add_months(chrono::Months::new(months)).unwrap()
    }

    fn goal(target: f64, current: f64, deadline: Option<DateTime<Utc>>) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id: "user-1".into(),
            title: "Vacation".into(),
            description: None,
            target_amount: target,
            current_amount: current,
            deadline,
            completed: false,
            created_at: now(),
        }
    }

    fn profile(income: f64, frequency: IncomeFrequency) -> FinancialProfile {
        FinancialProfile {
            monthly_income: income,
            income_frequency: frequency,
            ..Default::default()
        }
    }

    fn expense(category: &str, amount: f64) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            user_id: "user-1".into(),
            category: category.into(),
            subcategory: None,
            amount,
            description: None,
            date: now(),
        }
    }

    fn advise(g: &Goal, p: Option<&FinancialProfile>, e: &[Expense]) -> Vec<String> {
        GoalAdvisor::compute_advice(g, p, e, now()).lines().to_vec()
    }

    #[test]
    fn test_fully_funded_is_single_line() {
        let p = profile(3000.0, IncomeFrequency::Monthly);
        for current in [1000.0, 1000.01, 5000.0] {
            let lines = advise(&goal(1000.0, current, None), Some(&p), &[expense("Food", 3500.0)]);
            assert_eq!(lines, vec![FULLY_FUNDED.to_string()]);
        }
    }

    #[test]
    fn test_no_income_no_expenses() {
        let lines = advise(&goal(1000.0, 0.0, None), None, &[]);
        assert_eq!(lines, vec![MISSING_DATA.to_string()]);

        let p = profile(0.0, IncomeFrequency::Weekly);
        let lines = advise(&goal(1000.0, 0.0, Some(months_from_now(3))), Some(&p), &[]);
        assert_eq!(lines, vec![MISSING_DATA.to_string()]);
    }

    #[test]
    fn test_no_income_with_expenses_prompts_for_income() {
        let lines = advise(&goal(1000.0, 0.0, None), None, &[expense("Food", 120.0)]);
        assert_eq!(lines, vec![ADD_INCOME.to_string()]);
    }

    #[test]
    fn test_expenses_exceed_income_stops() {
        let mut p = profile(1000.0, IncomeFrequency::Monthly);
        p.survey_completed = true;
        let lines = advise(
            &goal(1000.0, 0.0, Some(months_from_now(6))),
            Some(&p),
            &[expense("Rent", 900.0), expense("Food", 300.0)],
        );

        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "⚠️ **Your monthly expenses ($1,200) exceed your income ($1,000)**. Pause contributions and focus on reducing expenses."
        );
    }

    #[test]
    fn test_break_even_counts_as_exceeding() {
        let p = profile(1000.0, IncomeFrequency::Monthly);
        let lines = advise(&goal(1000.0, 0.0, None), Some(&p), &[expense("Rent", 1000.0)]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("exceed your income"));
    }

    #[test]
    fn test_reachable_deadline_scenario() {
        let p = profile(3000.0, IncomeFrequency::Monthly);
        let lines = advise(
            &goal(1000.0, 0.0, Some(months_from_now(6))),
            Some(&p),
            &[expense("Rent", 1500.0), expense("Food", 500.0)],
        );

        assert_eq!(
            lines,
            vec![
                "💰 You currently have **$1,000** left after monthly expenses, which is 33.3% of your income.".to_string(),
                "✅ **You can reach this goal!** Save $166.67 per month (~$166.67 each paycheck) for the next 6 months.".to_string(),
            ]
        );
    }

    #[test]
    fn test_per_paycheck_amount_uses_pay_schedule() {
        let p = profile(3000.0, IncomeFrequency::BiWeekly);
        let lines = advise(
            &goal(1000.0, 0.0, Some(months_from_now(6))),
            Some(&p),
            &[expense("Rent", 2000.0)],
        );
        assert_eq!(
            lines[1],
            "✅ **You can reach this goal!** Save $166.67 per month (~$76.80 each paycheck) for the next 6 months."
        );
    }

    #[test]
    fn test_shortfall_warning_and_category_cuts() {
        let p = profile(3000.0, IncomeFrequency::Monthly);
        let expenses = vec![
            expense("Rent", 1500.0),
            expense("Dining", 300.0),
            expense("Shopping", 200.0),
            expense("Coffee", 100.0),
        ];
        let lines = advise(&goal(10_000.0, 1000.0, Some(months_from_now(6))), Some(&p), &expenses);

        assert_eq!(
            lines,
            vec![
                "💰 You currently have **$900** left after monthly expenses, which is 30.0% of your income.".to_string(),
                "⚠️ You need $1500.00/month to reach this goal by the deadline, but only have $900.00 available. Consider extending the deadline or finding ways to save an additional $600.00/month.".to_string(),
                SAVINGS_OPPORTUNITIES_HEADER.to_string(),
                "• **Rent**: $1500.00/month - Consider reducing by 15% to save an extra $225.00".to_string(),
                "• **Dining**: $300.00/month - Consider reducing by 15% to save an extra $45.00".to_string(),
                "• **Shopping**: $200.00/month - Consider reducing by 15% to save an extra $30.00".to_string(),
            ]
        );
    }

    #[test]
    fn test_same_month_deadline_counts_one_month() {
        let p = profile(3000.0, IncomeFrequency::Monthly);
        let same_month = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let lines = advise(&goal(500.0, 0.0, Some(same_month)), Some(&p), &[expense("Rent", 2000.0)]);
        assert!(lines[1].ends_with("for the next 1 months."), "{}", lines[1]);
    }

    #[test]
    fn test_no_deadline_auto_transfer_block() {
        let p = profile(1000.0, IncomeFrequency::Monthly);
        let lines = advise(&goal(400.0, 0.0, None), Some(&p), &[expense("Food", 500.0)]);

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], NO_DEADLINE_HEADER);
        assert_eq!(
            lines[2],
            "• Auto-transfer $125.00 each paycheck (about $125.00 per month) into this goal."
        );
        assert!(lines[3].starts_with("• Use round-ups"));
        assert!(lines[4].starts_with("• Trim 1-2 categories"));
    }

    #[test]
    fn test_weekly_auto_transfer_splits_per_paycheck() {
        let p = profile(2000.0, IncomeFrequency::Weekly);
        let lines = advise(&goal(300.0, 0.0, None), Some(&p), &[expense("Food", 1000.0)]);
        // base = 250, per paycheck = 250 / 4.33
        assert_eq!(
            lines[2],
            "• Auto-transfer $57.74 each paycheck (about $250.00 per month) into this goal."
        );
    }

    #[test]
    fn test_category_cuts_only_when_goal_exceeds_leftover() {
        let p = profile(3000.0, IncomeFrequency::Monthly);
        let expenses = vec![expense("Rent", 1500.0), expense("Dining", 500.0)];

        let small = advise(&goal(800.0, 0.0, None), Some(&p), &expenses);
        assert!(!small.iter().any(|l| l == SAVINGS_OPPORTUNITIES_HEADER));

        let large = advise(&goal(8000.0, 0.0, None), Some(&p), &expenses);
        assert!(large.iter().any(|l| l == SAVINGS_OPPORTUNITIES_HEADER));
        assert_eq!(large.len(), 1 + 4 + 1 + 2);
    }

    #[test]
    fn test_category_cuts_ignore_other_months() {
        let p = profile(3000.0, IncomeFrequency::Monthly);
        let mut old = expense("Travel", 5000.0);
        old.date = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let lines = advise(&goal(8000.0, 0.0, None), Some(&p), &[old, expense("Food", 100.0)]);

        assert!(lines.iter().any(|l| l.starts_with("• **Food**")));
        assert!(!lines.iter().any(|l| l.contains("Travel")));
    }

    #[test]
    fn test_focus_tip_requires_completed_survey() {
        let mut p = profile(4000.0, IncomeFrequency::Monthly);
        p.monthly_rent = 1000.0;
        p.electricity = 100.0;
        p.groceries = 600.0;
        let expenses = vec![expense("Rent", 1100.0), expense("Dining", 900.0)];

        let lines = advise(&goal(500.0, 0.0, Some(months_from_now(2))), Some(&p), &expenses);
        assert!(!lines.iter().any(|l| l == FOCUS_AREA_TIP));

        p.survey_completed = true;
        let lines = advise(&goal(500.0, 0.0, Some(months_from_now(2))), Some(&p), &expenses);
        assert_eq!(lines.last().map(String::as_str), Some(FOCUS_AREA_TIP));
    }

    #[test]
    fn test_focus_tip_skipped_when_variable_spending_is_low() {
        let mut p = profile(4000.0, IncomeFrequency::Monthly);
        p.survey_completed = true;
        p.monthly_rent = 1500.0;
        p.car_payment = 400.0;
        let expenses = vec![expense("Rent", 1500.0), expense("Car", 400.0), expense("Food", 300.0)];

        // variable = 2200 - 1900 = 300, threshold = 950
        let lines = advise(&goal(500.0, 0.0, None), Some(&p), &expenses);
        assert!(!lines.iter().any(|l| l == FOCUS_AREA_TIP));
    }

    #[test]
    fn test_idempotent() {
        let mut p = profile(5200.0, IncomeFrequency::BiWeekly);
        p.survey_completed = true;
        let expenses = vec![
            expense("Rent", 1800.0),
            expense("Dining", 420.0),
            expense("Dining", 80.0),
            expense("Gym", 60.0),
        ];
        let g = goal(25_000.0, 1200.0, Some(months_from_now(18)));

        let first = GoalAdvisor::compute_advice(&g, Some(&p), &expenses, now());
        let second = GoalAdvisor::compute_advice(&g, Some(&p), &expenses, now());
        assert_eq!(first, second);
        assert_eq!(first.to_text(), second.to_text());
    }
}
