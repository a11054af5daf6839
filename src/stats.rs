//! Platform statistics for staff
//!
//! Pure functions over store snapshots; `now` is injected.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Expense, Goal, Role, User};

/// Users seen within this many days count as active
const ACTIVE_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: usize,
    pub completed_goals: usize,
    pub active_users: usize,
    pub inactive_users: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub goal_count: usize,
    pub expense_count: usize,
}

pub fn platform_stats(users: &[User], goals: &[Goal], now: DateTime<Utc>) -> PlatformStats {
    let cutoff = now - Duration::days(ACTIVE_WINDOW_DAYS);
    let active_users = users.iter().filter(|u| u.updated_at >= cutoff).count();

    PlatformStats {
        total_users: users.len(),
        completed_goals: goals.iter().filter(|g| g.completed).count(),
        active_users,
        inactive_users: users.len() - active_users,
    }
}

/// One row per user with activity counts, newest account first
pub fn user_summaries(users: &[User], goals: &[Goal], expenses: &[Expense]) -> Vec<UserSummary> {
    let mut goal_counts: HashMap<&str, usize> = HashMap::new();
    for goal in goals {
        *goal_counts.entry(goal.user_id.as_str()).or_default() += 1;
    }

    let mut expense_counts: HashMap<&str, usize> = HashMap::new();
    for expense in expenses {
        *expense_counts.entry(expense.user_id.as_str()).or_default() += 1;
    }

    let mut rows: Vec<UserSummary> = users
        .iter()
        .map(|user| UserSummary {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
            goal_count: goal_counts.get(user.id.as_str()).copied().unwrap_or(0),
            expense_count: expense_counts.get(user.id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}
