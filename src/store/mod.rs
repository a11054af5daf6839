//! Tracker persistence layer
//!
//! Responsible for storing and loading users, survey answers, goals and
//! expenses. Currently uses in-memory maps; a database-backed store only
//! has to implement `TrackerStore`.

use crate::auth::AuthenticatedUser;
use crate::models::{Expense, FinancialProfile, Goal, User};
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Trait for tracker persistence
#[async_trait::async_trait]
pub trait TrackerStore: Send + Sync {
    /// Register the caller on first sight, refresh `updated_at` afterwards
    async fn touch_user(&self, identity: &AuthenticatedUser, now: DateTime<Utc>) -> Result<User>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn set_categories(&self, user_id: &str, categories: Vec<String>) -> Result<Vec<String>>;

    async fn load_profile(&self, user_id: &str) -> Result<Option<FinancialProfile>>;
    async fn save_profile(&self, user_id: &str, profile: FinancialProfile) -> Result<FinancialProfile>;

    /// A user's goals, newest first
    async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>>;
    async fn all_goals(&self) -> Result<Vec<Goal>>;
    async fn load_goal(&self, goal_id: Uuid) -> Result<Option<Goal>>;
    async fn persist_goal(&self, goal: &Goal) -> Result<()>;
    async fn delete_goal(&self, goal_id: Uuid) -> Result<bool>;

    /// A user's expenses, most recent first
    async fn list_expenses(&self, user_id: &str) -> Result<Vec<Expense>>;
    async fn all_expenses(&self) -> Result<Vec<Expense>>;
    async fn persist_expense(&self, expense: Expense) -> Result<()>;
}

/// In-memory store for development and tests
pub struct InMemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    profiles: Arc<RwLock<HashMap<String, FinancialProfile>>>, // user_id → survey
    goals: Arc<RwLock<HashMap<Uuid, Goal>>>,
    expenses_by_user: Arc<RwLock<HashMap<String, Vec<Expense>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            profiles: Arc::new(RwLock::new(HashMap::new())),
            goals: Arc::new(RwLock::new(HashMap::new())),
            expenses_by_user: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TrackerStore for InMemoryStore {

    async fn touch_user(&self, identity: &AuthenticatedUser, now: DateTime<Utc>) -> Result<User> {
        let mut users = self.users.write().await;

        let user = users.entry(identity.uid.clone()).or_insert_with(|| User {
            id: identity.uid.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            expense_categories: Vec::new(),
            created_at: now,
            updated_at: now,
        });

        // Identity provider is authoritative for role and contact details
        user.role = identity.role;
        if identity.email.is_some() {
            user.email = identity.email.clone();
        }
        if identity.name.is_some() {
            user.name = identity.name.clone();
        }
        user.updated_at = now;

        Ok(user.clone())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }

    async fn set_categories(&self, user_id: &str, categories: Vec<String>) -> Result<Vec<String>> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| crate::error::TrackerError::NotFound("User".to_string()))?;
        user.expense_categories = categories;
        Ok(user.expense_categories.clone())
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<FinancialProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(user_id).cloned())
    }

    async fn save_profile(&self, user_id: &str, profile: FinancialProfile) -> Result<FinancialProfile> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let goals = self.goals.read().await;

        let mut owned: Vec<Goal> = goals
            .values()
            .filter(|goal| goal.user_id == user_id)
            .cloned()
            .collect();

        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn all_goals(&self) -> Result<Vec<Goal>> {
        let goals = self.goals.read().await;
        Ok(goals.values().cloned().collect())
    }

    async fn load_goal(&self, goal_id: Uuid) -> Result<Option<Goal>> {
        let goals = self.goals.read().await;
        Ok(goals.get(&goal_id).cloned())
    }

    async fn persist_goal(&self, goal: &Goal) -> Result<()> {
        let mut goals = self.goals.write().await;
        goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn delete_goal(&self, goal_id: Uuid) -> Result<bool> {
        let mut goals = self.goals.write().await;
        Ok(goals.remove(&goal_id).is_some())
    }

    async fn list_expenses(&self, user_id: &str) -> Result<Vec<Expense>> {
        let expenses = self.expenses_by_user.read().await;

        let mut owned = expenses.get(user_id).cloned().unwrap_or_default();
        owned.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(owned)
    }

    async fn all_expenses(&self) -> Result<Vec<Expense>> {
        let expenses = self.expenses_by_user.read().await;

        Ok(expenses
            .values()
            .flat_map(|list| list.iter())
            .cloned()
            .collect())
    }

    async fn persist_expense(&self, expense: Expense) -> Result<()> {
        let mut expenses = self.expenses_by_user.write().await;
        expenses
            .entry(expense.user_id.clone())
            .or_insert_with(Vec::new)
            .push(expense);
        Ok(())
    }
}
