use chrono::{Duration, Utc};
use finance_tracker::{
    models::{AdviceSnapshot, Expense, FinancialProfile, Goal, IncomeFrequency},
    GoalAdvisor,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Prints goal advice for a JSON snapshot `{ goal, profile?, expenses?, now? }`.
/// Without an argument a built-in sample is used.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let snapshot = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "Reading snapshot");
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str::<AdviceSnapshot>(&raw)?
        }
        None => {
            info!("No snapshot given, using sample data");
            sample_snapshot()
        }
    };

    let now = snapshot.now.unwrap_or_else(Utc::now);
    let report = GoalAdvisor::compute_advice(
        &snapshot.goal,
        snapshot.profile.as_ref(),
        &snapshot.expenses,
        now,
    );

    println!("\n=== GOAL ADVICE ===");
    println!(
        "Goal: {} (${:.2} of ${:.2})",
        if snapshot.goal.title.is_empty() { "untitled" } else { snapshot.goal.title.as_str() },
        snapshot.goal.current_amount,
        snapshot.goal.target_amount
    );
    println!();
    for (i, line) in report.lines().iter().enumerate() {
        println!("  {}: {}", i + 1, line);
    }

    Ok(())
}

fn sample_snapshot() -> AdviceSnapshot {
    let now = Utc::now();

    let goal = Goal {
        id: Uuid::new_v4(),
        user_id: "sample-user".to_string(),
        title: "Emergency fund".to_string(),
        description: Some("Three months of rent".to_string()),
        target_amount: 4500.0,
        current_amount: 600.0,
        deadline: Some(now + Duration::days(270)),
        completed: false,
        created_at: now,
    };

    let profile = FinancialProfile {
        monthly_income: 4200.0,
        income_frequency: IncomeFrequency::BiWeekly,
        survey_completed: true,
        monthly_rent: 1500.0,
        electricity: 90.0,
        internet: 60.0,
        car_insurance: 110.0,
        ..Default::default()
    };

    let expenses = [
        ("Rent", 1500.0),
        ("Groceries", 420.0),
        ("Dining Out", 260.0),
        ("Utilities", 150.0),
        ("Shopping", 180.0),
    ]
    .into_iter()
    .map(|(category, amount)| Expense {
        id: Uuid::new_v4(),
        user_id: "sample-user".to_string(),
        category: category.to_string(),
        subcategory: None,
        amount,
        description: None,
        date: now,
    })
    .collect();

    AdviceSnapshot {
        goal,
        profile: Some(profile),
        expenses,
        now: Some(now),
    }
}
