//! Finance Tracker
//!
//! Personal finance service where authenticated users:
//! - Record expenses and custom spending categories
//! - Set savings goals and track contributions
//! - Complete a financial survey (income, pay schedule, fixed costs)
//! - Get deterministic, heuristic savings advice per goal
//!
//! Staff accounts additionally see platform-wide statistics.
//!
//! ADVICE PIPELINE:
//! SNAPSHOT → CASH FLOW → GUARDS → PLAN → OPPORTUNITIES → TIPS → REPORT

pub mod advisor;
pub mod api;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod stats;
pub mod store;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use advisor::GoalAdvisor;
pub use classifier::IncomeFrequencyClassifier;
