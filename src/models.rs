//! Core data models for the finance tracker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::classifier::IncomeFrequencyClassifier;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Staff,
}

/// How often the user is paid.
///
/// Parsed once from the survey's free-text answer; the advisor only ever
/// sees the enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IncomeFrequency {
    Weekly,
    BiWeekly,
    Monthly,
    Irregular,
    #[default]
    Unknown,
}

impl IncomeFrequency {
    /// Pay periods that fall in an average month
    pub fn periods_per_month(&self) -> f64 {
        match self {
            IncomeFrequency::Weekly => 4.33,    // ~52/year
            IncomeFrequency::BiWeekly => 2.17,  // ~26/year
            IncomeFrequency::Monthly
            | IncomeFrequency::Irregular
            | IncomeFrequency::Unknown => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IncomeFrequency::Weekly => "Weekly",
            IncomeFrequency::BiWeekly => "Bi-weekly",
            IncomeFrequency::Monthly => "Monthly",
            IncomeFrequency::Irregular => "Irregular",
            IncomeFrequency::Unknown => "",
        }
    }
}

impl fmt::Display for IncomeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for IncomeFrequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for IncomeFrequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw {
            serde_json::Value::String(text) => IncomeFrequencyClassifier::classify(&text),
            _ => IncomeFrequency::Unknown,
        })
    }
}

//
// ================= Goal =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub target_amount: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub current_amount: f64,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Money still missing; over-funding counts as zero
    pub fn amount_needed(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }

    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        self.current_amount / self.target_amount * 100.0
    }

    /// Add (positive) or withdraw (negative) money. The balance never drops below zero.
    pub fn adjust_current(&mut self, delta: f64) -> f64 {
        self.current_amount = (self.current_amount + delta).max(0.0);
        self.current_amount
    }
}

//
// ================= Expense =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub date: DateTime<Utc>,
}

//
// ================= Financial Profile =================
//

/// Survey fields counted as fixed monthly obligations.
pub const FIXED_COST_FIELDS: [&str; 10] = [
    "monthlyRent",
    "propertyTax",
    "homeInsurance",
    "electricity",
    "water",
    "gas",
    "internet",
    "carPayment",
    "carInsurance",
    "healthInsurance",
];

/// A user's answers to the financial survey. Missing amounts are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialProfile {
    #[serde(deserialize_with = "lenient::amount")]
    pub monthly_income: f64,
    pub income_frequency: IncomeFrequency,
    pub survey_completed: bool,

    // Housing
    #[serde(deserialize_with = "lenient::amount")]
    pub monthly_rent: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub property_tax: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub home_insurance: f64,

    // Utilities
    #[serde(deserialize_with = "lenient::amount")]
    pub electricity: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub water: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub gas: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub internet: f64,

    // Food
    #[serde(deserialize_with = "lenient::amount")]
    pub groceries: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub dining_out: f64,

    // Transportation
    #[serde(deserialize_with = "lenient::amount")]
    pub car_payment: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub car_insurance: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub gas_fuel: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub public_transport: f64,

    // Health
    #[serde(deserialize_with = "lenient::amount")]
    pub health_insurance: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub medications: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub medical_expenses: f64,

    // Debt
    #[serde(deserialize_with = "lenient::amount")]
    pub credit_cards: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub student_loans: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub personal_loans: f64,

    // Lifestyle
    #[serde(deserialize_with = "lenient::amount")]
    pub streaming: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub gym: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub hobbies: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub clothing: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub personal_care: f64,

    // Family & other
    #[serde(deserialize_with = "lenient::amount")]
    pub childcare: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub pet_care: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub other_expenses: f64,
}

impl FinancialProfile {
    /// Look up a survey cost field by its wire name
    pub fn cost_field(&self, name: &str) -> Option<f64> {
        let value = match name {
            "monthlyRent" => self.monthly_rent,
            "propertyTax" => self.property_tax,
            "homeInsurance" => self.home_insurance,
            "electricity" => self.electricity,
            "water" => self.water,
            "gas" => self.gas,
            "internet" => self.internet,
            "groceries" => self.groceries,
            "diningOut" => self.dining_out,
            "carPayment" => self.car_payment,
            "carInsurance" => self.car_insurance,
            "gasFuel" => self.gas_fuel,
            "publicTransport" => self.public_transport,
            "healthInsurance" => self.health_insurance,
            "medications" => self.medications,
            "medicalExpenses" => self.medical_expenses,
            "creditCards" => self.credit_cards,
            "studentLoans" => self.student_loans,
            "personalLoans" => self.personal_loans,
            "streaming" => self.streaming,
            "gym" => self.gym,
            "hobbies" => self.hobbies,
            "clothing" => self.clothing,
            "personalCare" => self.personal_care,
            "childcare" => self.childcare,
            "petCare" => self.pet_care,
            "otherExpenses" => self.other_expenses,
            _ => return None,
        };
        Some(value)
    }

    /// Sum of the fixed monthly obligations
    pub fn fixed_costs(&self) -> f64 {
        FIXED_COST_FIELDS
            .iter()
            .filter_map(|field| self.cost_field(field))
            .sum()
    }
}

//
// ================= User =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub expense_categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//
// ================= Advice =================
//

/// Ordered advice lines produced for a single goal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceReport {
    lines: Vec<String>,
}

impl AdviceReport {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Paragraph form shown on the goal page
    pub fn to_text(&self) -> String {
        self.lines.join("\n\n")
    }
}

/// Everything the advisor needs, as one JSON document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceSnapshot {
    pub goal: Goal,
    #[serde(default)]
    pub profile: Option<FinancialProfile>,
    /// Rows without a usable date are dropped, like any other row outside the month
    #[serde(default, deserialize_with = "lenient::dated_expenses")]
    pub expenses: Vec<Expense>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub now: Option<DateTime<Utc>>,
}

//
// ================= Lenient serde adapters =================
//

pub(crate) mod lenient {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, or a bare date (midnight UTC)
    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(parsed.and_utc());
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    fn finite(value: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    /// Numbers and numeric strings pass through; anything else is zero
    pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw {
            Value::Number(n) => n.as_f64().map(finite).unwrap_or(0.0),
            Value::String(s) => s.trim().parse::<f64>().map(finite).unwrap_or(0.0),
            _ => 0.0,
        })
    }

    /// Unparseable or empty dates become `None`
    pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw {
            Value::String(s) => parse_timestamp(&s),
            _ => None,
        })
    }

    pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid date '{}'", raw)))
    }

    /// Expense list that skips rows `Expense` rejects instead of failing the whole list
    pub fn dated_expenses<'de, D>(deserializer: D) -> Result<Vec<super::Expense>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
        let total = rows.len();
        let kept: Vec<super::Expense> = rows
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect();

        if kept.len() < total {
            tracing::debug!(skipped = total - kept.len(), "Dropped malformed expense rows");
        }
        Ok(kept)
    }
}

pub use lenient::parse_timestamp;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use serde_json::json;

    #[test]
    fn test_profile_defaults_missing_and_malformed_amounts() {
        let profile: FinancialProfile = serde_json::from_value(json!({
            "monthlyIncome": "4200.50",
            "incomeFrequency": "Bi-Weekly",
            "surveyCompleted": true,
            "monthlyRent": null,
            "water": "not a number",
            "gym": 35
        }))
        .unwrap();

        assert_eq!(profile.monthly_income, 4200.5);
        assert_eq!(profile.income_frequency, IncomeFrequency::BiWeekly);
        assert!(profile.survey_completed);
        assert_eq!(profile.monthly_rent, 0.0);
        assert_eq!(profile.water, 0.0);
        assert_eq!(profile.gym, 35.0);
        assert_eq!(profile.internet, 0.0);
    }

    #[test]
    fn test_fixed_costs_only_counts_fixed_fields() {
        let profile = FinancialProfile {
            monthly_rent: 1200.0,
            electricity: 80.0,
            car_insurance: 120.0,
            groceries: 400.0,
            dining_out: 150.0,
            ..Default::default()
        };
        assert_eq!(profile.fixed_costs(), 1400.0);
    }

    #[test]
    fn test_every_fixed_field_is_known() {
        let profile = FinancialProfile::default();
        for field in FIXED_COST_FIELDS {
            assert!(profile.cost_field(field).is_some(), "unknown field {}", field);
        }
        assert!(profile.cost_field("yachtFuel").is_none());
    }

    #[test]
    fn test_goal_deadline_parsing() {
        let goal: Goal = serde_json::from_value(json!({
            "targetAmount": 1000,
            "deadline": "2025-06-30"
        }))
        .unwrap();
        let deadline = goal.deadline.unwrap();
        assert_eq!((deadline.year(), deadline.month(), deadline.day()), (2025, 6, 30));
        assert_eq!(goal.current_amount, 0.0);

        let goal: Goal = serde_json::from_value(json!({
            "targetAmount": 1000,
            "deadline": "someday"
        }))
        .unwrap();
        assert!(goal.deadline.is_none());
    }

    #[test]
    fn test_goal_amounts() {
        let mut goal: Goal = serde_json::from_value(json!({
            "targetAmount": 500,
            "currentAmount": 650
        }))
        .unwrap();
        assert_eq!(goal.amount_needed(), 0.0);
        assert_eq!(goal.progress_percent(), 130.0);

        assert_eq!(goal.adjust_current(-1000.0), 0.0);
        assert_eq!(goal.adjust_current(125.0), 125.0);
        assert_eq!(goal.amount_needed(), 375.0);
    }

    #[test]
    fn test_expense_requires_valid_date() {
        let ok: Expense = serde_json::from_value(json!({
            "category": "Food",
            "amount": 12.5,
            "date": "2024-03-05T18:30:00Z"
        }))
        .unwrap();
        assert_eq!(ok.date, Utc.with_ymd_and_hms(2024, 3, 5, 18, 30, 0).unwrap());

        let bad = serde_json::from_value::<Expense>(json!({
            "category": "Food",
            "amount": 12.5,
            "date": "yesterday"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_snapshot_skips_undated_expenses() {
        let snapshot: AdviceSnapshot = serde_json::from_value(json!({
            "goal": { "title": "Bike", "targetAmount": 600 },
            "expenses": [
                { "category": "Rent", "amount": 900, "date": "2024-03-01" },
                { "category": "Food", "amount": 40, "date": "last tuesday" },
                { "category": "Fuel", "amount": 60 },
                { "category": "Gym", "amount": "35", "date": "2024-03-10T07:00:00Z" }
            ]
        }))
        .unwrap();

        let categories: Vec<&str> = snapshot.expenses.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, vec!["Rent", "Gym"]);
        assert_eq!(snapshot.expenses[1].amount, 35.0);

        let empty: AdviceSnapshot = serde_json::from_value(json!({
            "goal": { "title": "Bike", "targetAmount": 600 },
            "expenses": null
        }))
        .unwrap();
        assert!(empty.expenses.is_empty());
    }

    #[test]
    fn test_income_frequency_round_trips_label() {
        let value = serde_json::to_value(IncomeFrequency::BiWeekly).unwrap();
        assert_eq!(value, json!("Bi-weekly"));
        let parsed: IncomeFrequency = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, IncomeFrequency::BiWeekly);
        let parsed: IncomeFrequency = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(parsed, IncomeFrequency::Unknown);
    }

    #[test]
    fn test_report_text_joins_paragraphs() {
        let report = AdviceReport::new(vec!["one".into(), "two".into()]);
        assert_eq!(report.to_text(), "one\n\ntwo");
        assert_eq!(report.len(), 2);
    }
}
