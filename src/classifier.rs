//! Income Frequency Classifier
//!
//! Turns the survey's free-text pay schedule ("Bi-Weekly", "every week",
//! "irregular / gig work") into an `IncomeFrequency`. Matching is a
//! case-insensitive substring check, so it runs once at the boundary and
//! the advisor never re-parses strings.

use crate::models::IncomeFrequency;

/// Static keyword lists — zero allocation
const WEEK_KEYWORDS: &[&str] = &["week"];
const BI_KEYWORDS: &[&str] = &["bi"];
const IRREGULAR_KEYWORDS: &[&str] = &["irregular"];
const MONTH_KEYWORDS: &[&str] = &["month"];

/// Income frequency classifier
pub struct IncomeFrequencyClassifier;

impl IncomeFrequencyClassifier {
    /// Classify a free-text pay schedule.
    ///
    /// "bi" + "week" must win over plain "week", since both contain "week".
    pub fn classify(text: &str) -> IncomeFrequency {
        let text = text.trim().to_lowercase();

        if text.is_empty() {
            return IncomeFrequency::Unknown;
        }

        if contains_any(&text, WEEK_KEYWORDS) {
            if contains_any(&text, BI_KEYWORDS) {
                IncomeFrequency::BiWeekly
            } else {
                IncomeFrequency::Weekly
            }
        } else if contains_any(&text, IRREGULAR_KEYWORDS) {
            IncomeFrequency::Irregular
        } else if contains_any(&text, MONTH_KEYWORDS) {
            IncomeFrequency::Monthly
        } else {
            IncomeFrequency::Unknown
        }
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_period_mapping() {
        let cases = vec![
            ("Bi-Weekly", IncomeFrequency::BiWeekly, 2.17),
            ("biweekly", IncomeFrequency::BiWeekly, 2.17),
            ("Weekly", IncomeFrequency::Weekly, 4.33),
            ("WEEKLY", IncomeFrequency::Weekly, 4.33),
            ("Irregular", IncomeFrequency::Irregular, 1.0),
            ("Monthly", IncomeFrequency::Monthly, 1.0),
            ("", IncomeFrequency::Unknown, 1.0),
        ];

        for (text, expected, periods) in cases {
            let frequency = IncomeFrequencyClassifier::classify(text);
            assert_eq!(frequency, expected, "classifying {:?}", text);
            assert_eq!(frequency.periods_per_month(), periods, "periods for {:?}", text);
        }
    }

    #[test]
    fn test_edge_cases() {
        assert_eq!(
            IncomeFrequencyClassifier::classify("   "),
            IncomeFrequency::Unknown
        );
        assert_eq!(
            IncomeFrequencyClassifier::classify("quarterly"),
            IncomeFrequency::Unknown
        );
        assert_eq!(
            IncomeFrequencyClassifier::classify("every week, sometimes more"),
            IncomeFrequency::Weekly
        );
        assert_eq!(IncomeFrequency::Unknown.periods_per_month(), 1.0);
    }
}
