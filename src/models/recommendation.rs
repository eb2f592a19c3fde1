use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The JSON document the model is asked to return.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationEnvelope {
    pub trip_recommendation: TripRecommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecommendation {
    pub duration: u32,
    pub budget_breakdown: BudgetBreakdown,
    #[serde(default)]
    pub mode_of_travel: Option<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    pub itinerary: Vec<RecommendedDay>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetBreakdown {
    pub accommodation: f64,
    pub transportation: f64,
    pub activities: f64,
    pub food: f64,
    pub miscellaneous: f64,
}

impl BudgetBreakdown {
    pub fn categories(&self) -> [(&'static str, f64); 5] {
        [
            ("accommodation", self.accommodation),
            ("transportation", self.transportation),
            ("activities", self.activities),
            ("food", self.food),
            ("miscellaneous", self.miscellaneous),
        ]
    }

    pub fn total(&self) -> f64 {
        self.categories().iter().map(|(_, amount)| amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedDay {
    pub day: u32,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl TripRecommendation {
    /// Checks the shape beyond what serde enforces and puts the itinerary
    /// into dense day order starting at 1.
    pub fn validated(mut self) -> Result<Self, AppError> {
        if self.duration == 0 {
            return Err(malformed("duration must be at least one day"));
        }
        for (name, amount) in self.budget_breakdown.categories() {
            if !amount.is_finite() || amount < 0.0 {
                return Err(malformed(&format!(
                    "budget category {name} must be a non-negative number"
                )));
            }
        }
        if self.itinerary.is_empty() {
            return Err(malformed("itinerary has no days"));
        }

        let mut seen = HashSet::new();
        for entry in &self.itinerary {
            if entry.day == 0 {
                return Err(malformed("itinerary day numbers start at 1"));
            }
            if !seen.insert(entry.day) {
                return Err(malformed(&format!(
                    "itinerary day {} appears twice",
                    entry.day
                )));
            }
        }

        self.itinerary.sort_by_key(|entry| entry.day);
        for (index, entry) in self.itinerary.iter_mut().enumerate() {
            entry.day = index as u32 + 1;
        }
        self.mode_of_travel = self
            .mode_of_travel
            .map(|mode| mode.trim().to_string())
            .filter(|mode| !mode.is_empty());

        Ok(self)
    }
}

/// Removes Markdown code fences the model likes to wrap its JSON in.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

pub fn parse_recommendation(raw: &str) -> Result<TripRecommendation, AppError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(AppError::Upstream("model returned an empty response".into()));
    }
    let envelope: RecommendationEnvelope = serde_json::from_str(body)
        .map_err(|err| AppError::Upstream(format!("model returned malformed JSON: {err}")))?;
    envelope.trip_recommendation.validated()
}

fn malformed(reason: &str) -> AppError {
    AppError::Upstream(format!("model returned an invalid recommendation: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "tripRecommendation": {
            "duration": 3,
            "budgetBreakdown": {
                "accommodation": 6000,
                "transportation": 2500.5,
                "activities": 1500,
                "food": 2000,
                "miscellaneous": 500
            },
            "modeOfTravel": "Train",
            "activities": ["Beach walk", "Fort visit"],
            "itinerary": [
                { "day": 2, "activities": ["Fort visit"], "notes": "Start early" },
                { "day": 1, "activities": ["Check in"], "notes": "Rest" },
                { "day": 5, "activities": ["Depart"], "notes": "" }
            ],
            "tips": ["Carry sunscreen", "Book trains early"]
        }
    }"#;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {} "), "{}");
    }

    #[test]
    fn parses_fenced_output_and_renumbers_days() {
        let fenced = format!("```json\n{SAMPLE}\n```");
        let rec = parse_recommendation(&fenced).expect("parse");
        let days: Vec<_> = rec.itinerary.iter().map(|d| d.day).collect();
        assert_eq!(days, vec![1, 2, 3]);
        assert_eq!(rec.itinerary[0].notes, "Rest");
        assert_eq!(rec.itinerary[2].activities, vec!["Depart".to_string()]);
        assert_eq!(rec.budget_breakdown.total(), 12500.5);
    }

    #[test]
    fn rejects_prose_and_missing_fields() {
        assert!(matches!(
            parse_recommendation("Sure! Here is your trip."),
            Err(AppError::Upstream(_))
        ));
        assert!(matches!(
            parse_recommendation(r#"{"tripRecommendation": {"duration": 2}}"#),
            Err(AppError::Upstream(_))
        ));
        assert!(matches!(parse_recommendation("```json\n```"), Err(AppError::Upstream(_))));
    }

    #[test]
    fn rejects_negative_budget_and_duplicate_days() {
        let negative = SAMPLE.replace("\"food\": 2000", "\"food\": -1");
        assert!(parse_recommendation(&negative).is_err());

        let duplicate = SAMPLE.replace("\"day\": 5", "\"day\": 1");
        assert!(parse_recommendation(&duplicate).is_err());

        let zero = SAMPLE.replace("\"duration\": 3", "\"duration\": 0");
        assert!(parse_recommendation(&zero).is_err());
    }
}
