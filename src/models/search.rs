use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::{AppError, FieldError},
    models::trip::TravelMode,
};

/// IST, used to read a calendar date out of a full timestamp.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Trip search as posted by the client. Empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    #[validate(
        required(message = "current location is required"),
        length(min = 2, message = "current location must be at least 2 characters")
    )]
    pub current_location: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "destination is required"),
        length(min = 2, message = "destination must be at least 2 characters")
    )]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "budget_text")]
    pub budget: Option<String>,
    #[serde(default)]
    pub date_range: Option<DateRangeInput>,
    #[serde(default)]
    pub mode_of_travel: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeInput {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub from: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub to: Option<String>,
}

impl SearchRequest {
    pub fn trimmed(mut self) -> Self {
        self.current_location = self.current_location.map(|value| value.trim().to_string());
        self.destination = self.destination.map(|value| value.trim().to_string());
        self.budget = non_blank(self.budget);
        self.mode_of_travel = non_blank(self.mode_of_travel);
        self
    }
}

/// A validated search, ready for prompting and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub current_location: String,
    pub destination: String,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mode: Option<TravelMode>,
}

impl SearchQuery {
    pub fn from_request(request: SearchRequest) -> Result<Self, AppError> {
        let request = request.trimmed();
        request.validate()?;

        let mut problems = Vec::new();

        let budget = match request.budget.as_deref() {
            None => None,
            Some(raw) => match raw.replace(',', "").parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
                _ => {
                    problems.push(FieldError::new(
                        "budget",
                        "number",
                        "budget must be a non-negative number",
                    ));
                    None
                }
            },
        };

        let range = request.date_range.unwrap_or_default();
        let start_date = parse_date_field(range.from.as_deref(), "dateRange.from", &mut problems);
        let end_date = parse_date_field(range.to.as_deref(), "dateRange.to", &mut problems);
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                problems.push(FieldError::new(
                    "dateRange.to",
                    "range",
                    "end date must not be before start date",
                ));
            }
        }

        if !problems.is_empty() {
            return Err(AppError::Validation(problems));
        }

        Ok(Self {
            current_location: request.current_location.unwrap_or_default(),
            destination: request.destination.unwrap_or_default(),
            budget,
            start_date,
            end_date,
            mode: TravelMode::normalize(request.mode_of_travel.as_deref()),
        })
    }

    /// Whole days between the two dates, when both are known.
    pub fn number_of_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((end - start).num_days()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub current_location: String,
    pub destination: String,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mode_of_travel: Option<TravelMode>,
    pub number_of_days: Option<i64>,
    pub trip_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Budgets arrive as text from forms and as numbers from scripts.
fn budget_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Budget {
        Text(String),
        Amount(serde_json::Number),
    }

    Ok(match Option::<Budget>::deserialize(deserializer)? {
        Some(Budget::Text(text)) => non_blank(Some(text)),
        Some(Budget::Amount(amount)) => Some(amount.to_string()),
        None => None,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_date_field(
    raw: Option<&str>,
    field: &str,
    problems: &mut Vec<FieldError>,
) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty())?;
    match parse_date(raw) {
        Some(date) => Some(date),
        None => {
            problems.push(FieldError::new(
                field,
                "date",
                format!("{field} must be a date (YYYY-MM-DD) or an RFC 3339 timestamp"),
            ));
            None
        }
    }
}

/// Accepts a plain calendar date or a full timestamp; timestamps are read
/// as the calendar date in India.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    let ist = FixedOffset::east_opt(IST_OFFSET_SECS)?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&ist).date_naive())
}
