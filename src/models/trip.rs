use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    Flight,
    Train,
    Bus,
    Car,
    Bike,
    Walk,
}

impl TravelMode {
    pub const ALL: [TravelMode; 6] = [
        TravelMode::Flight,
        TravelMode::Train,
        TravelMode::Bus,
        TravelMode::Car,
        TravelMode::Bike,
        TravelMode::Walk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Flight => "FLIGHT",
            TravelMode::Train => "TRAIN",
            TravelMode::Bus => "BUS",
            TravelMode::Car => "CAR",
            TravelMode::Bike => "BIKE",
            TravelMode::Walk => "WALK",
        }
    }

    /// Case-insensitive lookup. Anything outside the enumeration means
    /// "unspecified" and yields `None` instead of an error.
    pub fn normalize(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| value.parse().ok())
    }
}

impl FromStr for TravelMode {
    type Err = UnknownTravelMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_uppercase();
        TravelMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == upper)
            .ok_or(UnknownTravelMode)
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownTravelMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    #[default]
    Planning,
    Upcoming,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, FromRow)]
pub struct Trip {
    pub id: String,
    pub user_id: String,
    pub from_location: String,
    pub to_location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub mode_of_travel: Option<TravelMode>,
    pub duration: Option<i64>,
    pub activities: Json<Vec<String>>,
    pub description: Option<String>,
    pub status: TripStatus,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ItineraryDay {
    pub id: String,
    pub trip_id: String,
    pub day_number: i64,
    pub date: NaiveDate,
    pub activities: Json<Vec<String>>,
    pub notes: Option<String>,
}

/// A trip with its itinerary in day order.
#[derive(Debug, Clone)]
pub struct TripWithDays {
    pub trip: Trip,
    pub itinerary: Vec<ItineraryDay>,
}

/// Rating and review given when a trip is marked complete.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TripCompletion {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 2000, message = "review must be at most 2000 characters"))]
    pub review: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}
