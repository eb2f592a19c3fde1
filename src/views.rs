//! JSON shapes returned by the trip endpoints. Amounts and dates are already
//! rendered for display.

use serde::Serialize;

use crate::{
    format,
    models::trip::{ItineraryDay, Trip, TripStatus, TripWithDays},
};

const NOT_SET: &str = "Not set";
const NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, Serialize)]
pub struct TripSummaryView {
    pub id: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub status: TripStatus,
    pub details: TripSummaryDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripSummaryDetails {
    pub budget: String,
    pub mode: String,
    pub duration: String,
    pub activities: Vec<String>,
}

impl From<&Trip> for TripSummaryView {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            from: trip.from_location.clone(),
            to: trip.to_location.clone(),
            date: date_or_unset(trip),
            status: trip.status,
            details: TripSummaryDetails {
                budget: format::budget_text(trip.budget).unwrap_or_else(|| NOT_SET.into()),
                mode: trip
                    .mode_of_travel
                    .map(|mode| mode.to_string())
                    .unwrap_or_else(|| NOT_SPECIFIED.into()),
                duration: format::duration_text(trip.duration).unwrap_or_else(|| NOT_SET.into()),
                activities: trip.activities.0.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentTripView {
    pub id: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub status: TripStatus,
}

impl From<&Trip> for RecentTripView {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            from: trip.from_location.clone(),
            to: trip.to_location.clone(),
            date: date_or_unset(trip),
            status: trip.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetailView {
    pub id: String,
    pub from: String,
    pub to: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: TripStatus,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub details: TripDetailDetails,
    pub itinerary: Vec<ItineraryDayView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripDetailDetails {
    pub budget: String,
    pub mode: String,
    pub duration: String,
    pub activities: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItineraryDayView {
    pub id: String,
    pub day: i64,
    pub date: String,
    pub activities: Vec<String>,
    pub notes: String,
}

impl From<&ItineraryDay> for ItineraryDayView {
    fn from(day: &ItineraryDay) -> Self {
        Self {
            id: day.id.clone(),
            day: day.day_number,
            date: format::iso_date(day.date),
            activities: day.activities.0.clone(),
            notes: day.notes.clone().unwrap_or_default(),
        }
    }
}

impl From<&TripWithDays> for TripDetailView {
    fn from(value: &TripWithDays) -> Self {
        let trip = &value.trip;
        Self {
            id: trip.id.clone(),
            from: trip.from_location.clone(),
            to: trip.to_location.clone(),
            start_date: trip.start_date.map(format::iso_date),
            end_date: trip.end_date.map(format::iso_date),
            status: trip.status,
            rating: trip.rating,
            review: trip.review.clone(),
            details: TripDetailDetails {
                budget: format::budget_text(trip.budget).unwrap_or_default(),
                mode: trip
                    .mode_of_travel
                    .map(|mode| mode.to_string())
                    .unwrap_or_default(),
                duration: format::duration_text(trip.duration).unwrap_or_default(),
                activities: trip.activities.0.clone(),
                notes: trip.description.clone().unwrap_or_default(),
            },
            itinerary: value.itinerary.iter().map(ItineraryDayView::from).collect(),
        }
    }
}

/// A completed trip as listed in the travel history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripHistoryView {
    pub id: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub completed_at: Option<String>,
}

impl From<&Trip> for TripHistoryView {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            from: trip.from_location.clone(),
            to: trip.to_location.clone(),
            date: date_or_unset(trip),
            rating: trip.rating,
            review: trip.review.clone(),
            completed_at: trip
                .completed_at
                .map(|ts| format::iso_date(ts.date_naive())),
        }
    }
}

fn date_or_unset(trip: &Trip) -> String {
    format::date_span(trip.start_date, trip.end_date).unwrap_or_else(|| "Dates not set".into())
}
