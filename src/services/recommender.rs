use async_trait::async_trait;

use crate::{error::AppError, format, models::search::SearchQuery};

const NOT_SPECIFIED: &str = "Not specified";

/// Something that turns a trip prompt into model text.
#[async_trait]
pub trait TripRecommender: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

const PROMPT_TEMPLATE: &str = r#"You are a travel expert specializing in Indian destinations.
Given the following travel details, provide a detailed trip recommendation:

Current Location: {current_location}
Destination: {destination}
Budget: {budget}
Travel Dates: {date_range}
Mode of Travel: {mode_of_travel}

Please provide a response in the following JSON format:
{
    "tripRecommendation": {
        "duration": number, // in days
        "budgetBreakdown": {
            "accommodation": number,
            "transportation": number,
            "activities": number,
            "food": number,
            "miscellaneous": number
        },
        "modeOfTravel": string, // one of FLIGHT, TRAIN, BUS, CAR, BIKE, WALK
        "activities": string[],
        "itinerary": [
            {
                "day": number,
                "activities": string[],
                "notes": string
            }
        ],
        "tips": string[]
    }
}

Focus on practical, realistic recommendations that consider:
1. Local culture and customs
2. Weather conditions
3. Transportation options
4. Popular attractions
5. Budget constraints
6. Safety considerations

All amounts are in Indian rupees. Number itinerary days from 1.
IMPORTANT: Respond ONLY with the JSON object, no additional text."#;

pub fn build_prompt(query: &SearchQuery) -> String {
    let budget = query
        .budget
        .map(format::format_inr)
        .unwrap_or_else(|| NOT_SPECIFIED.into());
    let date_range = if query.start_date.is_none() && query.end_date.is_none() {
        NOT_SPECIFIED.to_string()
    } else {
        let side = |date: Option<chrono::NaiveDate>| {
            date.map(format::display_date)
                .unwrap_or_else(|| NOT_SPECIFIED.into())
        };
        format!("{} to {}", side(query.start_date), side(query.end_date))
    };
    let mode = query
        .mode
        .map(|mode| mode.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.into());

    PROMPT_TEMPLATE
        .replace("{current_location}", &query.current_location)
        .replace("{destination}", &query.destination)
        .replace("{budget}", &budget)
        .replace("{date_range}", &date_range)
        .replace("{mode_of_travel}", &mode)
}
