mod common;

use common::{recommendation_json, TestApp};
use cucumber::{given, then, when, World as _};
use itinera::{
    auth::{self, AuthenticatedUser, Signup},
    error::AppError,
    models::{
        search::{SavedSearch, SearchRequest},
        trip::{TravelMode, Trip, TripCompletion, TripStatus, TripWithDays},
    },
    services::{
        planner::{self, SearchOutcome},
        trips,
    },
    state::AppState,
};

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    app: Option<TestApp>,
    registered_user: Option<AuthenticatedUser>,
    last_search: Option<Result<SearchOutcome, AppError>>,
    last_completion: Option<Result<TripWithDays, AppError>>,
}

impl AppWorld {
    fn app(&self) -> &TestApp {
        self.app.as_ref().expect("state must be initialised first")
    }

    fn app_state(&self) -> &AppState {
        &self.app().state
    }

    fn user(&self) -> &AuthenticatedUser {
        self.registered_user
            .as_ref()
            .expect("a user must be registered first")
    }

    async fn trips(&self) -> Vec<Trip> {
        trips::list_trips(&self.app_state().db, &self.user().id)
            .await
            .expect("list trips")
    }

    async fn latest_trip(&self) -> TripWithDays {
        let outcome = self
            .last_search
            .as_ref()
            .expect("a search must have run")
            .as_ref()
            .expect("the search must have succeeded");
        trips::find_trip(&self.app_state().db, &self.user().id, &outcome.trip.id)
            .await
            .expect("find trip")
            .expect("trip exists")
    }

    async fn saved_searches(&self) -> Vec<SavedSearch> {
        planner::list_saved_searches(&self.app_state().db, &self.user().id)
            .await
            .expect("list saved searches")
    }
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.app = Some(TestApp::new().await.expect("state"));
    world.registered_user = None;
    world.last_search = None;
    world.last_completion = None;
}

#[given(
    regex = r#"^a registered user \"([^\"]+)\" with email \"([^\"]+)\" and password \"([^\"]+)\"$"#
)]
async fn given_registered_user(
    world: &mut AppWorld,
    username: String,
    email: String,
    password: String,
) {
    register_user(world, username, email, password).await;
}

#[when(
    regex = r#"^I register a user \"([^\"]+)\" with email \"([^\"]+)\" and password \"([^\"]+)\"$"#
)]
async fn when_register_user(
    world: &mut AppWorld,
    username: String,
    email: String,
    password: String,
) {
    register_user(world, username, email, password).await;
}

#[then(regex = r#"^I can authenticate as \"([^\"]+)\" using password \"([^\"]+)\"$"#)]
async fn then_can_authenticate(world: &mut AppWorld, identifier: String, password: String) {
    let authed = auth::authenticate_user(world.app_state(), &identifier, &password)
        .await
        .expect("authentication");
    assert_eq!(authed.id, world.user().id);
}

#[then(regex = r#"^authenticating as \"([^\"]+)\" with password \"([^\"]+)\" is refused$"#)]
async fn then_authentication_refused(world: &mut AppWorld, identifier: String, password: String) {
    let result = auth::authenticate_user(world.app_state(), &identifier, &password).await;
    assert!(matches!(result, Err(AppError::Unauthorized)), "{result:?}");
}

#[then(regex = r#"^registering \"([^\"]+)\" with email \"([^\"]+)\" again is rejected$"#)]
async fn then_duplicate_rejected(world: &mut AppWorld, username: String, email: String) {
    let signup = Signup {
        name: username.clone(),
        username,
        email,
        password: "another-password".into(),
    };
    let result = auth::register_user(world.app_state(), &signup).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))), "{result:?}");
}

#[then("a session created for the user resolves back to them")]
async fn then_session_resolves(world: &mut AppWorld) {
    let state = world.app_state();
    let session_id = auth::create_session(state, &world.user().id)
        .await
        .expect("session");
    let resolved = auth::resolve_session(state, &session_id)
        .await
        .expect("resolve")
        .expect("live session");
    assert_eq!(resolved.id, world.user().id);

    auth::destroy_session(state, &session_id).await.expect("logout");
    let gone = auth::resolve_session(state, &session_id).await.expect("resolve");
    assert!(gone.is_none());
}

#[given(regex = r#"^the model recommends a (\d+) day trip by \"([^\"]*)\"$"#)]
async fn given_model_recommends(world: &mut AppWorld, days: u32, mode: String) {
    world
        .app()
        .recommender
        .reply_with(recommendation_json(days, &mode));
}

#[given(regex = r#"^the model replies \"([^\"]*)\"$"#)]
async fn given_model_replies(world: &mut AppWorld, text: String) {
    world.app().recommender.reply_with(text);
}

#[given("the model is unavailable")]
async fn given_model_unavailable(world: &mut AppWorld) {
    world.app().recommender.fail();
}

#[when(regex = r#"^I search from \"([^\"]*)\" to \"([^\"]*)\"$"#)]
async fn when_search_plain(world: &mut AppWorld, from: String, to: String) {
    run_search(world, plain_request(&from, &to)).await;
}

#[given(regex = r#"^a trip has been planned from \"([^\"]*)\" to \"([^\"]*)\"$"#)]
async fn given_planned_trip(world: &mut AppWorld, from: String, to: String) {
    run_search(world, plain_request(&from, &to)).await;
    let result = world.last_search.as_ref().expect("a search must have run");
    assert!(result.is_ok(), "{result:?}");
}

#[when(regex = r#"^I search from \"([^\"]*)\" to \"([^\"]*)\" by \"([^\"]*)\"$"#)]
async fn when_search_with_mode(world: &mut AppWorld, from: String, to: String, mode: String) {
    let request = search_request(serde_json::json!({
        "currentLocation": from,
        "destination": to,
        "modeOfTravel": mode,
    }));
    run_search(world, request).await;
}

#[when(
    regex = r#"^I search from \"([^\"]*)\" to \"([^\"]*)\" with budget \"([^\"]*)\" from \"([^\"]*)\" to \"([^\"]*)\" by \"([^\"]*)\"$"#
)]
async fn when_search_full(
    world: &mut AppWorld,
    from: String,
    to: String,
    budget: String,
    start: String,
    end: String,
    mode: String,
) {
    let request = search_request(serde_json::json!({
        "currentLocation": from,
        "destination": to,
        "budget": budget,
        "dateRange": { "from": start, "to": end },
        "modeOfTravel": mode,
    }));
    run_search(world, request).await;
}

#[when(regex = r#"^an unknown user searches from \"([^\"]*)\" to \"([^\"]*)\"$"#)]
async fn when_unknown_user_searches(world: &mut AppWorld, from: String, to: String) {
    let request = search_request(serde_json::json!({
        "currentLocation": from,
        "destination": to,
    }));
    let result = planner::search_trip(world.app_state(), "no-such-user", request).await;
    world.last_search = Some(result);
}

#[then("the search succeeds")]
async fn then_search_succeeds(world: &mut AppWorld) {
    let result = world.last_search.as_ref().expect("a search must have run");
    assert!(result.is_ok(), "{result:?}");
}

#[then("the search fails as an internal error")]
async fn then_search_internal(world: &mut AppWorld) {
    let result = world.last_search.as_ref().expect("a search must have run");
    assert!(
        matches!(result, Err(err) if err.is_internal()),
        "{result:?}"
    );
}

#[then("the search fails with not found")]
async fn then_search_not_found(world: &mut AppWorld) {
    let result = world.last_search.as_ref().expect("a search must have run");
    assert!(matches!(result, Err(AppError::NotFound(_))), "{result:?}");
}

#[then(regex = r#"^the search is rejected for \"([^\"]+)\"$"#)]
async fn then_search_rejected(world: &mut AppWorld, field: String) {
    let result = world.last_search.as_ref().expect("a search must have run");
    let Err(AppError::Validation(details)) = result else {
        panic!("expected a validation error, got {result:?}");
    };
    assert!(
        details.iter().any(|detail| detail.field == field),
        "{details:?}"
    );
}

#[then(regex = r"^the stored trip budget is (\d+)$")]
async fn then_trip_budget(world: &mut AppWorld, expected: u64) {
    let trip = world.latest_trip().await;
    assert_eq!(trip.trip.budget, Some(expected as f64));
}

#[then(regex = r#"^the stored trip mode is \"([^\"]+)\"$"#)]
async fn then_trip_mode(world: &mut AppWorld, expected: String) {
    let trip = world.latest_trip().await;
    let expected: TravelMode = expected.parse().expect("known travel mode");
    assert_eq!(trip.trip.mode_of_travel, Some(expected));
}

#[then("the stored trip has no travel mode")]
async fn then_trip_no_mode(world: &mut AppWorld) {
    let trip = world.latest_trip().await;
    assert_eq!(trip.trip.mode_of_travel, None);
}

#[then(regex = r"^the stored itinerary days are ([\d, ]+)$")]
async fn then_itinerary_days(world: &mut AppWorld, expected: String) {
    let expected: Vec<i64> = expected
        .split(',')
        .map(|part| part.trim().parse().expect("day number"))
        .collect();
    let trip = world.latest_trip().await;
    let days: Vec<i64> = trip.itinerary.iter().map(|day| day.day_number).collect();
    assert_eq!(days, expected);
    assert_eq!(trip.trip.duration, Some(expected.len() as i64));
}

#[then(regex = r#"^the first itinerary day is dated \"([^\"]+)\"$"#)]
async fn then_first_day_date(world: &mut AppWorld, expected: String) {
    let trip = world.latest_trip().await;
    let first = trip.itinerary.first().expect("at least one day");
    assert_eq!(first.date.to_string(), expected);
    assert_eq!(first.notes.as_deref(), Some("Notes for day 1"));
}

#[then(regex = r"^the user has (\d+) trips?$")]
async fn then_user_trip_count(world: &mut AppWorld, expected: usize) {
    assert_eq!(world.trips().await.len(), expected);
}

#[then(regex = r"^the user has (\d+) saved searche?s?$")]
async fn then_saved_search_count(world: &mut AppWorld, expected: usize) {
    assert_eq!(world.saved_searches().await.len(), expected);
}

#[then("every saved search links to its own trip")]
async fn then_searches_linked(world: &mut AppWorld) {
    let searches = world.saved_searches().await;
    let trips = world.trips().await;
    let mut linked: Vec<String> = searches
        .iter()
        .map(|search| search.trip_id.clone().expect("linked trip"))
        .collect();
    linked.sort();
    linked.dedup();
    assert_eq!(linked.len(), searches.len());
    for trip_id in linked {
        assert!(trips.iter().any(|trip| trip.id == trip_id));
    }
}

#[then("the saved search has no budget")]
async fn then_saved_search_no_budget(world: &mut AppWorld) {
    let searches = world.saved_searches().await;
    let latest = searches.first().expect("a saved search");
    assert_eq!(latest.budget, None);
    assert_eq!(latest.number_of_days, None);
}

#[then("the prompt says the budget is not specified")]
async fn then_prompt_budget_unspecified(world: &mut AppWorld) {
    let prompts = world.app().recommender.prompts();
    let last = prompts.last().expect("a prompt was sent");
    assert!(last.contains("Budget: Not specified"), "{last}");
}

#[when(regex = r#"^I complete the trip with rating (\d+) and review \"([^\"]*)\"$"#)]
async fn when_complete_trip(world: &mut AppWorld, rating: u8, review: String) {
    let trip = world.latest_trip().await;
    let completion = TripCompletion {
        rating,
        review: Some(review),
        user_id: None,
    };
    let result = trips::complete_trip(
        &world.app_state().db,
        &world.user().id,
        &trip.trip.id,
        completion,
    )
    .await;
    world.last_completion = Some(result);
}

#[then(regex = r"^the trip is completed with rating (\d+)$")]
async fn then_trip_completed(world: &mut AppWorld, rating: i64) {
    let trip = world.latest_trip().await;
    assert_eq!(trip.trip.status, TripStatus::Completed);
    assert_eq!(trip.trip.rating, Some(rating));
    assert!(trip.trip.completed_at.is_some());

    let history = trips::completed_trips(&world.app_state().db, &world.user().id)
        .await
        .expect("history");
    assert!(history.iter().any(|entry| entry.id == trip.trip.id));
}

#[then("the completion is rejected as a conflict")]
async fn then_completion_conflict(world: &mut AppWorld) {
    let result = world.last_completion.as_ref().expect("a completion ran");
    assert!(matches!(result, Err(AppError::Conflict(_))), "{result:?}");
}

#[then("the completion is rejected as invalid")]
async fn then_completion_invalid(world: &mut AppWorld) {
    let result = world.last_completion.as_ref().expect("a completion ran");
    assert!(matches!(result, Err(AppError::Validation(_))), "{result:?}");
}

#[then("looking up a missing trip finds nothing")]
async fn then_missing_trip(world: &mut AppWorld) {
    let found = trips::find_trip(&world.app_state().db, &world.user().id, "missing-trip")
        .await
        .expect("query");
    assert!(found.is_none());
}

fn plain_request(from: &str, to: &str) -> SearchRequest {
    search_request(serde_json::json!({
        "currentLocation": from,
        "destination": to,
        "budget": "",
    }))
}

fn search_request(value: serde_json::Value) -> SearchRequest {
    serde_json::from_value(value).expect("search request json")
}

async fn run_search(world: &mut AppWorld, request: SearchRequest) {
    let user_id = world.user().id.clone();
    let result = planner::search_trip(world.app_state(), &user_id, request).await;
    world.last_search = Some(result);
}

async fn register_user(world: &mut AppWorld, username: String, email: String, password: String) {
    let signup = Signup {
        name: username.clone(),
        username,
        email,
        password,
    };
    let created = auth::register_user(world.app_state(), &signup)
        .await
        .expect("register user");
    world.registered_user = Some(created);
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
