//! HTTP handlers under `/api`
//!
//! Every failure leaves as `{"error": "..."}`. Place search, nearby and weather
//! report upstream problems in a 200 body, as web clients already expect.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use crate::composer::ItineraryComposer;
use crate::enrichment::PlaceEnricher;
use crate::error::PlannerError;
use crate::gateway::Gateways;
use crate::generation::TextGeneration;
use crate::models::{
    DEFAULT_PREFERENCES, DEFAULT_TRAVEL_STYLE, DEFAULT_USER_ID, ErrorDescriptor, GeoPoint,
    ItineraryRequest, NewUser,
};
use crate::nearby::{self, NearbyFinder};
use crate::storage::DocumentStore;
use crate::weather::WeatherReporter;

/// Candidates requested by the search endpoint when `limit` is absent
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Shared handler state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<ItineraryComposer>,
    pub places: Arc<PlaceEnricher>,
    pub nearby: Arc<NearbyFinder>,
    pub weather: Arc<WeatherReporter>,
    pub text: Arc<TextGeneration>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    /// Wire the pipeline from its gateways and a store
    pub fn new(gateways: Gateways, store: Arc<dyn DocumentStore>, min_description_length: usize) -> Self {
        let text = Arc::new(TextGeneration::new(gateways.text));
        let places = Arc::new(PlaceEnricher::new(
            gateways.places.clone(),
            text.clone(),
            min_description_length,
        ));
        let nearby = Arc::new(NearbyFinder::new(gateways.places));
        let weather = Arc::new(WeatherReporter::new(gateways.weather));
        let composer = Arc::new(ItineraryComposer::new(
            places.clone(),
            nearby.clone(),
            weather.clone(),
            text.clone(),
        ));

        Self {
            composer,
            places,
            nearby,
            weather,
            text,
            store,
        }
    }
}

impl IntoResponse for PlannerError {
    fn into_response(self) -> Response {
        let status = match &self {
            PlannerError::Validation { .. } => StatusCode::BAD_REQUEST,
            PlannerError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlannerError::Conflict { .. } => StatusCode::CONFLICT,
            PlannerError::Config { .. } | PlannerError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(ErrorDescriptor::new(self.message()))).into_response()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/destinations/search", get(search_destinations))
        .route("/destinations/{id}/details", get(destination_details))
        .route("/destinations/{id}/nearby", get(nearby_attractions))
        .route("/itinerary/generate", post(generate_itinerary))
        .route("/itineraries", get(list_itineraries))
        .route("/itineraries/{id}", get(get_itinerary))
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/weather/{lat}/{lon}", get(weather_at))
}

/// JSON 404 for unknown routes
pub async fn not_found() -> PlannerError {
    PlannerError::not_found("Endpoint not found")
}

fn configured(flag: bool) -> &'static str {
    if flag { "configured" } else { "not_configured" }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let storage = if state.store.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "services": {
            "storage": storage,
            "opentripmap": configured(state.places.is_configured()),
            "huggingface": configured(state.text.is_configured()),
            "weather": configured(state.weather.is_configured()),
        }
    }))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyParams {
    radius: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    user_id: Option<String>,
}

/// Integer query parameter; unparsable values fall back to the default
fn int_param(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}

async fn search_destinations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, PlannerError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(PlannerError::validation("Query parameter \"q\" is required"));
    }
    let limit = int_param(params.limit.as_deref(), DEFAULT_SEARCH_LIMIT);

    Ok(match state.places.search(query, limit).await {
        Ok(places) => Json(places).into_response(),
        Err(e) => {
            warn!("Destination search for '{}' failed: {}", query, e);
            Json(ErrorDescriptor::new(e.to_string())).into_response()
        }
    })
}

async fn destination_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, PlannerError> {
    let place = state
        .places
        .enrich(&id)
        .await
        .ok_or_else(|| PlannerError::not_found("Destination not found"))?;
    Ok(Json(place).into_response())
}

async fn nearby_attractions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<NearbyParams>,
) -> Result<Response, PlannerError> {
    let destination = state
        .places
        .lookup(&id)
        .await
        .ok_or_else(|| PlannerError::not_found("Destination not found"))?;

    let radius = int_param(params.radius.as_deref(), nearby::DEFAULT_RADIUS_M);
    let limit = int_param(params.limit.as_deref(), nearby::DEFAULT_LIMIT);

    Ok(
        match state
            .nearby
            .find_within(&destination.coordinates, radius, limit)
            .await
        {
            Ok(attractions) => Json(attractions).into_response(),
            Err(e) => Json(ErrorDescriptor::new(e.to_string())).into_response(),
        },
    )
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, PlannerError> {
    let Json(value) = payload.map_err(|rejection| PlannerError::validation(rejection.body_text()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PlannerError::validation("Request body must be a JSON object")),
    }
}

fn required<'a>(body: &'a Map<String, Value>, field: &str) -> Result<&'a Value, PlannerError> {
    match body.get(field) {
        Some(Value::Null) | None => Err(PlannerError::validation(format!(
            "Missing required field: {field}"
        ))),
        Some(value) => Ok(value),
    }
}

fn required_string(body: &Map<String, Value>, field: &str) -> Result<String, PlannerError> {
    match required(body, field)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(PlannerError::validation(format!(
            "Invalid value for {field}: expected a non-empty string"
        ))),
    }
}

fn optional_string(body: &Map<String, Value>, field: &str, default: &str) -> Result<String, PlannerError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(PlannerError::validation(format!(
            "Invalid value for {field}: expected a string"
        ))),
    }
}

/// Numbers, fractional numbers (truncated) and numeric strings are accepted
fn non_negative_integer(value: &Value, field: &str) -> Result<u64, PlannerError> {
    let invalid = || PlannerError::validation(format!("Invalid value for {field}: expected a non-negative number"));

    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(invalid)?;

    if !number.is_finite() || number < 0.0 || number >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(number.trunc() as u64)
}

fn preferences(body: &Map<String, Value>) -> Result<Vec<String>, PlannerError> {
    match body.get("preferences") {
        None | Some(Value::Null) => Ok(DEFAULT_PREFERENCES.iter().map(|p| (*p).to_string()).collect()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    PlannerError::validation("Invalid value for preferences: expected a list of strings")
                })
            })
            .collect(),
        Some(_) => Err(PlannerError::validation(
            "Invalid value for preferences: expected a list of strings",
        )),
    }
}

fn itinerary_request(body: &Map<String, Value>) -> Result<ItineraryRequest, PlannerError> {
    // presence is checked for all fields before any value
    for field in ["destination", "duration", "budget"] {
        required(body, field)?;
    }

    let destination = required_string(body, "destination")?;
    let duration = non_negative_integer(required(body, "duration")?, "duration")?;
    let duration = u32::try_from(duration)
        .map_err(|_| PlannerError::validation("Invalid value for duration: too large"))?;
    let budget = non_negative_integer(required(body, "budget")?, "budget")?;
    // stored as a signed 64-bit integer
    if i64::try_from(budget).is_err() {
        return Err(PlannerError::validation("Invalid value for budget: too large"));
    }

    Ok(ItineraryRequest::new(destination, duration, budget)
        .with_preferences(preferences(body)?)
        .with_travel_style(optional_string(body, "travel_style", DEFAULT_TRAVEL_STYLE)?))
}

async fn generate_itinerary(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, PlannerError> {
    let body = json_body(payload)?;
    let request = itinerary_request(&body)?;
    let user_id = optional_string(&body, "user_id", DEFAULT_USER_ID)?;

    let itinerary = state.composer.compose(&request).await?;
    let record = state.store.insert_itinerary(&user_id, itinerary).await?;

    info!(
        "Generated itinerary {} for user {}",
        record.id.as_deref().unwrap_or_default(),
        record.user_id
    );

    Ok(Json(json!({
        "success": true,
        "itinerary": record,
        "message": "Itinerary generated successfully",
    })))
}

async fn list_itineraries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, PlannerError> {
    let user_id = params.user_id.as_deref().unwrap_or(DEFAULT_USER_ID);
    let itineraries = state.store.itineraries_for_user(user_id).await?;

    Ok(Json(json!({
        "success": true,
        "itineraries": itineraries,
    })))
}

async fn get_itinerary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, PlannerError> {
    let itinerary = state
        .store
        .find_itinerary(&id)
        .await?
        .ok_or_else(|| PlannerError::not_found("Itinerary not found"))?;

    Ok(Json(json!({
        "success": true,
        "itinerary": itinerary,
    })))
}

async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, PlannerError> {
    let body = json_body(payload)?;
    for field in ["username", "email"] {
        required(&body, field)?;
    }

    let preferences = match body.get("preferences") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(PlannerError::validation(
                "Invalid value for preferences: expected an object",
            ));
        }
    };

    let user = NewUser {
        username: required_string(&body, "username")?,
        email: required_string(&body, "email")?,
        preferences,
    };

    let record = state.store.create_user(user).await?;
    info!("Created user {}", record.username);

    Ok(Json(json!({
        "success": true,
        "user": record,
        "message": "User created successfully",
    })))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, PlannerError> {
    let user = state
        .store
        .find_user(&id)
        .await?
        .ok_or_else(|| PlannerError::not_found("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "user": user,
    })))
}

async fn weather_at(
    State(state): State<AppState>,
    Path((lat, lon)): Path<(String, String)>,
) -> Result<Response, PlannerError> {
    let parse = |raw: &str| raw.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    let (Some(lat), Some(lon)) = (parse(&lat), parse(&lon)) else {
        return Err(PlannerError::validation("Invalid coordinates"));
    };

    let info = state.weather.report_at(GeoPoint::new(lat, lon)).await;
    Ok(Json(info).into_response())
}
