//! Itinerary composition
//!
//! Search the destination, take the first hit as the main attraction, gather nearby
//! attractions and weather around it, then ask for a day-by-day plan. The result is a
//! fully denormalized [`Itinerary`]; persisting it is the caller's business.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::enrichment::PlaceEnricher;
use crate::gateway::GatewayError;
use crate::generation::TextGeneration;
use crate::models::{Itinerary, ItineraryRequest, NearbyAttraction};
use crate::nearby::NearbyFinder;
use crate::weather::WeatherReporter;

/// Character budget for the generated plan
pub const ITINERARY_MAX_TOKENS: usize = 800;

/// Candidates requested when resolving the destination
pub const SEARCH_LIMIT: u32 = 5;

/// Nearby attraction names quoted in the plan prompt
pub const PROMPT_NEARBY_NAMES: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComposeError {
    #[error(transparent)]
    Upstream(#[from] GatewayError),

    #[error("No destinations found")]
    NoDestinations,

    #[error("Duration must be at least 1 day")]
    InvalidDuration,
}

/// `budget / days` rounded down; `None` for zero days
#[must_use]
pub fn daily_budget(budget: u64, days: u32) -> Option<u64> {
    budget.checked_div(u64::from(days))
}

/// Prompt asking for a day-by-day plan
#[must_use]
pub fn itinerary_prompt(
    request: &ItineraryRequest,
    daily_budget: u64,
    main_attraction: &str,
    nearby: &[NearbyAttraction],
) -> String {
    let nearby_names: Vec<&str> = nearby
        .iter()
        .take(PROMPT_NEARBY_NAMES)
        .map(|a| a.name.as_str())
        .collect();

    format!(
        "Create a {days}-day travel itinerary for {destination} with the following details:
- Budget: ${budget} (${daily_budget} per day)
- Travel style: {style}
- Preferences: {preferences}
- Main attraction: {main_attraction}
- Nearby attractions: [{nearby}]

Provide a day-by-day plan with:
1. Morning activities
2. Afternoon activities
3. Evening activities
4. Recommended accommodation type
5. Transportation suggestions
6. Estimated daily costs
7. Travel tips and cultural notes",
        days = request.duration_days,
        destination = request.destination,
        budget = request.budget,
        style = request.travel_style,
        preferences = request.preferences.join(", "),
        nearby = nearby_names.join(", "),
    )
}

pub struct ItineraryComposer {
    places: Arc<PlaceEnricher>,
    nearby: Arc<NearbyFinder>,
    weather: Arc<WeatherReporter>,
    text: Arc<TextGeneration>,
}

impl ItineraryComposer {
    pub fn new(
        places: Arc<PlaceEnricher>,
        nearby: Arc<NearbyFinder>,
        weather: Arc<WeatherReporter>,
        text: Arc<TextGeneration>,
    ) -> Self {
        Self {
            places,
            nearby,
            weather,
            text,
        }
    }

    /// Build one itinerary. Fails only on an invalid duration, a search error or an
    /// empty search; nearby and weather problems degrade inside the document.
    #[instrument(skip(self, request), fields(destination = %request.destination, days = request.duration_days))]
    pub async fn compose(&self, request: &ItineraryRequest) -> Result<Itinerary, ComposeError> {
        let daily_budget =
            daily_budget(request.budget, request.duration_days).ok_or(ComposeError::InvalidDuration)?;

        let main_attraction = self
            .places
            .search(&request.destination, SEARCH_LIMIT)
            .await?
            .into_iter()
            .next()
            .ok_or(ComposeError::NoDestinations)?;

        let coordinates = main_attraction.coordinates;
        let (nearby, weather_info) = tokio::join!(
            self.nearby.find(&coordinates),
            self.weather.report(&coordinates)
        );

        let nearby_attractions = nearby.unwrap_or_else(|e| {
            warn!("Nearby attractions unavailable for {}: {}", main_attraction.name, e);
            Vec::new()
        });

        let prompt = itinerary_prompt(request, daily_budget, &main_attraction.name, &nearby_attractions);
        let ai_generated_plan = self.text.generate(&prompt, ITINERARY_MAX_TOKENS).await;

        info!(
            "Composed itinerary for {} around {} with {} nearby attractions",
            request.destination,
            main_attraction.name,
            nearby_attractions.len()
        );

        Ok(Itinerary {
            destination: request.destination.clone(),
            main_attraction,
            duration: request.duration_days,
            budget: request.budget,
            daily_budget,
            travel_style: request.travel_style.clone(),
            preferences: request.preferences.clone(),
            nearby_attractions,
            ai_generated_plan,
            created_at: Utc::now(),
            weather_info,
        })
    }
}
