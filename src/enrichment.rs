//! Place search and enrichment
//!
//! Details come from the place gateway. A place whose description is missing or
//! shorter than the configured threshold gets a generated `ai_description`; the
//! upstream description itself is never touched.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::gateway::{GatewayError, PlaceGateway};
use crate::generation::{DEFAULT_MAX_TOKENS, TextGeneration};
use crate::models::PlaceSummary;

/// Candidates beyond this many are never looked up during a search
pub const SEARCH_ENRICHMENT_CAP: usize = 5;

pub struct PlaceEnricher {
    places: Arc<dyn PlaceGateway>,
    text: Arc<TextGeneration>,
    min_description_length: usize,
}

impl PlaceEnricher {
    pub fn new(
        places: Arc<dyn PlaceGateway>,
        text: Arc<TextGeneration>,
        min_description_length: usize,
    ) -> Self {
        Self {
            places,
            text,
            min_description_length,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.places.is_configured()
    }

    /// Prompt used to describe a place whose own description is too thin
    #[must_use]
    pub fn description_prompt(name: &str) -> String {
        format!(
            "Provide a brief, engaging description of {name} as a tourist destination. Include what makes it special, what visitors can expect, and any interesting facts."
        )
    }

    fn needs_description(&self, place: &PlaceSummary) -> bool {
        place.description.is_empty()
            || place.description.chars().count() < self.min_description_length
    }

    /// Place details without enrichment. Any gateway failure reads as "not found".
    pub async fn lookup(&self, id: &str) -> Option<PlaceSummary> {
        match self.places.details(id).await {
            Ok(place) => Some(place),
            Err(e) => {
                warn!("Place details for {} unavailable: {}", id, e);
                None
            }
        }
    }

    /// Place details, with a generated description attached when needed
    #[instrument(skip(self))]
    pub async fn enrich(&self, id: &str) -> Option<PlaceSummary> {
        let mut place = self.lookup(id).await?;

        if self.needs_description(&place) {
            let prompt = Self::description_prompt(&place.name);
            place.ai_description = Some(self.text.generate(&prompt, DEFAULT_MAX_TOKENS).await);
        }

        Some(place)
    }

    /// Search by free text. Only the first [`SEARCH_ENRICHMENT_CAP`] candidates are
    /// enriched, concurrently; candidates whose lookup fails are dropped and the
    /// rest keep candidate order.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<PlaceSummary>, GatewayError> {
        let candidates = self.places.autosuggest(query, limit).await?;

        let lookups = candidates
            .iter()
            .take(SEARCH_ENRICHMENT_CAP)
            .map(|candidate| self.enrich(&candidate.xid));

        let places: Vec<PlaceSummary> = join_all(lookups).await.into_iter().flatten().collect();

        info!(
            "Search '{}' returned {} candidates, {} enriched",
            query,
            candidates.len(),
            places.len()
        );
        Ok(places)
    }
}
