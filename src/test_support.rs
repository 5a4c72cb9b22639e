//! In-process gateway stubs for unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::gateway::{GatewayError, PlaceCandidate, PlaceGateway, TextGenerator, WeatherGateway};
use crate::models::{Coordinates, GeoPoint, NearbyAttraction, PlaceSummary, WeatherSnapshot};

/// Text generator returning a fixed outcome and recording prompts
pub(crate) struct StubText {
    outcome: Result<String, GatewayError>,
    pub prompts: Mutex<Vec<(String, usize)>>,
}

impl StubText {
    pub(crate) fn replying(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(err: GatewayError) -> Self {
        Self {
            outcome: Err(err),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn unconfigured() -> Self {
        Self::failing(GatewayError::NotConfigured {
            service: "Text generation",
        })
    }
}

#[async_trait]
impl TextGenerator for StubText {
    fn is_configured(&self) -> bool {
        !matches!(self.outcome, Err(GatewayError::NotConfigured { .. }))
    }

    async fn complete(&self, prompt: &str, max_chars: usize) -> Result<String, GatewayError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_chars));
        self.outcome.clone()
    }
}

/// Place gateway backed by fixed tables
#[derive(Default)]
pub(crate) struct StubPlaces {
    pub suggest: Option<Result<Vec<PlaceCandidate>, GatewayError>>,
    pub details: HashMap<String, PlaceSummary>,
    pub nearby: Option<Result<Vec<NearbyAttraction>, GatewayError>>,
    pub nearby_calls: Mutex<Vec<(GeoPoint, u32, u32)>>,
    pub detail_calls: Mutex<Vec<String>>,
}

impl StubPlaces {
    /// Place with a known location and the given description
    pub(crate) fn place(id: &str, name: &str, lat: f64, lon: f64, description: &str) -> PlaceSummary {
        let mut place = PlaceSummary::new(id, name);
        place.coordinates = Coordinates::new(lat, lon);
        place.description = description.to_string();
        place
    }

    pub(crate) fn attraction(name: &str, distance: f64) -> NearbyAttraction {
        NearbyAttraction {
            name: name.to_string(),
            distance,
            kinds: vec!["historic".to_string()],
            coordinates: vec![2.29, 48.86],
        }
    }

    /// Autosuggest returns every place in `places`, in order
    pub(crate) fn with_places(places: Vec<PlaceSummary>) -> Self {
        let suggest = places
            .iter()
            .map(|p| PlaceCandidate {
                xid: p.id.clone(),
                name: p.name.clone(),
            })
            .collect();
        Self {
            suggest: Some(Ok(suggest)),
            details: places.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn with_nearby(mut self, nearby: Result<Vec<NearbyAttraction>, GatewayError>) -> Self {
        self.nearby = Some(nearby);
        self
    }
}

#[async_trait]
impl PlaceGateway for StubPlaces {
    fn is_configured(&self) -> bool {
        true
    }

    async fn autosuggest(&self, _query: &str, limit: u32) -> Result<Vec<PlaceCandidate>, GatewayError> {
        match &self.suggest {
            Some(Ok(candidates)) => Ok(candidates.iter().take(limit as usize).cloned().collect()),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn details(&self, xid: &str) -> Result<PlaceSummary, GatewayError> {
        self.detail_calls.lock().unwrap().push(xid.to_string());
        self.details.get(xid).cloned().ok_or(GatewayError::Status {
            service: "OpenTripMap",
            status: 404,
        })
    }

    async fn nearby(
        &self,
        point: GeoPoint,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<NearbyAttraction>, GatewayError> {
        self.nearby_calls
            .lock()
            .unwrap()
            .push((point, radius_m, limit));
        self.nearby.clone().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Weather gateway with a single fixed outcome
pub(crate) struct StubWeather {
    outcome: Result<WeatherSnapshot, GatewayError>,
    pub calls: Mutex<Vec<GeoPoint>>,
}

impl StubWeather {
    pub(crate) fn reporting(temperature: f64, description: &str, humidity: f64, wind_speed: f64) -> Self {
        Self::with_outcome(Ok(WeatherSnapshot {
            temperature,
            description: description.to_string(),
            humidity,
            wind_speed,
        }))
    }

    pub(crate) fn with_outcome(outcome: Result<WeatherSnapshot, GatewayError>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WeatherGateway for StubWeather {
    fn is_configured(&self) -> bool {
        !matches!(self.outcome, Err(GatewayError::NotConfigured { .. }))
    }

    async fn current(&self, point: GeoPoint) -> Result<WeatherSnapshot, GatewayError> {
        self.calls.lock().unwrap().push(point);
        self.outcome.clone()
    }
}
