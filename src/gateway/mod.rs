//! Upstream gateways
//!
//! One adapter per external API:
//! - OpenTripMap: place autosuggest, place details and radius search
//! - OpenWeatherMap: current conditions
//! - Hugging Face inference: free-text generation
//!
//! Every call yields `Result<T, GatewayError>`; transport failures, timeouts and
//! unexpected payloads never escape in any other form.

pub mod huggingface;
pub mod opentripmap;
pub mod openweather;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::PlannerConfig;
use crate::models::{GeoPoint, NearbyAttraction, PlaceSummary, WeatherSnapshot};

pub use huggingface::HuggingFaceClient;
pub use opentripmap::OpenTripMapClient;
pub use openweather::OpenWeatherClient;

const USER_AGENT: &str = concat!("itinerary-planner/", env!("CARGO_PKG_VERSION"));

/// Failure of a single upstream call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("{service} API key not configured")]
    NotConfigured { service: &'static str },

    #[error("{service} request failed with status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned an unexpected payload: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned no usable text")]
    EmptyCompletion { service: &'static str },

    #[error("Coordinates unavailable")]
    MissingCoordinates,
}

impl GatewayError {
    /// Keys travel in query strings, so the request URL never reaches the message
    pub(crate) fn transport(service: &'static str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.without_url().to_string()
        };
        GatewayError::Transport { service, message }
    }
}

/// Candidate returned by a place autosuggest call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceCandidate {
    pub xid: String,
    pub name: String,
}

#[async_trait]
pub trait PlaceGateway: Send + Sync {
    /// Whether an API key is available
    fn is_configured(&self) -> bool;

    /// Candidate places matching `query`, at most `limit`
    async fn autosuggest(&self, query: &str, limit: u32) -> Result<Vec<PlaceCandidate>, GatewayError>;

    /// Full record for one place
    async fn details(&self, xid: &str) -> Result<PlaceSummary, GatewayError>;

    /// Attractions within `radius_m` of `point`, in provider order
    async fn nearby(
        &self,
        point: GeoPoint,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<NearbyAttraction>, GatewayError>;
}

#[async_trait]
pub trait WeatherGateway: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Current conditions in metric units
    async fn current(&self, point: GeoPoint) -> Result<WeatherSnapshot, GatewayError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Raw completion for `prompt`, at most `max_chars` characters.
    /// Callers that must not fail go through [`crate::generation::TextGeneration`].
    async fn complete(&self, prompt: &str, max_chars: usize) -> Result<String, GatewayError>;
}

/// The three upstream adapters, built once at startup and shared
#[derive(Clone)]
pub struct Gateways {
    pub places: Arc<dyn PlaceGateway>,
    pub weather: Arc<dyn WeatherGateway>,
    pub text: Arc<dyn TextGenerator>,
}

impl Gateways {
    /// Build the HTTP-backed gateways from configuration
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        Ok(Self {
            places: Arc::new(OpenTripMapClient::new(&config.places)?),
            weather: Arc::new(OpenWeatherClient::new(&config.weather)?),
            text: Arc::new(HuggingFaceClient::new(&config.text_generation)?),
        })
    }
}

/// HTTP client shared by one gateway
pub(crate) fn http_client(timeout_seconds: u32) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(USER_AGENT)
        .build()
        .with_context(|| "Failed to create HTTP client")
}

/// Check the status and decode a JSON body
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status {
            service,
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| GatewayError::transport(service, e))?;

    serde_json::from_slice(&body).map_err(|e| GatewayError::Decode {
        service,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GatewayError::NotConfigured {
                service: "OpenTripMap"
            }
            .to_string(),
            "OpenTripMap API key not configured"
        );
        assert_eq!(
            GatewayError::Status {
                service: "Weather",
                status: 401
            }
            .to_string(),
            "Weather request failed with status 401"
        );
        assert_eq!(GatewayError::MissingCoordinates.to_string(), "Coordinates unavailable");
    }

    #[test]
    fn test_gateways_from_default_config() {
        let gateways = Gateways::from_config(&PlannerConfig::default()).unwrap();
        assert!(!gateways.places.is_configured());
        assert!(!gateways.weather.is_configured());
        assert!(!gateways.text.is_configured());
    }
}
