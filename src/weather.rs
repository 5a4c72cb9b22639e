//! Weather lookup for itineraries and the weather endpoint

use std::sync::Arc;

use tracing::warn;

use crate::gateway::{GatewayError, WeatherGateway};
use crate::models::{Coordinates, GeoPoint, WeatherInfo};

/// Message recorded when the provider call itself fails
pub const WEATHER_UNAVAILABLE: &str = "Weather information unavailable";

pub struct WeatherReporter {
    gateway: Arc<dyn WeatherGateway>,
}

impl WeatherReporter {
    pub fn new(gateway: Arc<dyn WeatherGateway>) -> Self {
        Self { gateway }
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_configured()
    }

    /// Weather at `coordinates`, or an `{error}` marker. Never partially populated.
    pub async fn report(&self, coordinates: &Coordinates) -> WeatherInfo {
        match coordinates.point() {
            Some(point) => self.report_at(point).await,
            None => unavailable(&GatewayError::MissingCoordinates),
        }
    }

    pub async fn report_at(&self, point: GeoPoint) -> WeatherInfo {
        match self.gateway.current(point).await {
            Ok(snapshot) => WeatherInfo::Available(snapshot),
            Err(e) => unavailable(&e),
        }
    }
}

fn unavailable(err: &GatewayError) -> WeatherInfo {
    let error = match err {
        GatewayError::NotConfigured { .. } | GatewayError::MissingCoordinates => err.to_string(),
        other => {
            warn!("Weather lookup failed: {}", other);
            WEATHER_UNAVAILABLE.to_string()
        }
    };
    WeatherInfo::Unavailable { error }
}
