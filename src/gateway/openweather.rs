use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{GatewayError, WeatherGateway, http_client, read_json};
use crate::config::WeatherConfig;
use crate::models::{GeoPoint, WeatherSnapshot};

const SERVICE: &str = "Weather";

/// OpenWeatherMap current-conditions client
pub struct OpenWeatherClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: MainBlock,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_seconds)?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self))]
    async fn current(&self, point: GeoPoint) -> Result<WeatherSnapshot, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured { service: SERVICE })?;

        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("units", "metric".to_string()),
            ])
            .query(&[("appid", api_key)])
            .send()
            .await
            .map_err(|e| GatewayError::transport(SERVICE, e))?;

        let body: CurrentWeatherResponse = read_json(SERVICE, response).await?;
        let condition = body
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Decode {
                service: SERVICE,
                message: "missing weather conditions".to_string(),
            })?;

        debug!("Current weather: {}°C, {}", body.main.temp, condition.description);

        Ok(WeatherSnapshot {
            temperature: body.main.temp,
            description: condition.description,
            humidity: body.main.humidity,
            wind_speed: body.wind.speed,
        })
    }
}
