use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{GatewayError, PlaceCandidate, PlaceGateway, http_client, read_json};
use crate::config::PlacesConfig;
use crate::models::{Address, Coordinates, GeoPoint, NearbyAttraction, PlaceSummary};

const SERVICE: &str = "OpenTripMap";

/// Categories requested from the radius endpoint
pub const NEARBY_KINDS: &str = "cultural,historic,architecture,interesting_places";

/// OpenTripMap places API client
pub struct OpenTripMapClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SuggestItem {
    #[serde(default)]
    xid: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Address,
    #[serde(default)]
    point: Option<RawPoint>,
    #[serde(default)]
    kinds: String,
    #[serde(default)]
    wikipedia: String,
    #[serde(default)]
    preview: Option<Preview>,
    #[serde(default)]
    wikipedia_extracts: Option<Extracts>,
    /// Integer on some endpoints, strings like "3h" on others
    #[serde(default)]
    rate: Value,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Preview {
    #[serde(default)]
    source: String,
}

#[derive(Debug, Deserialize)]
struct Extracts {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: FeatureProperties,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    dist: Option<f64>,
    #[serde(default)]
    kinds: String,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

impl OpenTripMapClient {
    /// Create a new client
    pub fn new(config: &PlacesConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_seconds)?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_key(&self) -> Result<&str, GatewayError> {
        self.api_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured { service: SERVICE })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("apikey", api_key)])
            .send()
            .await
            .map_err(|e| GatewayError::transport(SERVICE, e))?;

        read_json(SERVICE, response).await
    }
}

#[async_trait]
impl PlaceGateway for OpenTripMapClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self))]
    async fn autosuggest(&self, query: &str, limit: u32) -> Result<Vec<PlaceCandidate>, GatewayError> {
        let url = format!("{}/autosuggest", self.base_url);
        let items: Vec<SuggestItem> = self
            .get(
                &url,
                &[
                    ("name", query.to_string()),
                    ("limit", limit.to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        let candidates: Vec<PlaceCandidate> = items
            .into_iter()
            .filter_map(|item| {
                item.xid.map(|xid| PlaceCandidate {
                    xid,
                    name: item.name.unwrap_or_default(),
                })
            })
            .collect();

        info!("Found {} place candidates for '{}'", candidates.len(), query);
        Ok(candidates)
    }

    #[instrument(skip(self))]
    async fn details(&self, xid: &str) -> Result<PlaceSummary, GatewayError> {
        let url = format!("{}/xid/{}", self.base_url, urlencoding::encode(xid));
        let details: DetailsResponse = self.get(&url, &[("format", "json".to_string())]).await?;
        debug!("Fetched details for {}", xid);
        Ok(details.into_summary(xid))
    }

    #[instrument(skip(self))]
    async fn nearby(
        &self,
        point: GeoPoint,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<NearbyAttraction>, GatewayError> {
        let url = format!("{}/radius", self.base_url);
        let collection: FeatureCollection = self
            .get(
                &url,
                &[
                    ("radius", radius_m.to_string()),
                    ("lon", point.lon.to_string()),
                    ("lat", point.lat.to_string()),
                    ("limit", limit.to_string()),
                    ("kinds", NEARBY_KINDS.to_string()),
                    ("format", "geojson".to_string()),
                ],
            )
            .await?;

        let attractions: Vec<NearbyAttraction> = collection
            .features
            .into_iter()
            .map(Feature::into_attraction)
            .collect();

        info!("Found {} attractions within {}m", attractions.len(), radius_m);
        Ok(attractions)
    }
}

impl DetailsResponse {
    fn into_summary(self, xid: &str) -> PlaceSummary {
        let coordinates = self
            .point
            .map(|p| Coordinates {
                lat: p.lat,
                lon: p.lon,
            })
            .unwrap_or_default();

        PlaceSummary {
            id: xid.to_string(),
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            address: self.address,
            coordinates,
            kinds: split_kinds(&self.kinds),
            wikipedia: self.wikipedia,
            image: self.preview.map(|p| p.source).unwrap_or_default(),
            description: self.wikipedia_extracts.map(|e| e.text).unwrap_or_default(),
            ai_description: None,
            rating: parse_rating(&self.rate),
        }
    }
}

impl Feature {
    fn into_attraction(self) -> NearbyAttraction {
        NearbyAttraction {
            name: self
                .properties
                .name
                .unwrap_or_else(|| "Unknown".to_string()),
            distance: self.properties.dist.unwrap_or(0.0),
            kinds: split_kinds(&self.properties.kinds),
            coordinates: self.geometry.map(|g| g.coordinates).unwrap_or_default(),
        }
    }
}

/// "museums,cultural," -> ["museums", "cultural"]
fn split_kinds(kinds: &str) -> Vec<String> {
    kinds
        .split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .map(String::from)
        .collect()
}

/// Numeric part of a rating such as `3`, `"7"` or `"3h"`; 0 otherwise
fn parse_rating(rate: &Value) -> f64 {
    match rate {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}
