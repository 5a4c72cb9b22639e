//! Data models for the itinerary planner
//!
//! Places and attractions are normalized from the upstream gateways, itineraries are
//! the aggregate documents handed to storage, and users are plain profile records.
//! Field names follow the JSON contract of the web client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Travel style used when a request does not name one
pub const DEFAULT_TRAVEL_STYLE: &str = "balanced";

/// Preferences used when a request does not name any
pub const DEFAULT_PREFERENCES: [&str; 3] = ["culture", "food", "history"];

/// Owner recorded for itineraries created without a user
pub const DEFAULT_USER_ID: &str = "anonymous";

/// A resolved latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Coordinates as reported upstream. Either half may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    /// Coordinates for a place whose location is unknown
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    /// The usable point, or `None` when either half is missing
    #[must_use]
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            _ => None,
        }
    }
}

/// Structured street address. OpenTripMap fills whichever parts it knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Normalized point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub coordinates: Coordinates,
    /// Category tags in upstream order
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub wikipedia: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    /// Generated text, only present when `description` was too thin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,
    #[serde(default)]
    pub rating: f64,
}

impl PlaceSummary {
    /// A bare place with everything but id and name left empty
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: Address::default(),
            coordinates: Coordinates::unknown(),
            kinds: Vec::new(),
            wikipedia: String::new(),
            image: String::new(),
            description: String::new(),
            ai_description: None,
            rating: 0.0,
        }
    }
}

/// Attraction found around a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyAttraction {
    pub name: String,
    /// Meters from the query point
    pub distance: f64,
    pub kinds: Vec<String>,
    /// Raw GeoJSON position as emitted by the gateway, i.e. `[lon, lat]`
    pub coordinates: Vec<f64>,
}

/// Current conditions, metric units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Celsius
    pub temperature: f64,
    pub description: String,
    /// Percent
    pub humidity: f64,
    /// m/s
    pub wind_speed: f64,
}

/// Weather as embedded in an itinerary: a full snapshot or an `{error}` marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeatherInfo {
    Available(WeatherSnapshot),
    Unavailable { error: String },
}

impl WeatherInfo {
    #[must_use]
    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            WeatherInfo::Available(snapshot) => Some(snapshot),
            WeatherInfo::Unavailable { .. } => None,
        }
    }
}

/// `{ "error": "..." }` payload used in place of a success value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub error: String,
}

impl ErrorDescriptor {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Input to the itinerary composer
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryRequest {
    pub destination: String,
    pub duration_days: u32,
    pub budget: u64,
    pub preferences: Vec<String>,
    pub travel_style: String,
}

impl ItineraryRequest {
    /// Request with the default preferences and travel style
    pub fn new(destination: impl Into<String>, duration_days: u32, budget: u64) -> Self {
        Self {
            destination: destination.into(),
            duration_days,
            budget,
            preferences: DEFAULT_PREFERENCES.iter().map(|p| (*p).to_string()).collect(),
            travel_style: DEFAULT_TRAVEL_STYLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_preferences(mut self, preferences: Vec<String>) -> Self {
        self.preferences = preferences;
        self
    }

    #[must_use]
    pub fn with_travel_style(mut self, travel_style: impl Into<String>) -> Self {
        self.travel_style = travel_style.into();
        self
    }
}

/// Composed itinerary document. Built once and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub destination: String,
    pub main_attraction: PlaceSummary,
    pub duration: u32,
    pub budget: u64,
    pub daily_budget: u64,
    pub travel_style: String,
    pub preferences: Vec<String>,
    pub nearby_attractions: Vec<NearbyAttraction>,
    pub ai_generated_plan: String,
    #[serde(with = "iso_timestamp")]
    pub created_at: DateTime<Utc>,
    pub weather_info: WeatherInfo,
}

/// Itinerary as stored, with its owner and, where projected, its storage id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(flatten)]
    pub itinerary: Itinerary,
}

impl ItineraryRecord {
    /// Record as returned by list projections
    #[must_use]
    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }
}

/// Fields accepted when registering a user
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub preferences: Map<String, Value>,
}

/// Stored user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub preferences: Map<String, Value>,
    #[serde(with = "iso_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    #[must_use]
    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }
}

/// RFC 3339 timestamps with fixed millisecond precision, so stored values sort
/// lexically in creation order.
pub mod iso_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}
