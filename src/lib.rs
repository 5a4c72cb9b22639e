//! Smart itinerary planner
//!
//! Composes place search, weather and text generation into itinerary documents
//! and serves them over HTTP.

pub mod api;
pub mod composer;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod gateway;
pub mod generation;
pub mod models;
pub mod nearby;
pub mod storage;
pub mod telemetry;
pub mod templates;
pub mod weather;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export core types for public API
pub use api::AppState;
pub use composer::{ComposeError, ItineraryComposer};
pub use config::PlannerConfig;
pub use error::PlannerError;
pub use gateway::{GatewayError, Gateways, PlaceGateway, TextGenerator, WeatherGateway};
pub use models::{Itinerary, ItineraryRequest, PlaceSummary, WeatherInfo};
pub use storage::{DocumentStore, MemoryStore, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
