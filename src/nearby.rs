//! Nearby attraction lookup

use std::sync::Arc;

use tracing::instrument;

use crate::gateway::{GatewayError, PlaceGateway};
use crate::models::{Coordinates, NearbyAttraction};

pub const DEFAULT_RADIUS_M: u32 = 5000;
pub const DEFAULT_LIMIT: u32 = 10;

/// Pass-through over the place gateway's radius search. Results keep provider order.
pub struct NearbyFinder {
    places: Arc<dyn PlaceGateway>,
}

impl NearbyFinder {
    pub fn new(places: Arc<dyn PlaceGateway>) -> Self {
        Self { places }
    }

    /// Attractions within the default radius and cap
    pub async fn find(&self, coordinates: &Coordinates) -> Result<Vec<NearbyAttraction>, GatewayError> {
        self.find_within(coordinates, DEFAULT_RADIUS_M, DEFAULT_LIMIT)
            .await
    }

    /// Unknown coordinates fail with [`GatewayError::MissingCoordinates`] before any
    /// upstream call.
    #[instrument(skip(self))]
    pub async fn find_within(
        &self,
        coordinates: &Coordinates,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<NearbyAttraction>, GatewayError> {
        let point = coordinates.point().ok_or(GatewayError::MissingCoordinates)?;
        self.places.nearby(point, radius_m, limit).await
    }
}
