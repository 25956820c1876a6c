use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::ResolveError;
use crate::model::{GeocodeCandidate, Location};
use crate::provider::{ProviderError, WeatherProvider};
use crate::store::{CacheStore, StoreError};

/// Resolves `(city, country_code)` to coordinates, geocoding only on a
/// cache miss.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    store: Arc<dyn CacheStore>,
    provider: Arc<dyn WeatherProvider>,
}

impl LocationResolver {
    pub fn new(store: Arc<dyn CacheStore>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { store, provider }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn resolve(&self, city: &str, country_code: &str) -> Result<Location, ResolveError> {
        if let Some(location) = self
            .store
            .find_location(city, country_code)
            .await
            .map_err(get_location_error)?
        {
            debug!(id = location.id, "location cache hit");
            return Ok(location);
        }

        debug!("location cache miss, geocoding");

        let body = match self.provider.geocode(city, country_code, 1).await {
            Ok(body) => body,
            Err(ProviderError::Empty) => {
                return Err(ResolveError::location_not_found(city, country_code));
            }
            Err(ProviderError::Fetch(err)) => {
                return Err(err.or_fallback("location not found").into());
            }
            Err(err) => return Err(get_location_error(err)),
        };

        let candidates: Vec<GeocodeCandidate> =
            serde_json::from_value(body).map_err(get_location_error)?;

        let Some(first) = candidates.first() else {
            return Err(ResolveError::location_not_found(city, country_code));
        };

        let location = self.persist(city, country_code, first.lat, first.lon).await?;
        info!(id = location.id, lat = location.lat, lon = location.lon, "cached new location");
        Ok(location)
    }

    async fn persist(
        &self,
        city: &str,
        country_code: &str,
        lat: f64,
        lon: f64,
    ) -> Result<Location, ResolveError> {
        match self.store.insert_location(city, country_code, lat, lon).await {
            Ok(location) => Ok(location),
            Err(StoreError::Conflict) => {
                warn!("location cached concurrently, re-reading");
                self.store
                    .find_location(city, country_code)
                    .await
                    .map_err(get_location_error)?
                    .ok_or_else(|| {
                        ResolveError::GetLocation(
                            "location vanished after conflicting insert".into(),
                        )
                    })
            }
            Err(err) => Err(get_location_error(err)),
        }
    }
}

fn get_location_error(err: impl std::fmt::Display) -> ResolveError {
    ResolveError::GetLocation(err.to_string())
}
