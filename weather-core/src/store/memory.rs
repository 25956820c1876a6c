use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{CacheStore, StoreError};
use crate::model::{Location, WeatherPayload, WeatherSnapshot};

/// Process-local cache with the same insert-if-absent contract as
/// [`SqliteStore`](super::SqliteStore). Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    locations: HashMap<(String, String), Location>,
    weather: HashMap<(i64, i64), WeatherPayload>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location_count(&self) -> usize {
        self.inner.lock().locations.len()
    }

    pub fn snapshot_count(&self) -> usize {
        self.inner.lock().weather.len()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn find_location(
        &self,
        city: &str,
        country_code: &str,
    ) -> Result<Option<Location>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .locations
            .get(&(city.to_string(), country_code.to_string()))
            .cloned())
    }

    async fn insert_location(
        &self,
        city: &str,
        country_code: &str,
        lat: f64,
        lon: f64,
    ) -> Result<Location, StoreError> {
        let mut inner = self.inner.lock();
        let key = (city.to_string(), country_code.to_string());

        if let Some(existing) = inner.locations.get(&key) {
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let location = Location {
            id: inner.next_id,
            city: city.to_string(),
            country_code: country_code.to_string(),
            lat,
            lon,
        };
        inner.locations.insert(key, location.clone());
        Ok(location)
    }

    async fn find_weather(
        &self,
        location_id: i64,
        dt: i64,
    ) -> Result<Option<WeatherPayload>, StoreError> {
        Ok(self.inner.lock().weather.get(&(location_id, dt)).cloned())
    }

    async fn insert_weather_batch(
        &self,
        location_id: i64,
        entries: &[WeatherSnapshot],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();

        if !inner.locations.values().any(|l| l.id == location_id) {
            return Err(StoreError::UnknownLocation(location_id));
        }

        for entry in entries {
            inner
                .weather
                .entry((location_id, entry.dt))
                .or_insert_with(|| entry.data.clone());
        }
        Ok(())
    }
}
