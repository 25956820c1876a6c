//! Persistence for geocoded locations and hourly weather snapshots.
//!
//! Nothing above this module knows which storage engine is in use. Both
//! inserts are insert-if-absent on their natural keys, so concurrent
//! resolvers racing on the same miss converge on one record.

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::{Location, WeatherPayload, WeatherSnapshot};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to encode weather payload: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A uniqueness violation reported by stores that don't ignore them.
    #[error("record already exists")]
    Conflict,

    #[error("no location with id {0}")]
    UnknownLocation(i64),

    #[error("location {city}, {country_code} missing after insert")]
    Missing { city: String, country_code: String },
}

#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    async fn find_location(
        &self,
        city: &str,
        country_code: &str,
    ) -> Result<Option<Location>, StoreError>;

    /// Insert a location, or return the existing one for the same
    /// `(city, country_code)`.
    async fn insert_location(
        &self,
        city: &str,
        country_code: &str,
        lat: f64,
        lon: f64,
    ) -> Result<Location, StoreError>;

    async fn find_weather(
        &self,
        location_id: i64,
        dt: i64,
    ) -> Result<Option<WeatherPayload>, StoreError>;

    /// Write every entry not already cached for `(location_id, dt)`.
    async fn insert_weather_batch(
        &self,
        location_id: i64,
        entries: &[WeatherSnapshot],
    ) -> Result<(), StoreError>;
}
