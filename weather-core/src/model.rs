use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Weather data for one hour, kept exactly as the provider returned it.
pub type WeatherPayload = Value;

/// A geocoded place. `(city, country_code)` is the natural key; `id` is
/// assigned by the store and referenced by cached weather snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub city: String,
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
}

/// One hourly entry of a provider response. The owning location id travels
/// alongside it when the snapshot is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Epoch seconds on a whole-hour boundary.
    pub dt: i64,
    pub data: WeatherPayload,
}

/// A validated lookup: where and when.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub city: String,
    pub country_code: String,
    pub date: DateTime<Utc>,
}

impl WeatherRequest {
    /// Build a request, normalizing city and country code the same way the
    /// cache keys them.
    pub fn new(city: &str, country_code: &str, date: DateTime<Utc>) -> Self {
        Self {
            city: normalize_city(city),
            country_code: normalize_country_code(country_code),
            date,
        }
    }
}

/// First letter uppercase, the rest lowercase: `"pARIS"` becomes `"Paris"`.
pub fn normalize_city(city: &str) -> String {
    let mut chars = city.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn normalize_country_code(country_code: &str) -> String {
    country_code.to_uppercase()
}

/// One candidate from the geocoding endpoint. Only the coordinates are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeCandidate {
    pub lat: f64,
    pub lon: f64,
}
