use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::ResolveError;
use crate::bucket::bucket_hour;
use crate::clock::Clock;
use crate::model::{Location, WeatherPayload, WeatherSnapshot};
use crate::provider::WeatherProvider;
use crate::store::{CacheStore, StoreError};

/// Which upstream endpoint answers a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Historical,
    Forecast,
}

impl QueryKind {
    /// The provider partitions time at "now": anything strictly earlier is
    /// history. Uses the requested time, not its hourly bucket.
    pub fn for_request(requested: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if requested < now {
            QueryKind::Historical
        } else {
            QueryKind::Forecast
        }
    }
}

/// Resolves `(location, time)` to one hour of weather, caching every hourly
/// entry the provider returns.
#[derive(Debug, Clone)]
pub struct WeatherResolver {
    store: Arc<dyn CacheStore>,
    provider: Arc<dyn WeatherProvider>,
    clock: Arc<dyn Clock>,
}

impl WeatherResolver {
    pub fn new(
        store: Arc<dyn CacheStore>,
        provider: Arc<dyn WeatherProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            provider,
            clock,
        }
    }

    #[instrument(skip(self, location), fields(location_id = location.id), level = "debug")]
    pub async fn resolve(
        &self,
        location: &Location,
        requested: DateTime<Utc>,
    ) -> Result<WeatherPayload, ResolveError> {
        let dt = bucket_hour(requested);

        if let Some(payload) = self
            .store
            .find_weather(location.id, dt)
            .await
            .map_err(get_weather_error)?
        {
            debug!(dt, "weather cache hit");
            return Ok(payload);
        }

        let kind = QueryKind::for_request(requested, self.clock.now());
        debug!(dt, ?kind, "weather cache miss");

        let fetched = match kind {
            QueryKind::Historical => {
                self.provider
                    .historical(location.lat, location.lon, requested.timestamp())
                    .await
            }
            QueryKind::Forecast => self.provider.forecast(location.lat, location.lon).await,
        };

        let body = fetched.map_err(|err| match err.into_fetch_error() {
            Ok(fetch) => ResolveError::from(fetch.or_fallback("weather not found")),
            Err(other) => get_weather_error(other),
        })?;

        let (current, hourly) = split_series(body)?;

        if !hourly.is_empty() {
            match self.store.insert_weather_batch(location.id, &hourly).await {
                Ok(()) => info!(count = hourly.len(), "cached hourly weather"),
                Err(StoreError::Conflict) => {
                    warn!("hourly weather cached concurrently, keeping fetched payload")
                }
                Err(err) => return Err(get_weather_error(err)),
            }
        }

        Ok(current)
    }
}

/// Split a provider response into its `current` entry and the hourly series,
/// each hourly entry keyed by its own `dt`.
fn split_series(body: Value) -> Result<(WeatherPayload, Vec<WeatherSnapshot>), ResolveError> {
    let Value::Object(mut fields) = body else {
        return Err(ResolveError::GetWeather("provider response is not an object".into()));
    };

    let current = match fields.remove("current") {
        Some(Value::Null) | None => {
            return Err(ResolveError::GetWeather(
                "provider response has no current entry".into(),
            ));
        }
        Some(current) => current,
    };

    let hourly = match fields.remove("hourly") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .into_iter()
            .map(|entry| {
                let dt = entry.get("dt").and_then(Value::as_i64).ok_or_else(|| {
                    ResolveError::GetWeather("hourly entry without an integer dt".into())
                })?;
                Ok::<_, ResolveError>(WeatherSnapshot { dt, data: entry })
            })
            .collect::<Result<Vec<_>, ResolveError>>()?,
        Some(_) => {
            return Err(ResolveError::GetWeather(
                "provider hourly series is not a list".into(),
            ));
        }
    };

    Ok((current, hourly))
}

fn get_weather_error(err: impl std::fmt::Display) -> ResolveError {
    ResolveError::GetWeather(err.to_string())
}
