use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::ResolveError;
use crate::clock::Clock;
use crate::model::{WeatherPayload, WeatherRequest};
use crate::provider::WeatherProvider;
use crate::resolver::{LocationResolver, WeatherResolver};
use crate::store::CacheStore;

/// HTTP status and JSON body for one lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl From<Result<WeatherPayload, ResolveError>> for Reply {
    fn from(result: Result<WeatherPayload, ResolveError>) -> Self {
        match result {
            Ok(body) => Reply { status: 200, body },
            Err(err) => Reply {
                status: err.status_code(),
                body: err.body(),
            },
        }
    }
}

/// Runs one lookup: location first, then weather for that location.
#[derive(Debug, Clone)]
pub struct WeatherService {
    locations: LocationResolver,
    weather: WeatherResolver,
}

impl WeatherService {
    pub fn new(
        store: Arc<dyn CacheStore>,
        provider: Arc<dyn WeatherProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            locations: LocationResolver::new(store.clone(), provider.clone()),
            weather: WeatherResolver::new(store, provider, clock),
        }
    }

    #[instrument(
        skip(self, request),
        fields(city = %request.city, country_code = %request.country_code)
    )]
    pub async fn lookup(&self, request: &WeatherRequest) -> Result<WeatherPayload, ResolveError> {
        let location = self
            .locations
            .resolve(&request.city, &request.country_code)
            .await?;

        self.weather.resolve(&location, request.date).await
    }

    /// [`lookup`](Self::lookup), translated to a status/body pair.
    pub async fn respond(&self, request: &WeatherRequest) -> Reply {
        let result = self.lookup(request).await;
        if let Err(err) = &result {
            warn!(status = err.status_code(), error = %err, "weather lookup failed");
        }
        Reply::from(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::resolver::fakes::{Call, FakeProvider, Reply as Canned};
    use crate::store::MemoryStore;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn service(provider: Arc<FakeProvider>, store: Arc<MemoryStore>) -> WeatherService {
        WeatherService::new(store, provider, Arc::new(FixedClock(now())))
    }

    #[tokio::test]
    async fn first_seen_location_is_cached_then_history_fetched() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FakeProvider::new(
            Canned::Json(json!([{"lat": 48.85, "lon": 2.35}])),
            Canned::Json(json!({
                "current": {"dt": 1_700_000_000, "temp": 7.0},
                "hourly": [{"dt": 1_699_999_200, "temp": 6.5}]
            })),
        ));
        let date = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let request = WeatherRequest::new("paris", "fr", date);

        let payload = service(provider.clone(), store.clone()).lookup(&request).await.unwrap();

        assert_eq!(payload["temp"], 7.0);
        assert_eq!(store.location_count(), 1);
        assert_eq!(
            provider.calls(),
            vec![
                Call::Geocode {
                    city: "Paris".into(),
                    country_code: "FR".into(),
                    limit: 1,
                },
                Call::Historical {
                    lat: 48.85,
                    lon: 2.35,
                    epoch: 1_700_000_000,
                },
            ]
        );
    }

    #[tokio::test]
    async fn unknown_city_replies_404() {
        let provider = Arc::new(FakeProvider::new(Canned::Empty, Canned::Empty));
        let request = WeatherRequest::new("Xyzzy", "zz", now());

        let reply = service(provider.clone(), Arc::new(MemoryStore::new()))
            .respond(&request)
            .await;

        assert_eq!(reply.status, 404);
        assert!(
            reply.body["error"]
                .as_str()
                .unwrap()
                .starts_with("Requested location not found")
        );
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn geocode_server_error_passes_through() {
        let provider = Arc::new(FakeProvider::new(
            Canned::Status(500, Some(json!({"message": "server error"}))),
            Canned::Empty,
        ));
        let request = WeatherRequest::new("Paris", "FR", now());

        let reply = service(provider, Arc::new(MemoryStore::new())).respond(&request).await;

        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, json!({"message": "server error"}));
    }

    #[tokio::test]
    async fn successful_lookup_replies_200_with_payload() {
        let provider = Arc::new(FakeProvider::new(
            Canned::Json(json!([{"lat": 1.0, "lon": 2.0}])),
            Canned::Json(json!({"current": {"dt": 0, "temp": 3.0}, "hourly": []})),
        ));
        let request = WeatherRequest::new("Paris", "FR", now());

        let reply = service(provider, Arc::new(MemoryStore::new())).respond(&request).await;

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, json!({"dt": 0, "temp": 3.0}));
    }

    #[tokio::test]
    async fn weather_failure_after_location_keeps_location_cached() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FakeProvider::new(
            Canned::Json(json!([{"lat": 1.0, "lon": 2.0}])),
            Canned::Malformed,
        ));
        let request = WeatherRequest::new("Paris", "FR", now());

        let reply = service(provider, store.clone()).respond(&request).await;

        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, json!({"error": "failed to resolve weather"}));
        assert_eq!(store.location_count(), 1);
    }
}
