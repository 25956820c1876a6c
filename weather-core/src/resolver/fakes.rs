use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::FetchError;
use crate::provider::{ProviderError, WeatherProvider};

/// Canned provider answer.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Json(Value),
    Status(u16, Option<Value>),
    Empty,
    Malformed,
}

impl Reply {
    fn produce(&self) -> Result<Value, ProviderError> {
        match self {
            Reply::Json(body) => Ok(body.clone()),
            Reply::Status(code, data) => Err(FetchError::new(*code, data.clone()).into()),
            Reply::Empty => Err(ProviderError::Empty),
            Reply::Malformed => Err(serde_json::from_str::<Value>("{").unwrap_err().into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Geocode {
        city: String,
        country_code: String,
        limit: u32,
    },
    Historical { lat: f64, lon: f64, epoch: i64 },
    Forecast { lat: f64, lon: f64 },
}

/// Provider that answers from fixed replies and records every call.
#[derive(Debug)]
pub(crate) struct FakeProvider {
    geocode: Reply,
    weather: Reply,
    calls: Mutex<Vec<Call>>,
}

impl FakeProvider {
    pub(crate) fn new(geocode: Reply, weather: Reply) -> Self {
        Self {
            geocode,
            weather,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn geocode(
        &self,
        city: &str,
        country_code: &str,
        limit: u32,
    ) -> Result<Value, ProviderError> {
        self.calls.lock().push(Call::Geocode {
            city: city.to_string(),
            country_code: country_code.to_string(),
            limit,
        });
        self.geocode.produce()
    }

    async fn historical(&self, lat: f64, lon: f64, epoch: i64) -> Result<Value, ProviderError> {
        self.calls.lock().push(Call::Historical { lat, lon, epoch });
        self.weather.produce()
    }

    async fn forecast(&self, lat: f64, lon: f64) -> Result<Value, ProviderError> {
        self.calls.lock().push(Call::Forecast { lat, lon });
        self.weather.produce()
    }
}
