use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use super::{ProviderError, WeatherProvider};
use crate::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const GEOCODE_PATH: &str = "/geo/1.0/direct";
const HISTORICAL_PATH: &str = "/data/2.5/onecall/timemachine";
const FORECAST_PATH: &str = "/data/2.5/onecall";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self::with_client(api_key, base_url, Client::new())
    }

    pub fn with_client(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Single GET against the provider.
    ///
    /// Non-success statuses become [`FetchError`] carrying the parsed body
    /// when there is one; a success with an empty body becomes
    /// [`ProviderError::Empty`].
    async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ProviderError> {
        let request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .build()?;

        info!(endpoint = path, "Requesting OpenWeather");

        let res = self.http.execute(request).await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            debug!(
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            let data = serde_json::from_str::<Value>(&body).ok();
            return Err(FetchError::new(status.as_u16(), data).into());
        }

        if body.trim().is_empty() {
            return Err(ProviderError::Empty);
        }

        let data: Value = serde_json::from_str(&body)?;
        if is_empty(&data) {
            return Err(ProviderError::Empty);
        }

        Ok(data)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(
        &self,
        city: &str,
        country_code: &str,
        limit: u32,
    ) -> Result<Value, ProviderError> {
        self.fetch(
            GEOCODE_PATH,
            &[
                ("q", format!("{city},{country_code}")),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn historical(&self, lat: f64, lon: f64, epoch: i64) -> Result<Value, ProviderError> {
        self.fetch(
            HISTORICAL_PATH,
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("dt", epoch.to_string()),
                ("units", "metric".to_string()),
            ],
        )
        .await
    }

    async fn forecast(&self, lat: f64, lon: f64) -> Result<Value, ProviderError> {
        self.fetch(
            FORECAST_PATH,
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("exclude", "minutely,daily,alerts".to_string()),
                ("units", "metric".to_string()),
            ],
        )
        .await
    }
}

fn is_empty(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
