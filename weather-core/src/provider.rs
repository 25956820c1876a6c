use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;

use crate::{Config, FetchError, provider::openweather::OpenWeatherProvider};

pub mod openweather;

/// Why an upstream call produced no usable body.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Non-success HTTP status.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Success status but an empty or null body.
    #[error("upstream returned an empty body")]
    Empty,

    #[error("request to upstream failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProviderError {
    /// The status-carrying form of this failure, if it has one. An empty body
    /// counts as a 404.
    pub fn into_fetch_error(self) -> Result<FetchError, Self> {
        match self {
            Self::Fetch(err) => Ok(err),
            Self::Empty => Ok(FetchError::empty()),
            other => Err(other),
        }
    }
}

/// The three upstream query shapes. Each returns the provider's JSON as-is.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn geocode(
        &self,
        city: &str,
        country_code: &str,
        limit: u32,
    ) -> Result<Value, ProviderError>;

    /// Conditions at `epoch`, plus the hourly series around it.
    async fn historical(&self, lat: f64, lon: f64, epoch: i64) -> Result<Value, ProviderError>;

    /// Current conditions plus the upcoming hourly series.
    async fn forecast(&self, lat: f64, lon: f64) -> Result<Value, ProviderError>;
}

/// Construct the provider from config. The HTTP client built here is meant
/// to be shared for the lifetime of the process.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key()?;

    let http = Client::builder()
        .timeout(Duration::from_secs(config.provider.timeout_secs))
        .build()?;

    Ok(OpenWeatherProvider::with_client(
        api_key.to_owned(),
        config.provider.base_url.clone(),
        http,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }

    #[test]
    fn empty_body_counts_as_not_found() {
        let err = ProviderError::Empty.into_fetch_error().unwrap();
        assert_eq!(err, FetchError::new(404, None));
    }

    #[test]
    fn malformed_body_has_no_status() {
        let parse_err = serde_json::from_str::<Value>("{").unwrap_err();
        assert!(ProviderError::Malformed(parse_err).into_fetch_error().is_err());
    }
}
