//! Failure taxonomy for a weather lookup and its HTTP translation.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// An upstream call answered with a non-success status, or with nothing.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("upstream request failed with status {code}")]
pub struct FetchError {
    pub code: u16,
    pub data: Option<Value>,
}

impl FetchError {
    pub fn new(code: u16, data: Option<Value>) -> Self {
        Self { code, data }
    }

    /// Status used when the provider answered successfully but with an empty body.
    pub fn empty() -> Self {
        Self::new(404, None)
    }

    /// Replace a missing or unstructured body with `{"error": message}`.
    pub fn or_fallback(mut self, message: &str) -> Self {
        if !matches!(self.data, Some(Value::Object(_)) | Some(Value::Array(_))) {
            self.data = Some(json!({ "error": message }));
        }
        self
    }
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid request: {} field(s) rejected", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Requested location not found, city: {city}, country_code: {country_code}")]
    LocationNotFound { city: String, country_code: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to resolve location: {0}")]
    GetLocation(String),

    #[error("failed to resolve weather: {0}")]
    GetWeather(String),
}

impl ResolveError {
    pub fn location_not_found(city: &str, country_code: &str) -> Self {
        Self::LocationNotFound {
            city: city.to_string(),
            country_code: country_code.to_string(),
        }
    }

    /// HTTP status for this failure. Upstream statuses pass through unless
    /// they are not valid HTTP statuses, which become 502.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::LocationNotFound { .. } => 404,
            Self::Fetch(err) if (100..=599).contains(&err.code) => err.code,
            Self::Fetch(_) => 502,
            Self::GetLocation(_) | Self::GetWeather(_) => 500,
        }
    }

    /// JSON body returned to the caller. Internal failures stay opaque.
    pub fn body(&self) -> Value {
        match self {
            Self::Validation(fields) => json!(fields),
            Self::LocationNotFound { .. } => json!({ "error": self.to_string() }),
            Self::Fetch(err) => err
                .data
                .clone()
                .unwrap_or_else(|| json!({ "error": "upstream request failed" })),
            Self::GetLocation(_) => json!({ "error": "failed to resolve location" }),
            Self::GetWeather(_) => json!({ "error": "failed to resolve weather" }),
        }
    }
}
