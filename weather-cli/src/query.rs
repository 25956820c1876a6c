//! Validation of the raw `?country_code=..&city=..&date=..` query.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use weather_core::{FieldError, WeatherRequest};

/// Accepted request time format, e.g. `14.11.2023T22:13`. Interpreted as UTC.
pub const DATE_FORMAT: &str = "%d.%m.%YT%H:%M";

/// Query parameters as received. Every field is optional here so that a
/// missing one is reported alongside the others.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub date: Option<String>,
}

impl WeatherQuery {
    pub fn validate(self) -> Result<WeatherRequest, Vec<FieldError>> {
        self.validate_with(None)
    }

    /// Same as [`validate`](Self::validate), but a missing date means `now`.
    pub fn validate_or_now(self, now: DateTime<Utc>) -> Result<WeatherRequest, Vec<FieldError>> {
        self.validate_with(Some(now))
    }

    fn validate_with(
        self,
        default_date: Option<DateTime<Utc>>,
    ) -> Result<WeatherRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        let country_code = match self.country_code {
            Some(code) if code.chars().count() == 2 => Some(code),
            Some(_) => {
                errors.push(FieldError::new(
                    "country_code",
                    "country_code must be a string two characters long",
                ));
                None
            }
            None => {
                errors.push(FieldError::new("country_code", "field required"));
                None
            }
        };

        let city = match self.city {
            Some(city) if city.chars().count() >= 2 => Some(city),
            Some(_) => {
                errors.push(FieldError::new(
                    "city",
                    "must be a string at least two characters long",
                ));
                None
            }
            None => {
                errors.push(FieldError::new("city", "field required"));
                None
            }
        };

        let date = match self.date.as_deref().map(parse_date) {
            Some(Ok(date)) => Some(date),
            Some(Err(message)) => {
                errors.push(FieldError::new("date", message));
                None
            }
            None if default_date.is_some() => default_date,
            None => {
                errors.push(FieldError::new("date", "field required"));
                None
            }
        };

        match (country_code, city, date) {
            (Some(country_code), Some(city), Some(date)) if errors.is_empty() => {
                Ok(WeatherRequest::new(&city, &country_code, date))
            }
            _ => Err(errors),
        }
    }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| "wrong date format".to_string())
}
