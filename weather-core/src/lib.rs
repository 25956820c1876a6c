//! Core library for the weather cache service.
//!
//! This crate defines:
//! - Configuration handling
//! - The upstream provider client and its failure contract
//! - The cache store (SQLite or in-memory)
//! - Cache-first location and weather resolution
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod bucket;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, DatabaseConfig, ProviderConfig, ServerConfig};
pub use error::{FetchError, FieldError, ResolveError};
pub use model::{Location, WeatherPayload, WeatherRequest, WeatherSnapshot};
pub use provider::{ProviderError, WeatherProvider};
pub use service::{Reply, WeatherService};
pub use store::{CacheStore, MemoryStore, SqliteStore, StoreError};
