//! Cache-first resolution of locations and hourly weather.

pub mod location;
pub mod weather;

pub use location::LocationResolver;
pub use weather::{QueryKind, WeatherResolver};

#[cfg(test)]
pub(crate) mod fakes;
