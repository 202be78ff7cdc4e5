//! Weather data and agronomic advisories for AgriWx
//!
//! Fetches current conditions and the 5-day/3-hour forecast from
//! OpenWeatherMap, narrows the forecast to the next few buckets and turns
//! the result into crop advisories.

pub mod advisory;
pub mod geocode;
pub mod provider;
pub mod types;
pub mod units;
pub mod window;

pub use advisory::{derive_advisories, evaluate_rules, Advisory};
pub use geocode::{Geocoder, OpenWeatherGeocoder};
pub use provider::{WeatherFeed, WeatherProvider};
pub use types::*;
pub use window::select_upcoming;
