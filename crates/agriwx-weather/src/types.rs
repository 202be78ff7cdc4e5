use serde::{Deserialize, Serialize};

use crate::units::{meters_per_second_to_kmh, probability_to_percent};

/// Single best geocoding match for a free-text location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMatch {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    #[serde(default)]
    pub country: String,
}

impl GeoMatch {
    /// Human-readable label, e.g. "Nairobi, KE"
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// Conditions at lookup time, in the units the advisory rules expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(rename = "temp")]
    pub temperature_c: f64,
    #[serde(rename = "humidity")]
    pub humidity_pct: u8,
    pub wind_kmh: f64,
    /// Borrowed from the first forecast bucket; the current-weather feed has none
    #[serde(rename = "pop")]
    pub precipitation_probability_pct: Option<u8>,
    #[serde(default)]
    pub description: String,
}

impl CurrentConditions {
    /// Build from a raw observation, approximating "now" precipitation
    /// probability with the first forecast bucket when there is one.
    pub fn from_observation(
        observation: &CurrentObservation,
        first_bucket: Option<&ForecastEntry>,
    ) -> Self {
        Self {
            temperature_c: observation.main.temp,
            humidity_pct: observation.main.humidity,
            wind_kmh: meters_per_second_to_kmh(observation.wind.speed).round(),
            precipitation_probability_pct: first_bucket
                .map(|entry| probability_to_percent(entry.pop.unwrap_or(0.0))),
            description: observation
                .weather
                .first()
                .map(|w| w.description.clone())
                .unwrap_or_default(),
        }
    }
}

/// One 3-hour forecast bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    #[serde(rename = "dt")]
    pub timestamp_unix: i64,
    #[serde(rename = "temp")]
    pub temperature_c: f64,
    #[serde(rename = "pop")]
    pub precipitation_probability_pct: u8,
    pub wind_kmh: f64,
    #[serde(rename = "rain_mm")]
    pub rain_volume_mm: Option<f64>,
}

impl From<&ForecastEntry> for ForecastSample {
    fn from(entry: &ForecastEntry) -> Self {
        Self {
            timestamp_unix: entry.dt,
            temperature_c: entry.main.temp,
            precipitation_probability_pct: probability_to_percent(entry.pop.unwrap_or(0.0)),
            wind_kmh: meters_per_second_to_kmh(entry.wind.speed).round(),
            rain_volume_mm: entry.rain.as_ref().and_then(|r| r.three_hours),
        }
    }
}

/// Raw `/data/2.5/weather` payload (metric units)
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentObservation {
    pub main: CurrentMain,
    pub wind: Wind,
    #[serde(default)]
    pub weather: Vec<ConditionSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentMain {
    pub temp: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionSummary {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wind {
    /// Metres per second
    pub speed: f64,
}

/// One entry of the `/data/2.5/forecast` list
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: ForecastMain,
    pub wind: Wind,
    /// Probability of precipitation, 0.0..=1.0
    #[serde(default)]
    pub pop: Option<f64>,
    #[serde(default)]
    pub rain: Option<RainVolume>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RainVolume {
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

/// Parsed forecast plus the untouched list items for display passthrough
#[derive(Debug, Clone, Default)]
pub struct Forecast {
    pub entries: Vec<ForecastEntry>,
    pub raw: Vec<serde_json::Value>,
}

impl Forecast {
    /// Parse the `list` array of a forecast response, keeping the raw items.
    pub fn from_list(list: Vec<serde_json::Value>) -> Result<Self, WeatherError> {
        let entries = list
            .iter()
            .map(|item| serde_json::from_value::<ForecastEntry>(item.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| WeatherError::Parse(format!("forecast entry: {}", e)))?;

        Ok(Self { entries, raw: list })
    }

    pub fn first(&self) -> Option<&ForecastEntry> {
        self.entries.first()
    }

    pub fn samples(&self) -> Vec<ForecastSample> {
        self.entries.iter().map(ForecastSample::from).collect()
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("OpenWeatherMap API key is not configured")]
    MissingApiKey,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> ForecastEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_geo_label() {
        let m = GeoMatch {
            lat: -1.29,
            lon: 36.82,
            name: "Nairobi".into(),
            country: "KE".into(),
        };
        assert_eq!(m.label(), "Nairobi, KE");

        let bare = GeoMatch {
            country: String::new(),
            ..m
        };
        assert_eq!(bare.label(), "Nairobi");
    }

    #[test]
    fn test_sample_from_entry_converts_units() {
        let e = entry(json!({
            "dt": 1_700_000_000,
            "main": {"temp": 21.4, "feels_like": 21.0},
            "wind": {"speed": 4.2, "deg": 180},
            "pop": 0.37,
            "rain": {"3h": 0.8}
        }));
        let s = ForecastSample::from(&e);
        assert_eq!(s.timestamp_unix, 1_700_000_000);
        assert_eq!(s.precipitation_probability_pct, 37);
        assert_eq!(s.wind_kmh, 15.0);
        assert_eq!(s.rain_volume_mm, Some(0.8));
    }

    #[test]
    fn test_sample_without_pop_or_rain() {
        let e = entry(json!({"dt": 1, "main": {"temp": 10.0}, "wind": {"speed": 0.0}}));
        let s = ForecastSample::from(&e);
        assert_eq!(s.precipitation_probability_pct, 0);
        assert_eq!(s.rain_volume_mm, None);
    }

    #[test]
    fn test_current_borrows_pop_from_first_bucket() {
        let obs: CurrentObservation = serde_json::from_value(json!({
            "dt": 1_700_000_000,
            "main": {"temp": 31.5, "humidity": 64},
            "wind": {"speed": 3.0},
            "weather": [{"main": "Clouds", "description": "scattered clouds"}]
        }))
        .unwrap();
        let first = entry(json!({"dt": 1, "main": {"temp": 30.0}, "wind": {"speed": 1.0}, "pop": 0.72}));

        let current = CurrentConditions::from_observation(&obs, Some(&first));
        assert_eq!(current.temperature_c, 31.5);
        assert_eq!(current.humidity_pct, 64);
        assert_eq!(current.wind_kmh, 11.0);
        assert_eq!(current.precipitation_probability_pct, Some(72));
        assert_eq!(current.description, "scattered clouds");

        let without = CurrentConditions::from_observation(&obs, None);
        assert_eq!(without.precipitation_probability_pct, None);
    }

    #[test]
    fn test_current_serializes_with_short_names() {
        let current = CurrentConditions {
            temperature_c: 20.0,
            humidity_pct: 50,
            wind_kmh: 5.0,
            precipitation_probability_pct: Some(10),
            description: "clear sky".into(),
        };
        let v = serde_json::to_value(&current).unwrap();
        assert_eq!(v["temp"], 20.0);
        assert_eq!(v["pop"], 10);
        assert_eq!(v["wind_kmh"], 5.0);
    }

    #[test]
    fn test_forecast_from_list_keeps_raw_items() {
        let list = vec![
            json!({"dt": 1, "main": {"temp": 10.0}, "wind": {"speed": 1.0}, "visibility": 10000}),
            json!({"dt": 2, "main": {"temp": 11.0}, "wind": {"speed": 2.0}}),
        ];
        let forecast = Forecast::from_list(list).unwrap();
        assert_eq!(forecast.entries.len(), 2);
        assert_eq!(forecast.raw[0]["visibility"], 10000);
        assert_eq!(forecast.first().map(|e| e.dt), Some(1));
    }

    #[test]
    fn test_forecast_from_list_rejects_malformed_entry() {
        let list = vec![json!({"dt": "soon"})];
        assert!(matches!(
            Forecast::from_list(list),
            Err(WeatherError::Parse(_))
        ));
    }
}
