//! OpenWeatherMap current-weather and 5-day/3-hour forecast client.

use crate::types::{CurrentObservation, Forecast, WeatherError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub const USER_AGENT: &str = "AgriWx/0.1.0";

/// Source of current conditions and forecast buckets for a coordinate pair
#[async_trait]
pub trait WeatherFeed: Send + Sync {
    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentObservation, WeatherError>;

    async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    api_key: Option<String>,
    base_url: String,
}

impl WeatherProvider {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        Ok(Self {
            client: Arc::new(build_client(timeout)?),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn api_key(&self) -> Result<&str, WeatherError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(WeatherError::MissingApiKey)
    }

    async fn get_metric<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        lat: f64,
        lon: f64,
    ) -> Result<T, WeatherError> {
        let api_key = self.api_key()?;
        let url = format!("{}/data/2.5/{}", self.base_url, endpoint);
        let lat = lat.to_string();
        let lon = lon.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", "metric"),
            ])
            .send()
            .await?;

        handle_response(response).await
    }
}

#[async_trait]
impl WeatherFeed for WeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentObservation, WeatherError> {
        self.get_metric("weather", lat, lon).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast, WeatherError> {
        let response: ForecastResponse = self.get_metric("forecast", lat, lon).await?;
        let forecast = Forecast::from_list(response.list)?;
        tracing::debug!("Forecast returned {} buckets", forecast.entries.len());
        Ok(forecast)
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client, WeatherError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Decode a successful JSON body or turn the status into an API error.
pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WeatherError> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))
    } else {
        let text = response.text().await.unwrap_or_default();
        Err(WeatherError::Api {
            status: status.as_u16(),
            message: text,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, key: Option<&str>) -> WeatherProvider {
        WeatherProvider::new(
            key.map(str::to_string),
            server.uri(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_current_weather() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("appid", "test_key"))
            .and(query_param("units", "metric"))
            .and(query_param("lat", "-1.29"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "dt": 1_700_000_000,
                "main": {"temp": 24.3, "humidity": 58, "pressure": 1012},
                "wind": {"speed": 2.1, "deg": 90},
                "weather": [{"id": 802, "main": "Clouds", "description": "scattered clouds"}]
            })))
            .mount(&mock_server)
            .await;

        let current = provider(&mock_server, Some("test_key"))
            .current(-1.29, 36.82)
            .await
            .unwrap();

        assert_eq!(current.main.humidity, 58);
        assert_eq!(current.weather[0].description, "scattered clouds");
    }

    #[tokio::test]
    async fn test_forecast_keeps_raw_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "200",
                "cnt": 2,
                "list": [
                    {"dt": 1_700_010_800, "main": {"temp": 22.0}, "wind": {"speed": 3.0}, "pop": 0.1},
                    {"dt": 1_700_021_600, "main": {"temp": 20.5}, "wind": {"speed": 4.0}, "pop": 0.6, "rain": {"3h": 1.2}}
                ]
            })))
            .mount(&mock_server)
            .await;

        let forecast = provider(&mock_server, Some("test_key"))
            .forecast(-1.29, 36.82)
            .await
            .unwrap();

        assert_eq!(forecast.entries.len(), 2);
        assert_eq!(forecast.raw.len(), 2);
        assert_eq!(forecast.raw[1]["rain"]["3h"], 1.2);
        assert_eq!(forecast.samples()[1].precipitation_probability_pct, 60);
    }

    #[tokio::test]
    async fn test_missing_api_key_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server, None).current(0.0, 0.0).await;
        assert!(matches!(result, Err(WeatherError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server, Some("bad")).forecast(0.0, 0.0).await;
        match result {
            Err(WeatherError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
