//! Lookup orchestration: location text in, advisory-bearing result out.

use std::sync::Arc;
use std::time::Duration;

use agriwx_core::{Config, LookupError, NetworkError, ReqwestErrorExt};
use agriwx_history::{HistoryClient, NewLookupRecord};
use agriwx_weather::window::NEXT_6H_BUCKETS;
use agriwx_weather::{
    derive_advisories, select_upcoming, CurrentConditions, ForecastSample, GeoMatch, Geocoder,
    OpenWeatherGeocoder, WeatherError, WeatherFeed, WeatherProvider,
};
use serde::Serialize;
use tracing::instrument;

/// Raw forecast buckets passed through for display (about two days).
pub const FORECAST_LIST_LEN: usize = 16;

/// Response payload of a successful lookup
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub location: GeoMatch,
    pub current: CurrentConditions,
    #[serde(rename = "forecastNext6h")]
    pub forecast_next_6h: Vec<ForecastSample>,
    pub advisories: Vec<String>,
    #[serde(rename = "forecastList")]
    pub forecast_list: Vec<serde_json::Value>,
}

pub struct LookupService {
    geocoder: Arc<dyn Geocoder>,
    feed: Arc<dyn WeatherFeed>,
    history: HistoryClient,
    history_limit: usize,
}

impl LookupService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        feed: Arc<dyn WeatherFeed>,
        history: HistoryClient,
        history_limit: usize,
    ) -> Self {
        Self {
            geocoder,
            feed,
            history,
            history_limit,
        }
    }

    /// Wire the OpenWeatherMap clients and the history store from config.
    ///
    /// A history database that fails to open is logged and retention is
    /// switched off; lookups keep working.
    pub fn from_config(config: &Config) -> Result<Self, NetworkError> {
        let ow = &config.openweather;
        let timeout = Duration::from_secs(ow.request_timeout_secs);
        let api_key = ow.api_key().map(str::to_string);

        let geocoder = OpenWeatherGeocoder::new(api_key.clone(), &ow.geo_base_url, timeout)
            .map_err(client_build_error)?;
        let feed = WeatherProvider::new(api_key, &ow.api_base_url, timeout)
            .map_err(client_build_error)?;

        let history = HistoryClient::from_config(&config.history).unwrap_or_else(|e| {
            tracing::error!("History store unavailable, retention disabled: {}", e);
            HistoryClient::disabled()
        });

        Ok(Self::new(
            Arc::new(geocoder),
            Arc::new(feed),
            history,
            config.history.max_retained,
        ))
    }

    pub fn history(&self) -> &HistoryClient {
        &self.history
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Look up a location using the wall clock as "now".
    pub async fn perform_lookup(&self, query: &str) -> Result<LookupResult, LookupError> {
        self.perform_lookup_at(query, chrono::Utc::now().timestamp())
            .await
    }

    /// Look up a location, windowing the forecast from `now_unix`.
    #[instrument(skip(self), level = "info")]
    pub async fn perform_lookup_at(
        &self,
        query: &str,
        now_unix: i64,
    ) -> Result<LookupResult, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::InvalidQuery);
        }

        let location = self
            .geocoder
            .geocode(query)
            .await
            .map_err(upstream_error)?
            .ok_or_else(|| LookupError::LocationNotFound(query.to_string()))?;

        let (observation, forecast) = tokio::try_join!(
            self.feed.current(location.lat, location.lon),
            self.feed.forecast(location.lat, location.lon),
        )
        .map_err(upstream_error)?;

        let current = CurrentConditions::from_observation(&observation, forecast.first());
        let samples = forecast.samples();
        let forecast_next_6h = select_upcoming(&samples, now_unix, NEXT_6H_BUCKETS);
        let advisories = derive_advisories(&current, &forecast_next_6h);

        let result = LookupResult {
            location,
            current,
            forecast_next_6h,
            advisories,
            forecast_list: forecast.raw.into_iter().take(FORECAST_LIST_LEN).collect(),
        };

        tracing::info!(
            "Lookup for {} produced {} advisories",
            result.location.label(),
            result.advisories.len()
        );

        self.retain(&result);
        Ok(result)
    }

    /// Hand the lookup to the history store without waiting on it.
    fn retain(&self, result: &LookupResult) {
        if !self.history.is_enabled() {
            return;
        }

        let entry = NewLookupRecord::now(
            result.location.label(),
            result.current.clone(),
            result.advisories.clone(),
        );
        let history = self.history.clone();

        tokio::spawn(async move {
            if let Err(e) = history.record(entry).await {
                tracing::error!("Failed to retain lookup: {}", e);
            }
        });
    }
}

fn client_build_error(error: WeatherError) -> NetworkError {
    match error {
        WeatherError::Network(e) => e.into_network_error(),
        other => NetworkError::ConnectionFailed(other.to_string()),
    }
}

fn upstream_error(error: WeatherError) -> LookupError {
    match error {
        WeatherError::MissingApiKey => {
            LookupError::ServerMisconfigured(WeatherError::MissingApiKey.to_string())
        }
        WeatherError::Network(e) => {
            let network = e.into_network_error();
            tracing::warn!("Weather provider request failed: {}", network);
            LookupError::UpstreamUnavailable(network.to_string())
        }
        other => {
            tracing::warn!("Weather provider error: {}", other);
            LookupError::UpstreamUnavailable(other.to_string())
        }
    }
}
