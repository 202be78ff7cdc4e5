//! Forward geocoding: free-text location to coordinates.
//! Uses the OpenWeatherMap direct geocoding endpoint with the same API key
//! as the weather feed.

use crate::provider::{build_client, handle_response};
use crate::types::{GeoMatch, WeatherError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Resolves a location name to at most one match
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<GeoMatch>, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    client: Arc<Client>,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherGeocoder {
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
}

#[async_trait]
impl Geocoder for OpenWeatherGeocoder {
    #[instrument(skip(self), level = "debug")]
    async fn geocode(&self, query: &str) -> Result<Option<GeoMatch>, WeatherError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(WeatherError::MissingApiKey)?;

        let url = format!("{}/geo/1.0/direct", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("limit", "1"), ("appid", api_key)])
            .send()
            .await?;

        let matches: Vec<GeoMatch> = handle_response(response).await?;
        let best = matches.into_iter().next();

        match &best {
            Some(m) => tracing::info!("Geocoded {:?} to {} ({}, {})", query, m.label(), m.lat, m.lon),
            None => tracing::debug!("No geocoding match for {:?}", query),
        }

        Ok(best)
    }
}
