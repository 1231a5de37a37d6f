//! HTTP-backed geolocation and weather lookups.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

use super::{Lookup, PrimitiveError, Result};
use crate::config;

/// wttr.in one-line format: condition, temperature, wind.
const WEATHER_FORMAT: &str = "format=%C+%t+%w";

#[derive(Deserialize)]
struct GeoResponse {
    city: Option<String>,
}

pub struct HttpLookup {
    client: Client,
    geo_url: String,
    weather_url: String,
}

impl HttpLookup {
    pub fn new(settings: &config::Lookup) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("neurofusion/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            geo_url: settings.geo_url.clone(),
            weather_url: settings.weather_url.clone(),
        })
    }

    /// Weather URL for `location`; the location is a single escaped path segment.
    pub fn weather_url(&self, location: &str) -> Result<Url> {
        let mut url = Url::parse(&self.weather_url)
            .map_err(|e| PrimitiveError::other(format!("Invalid weather URL: {}", e)))?;
        if !location.is_empty() {
            url.path_segments_mut()
                .map_err(|_| PrimitiveError::other("Weather URL cannot take a path"))?
                .pop_if_empty()
                .push(location);
        }
        url.set_query(Some(WEATHER_FORMAT));
        Ok(url)
    }
}

#[async_trait]
impl Lookup for HttpLookup {
    async fn locate_city(&self) -> Result<Option<String>> {
        let geo: GeoResponse = self
            .client
            .get(&self.geo_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(geo.city.filter(|c| !c.trim().is_empty()))
    }

    async fn weather(&self, location: &str) -> Result<String> {
        let url = self.weather_url(location)?;
        tracing::debug!("Weather lookup: {}", url);

        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(text.trim().to_string())
    }
}
