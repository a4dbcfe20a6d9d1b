// src/collectors/geocode.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{record_miss, trim_base, GeocodeSource};
use crate::config::enrich::NominatimConfig;
use crate::record::GeoLocation;

/// Free-text location to coordinates plus map link.
///
/// The provider's fixed delay is applied by the caller (the pipeline's geocode
/// task); this type only performs the lookup.
pub struct Geocoder {
    source: Arc<dyn GeocodeSource>,
}

impl Geocoder {
    pub fn new(source: Arc<dyn GeocodeSource>) -> Self {
        Self { source }
    }

    pub async fn geocode(&self, location: &str) -> Option<GeoLocation> {
        match self.source.lookup(location).await {
            Ok(Some((lat, lng))) if lat.is_finite() && lng.is_finite() => {
                Some(GeoLocation::new(lat, lng))
            }
            Ok(_) => {
                record_miss("geocode");
                None
            }
            Err(e) => {
                warn!(target: "enrich", provider = self.source.name(), error = %e, "geocode failed");
                record_miss("geocode");
                None
            }
        }
    }
}

pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl NominatimClient {
    pub fn new(cfg: &NominatimConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: trim_base(&cfg.base_url),
            user_agent: cfg.user_agent.clone(),
        }
    }
}

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

#[async_trait]
impl GeocodeSource for NominatimClient {
    async fn lookup(&self, location: &str) -> Result<Option<(f64, f64)>> {
        let places: Vec<Place> = self
            .http
            .get(format!("{}/search", self.base_url))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("q", location),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()
            .await
            .context("nominatim request")?
            .error_for_status()
            .context("nominatim non-2xx")?
            .json()
            .await
            .context("nominatim body")?;

        let Some(first) = places.into_iter().next() else {
            return Ok(None);
        };
        let lat: f64 = first.lat.trim().parse().context("nominatim lat")?;
        let lng: f64 = first.lon.trim().parse().context("nominatim lon")?;
        Ok(Some((lat, lng)))
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}
