//! Nearest-station PM2.5 lookup against the OpenAQ `latest` endpoint

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use haversine::{Location as HaversineLocation, Units, distance};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{HttpClient, Provider, ProviderError, ProviderKind, ProviderResult, parse_json};
use crate::metrics::AqiCategory;
use crate::models::{AirQualityReading, Location};

const PM25: &str = "pm25";

pub struct OpenAqProvider {
    http: HttpClient,
    base_url: String,
    radius_m: u32,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    results: Vec<StationResult>,
}

#[derive(Debug, Deserialize)]
struct StationResult {
    location: String,
    coordinates: Option<StationCoordinates>,
    #[serde(default)]
    measurements: Vec<Measurement>,
}

#[derive(Debug, Deserialize)]
struct StationCoordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct Measurement {
    parameter: String,
    value: Option<f64>,
    #[serde(rename = "lastUpdated")]
    last_updated: Option<String>,
}

fn distance_km(from: &Location, to: &StationCoordinates) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        HaversineLocation {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        Units::Kilometers,
    )
}

impl OpenAqProvider {
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, radius_m: u32, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            radius_m,
            api_key,
        }
    }

    #[must_use]
    pub fn url(&self, location: &Location) -> String {
        format!(
            "{}/latest?coordinates={},{}&radius={}&parameter={PM25}&limit=20",
            self.base_url, location.latitude, location.longitude, self.radius_m
        )
    }

    /// Pick the nearest station that reports PM2.5. If no station does, the
    /// nearest station is returned with the reading marked absent.
    pub fn parse(body: &str, location: &Location) -> Result<AirQualityReading, ProviderError> {
        let response: LatestResponse = parse_json(body)?;

        let mut stations: Vec<(f64, StationResult)> = response
            .results
            .into_iter()
            .filter_map(|station| {
                let km = distance_km(location, station.coordinates.as_ref()?);
                Some((km, station))
            })
            .collect();
        stations.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let pm25_of = |station: &StationResult| {
            station
                .measurements
                .iter()
                .find(|m| m.parameter.eq_ignore_ascii_case(PM25))
                .and_then(|m| m.value.filter(|v| *v >= 0.0).map(|v| (v, m.last_updated.clone())))
        };

        let chosen = stations
            .iter()
            .find(|(_, station)| pm25_of(station).is_some())
            .or_else(|| stations.first())
            .ok_or_else(|| ProviderError::no_data("no station within search radius"))?;

        let (km, station) = chosen;
        let measurement = pm25_of(station);
        let pm25 = measurement.as_ref().map(|(value, _)| *value);
        let measured_at = measurement
            .and_then(|(_, updated)| updated)
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|t| t.with_timezone(&Utc));

        debug!(
            "Nearest air quality station '{}' at {:.1} km, pm25 {:?}",
            station.location, km, pm25
        );

        Ok(AirQualityReading {
            station: station.location.clone(),
            distance_km: (km * 10.0).round() / 10.0,
            pm25,
            category: pm25.map(AqiCategory::from_pm25),
            measured_at,
        })
    }
}

#[async_trait]
impl Provider<AirQualityReading> for OpenAqProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AirQuality
    }

    #[instrument(name = "fetch_air_quality", skip(self, location), fields(location = %location.id))]
    async fn fetch(&self, location: &Location, _as_of: NaiveDate) -> ProviderResult<AirQualityReading> {
        let url = self.url(location);
        let headers: Vec<(&'static str, String)> = self
            .api_key
            .iter()
            .map(|key| ("X-API-Key", key.clone()))
            .collect();

        self.http
            .get_text(self.kind(), &url, &headers)
            .await
            .and_then(|body| Self::parse(&body, location))
            .into()
    }
}
