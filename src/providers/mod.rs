//! Provider adapters
//!
//! One adapter per external data source. Every adapter builds its own URL,
//! performs a single GET and parses the body into a typed value. Failures of
//! any kind (transport, status, payload) are returned as
//! [`ProviderResult::Unavailable`] and never propagate further.

pub mod air_quality;
pub mod alerts;
pub mod forecast;
pub mod history;
pub mod http;
pub mod solar;
pub mod sun_times;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::EnviroSnapConfig;
use crate::models::{
    AirQualityReading, Alert, HistoricalSummary, Location, PrimaryForecast, SolarReading,
    SunTimes,
};

pub use air_quality::OpenAqProvider;
pub use alerts::RssAlertProvider;
pub use forecast::OpenMeteoForecastProvider;
pub use history::OpenMeteoArchiveProvider;
pub use http::HttpClient;
pub use solar::NasaPowerProvider;
pub use sun_times::SunriseSunsetProvider;

/// The six data sources a snapshot is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Forecast,
    AirQuality,
    Solar,
    SunTimes,
    Alerts,
    History,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Forecast,
        ProviderKind::AirQuality,
        ProviderKind::Solar,
        ProviderKind::SunTimes,
        ProviderKind::Alerts,
        ProviderKind::History,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Forecast => "forecast",
            ProviderKind::AirQuality => "air_quality",
            ProviderKind::Solar => "solar",
            ProviderKind::SunTimes => "sun_times",
            ProviderKind::Alerts => "alerts",
            ProviderKind::History => "history",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a provider did not contribute to a cycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Connection, DNS, TLS or timeout failure
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Non-2xx response
    #[error("HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Body could not be parsed or lacks a required field
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Well-formed response that carries nothing usable for the location
    #[error("No data: {0}")]
    NoData(String),
}

impl ProviderError {
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn no_data<S: Into<String>>(message: S) -> Self {
        Self::NoData(message.into())
    }
}

/// Outcome of one adapter call: a fully parsed value or the reason there is none
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult<T> {
    Available(T),
    Unavailable(ProviderError),
}

impl<T> ProviderResult<T> {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, ProviderResult::Available(_))
    }

    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            ProviderResult::Available(value) => Some(value),
            ProviderResult::Unavailable(_) => None,
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<&ProviderError> {
        match self {
            ProviderResult::Available(_) => None,
            ProviderResult::Unavailable(reason) => Some(reason),
        }
    }
}

impl<T> From<Result<T, ProviderError>> for ProviderResult<T> {
    fn from(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => ProviderResult::Available(value),
            Err(reason) => ProviderResult::Unavailable(reason),
        }
    }
}

/// A single external data source
#[async_trait]
pub trait Provider<T: Send>: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Fetch data for `location` as of the local date `as_of`. Must not fail
    /// past this boundary.
    async fn fetch(&self, location: &Location, as_of: NaiveDate) -> ProviderResult<T>;
}

/// The adapters the orchestrator fans out to
#[derive(Clone)]
pub struct ProviderSet {
    pub forecast: Arc<dyn Provider<PrimaryForecast>>,
    pub air_quality: Arc<dyn Provider<AirQualityReading>>,
    pub solar: Arc<dyn Provider<SolarReading>>,
    pub sun_times: Arc<dyn Provider<SunTimes>>,
    pub alerts: Arc<dyn Provider<Vec<Alert>>>,
    pub history: Arc<dyn Provider<HistoricalSummary>>,
}

impl ProviderSet {
    /// Build the live HTTP adapters from configuration
    pub fn from_config(config: &EnviroSnapConfig) -> anyhow::Result<Self> {
        let http = HttpClient::new(config.providers.timeout())?;
        let timezone = config.defaults.timezone()?;
        let providers = &config.providers;

        Ok(Self {
            forecast: Arc::new(OpenMeteoForecastProvider::new(
                http.clone(),
                &providers.forecast_base_url,
                timezone,
            )),
            air_quality: Arc::new(OpenAqProvider::new(
                http.clone(),
                &providers.air_quality_base_url,
                providers.air_quality_radius_m,
                providers.air_quality_api_key.clone(),
            )),
            solar: Arc::new(NasaPowerProvider::new(http.clone(), &providers.solar_base_url)),
            sun_times: Arc::new(SunriseSunsetProvider::new(
                http.clone(),
                &providers.sun_times_base_url,
                timezone,
            )),
            alerts: Arc::new(RssAlertProvider::new(http.clone(), &providers.alerts_feed_url)),
            history: Arc::new(OpenMeteoArchiveProvider::new(
                http,
                &providers.history_base_url,
                providers.history_days,
                timezone,
            )),
        })
    }
}

/// Deserialize a JSON body, mapping failures to [`ProviderError::MalformedResponse`]
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::malformed(e.to_string()))
}

/// Value at `index` of an optional series of optional values
pub(crate) fn series_at<T: Copy>(series: &Option<Vec<Option<T>>>, index: usize) -> Option<T> {
    series.as_ref()?.get(index).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_result_from_result() {
        let ok: ProviderResult<u8> = Ok(3).into();
        assert!(ok.is_available());
        assert_eq!(ok.into_option(), Some(3));

        let err: ProviderResult<u8> = Err(ProviderError::malformed("truncated")).into();
        assert!(!err.is_available());
        assert_eq!(
            err.reason().map(ToString::to_string),
            Some("Malformed response: truncated".to_string())
        );
        assert_eq!(err.into_option(), None);
    }

    #[test]
    fn test_series_at() {
        let series = Some(vec![Some(1.0), None]);
        assert_eq!(series_at(&series, 0), Some(1.0));
        assert_eq!(series_at(&series, 1), None);
        assert_eq!(series_at(&series, 5), None);
        assert_eq!(series_at::<f64>(&None, 0), None);
    }

    #[test]
    fn test_parse_json_malformed() {
        let result: Result<serde_json::Value, _> = parse_json("{not json");
        assert!(matches!(result, Err(ProviderError::MalformedResponse(_))));
    }

    #[test]
    fn test_kind_names_are_unique() {
        let mut names: Vec<_> = ProviderKind::ALL.iter().map(ProviderKind::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 6);
    }
}
