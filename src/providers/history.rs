//! Trailing-window climate summary from the Open-Meteo archive API

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::instrument;

use super::{HttpClient, Provider, ProviderError, ProviderKind, ProviderResult, parse_json, series_at};
use crate::metrics::round1;
use crate::models::{HistoricalSummary, HistoricalTrend, Location};

/// Daily precipitation at or above this (mm) counts as a rainy day
pub const RAINY_DAY_THRESHOLD_MM: f64 = 1.0;
/// Minimum change in mean max temperature (°C) between window halves to report a trend
pub const TREND_THRESHOLD: f64 = 0.5;

pub struct OpenMeteoArchiveProvider {
    http: HttpClient,
    base_url: String,
    window_days: u32,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<ArchiveDaily>,
}

#[derive(Debug, Deserialize)]
struct ArchiveDaily {
    time: Vec<String>,
    temperature_2m_max: Option<Vec<Option<f64>>>,
    precipitation_sum: Option<Vec<Option<f64>>>,
    wind_speed_10m_max: Option<Vec<Option<f64>>>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Classify the window by comparing the mean of its first and second halves
#[must_use]
pub fn temperature_trend(max_temperatures: &[f64]) -> HistoricalTrend {
    if max_temperatures.len() < 2 {
        return HistoricalTrend::Stable;
    }
    let (first, second) = max_temperatures.split_at(max_temperatures.len() / 2);
    match (mean(first), mean(second)) {
        (Some(a), Some(b)) if b - a > TREND_THRESHOLD => HistoricalTrend::Warming,
        (Some(a), Some(b)) if a - b > TREND_THRESHOLD => HistoricalTrend::Cooling,
        _ => HistoricalTrend::Stable,
    }
}

impl OpenMeteoArchiveProvider {
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, window_days: u32, timezone: Tz) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            window_days: window_days.max(1),
            timezone,
        }
    }

    /// Inclusive date range of the window ending the day before `as_of`
    #[must_use]
    pub fn window(&self, as_of: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = as_of - Duration::days(1);
        let start = as_of - Duration::days(i64::from(self.window_days));
        (start, end)
    }

    #[must_use]
    pub fn url(&self, location: &Location, as_of: NaiveDate) -> String {
        let (start, end) = self.window(as_of);
        format!(
            "{}/archive?latitude={}&longitude={}&start_date={}&end_date={}&daily=temperature_2m_max,precipitation_sum,wind_speed_10m_max&timezone={}&wind_speed_unit=ms",
            self.base_url,
            location.latitude,
            location.longitude,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            urlencoding::encode(self.timezone.name())
        )
    }

    /// Summarize the archive body over `[start, end]`
    pub fn parse(
        body: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalSummary, ProviderError> {
        let response: ArchiveResponse = parse_json(body)?;
        let daily = response
            .daily
            .ok_or_else(|| ProviderError::malformed("missing daily block"))?;
        if daily.time.is_empty() {
            return Err(ProviderError::no_data("archive window is empty"));
        }

        let count = daily.time.len();
        let max_temperatures: Vec<f64> = (0..count)
            .filter_map(|i| series_at(&daily.temperature_2m_max, i))
            .collect();
        let precipitation: Vec<f64> = (0..count)
            .filter_map(|i| series_at(&daily.precipitation_sum, i))
            .collect();
        let winds: Vec<f64> = (0..count)
            .filter_map(|i| series_at(&daily.wind_speed_10m_max, i))
            .collect();

        let total_precipitation = if precipitation.is_empty() {
            None
        } else {
            Some(round1(precipitation.iter().sum()))
        };

        Ok(HistoricalSummary {
            start,
            end,
            days_observed: max_temperatures.len(),
            average_max_temperature: mean(&max_temperatures).map(round1),
            total_precipitation,
            rainy_days: precipitation
                .iter()
                .filter(|mm| **mm >= RAINY_DAY_THRESHOLD_MM)
                .count(),
            peak_wind_speed: winds.iter().copied().reduce(f64::max).map(round1),
            trend: temperature_trend(&max_temperatures),
        })
    }
}

#[async_trait]
impl Provider<HistoricalSummary> for OpenMeteoArchiveProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::History
    }

    #[instrument(name = "fetch_history", skip(self, location), fields(location = %location.id))]
    async fn fetch(&self, location: &Location, as_of: NaiveDate) -> ProviderResult<HistoricalSummary> {
        let url = self.url(location, as_of);
        let (start, end) = self.window(as_of);
        self.http
            .get_text(self.kind(), &url, &[])
            .await
            .and_then(|body| Self::parse(&body, start, end))
            .into()
    }
}
