//! Primary conditions provider backed by the Open-Meteo forecast API

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::instrument;

use super::{HttpClient, Provider, ProviderError, ProviderKind, ProviderResult, parse_json, series_at};
use crate::models::{DailyPoint, HourlyPoint, Location, PrimaryForecast, RawCurrent};

pub const HOURLY_POINTS: usize = 24;
pub const DAILY_POINTS: usize = 7;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,is_day,precipitation,weather_code,cloud_cover,pressure_msl,wind_speed_10m,wind_direction_10m,visibility";
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation_probability,precipitation,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum,precipitation_probability_max,wind_speed_10m_max,uv_index_max";

/// Current conditions, 24 h hourly and 7 day daily forecast
pub struct OpenMeteoForecastProvider {
    http: HttpClient,
    base_url: String,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentBlock>,
    hourly: Option<HourlyBlock>,
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: String,
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    is_day: Option<u8>,
    precipitation: Option<f64>,
    weather_code: Option<u8>,
    cloud_cover: Option<f64>,
    pressure_msl: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    /// Meters
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Option<Vec<Option<f64>>>,
    relative_humidity_2m: Option<Vec<Option<f64>>>,
    precipitation_probability: Option<Vec<Option<f64>>>,
    precipitation: Option<Vec<Option<f64>>>,
    weather_code: Option<Vec<Option<u8>>>,
    wind_speed_10m: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    weather_code: Option<Vec<Option<u8>>>,
    temperature_2m_max: Option<Vec<Option<f64>>>,
    temperature_2m_min: Option<Vec<Option<f64>>>,
    precipitation_sum: Option<Vec<Option<f64>>>,
    precipitation_probability_max: Option<Vec<Option<f64>>>,
    wind_speed_10m_max: Option<Vec<Option<f64>>>,
    uv_index_max: Option<Vec<Option<f64>>>,
}

fn parse_local_time(value: &str) -> Result<NaiveDateTime, ProviderError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .map_err(|e| ProviderError::malformed(format!("Invalid time '{value}': {e}")))
}

impl OpenMeteoForecastProvider {
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, timezone: Tz) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timezone,
        }
    }

    /// Endpoint for a location. One day of history is requested so the
    /// trailing 24 h of rainfall is available.
    #[must_use]
    pub fn url(&self, location: &Location) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&current={CURRENT_FIELDS}&hourly={HOURLY_FIELDS}&daily={DAILY_FIELDS}&timezone={}&past_days=1&forecast_days={DAILY_POINTS}&wind_speed_unit=ms",
            self.base_url,
            location.latitude,
            location.longitude,
            urlencoding::encode(self.timezone.name())
        )
    }

    /// Parse a forecast body. Current temperature and humidity are required,
    /// as are all three blocks.
    pub fn parse(body: &str) -> Result<PrimaryForecast, ProviderError> {
        let response: ForecastResponse = parse_json(body)?;

        let current = response
            .current
            .ok_or_else(|| ProviderError::malformed("missing current block"))?;
        let hourly = response
            .hourly
            .ok_or_else(|| ProviderError::malformed("missing hourly block"))?;
        let daily = response
            .daily
            .ok_or_else(|| ProviderError::malformed("missing daily block"))?;

        let observed_at = parse_local_time(&current.time)?;
        let current = RawCurrent {
            observed_at,
            temperature: current
                .temperature_2m
                .ok_or_else(|| ProviderError::malformed("current temperature absent"))?,
            humidity: current
                .relative_humidity_2m
                .ok_or_else(|| ProviderError::malformed("current humidity absent"))?,
            precipitation: current.precipitation,
            wind_speed: current.wind_speed_10m,
            wind_direction: current.wind_direction_10m,
            pressure: current.pressure_msl,
            cloud_cover: current.cloud_cover,
            visibility_km: current.visibility.map(|meters| meters / 1000.0),
            is_day: current.is_day.map(|flag| flag == 1),
            condition_code: current.weather_code,
        };

        let (hourly_points, recent_precipitation) = Self::parse_hourly(&hourly, observed_at)?;
        let daily_points = Self::parse_daily(&daily, observed_at.date())?;

        Ok(PrimaryForecast {
            current,
            hourly: hourly_points,
            daily: daily_points,
            recent_precipitation,
        })
    }

    fn parse_hourly(
        hourly: &HourlyBlock,
        observed_at: NaiveDateTime,
    ) -> Result<(Vec<HourlyPoint>, Option<Vec<f64>>), ProviderError> {
        let times = hourly
            .time
            .iter()
            .map(|t| parse_local_time(t))
            .collect::<Result<Vec<_>, _>>()?;

        let hour_start = observed_at
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(observed_at);
        let start = times
            .iter()
            .position(|t| *t >= hour_start)
            .ok_or_else(|| ProviderError::malformed("hourly series ends before current hour"))?;

        let points = times
            .iter()
            .enumerate()
            .skip(start)
            .take(HOURLY_POINTS)
            .map(|(i, time)| HourlyPoint {
                time: *time,
                temperature: series_at(&hourly.temperature_2m, i),
                humidity: series_at(&hourly.relative_humidity_2m, i),
                precipitation_probability: series_at(&hourly.precipitation_probability, i),
                precipitation: series_at(&hourly.precipitation, i),
                wind_speed: series_at(&hourly.wind_speed_10m, i),
                condition_code: series_at(&hourly.weather_code, i),
            })
            .collect();

        // Trailing window ends at the current hour inclusive
        let window_start = (start + 1).saturating_sub(HOURLY_POINTS);
        let recent: Vec<f64> = (window_start..=start)
            .filter_map(|i| series_at(&hourly.precipitation, i))
            .collect();
        let recent_precipitation = if recent.is_empty() { None } else { Some(recent) };

        Ok((points, recent_precipitation))
    }

    fn parse_daily(daily: &DailyBlock, today: NaiveDate) -> Result<Vec<DailyPoint>, ProviderError> {
        let mut points = Vec::with_capacity(DAILY_POINTS);
        for (i, raw) in daily.time.iter().enumerate() {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| ProviderError::malformed(format!("Invalid date '{raw}': {e}")))?;
            if date < today {
                continue;
            }
            points.push(DailyPoint {
                date,
                temperature_max: series_at(&daily.temperature_2m_max, i),
                temperature_min: series_at(&daily.temperature_2m_min, i),
                precipitation_sum: series_at(&daily.precipitation_sum, i),
                precipitation_probability: series_at(&daily.precipitation_probability_max, i),
                wind_speed_max: series_at(&daily.wind_speed_10m_max, i),
                uv_index_max: series_at(&daily.uv_index_max, i),
                condition_code: series_at(&daily.weather_code, i),
            });
            if points.len() == DAILY_POINTS {
                break;
            }
        }
        Ok(points)
    }
}

#[async_trait]
impl Provider<PrimaryForecast> for OpenMeteoForecastProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Forecast
    }

    #[instrument(name = "fetch_forecast", skip(self, location), fields(location = %location.id))]
    async fn fetch(&self, location: &Location, _as_of: NaiveDate) -> ProviderResult<PrimaryForecast> {
        let url = self.url(location);
        self.http
            .get_text(self.kind(), &url, &[])
            .await
            .and_then(|body| Self::parse(&body))
            .into()
    }
}
