//! Synthetic data generation
//!
//! All randomness in the engine goes through [`SyntheticSource`]. It feeds the
//! degraded fallback used when the primary forecast is unavailable, and the
//! illustrative lake water temperature.

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::RngExt;
use std::ops::Range;

use crate::metrics::round1;
use crate::models::{DailyPoint, HourlyPoint, PrimaryForecast, RawCurrent};

pub const TEMPERATURE_RANGE: Range<f64> = 26.0..33.0;
pub const HUMIDITY_RANGE: Range<f64> = 60.0..90.0;
pub const WIND_SPEED_RANGE: Range<f64> = 0.5..6.0;
pub const WIND_DIRECTION_RANGE: Range<f64> = 0.0..360.0;
pub const PRESSURE_RANGE: Range<f64> = 1005.0..1018.0;
pub const CLOUD_COVER_RANGE: Range<f64> = 20.0..80.0;

const PRECIPITATION_RANGE: Range<f64> = 0.0..1.5;
const PRECIPITATION_PROBABILITY_RANGE: Range<f64> = 0.0..60.0;
const VISIBILITY_KM_RANGE: Range<f64> = 8.0..10.0;
const DAILY_MAX_RANGE: Range<f64> = 29.0..34.0;
const DAILY_MIN_RANGE: Range<f64> = 22.0..26.0;
const DAILY_PRECIPITATION_RANGE: Range<f64> = 0.0..15.0;
const DAILY_WIND_RANGE: Range<f64> = 2.0..8.0;
const DAILY_UV_RANGE: Range<f64> = 6.0..11.0;

/// Source of values drawn uniformly from a half-open range
pub trait SyntheticSource: Send + Sync {
    fn sample(&self, range: Range<f64>) -> f64;
}

/// Thread-local RNG backed source used in production
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSource;

impl SyntheticSource for RandomSource {
    fn sample(&self, range: Range<f64>) -> f64 {
        if range.is_empty() {
            return range.start;
        }
        rand::rng().random_range(range)
    }
}

/// Deterministic source returning the same relative position in every range
#[derive(Debug, Clone, Copy)]
pub struct FixedSource {
    fraction: f64,
}

impl FixedSource {
    /// `fraction` is clamped to `[0, 1)`
    #[must_use]
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 0.999_999),
        }
    }

    #[must_use]
    pub fn midpoint() -> Self {
        Self::new(0.5)
    }
}

impl SyntheticSource for FixedSource {
    fn sample(&self, range: Range<f64>) -> f64 {
        range.start + (range.end - range.start) * self.fraction
    }
}

/// WMO code matching a cloud-cover percentage
fn condition_for_cloud_cover(cloud_cover: f64) -> u8 {
    if cloud_cover < 30.0 {
        1
    } else if cloud_cover < 60.0 {
        2
    } else {
        3
    }
}

/// Build a complete stand-in forecast starting at `observed_at` (local time).
///
/// The day/night flag is left unset so the caller derives it astronomically.
/// The synthetic hourly precipitation doubles as the trailing rainfall series.
pub fn synthetic_forecast(source: &dyn SyntheticSource, observed_at: NaiveDateTime) -> PrimaryForecast {
    let sample = |range: Range<f64>| round1(source.sample(range));

    let cloud_cover = sample(CLOUD_COVER_RANGE);
    let current = RawCurrent {
        observed_at,
        temperature: sample(TEMPERATURE_RANGE),
        humidity: sample(HUMIDITY_RANGE).round(),
        precipitation: Some(sample(PRECIPITATION_RANGE)),
        wind_speed: Some(sample(WIND_SPEED_RANGE)),
        wind_direction: Some(source.sample(WIND_DIRECTION_RANGE).round()),
        pressure: Some(sample(PRESSURE_RANGE)),
        cloud_cover: Some(cloud_cover.round()),
        visibility_km: Some(sample(VISIBILITY_KM_RANGE)),
        is_day: None,
        condition_code: Some(condition_for_cloud_cover(cloud_cover)),
    };

    let hour_start = observed_at
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(observed_at);
    let hourly: Vec<HourlyPoint> = (0..crate::providers::forecast::HOURLY_POINTS as i64)
        .map(|offset| HourlyPoint {
            time: hour_start + Duration::hours(offset),
            temperature: Some(sample(TEMPERATURE_RANGE)),
            humidity: Some(sample(HUMIDITY_RANGE).round()),
            precipitation_probability: Some(sample(PRECIPITATION_PROBABILITY_RANGE).round()),
            precipitation: Some(sample(PRECIPITATION_RANGE)),
            wind_speed: Some(sample(WIND_SPEED_RANGE)),
            condition_code: Some(condition_for_cloud_cover(source.sample(CLOUD_COVER_RANGE))),
        })
        .collect();

    let today = observed_at.date();
    let daily = (0..crate::providers::forecast::DAILY_POINTS as i64)
        .map(|offset| DailyPoint {
            date: today + Duration::days(offset),
            temperature_max: Some(sample(DAILY_MAX_RANGE)),
            temperature_min: Some(sample(DAILY_MIN_RANGE)),
            precipitation_sum: Some(sample(DAILY_PRECIPITATION_RANGE)),
            precipitation_probability: Some(sample(PRECIPITATION_PROBABILITY_RANGE).round()),
            wind_speed_max: Some(sample(DAILY_WIND_RANGE)),
            uv_index_max: Some(sample(DAILY_UV_RANGE).round()),
            condition_code: Some(condition_for_cloud_cover(source.sample(CLOUD_COVER_RANGE))),
        })
        .collect();

    let recent_precipitation = hourly.iter().filter_map(|p| p.precipitation).collect();

    PrimaryForecast {
        current,
        hourly,
        daily,
        recent_precipitation: Some(recent_precipitation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 19)
            .unwrap()
            .and_hms_opt(12, 34, 0)
            .unwrap()
    }

    #[test]
    fn test_fixed_source_is_deterministic() {
        let source = FixedSource::midpoint();
        assert_eq!(source.sample(26.0..33.0), 29.5);
        assert_eq!(FixedSource::new(0.0).sample(1005.0..1018.0), 1005.0);
        assert!(FixedSource::new(2.0).sample(0.0..1.0) < 1.0);
    }

    #[test]
    fn test_random_source_stays_in_range() {
        let source = RandomSource;
        for _ in 0..200 {
            let value = source.sample(TEMPERATURE_RANGE);
            assert!(TEMPERATURE_RANGE.contains(&value));
        }
        assert_eq!(source.sample(5.0..5.0), 5.0);
    }

    #[test]
    fn test_synthetic_forecast_shape() {
        let forecast = synthetic_forecast(&FixedSource::midpoint(), noon());
        assert_eq!(forecast.hourly.len(), 24);
        assert_eq!(forecast.daily.len(), 7);
        assert_eq!(forecast.hourly[0].time.minute(), 0);
        assert_eq!(forecast.daily[0].date, noon().date());
        assert_eq!(forecast.current.temperature, 29.5);
        assert_eq!(forecast.current.pressure, Some(1011.5));
        assert_eq!(forecast.current.is_day, None);
        assert_eq!(forecast.recent_precipitation.as_ref().map(Vec::len), Some(24));
    }

    #[test]
    fn test_synthetic_values_within_ranges() {
        let forecast = synthetic_forecast(&RandomSource, noon());
        let current = &forecast.current;
        assert!((26.0..=33.0).contains(&current.temperature));
        assert!((60.0..=90.0).contains(&current.humidity));
        assert!(current.wind_speed.is_some_and(|w| (0.5..=6.0).contains(&w)));
        assert!(current.wind_direction.is_some_and(|d| (0.0..=360.0).contains(&d)));
        assert!(current.pressure.is_some_and(|p| (1005.0..=1018.0).contains(&p)));
        assert!(current.cloud_cover.is_some_and(|c| (20.0..=80.0).contains(&c)));
    }
}
