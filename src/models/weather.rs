//! Weather data model and display methods

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::metrics::{CompassPoint, PressureTrend};

/// Current conditions as published in a snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Local observation time
    pub observed_at: NaiveDateTime,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Heat index in Celsius
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: f64,
    /// Precipitation in mm over the last hour
    pub precipitation: Option<f64>,
    pub wind: Wind,
    /// Sea-level pressure in hPa
    pub pressure: Option<f64>,
    pub pressure_trend: Option<PressureTrend>,
    /// Cloud cover percentage (0-100)
    pub cloud_cover: Option<f64>,
    /// Visibility in kilometers
    pub visibility_km: Option<f64>,
    pub is_day: bool,
    /// WMO weather code
    pub condition_code: Option<u8>,
    pub description: String,
}

/// Wind vector
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Wind {
    /// Wind speed in m/s
    pub speed: Option<f64>,
    /// Direction the wind blows from, degrees (0-360, where 0/360 is North)
    pub direction: Option<f64>,
    pub bearing: Option<CompassPoint>,
}

/// One point of the hourly forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    /// Precipitation probability (0-100%)
    pub precipitation_probability: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
    pub condition_code: Option<u8>,
}

/// One point of the daily forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation_sum: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub uv_index_max: Option<f64>,
    pub condition_code: Option<u8>,
}

/// Raw current block returned by the forecast provider, before derived metrics
#[derive(Debug, Clone, PartialEq)]
pub struct RawCurrent {
    pub observed_at: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub pressure: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub visibility_km: Option<f64>,
    pub is_day: Option<bool>,
    pub condition_code: Option<u8>,
}

/// Everything the primary forecast provider yields for one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryForecast {
    pub current: RawCurrent,
    /// 24 points starting at the current hour
    pub hourly: Vec<HourlyPoint>,
    /// 7 points starting today
    pub daily: Vec<DailyPoint>,
    /// Hourly precipitation over the trailing 24 hours; `None` when not reported
    pub recent_precipitation: Option<Vec<f64>>,
}

impl CurrentConditions {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C (feels like {:.1}°C)", self.temperature, self.feels_like)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        match (self.wind.speed, self.wind.bearing) {
            (Some(speed), Some(bearing)) => format!("{speed:.1} m/s {bearing}"),
            (Some(speed), None) => format!("{speed:.1} m/s"),
            _ => "--".to_string(),
        }
    }

    /// Format atmospheric pressure with unit
    #[must_use]
    pub fn format_pressure(&self) -> String {
        match (self.pressure, self.pressure_trend) {
            (Some(pressure), Some(trend)) => format!("{pressure:.1} hPa ({trend})"),
            (Some(pressure), None) => format!("{pressure:.1} hPa"),
            _ => "--".to_string(),
        }
    }
}

/// Convert WMO weather code to human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
