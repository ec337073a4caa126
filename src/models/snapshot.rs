//! The assembled environmental snapshot and its secondary readings

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CurrentConditions, DailyPoint, HourlyPoint, Location};
use crate::metrics::{AqiCategory, LakeConditions, UvCategory};
use crate::providers::ProviderKind;

/// Nearest-station air quality reading
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQualityReading {
    pub station: String,
    /// Distance from the selected location in km
    pub distance_km: f64,
    /// PM2.5 in µg/m³, `None` if the station did not report it
    pub pm25: Option<f64>,
    pub category: Option<AqiCategory>,
    pub measured_at: Option<DateTime<Utc>>,
}

/// Estimated UV exposure
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct UvReading {
    pub index: u8,
    pub category: UvCategory,
}

/// Sun times in the region's local offset
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SunTimes {
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
    pub solar_noon: DateTime<FixedOffset>,
    /// Length of day in seconds
    pub day_length_seconds: Option<i64>,
}

/// Daily solar/agricultural point data, keyed by the request date
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SolarReading {
    pub date: NaiveDate,
    /// All-sky surface shortwave irradiance, kWh/m²/day
    pub solar_radiation: Option<f64>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    /// Corrected precipitation, mm/day
    pub precipitation: Option<f64>,
    /// Relative humidity at 2 m, %
    pub humidity: Option<f64>,
}

/// Agricultural indicators published with each snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AgricultureSummary {
    /// Soil-moisture index 0-100
    pub soil_moisture_index: u8,
    /// Growing-degree-days for today, `None` without a temperature range
    pub growing_degree_days: Option<f64>,
    /// Solar radiation from the solar provider, kWh/m²/day
    pub solar_radiation: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum HistoricalTrend {
    Warming,
    Cooling,
    Stable,
}

impl fmt::Display for HistoricalTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoricalTrend::Warming => write!(f, "Warming"),
            HistoricalTrend::Cooling => write!(f, "Cooling"),
            HistoricalTrend::Stable => write!(f, "Stable"),
        }
    }
}

/// Summary of the trailing archive window
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoricalSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Days that reported a maximum temperature
    pub days_observed: usize,
    pub average_max_temperature: Option<f64>,
    pub total_precipitation: Option<f64>,
    pub rainy_days: usize,
    /// Peak daily maximum wind speed, m/s
    pub peak_wind_speed: Option<f64>,
    pub trend: HistoricalTrend,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    High,
    Moderate,
}

/// One entry of the official alert feed
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    /// Description with markup removed
    pub description: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub severity: AlertSeverity,
}

/// Outcome of one provider for the cycle that produced a snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SourceStatus {
    pub provider: ProviderKind,
    pub available: bool,
    pub reason: Option<String>,
}

/// One immutable, fully assembled environmental state for a location and cycle
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnvironmentalSnapshot {
    pub location: Location,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
    pub air_quality: Option<AirQualityReading>,
    pub uv: UvReading,
    pub sun_times: Option<SunTimes>,
    pub agriculture: AgricultureSummary,
    pub history: Option<HistoricalSummary>,
    pub lake: LakeConditions,
    /// Most recent first, at most five
    pub alerts: Vec<Alert>,
    pub sources: Vec<SourceStatus>,
    /// Primary provider failed and synthetic values were substituted
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
}

impl EnvironmentalSnapshot {
    /// Whether a given provider contributed to this snapshot
    #[must_use]
    pub fn is_available(&self, provider: ProviderKind) -> bool {
        self.sources
            .iter()
            .any(|status| status.provider == provider && status.available)
    }
}

impl fmt::Display for EnvironmentalSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "📍 {} ({})",
            self.location.name,
            self.location.format_coordinates()
        )?;
        if self.degraded {
            writeln!(f, "   ⚠️  Live weather unavailable, showing estimated values")?;
        }
        writeln!(
            f,
            "   🌡️  {} · {:.0}% humidity · {}",
            self.current.format_temperature(),
            self.current.humidity,
            self.current.description
        )?;
        writeln!(
            f,
            "   💨 {} · {}",
            self.current.format_wind(),
            self.current.format_pressure()
        )?;
        writeln!(f, "   ☀️  UV {} ({})", self.uv.index, self.uv.category)?;

        match self.air_quality.as_ref().and_then(|aq| aq.pm25.zip(aq.category)) {
            Some((pm25, category)) => writeln!(f, "   🫁 PM2.5 {pm25:.1} µg/m³ ({category})")?,
            None => writeln!(f, "   🫁 Air quality: --")?,
        }

        if let Some(sun) = &self.sun_times {
            writeln!(
                f,
                "   🌅 {} · 🌇 {}",
                sun.sunrise.format("%H:%M"),
                sun.sunset.format("%H:%M")
            )?;
        }

        writeln!(
            f,
            "   🌱 Soil moisture {} · GDD {}",
            self.agriculture.soil_moisture_index,
            self.agriculture
                .growing_degree_days
                .map_or("--".to_string(), |gdd| format!("{gdd:.1}"))
        )?;

        if let Some(history) = &self.history {
            writeln!(
                f,
                "   📈 30 days: {} rainy days, trend {}",
                history.rainy_days, history.trend
            )?;
        }

        writeln!(
            f,
            "   🎣 Lake: {:?} water, {:?} fishing, waves {:.1} m",
            self.lake.water_level, self.lake.fishing, self.lake.wave_height
        )?;

        for alert in &self.alerts {
            writeln!(f, "   🚨 [{:?}] {}", alert.severity, alert.title)?;
        }
        Ok(())
    }
}
