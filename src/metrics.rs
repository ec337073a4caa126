//! Derived environmental metrics
//!
//! Pure, deterministic calculators that turn raw provider fields into the
//! secondary values published in a snapshot. Nothing in here performs I/O or
//! draws random numbers; callers pass sampled values in explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this temperature (°C) the heat index equals the air temperature
pub const HEAT_INDEX_MIN_TEMPERATURE: f64 = 27.0;
/// Below this relative humidity (%) the heat index equals the air temperature
pub const HEAT_INDEX_MIN_HUMIDITY: f64 = 40.0;

/// Pressure above which the trend is reported as rising, in hPa
pub const STANDARD_PRESSURE_HPA: f64 = 1013.0;

/// Number of trailing hourly values that feed the soil-moisture index
pub const SOIL_MOISTURE_WINDOW_HOURS: usize = 24;

/// Base temperature for growing-degree-days, °C
pub const GDD_BASE_TEMPERATURE: f64 = 10.0;

/// Round to one decimal place
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Apparent temperature in °C using the Rothfusz regression (Celsius form).
///
/// Returns `temperature` unchanged when it is below 27 °C or humidity is below
/// 40 %, where the regression is not valid.
#[must_use]
pub fn heat_index(temperature: f64, humidity: f64) -> f64 {
    if temperature < HEAT_INDEX_MIN_TEMPERATURE || humidity < HEAT_INDEX_MIN_HUMIDITY {
        return temperature;
    }

    let t = temperature;
    let r = humidity;
    let index = -8.784_694_755_56 + 1.611_394_11 * t + 2.338_548_838_89 * r
        - 0.146_116_05 * t * r
        - 0.012_308_094 * t * t
        - 0.016_424_827_777_8 * r * r
        + 0.002_211_732 * t * t * r
        + 0.000_725_46 * t * r * r
        - 0.000_003_582 * t * t * r * r;

    round1(index)
}

/// UV exposure band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UvCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvCategory {
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        match index {
            0..=2 => UvCategory::Low,
            3..=5 => UvCategory::Moderate,
            6..=7 => UvCategory::High,
            8..=10 => UvCategory::VeryHigh,
            _ => UvCategory::Extreme,
        }
    }
}

impl fmt::Display for UvCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UvCategory::Low => write!(f, "Low"),
            UvCategory::Moderate => write!(f, "Moderate"),
            UvCategory::High => write!(f, "High"),
            UvCategory::VeryHigh => write!(f, "Very High"),
            UvCategory::Extreme => write!(f, "Extreme"),
        }
    }
}

/// Baseline UV index for a latitude: 8 inside the tropics, 5 elsewhere
#[must_use]
pub fn uv_baseline(latitude: f64) -> i32 {
    if latitude.abs() <= 23.44 { 8 } else { 5 }
}

/// Estimate the UV index from time of day and season.
///
/// `hour` is the local hour (0-23) and `month0` the zero-based month (0 = January).
/// The result is clamped to 0..=11 and is always 0 outside 06:00-18:00.
#[must_use]
pub fn uv_index_estimate(latitude: f64, hour: u32, month0: u32) -> u8 {
    if !(6..18).contains(&hour) {
        return 0;
    }

    let mut index = uv_baseline(latitude);
    if (10..=14).contains(&hour) {
        index += 2;
    } else {
        index -= 2;
    }
    if (2..=5).contains(&month0) {
        index += 1;
    }

    index.clamp(0, 11) as u8
}

/// Map trailing hourly rainfall onto a 0-100 soil-moisture index.
///
/// Only the most recent 24 values are summed. Returns 50 when no series is
/// available, which is distinct from a dry series.
#[must_use]
pub fn soil_moisture_index(hourly_precipitation: Option<&[f64]>) -> u8 {
    let Some(series) = hourly_precipitation else {
        return 50;
    };

    let start = series.len().saturating_sub(SOIL_MOISTURE_WINDOW_HOURS);
    let cumulative: f64 = series[start..].iter().sum();

    let index: i32 = if cumulative > 20.0 {
        85
    } else if cumulative > 10.0 {
        70
    } else if cumulative > 5.0 {
        60
    } else if cumulative > 0.0 {
        55
    } else {
        45
    };

    index.clamp(0, 100) as u8
}

/// Growing-degree-days for one day with base 10 °C
#[must_use]
pub fn growing_degree_days(temperature_max: f64, temperature_min: f64) -> f64 {
    ((temperature_max + temperature_min) / 2.0 - GDD_BASE_TEMPERATURE).max(0.0)
}

/// Air quality band derived from PM2.5 concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
}

impl AqiCategory {
    /// Classify a PM2.5 concentration in µg/m³
    #[must_use]
    pub fn from_pm25(pm25: f64) -> Self {
        match pm25 {
            v if v <= 50.0 => AqiCategory::Good,
            v if v <= 100.0 => AqiCategory::Moderate,
            v if v <= 150.0 => AqiCategory::UnhealthyForSensitiveGroups,
            v if v <= 200.0 => AqiCategory::Unhealthy,
            _ => AqiCategory::VeryUnhealthy,
        }
    }

    /// Severity color token for presentation
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "green",
            AqiCategory::Moderate => "yellow",
            AqiCategory::UnhealthyForSensitiveGroups => "orange",
            AqiCategory::Unhealthy => "red",
            AqiCategory::VeryUnhealthy => "purple",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AqiCategory::Good => write!(f, "Good"),
            AqiCategory::Moderate => write!(f, "Moderate"),
            AqiCategory::UnhealthyForSensitiveGroups => {
                write!(f, "Unhealthy for Sensitive Groups")
            }
            AqiCategory::Unhealthy => write!(f, "Unhealthy"),
            AqiCategory::VeryUnhealthy => write!(f, "Very Unhealthy"),
        }
    }
}

/// Eight-point compass bearing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    const POINTS: [CompassPoint; 8] = [
        CompassPoint::N,
        CompassPoint::NE,
        CompassPoint::E,
        CompassPoint::SE,
        CompassPoint::S,
        CompassPoint::SW,
        CompassPoint::W,
        CompassPoint::NW,
    ];

    /// Bucket a direction in degrees into 45°-wide sectors centered on each point
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        let sector = ((normalized + 22.5) / 45.0).floor() as usize % 8;
        Self::POINTS[sector]
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Pressure tendency from a single reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureTrend {
    Rising,
    Falling,
}

impl PressureTrend {
    /// Threshold against standard pressure; this is not a rate of change
    #[must_use]
    pub fn from_pressure(pressure_hpa: f64) -> Self {
        if pressure_hpa > STANDARD_PRESSURE_HPA {
            PressureTrend::Rising
        } else {
            PressureTrend::Falling
        }
    }
}

impl fmt::Display for PressureTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressureTrend::Rising => write!(f, "Rising"),
            PressureTrend::Falling => write!(f, "Falling"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterLevel {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FishingQuality {
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyLevel {
    Safe,
    Caution,
    HighCaution,
}

/// Lake conditions derived from rainfall and wind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LakeConditions {
    pub water_level: WaterLevel,
    pub fishing: FishingQuality,
    pub safety: SafetyLevel,
    /// Estimated wave height in meters
    pub wave_height: f64,
    /// Water temperature in °C. Illustrative only, no lake sensor feeds it.
    pub water_temperature: f64,
}

/// Range the illustrative water temperature is drawn from, °C
pub const LAKE_WATER_TEMPERATURE_RANGE: std::ops::Range<f64> = 28.0..32.0;

/// Lake-condition heuristic.
///
/// `recent_precipitation` is rainfall in mm over the trailing window and
/// `wind_speed` is in m/s. `water_temperature` is passed in by the caller.
#[must_use]
pub fn lake_conditions(
    recent_precipitation: f64,
    wind_speed: f64,
    water_temperature: f64,
) -> LakeConditions {
    let water_level = if recent_precipitation > 10.0 {
        WaterLevel::High
    } else {
        WaterLevel::Normal
    };

    let fishing = if recent_precipitation > 10.0 || wind_speed > 8.0 {
        FishingQuality::Poor
    } else if recent_precipitation > 5.0 {
        FishingQuality::Fair
    } else {
        FishingQuality::Good
    };

    let safety = match fishing {
        FishingQuality::Poor => SafetyLevel::HighCaution,
        FishingQuality::Fair => SafetyLevel::Caution,
        FishingQuality::Good => SafetyLevel::Safe,
    };

    LakeConditions {
        water_level,
        fishing,
        safety,
        wave_height: round1(wind_speed / 5.0),
        water_temperature: round1(water_temperature),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(26.9, 90.0)]
    #[case(20.0, 100.0)]
    #[case(35.0, 39.9)]
    #[case(-5.0, 10.0)]
    fn test_heat_index_identity_below_thresholds(#[case] t: f64, #[case] rh: f64) {
        assert_eq!(heat_index(t, rh), t);
    }

    #[test]
    fn test_heat_index_calamba_reading() {
        let hi = heat_index(30.0, 85.0);
        assert!((hi - 39.1).abs() < 0.05, "got {hi}");
    }

    #[test]
    fn test_heat_index_rises_with_humidity() {
        assert!(heat_index(32.0, 80.0) > heat_index(32.0, 50.0));
        assert!(heat_index(32.0, 50.0) > 32.0);
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(18)]
    #[case(23)]
    fn test_uv_zero_outside_daylight(#[case] hour: u32) {
        for month in 0..12 {
            assert_eq!(uv_index_estimate(14.2, hour, month), 0);
        }
    }

    #[test]
    fn test_uv_midday_at_least_baseline() {
        for hour in 10..=14 {
            for month in 0..12 {
                let uv = uv_index_estimate(14.2, hour, month);
                assert!(i32::from(uv) >= uv_baseline(14.2), "hour {hour} month {month}");
            }
        }
    }

    #[rstest]
    #[case(12, 0, 10)]
    #[case(12, 3, 11)]
    #[case(7, 0, 6)]
    #[case(16, 4, 7)]
    fn test_uv_values(#[case] hour: u32, #[case] month0: u32, #[case] expected: u8) {
        assert_eq!(uv_index_estimate(14.2, hour, month0), expected);
    }

    #[test]
    fn test_uv_non_tropical_baseline() {
        assert_eq!(uv_index_estimate(52.5, 12, 0), 7);
    }

    #[rstest]
    #[case(0, UvCategory::Low)]
    #[case(2, UvCategory::Low)]
    #[case(5, UvCategory::Moderate)]
    #[case(7, UvCategory::High)]
    #[case(10, UvCategory::VeryHigh)]
    #[case(11, UvCategory::Extreme)]
    fn test_uv_category(#[case] index: u8, #[case] expected: UvCategory) {
        assert_eq!(UvCategory::from_index(index), expected);
    }

    #[rstest]
    #[case(vec![], 45)]
    #[case(vec![0.0; 24], 45)]
    #[case(vec![0.2], 55)]
    #[case(vec![3.0, 3.0], 60)]
    #[case(vec![6.0, 6.0], 70)]
    #[case(vec![10.0, 10.5], 85)]
    fn test_soil_moisture_bands(#[case] series: Vec<f64>, #[case] expected: u8) {
        assert_eq!(soil_moisture_index(Some(&series)), expected);
    }

    #[test]
    fn test_soil_moisture_uses_latest_window_only() {
        let mut series = vec![50.0];
        series.extend(std::iter::repeat_n(0.0, 24));
        assert_eq!(soil_moisture_index(Some(&series)), 45);
    }

    #[test]
    fn test_soil_moisture_without_series() {
        assert_eq!(soil_moisture_index(None), 50);
    }

    #[test]
    fn test_growing_degree_days() {
        assert_eq!(growing_degree_days(32.0, 24.0), 18.0);
        assert_eq!(growing_degree_days(12.0, 4.0), 0.0);
    }

    #[test]
    fn test_aqi_monotonic_across_boundaries() {
        let samples = [
            0.0, 50.0, 50.1, 100.0, 100.1, 120.0, 150.0, 150.1, 200.0, 200.1, 500.0,
        ];
        let categories: Vec<_> = samples.iter().map(|&v| AqiCategory::from_pm25(v)).collect();
        assert!(categories.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            AqiCategory::from_pm25(120.0),
            AqiCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(
            AqiCategory::from_pm25(120.0).to_string(),
            "Unhealthy for Sensitive Groups"
        );
        assert_eq!(AqiCategory::from_pm25(250.0).color(), "purple");
    }

    #[rstest]
    #[case(0.0, CompassPoint::N)]
    #[case(22.4, CompassPoint::N)]
    #[case(22.5, CompassPoint::NE)]
    #[case(90.0, CompassPoint::E)]
    #[case(180.0, CompassPoint::S)]
    #[case(225.0, CompassPoint::SW)]
    #[case(337.5, CompassPoint::N)]
    #[case(337.4, CompassPoint::NW)]
    #[case(360.0, CompassPoint::N)]
    #[case(-45.0, CompassPoint::NW)]
    fn test_compass_bearing(#[case] degrees: f64, #[case] expected: CompassPoint) {
        assert_eq!(CompassPoint::from_degrees(degrees), expected);
    }

    #[test]
    fn test_pressure_trend_threshold() {
        assert_eq!(PressureTrend::from_pressure(1013.0), PressureTrend::Falling);
        assert_eq!(PressureTrend::from_pressure(1013.1), PressureTrend::Rising);
    }

    #[test]
    fn test_lake_conditions() {
        let calm = lake_conditions(0.0, 2.0, 29.44);
        assert_eq!(calm.water_level, WaterLevel::Normal);
        assert_eq!(calm.fishing, FishingQuality::Good);
        assert_eq!(calm.safety, SafetyLevel::Safe);
        assert_eq!(calm.wave_height, 0.4);
        assert_eq!(calm.water_temperature, 29.4);

        let showery = lake_conditions(7.0, 2.0, 30.0);
        assert_eq!(showery.fishing, FishingQuality::Fair);
        assert_eq!(showery.safety, SafetyLevel::Caution);

        let windy = lake_conditions(0.0, 9.0, 30.0);
        assert_eq!(windy.water_level, WaterLevel::Normal);
        assert_eq!(windy.fishing, FishingQuality::Poor);
        assert_eq!(windy.safety, SafetyLevel::HighCaution);

        let flooded = lake_conditions(12.0, 1.0, 30.0);
        assert_eq!(flooded.water_level, WaterLevel::High);
        assert_eq!(flooded.fishing, FishingQuality::Poor);
    }
}
