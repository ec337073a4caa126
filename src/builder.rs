//! Aggregate state builder
//!
//! Turns one [`PartialResultsBundle`] into an immutable
//! [`EnvironmentalSnapshot`]. When the primary forecast is unavailable a
//! synthetic stand-in is generated and the snapshot is marked degraded; every
//! derived metric is then computed from the synthetic values so the snapshot
//! stays internally consistent.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use sunrise::{Coordinates, SolarDay, SolarEvent};
use tracing::{debug, warn};

use crate::metrics::{
    CompassPoint, LAKE_WATER_TEMPERATURE_RANGE, PressureTrend, UvCategory, growing_degree_days,
    heat_index, lake_conditions, round1, soil_moisture_index, uv_index_estimate,
};
use crate::models::{
    AgricultureSummary, CurrentConditions, DailyPoint, EnvironmentalSnapshot, Location,
    PrimaryForecast, SolarReading, SunTimes, UvReading, Wind, weather_code_to_description,
};
use crate::orchestrator::PartialResultsBundle;
use crate::providers::ProviderResult;
use crate::providers::alerts::MAX_ALERTS;
use crate::synthetic::{SyntheticSource, synthetic_forecast};

/// Day/night from sunrise and sunset computed for the location's local date
#[must_use]
pub fn is_daytime(location: &Location, now: DateTime<Utc>, local_date: NaiveDate) -> bool {
    let Some(coords) = Coordinates::new(location.latitude, location.longitude) else {
        // Out-of-range coordinates never reach here through the catalog
        return (6..18).contains(&now.hour());
    };
    let solar_day = SolarDay::new(coords, local_date);
    match (
        solar_day.event_time(SolarEvent::Sunrise),
        solar_day.event_time(SolarEvent::Sunset),
    ) {
        (Some(sunrise), Some(sunset)) => now >= sunrise && now < sunset,
        // Polar day or night: the sun stays up through the hemisphere's summer
        _ => (4..=9).contains(&local_date.month()) == (location.latitude >= 0.0),
    }
}

fn daytime_from_sun_times(sun: &SunTimes, now: DateTime<Utc>) -> bool {
    now >= sun.sunrise && now < sun.sunset
}

/// GDD from the solar provider's range, else from today's daily forecast point
fn today_growing_degree_days(
    solar: Option<&SolarReading>,
    daily: &[DailyPoint],
    today: NaiveDate,
) -> Option<f64> {
    let from_solar = solar.and_then(|s| s.temperature_max.zip(s.temperature_min));
    let from_daily = || {
        daily
            .iter()
            .find(|d| d.date == today)
            .and_then(|d| d.temperature_max.zip(d.temperature_min))
    };

    from_solar
        .or_else(from_daily)
        .map(|(max, min)| round1(growing_degree_days(max, min)))
}

/// Builds snapshots for one region time zone
#[derive(Clone)]
pub struct SnapshotBuilder {
    synthetic: Arc<dyn SyntheticSource>,
    timezone: Tz,
}

impl SnapshotBuilder {
    #[must_use]
    pub fn new(synthetic: Arc<dyn SyntheticSource>, timezone: Tz) -> Self {
        Self {
            synthetic,
            timezone,
        }
    }

    /// Merge adapter outcomes with derived metrics into one snapshot.
    ///
    /// Secondary providers never influence the degraded flag; each one that is
    /// unavailable leaves its sub-field empty.
    pub fn build(&self, bundle: PartialResultsBundle, now: DateTime<Utc>) -> EnvironmentalSnapshot {
        let sources = bundle.sources();
        let local_now = now.with_timezone(&self.timezone).naive_local();
        let location = bundle.location;

        let (forecast, degraded) = match bundle.forecast {
            ProviderResult::Available(forecast) => (forecast, false),
            ProviderResult::Unavailable(reason) => {
                warn!(
                    "Primary forecast unavailable for {} ({}), using estimated values",
                    location.name, reason
                );
                (synthetic_forecast(self.synthetic.as_ref(), local_now), true)
            }
        };

        let sun_times = bundle.sun_times.into_option();
        let solar = bundle.solar.into_option();
        let PrimaryForecast {
            current: raw,
            hourly,
            daily,
            recent_precipitation,
        } = forecast;

        let is_day = raw.is_day.unwrap_or_else(|| match &sun_times {
            Some(sun) => daytime_from_sun_times(sun, now),
            None => is_daytime(&location, now, local_now.date()),
        });

        let current = CurrentConditions {
            observed_at: raw.observed_at,
            temperature: raw.temperature,
            feels_like: heat_index(raw.temperature, raw.humidity),
            humidity: raw.humidity,
            precipitation: raw.precipitation,
            wind: Wind {
                speed: raw.wind_speed,
                direction: raw.wind_direction,
                bearing: raw.wind_direction.map(CompassPoint::from_degrees),
            },
            pressure: raw.pressure,
            pressure_trend: raw.pressure.map(PressureTrend::from_pressure),
            cloud_cover: raw.cloud_cover,
            visibility_km: raw.visibility_km,
            is_day,
            condition_code: raw.condition_code,
            description: raw
                .condition_code
                .map_or("Unknown", weather_code_to_description)
                .to_string(),
        };

        let uv_index = uv_index_estimate(
            location.latitude,
            raw.observed_at.hour(),
            raw.observed_at.month0(),
        );
        let uv = UvReading {
            index: uv_index,
            category: UvCategory::from_index(uv_index),
        };

        let agriculture = AgricultureSummary {
            soil_moisture_index: soil_moisture_index(recent_precipitation.as_deref()),
            growing_degree_days: today_growing_degree_days(
                solar.as_ref(),
                &daily,
                raw.observed_at.date(),
            ),
            solar_radiation: solar.as_ref().and_then(|s| s.solar_radiation),
        };

        // The lake heuristic needs a number; an unreported rainfall series counts as dry
        let recent_rain: f64 = recent_precipitation.iter().flatten().sum();
        let lake = lake_conditions(
            recent_rain,
            raw.wind_speed.unwrap_or(0.0),
            self.synthetic.sample(LAKE_WATER_TEMPERATURE_RANGE),
        );

        let mut alerts = bundle.alerts.into_option().unwrap_or_default();
        alerts.truncate(MAX_ALERTS);

        debug!(
            location = %location.id,
            degraded,
            "Built snapshot: {:.1}°C, UV {}, {} alerts",
            current.temperature,
            uv.index,
            alerts.len()
        );

        EnvironmentalSnapshot {
            location,
            current,
            hourly,
            daily,
            air_quality: bundle.air_quality.into_option(),
            uv,
            sun_times,
            agriculture,
            history: bundle.history.into_option(),
            lake,
            alerts,
            sources,
            degraded,
            created_at: now,
        }
    }
}
