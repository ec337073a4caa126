//! Concurrent fan-out to every provider adapter

use chrono::NaiveDate;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::models::{
    AirQualityReading, Alert, HistoricalSummary, Location, PrimaryForecast, SolarReading,
    SourceStatus, SunTimes,
};
use crate::providers::{ProviderKind, ProviderResult, ProviderSet};

/// Outcomes of all six adapters for one location and cycle
#[derive(Debug, Clone)]
pub struct PartialResultsBundle {
    pub location: Location,
    pub as_of: NaiveDate,
    pub forecast: ProviderResult<PrimaryForecast>,
    pub air_quality: ProviderResult<AirQualityReading>,
    pub solar: ProviderResult<SolarReading>,
    pub sun_times: ProviderResult<SunTimes>,
    pub alerts: ProviderResult<Vec<Alert>>,
    pub history: ProviderResult<HistoricalSummary>,
}

impl PartialResultsBundle {
    fn status_of<T>(provider: ProviderKind, result: &ProviderResult<T>) -> SourceStatus {
        SourceStatus {
            provider,
            available: result.is_available(),
            reason: result.reason().map(ToString::to_string),
        }
    }

    /// Availability of each provider, in [`ProviderKind::ALL`] order
    #[must_use]
    pub fn sources(&self) -> Vec<SourceStatus> {
        vec![
            Self::status_of(ProviderKind::Forecast, &self.forecast),
            Self::status_of(ProviderKind::AirQuality, &self.air_quality),
            Self::status_of(ProviderKind::Solar, &self.solar),
            Self::status_of(ProviderKind::SunTimes, &self.sun_times),
            Self::status_of(ProviderKind::Alerts, &self.alerts),
            Self::status_of(ProviderKind::History, &self.history),
        ]
    }

    #[must_use]
    pub fn available_count(&self) -> usize {
        self.sources().iter().filter(|s| s.available).count()
    }
}

/// Issues all adapter calls for a location at once
#[derive(Clone)]
pub struct Orchestrator {
    providers: ProviderSet,
}

impl Orchestrator {
    #[must_use]
    pub fn new(providers: ProviderSet) -> Self {
        Self { providers }
    }

    /// Fetch from every provider concurrently. Each branch settles on its own;
    /// a slow or failing provider never cancels the others.
    #[instrument(skip(self, location), fields(location = %location.id))]
    pub async fn fetch_all(&self, location: &Location, as_of: NaiveDate) -> PartialResultsBundle {
        let start_time = Instant::now();
        let p = &self.providers;

        let (forecast, air_quality, solar, sun_times, alerts, history) = tokio::join!(
            p.forecast.fetch(location, as_of),
            p.air_quality.fetch(location, as_of),
            p.solar.fetch(location, as_of),
            p.sun_times.fetch(location, as_of),
            p.alerts.fetch(location, as_of),
            p.history.fetch(location, as_of),
        );

        let bundle = PartialResultsBundle {
            location: location.clone(),
            as_of,
            forecast,
            air_quality,
            solar,
            sun_times,
            alerts,
            history,
        };

        for status in bundle.sources().iter().filter(|s| !s.available) {
            warn!(
                provider = %status.provider,
                "Provider unavailable: {}",
                status.reason.as_deref().unwrap_or("unknown")
            );
        }

        info!(
            "Fetched {}/{} providers for {} in {:.3}s",
            bundle.available_count(),
            ProviderKind::ALL.len(),
            location.name,
            start_time.elapsed().as_secs_f64()
        );

        bundle
    }
}
