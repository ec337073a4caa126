//! Sunrise, sunset and solar noon from sunrise-sunset.org

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::instrument;

use super::{HttpClient, Provider, ProviderError, ProviderKind, ProviderResult, parse_json};
use crate::models::{Location, SunTimes};

pub struct SunriseSunsetProvider {
    http: HttpClient,
    base_url: String,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct SunResponse {
    results: Option<SunResults>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct SunResults {
    sunrise: String,
    sunset: String,
    solar_noon: String,
    day_length: Option<i64>,
}

impl SunriseSunsetProvider {
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, timezone: Tz) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timezone,
        }
    }

    #[must_use]
    pub fn url(&self, location: &Location, date: NaiveDate) -> String {
        format!(
            "{}/json?lat={}&lng={}&date={}&formatted=0",
            self.base_url,
            location.latitude,
            location.longitude,
            date.format("%Y-%m-%d")
        )
    }

    /// Parse the UTC timestamps and shift them to the region's local offset
    pub fn parse(body: &str, timezone: Tz) -> Result<SunTimes, ProviderError> {
        let response: SunResponse = parse_json(body)?;
        if response.status != "OK" {
            return Err(ProviderError::no_data(format!("status {}", response.status)));
        }
        let results = response
            .results
            .ok_or_else(|| ProviderError::malformed("missing results"))?;

        let local = |raw: &str| -> Result<DateTime<FixedOffset>, ProviderError> {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&timezone).fixed_offset())
                .map_err(|e| ProviderError::malformed(format!("Invalid timestamp '{raw}': {e}")))
        };

        Ok(SunTimes {
            sunrise: local(&results.sunrise)?,
            sunset: local(&results.sunset)?,
            solar_noon: local(&results.solar_noon)?,
            day_length_seconds: results.day_length,
        })
    }
}

#[async_trait]
impl Provider<SunTimes> for SunriseSunsetProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::SunTimes
    }

    #[instrument(name = "fetch_sun_times", skip(self, location), fields(location = %location.id))]
    async fn fetch(&self, location: &Location, as_of: NaiveDate) -> ProviderResult<SunTimes> {
        let url = self.url(location, as_of);
        self.http
            .get_text(self.kind(), &url, &[])
            .await
            .and_then(|body| Self::parse(&body, self.timezone))
            .into()
    }
}
