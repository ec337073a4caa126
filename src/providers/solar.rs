//! Solar and agricultural daily point data from NASA POWER

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::instrument;

use super::{HttpClient, Provider, ProviderError, ProviderKind, ProviderResult, parse_json};
use crate::models::{Location, SolarReading};

const PARAMETERS: &str = "ALLSKY_SFC_SW_DWN,T2M_MAX,T2M_MIN,PRECTOTCORR,RH2M";
const DEFAULT_FILL_VALUE: f64 = -999.0;

pub struct NasaPowerProvider {
    http: HttpClient,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    header: Option<PowerHeader>,
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerHeader {
    fill_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: HashMap<String, HashMap<String, Option<f64>>>,
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

impl NasaPowerProvider {
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn url(&self, location: &Location, date: NaiveDate) -> String {
        let day = date_key(date);
        format!(
            "{}/temporal/daily/point?parameters={PARAMETERS}&community=AG&longitude={}&latitude={}&start={day}&end={day}&format=JSON",
            self.base_url, location.longitude, location.latitude
        )
    }

    /// Extract the values for `date`. Values equal to the fill value are
    /// reported as absent.
    pub fn parse(body: &str, date: NaiveDate) -> Result<SolarReading, ProviderError> {
        let response: PowerResponse = parse_json(body)?;
        let fill_value = response
            .header
            .and_then(|h| h.fill_value)
            .unwrap_or(DEFAULT_FILL_VALUE);
        let key = date_key(date);
        let parameters = &response.properties.parameter;

        let value = |name: &str| {
            parameters
                .get(name)
                .and_then(|series| series.get(&key).copied().flatten())
                .filter(|v| (*v - fill_value).abs() > f64::EPSILON)
        };

        Ok(SolarReading {
            date,
            solar_radiation: value("ALLSKY_SFC_SW_DWN"),
            temperature_max: value("T2M_MAX"),
            temperature_min: value("T2M_MIN"),
            precipitation: value("PRECTOTCORR"),
            humidity: value("RH2M"),
        })
    }
}

#[async_trait]
impl Provider<SolarReading> for NasaPowerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Solar
    }

    #[instrument(name = "fetch_solar", skip(self, location), fields(location = %location.id))]
    async fn fetch(&self, location: &Location, as_of: NaiveDate) -> ProviderResult<SolarReading> {
        let url = self.url(location, as_of);
        self.http
            .get_text(self.kind(), &url, &[])
            .await
            .and_then(|body| Self::parse(&body, as_of))
            .into()
    }
}
