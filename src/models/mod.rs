//! Data models for the EnviroSnap engine
//!
//! This module contains the core domain models organized by concern:
//! - Location: municipalities and the catalog they are selected from
//! - Weather: current conditions and forecast points
//! - Snapshot: the assembled view and its secondary readings

pub mod location;
pub mod snapshot;
pub mod weather;

pub use location::{Location, LocationCatalog, LocationKind};
pub use snapshot::{
    AgricultureSummary, AirQualityReading, Alert, AlertSeverity, EnvironmentalSnapshot,
    HistoricalSummary, HistoricalTrend, SolarReading, SourceStatus, SunTimes, UvReading,
};
pub use weather::{
    CurrentConditions, DailyPoint, HourlyPoint, PrimaryForecast, RawCurrent, Wind,
    weather_code_to_description,
};
