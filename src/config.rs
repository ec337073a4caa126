//! Configuration management for the `EnviroSnap` engine
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::EnviroSnapError;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnviroSnapConfig {
    /// Data provider endpoints and request settings
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Refresh and clock timers
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default application settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// HTTP API settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Provider endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    #[serde(default = "default_air_quality_base_url")]
    pub air_quality_base_url: String,
    /// OpenAQ API key (optional)
    pub air_quality_api_key: Option<String>,
    /// Station search radius in meters
    #[serde(default = "default_air_quality_radius")]
    pub air_quality_radius_m: u32,
    #[serde(default = "default_solar_base_url")]
    pub solar_base_url: String,
    #[serde(default = "default_sun_times_base_url")]
    pub sun_times_base_url: String,
    /// RSS 2.0 feed of official alerts
    #[serde(default = "default_alerts_feed_url")]
    pub alerts_feed_url: String,
    #[serde(default = "default_history_base_url")]
    pub history_base_url: String,
    /// Length of the historical summary window in days
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Timer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_clock_interval")]
    pub clock_interval_seconds: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Location selected at startup
    #[serde(default = "default_location")]
    pub location: String,
    /// IANA time zone local dates and sun times are expressed in
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// JSON file replacing the built-in location catalog
    pub locations_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_forecast_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_air_quality_base_url() -> String {
    "https://api.openaq.org/v2".to_string()
}

fn default_air_quality_radius() -> u32 {
    25_000
}

fn default_solar_base_url() -> String {
    "https://power.larc.nasa.gov/api".to_string()
}

fn default_sun_times_base_url() -> String {
    "https://api.sunrise-sunset.org".to_string()
}

fn default_alerts_feed_url() -> String {
    "https://www.gdacs.org/xml/rss.xml".to_string()
}

fn default_history_base_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

fn default_history_days() -> u32 {
    30
}

fn default_timeout() -> u32 {
    30
}

fn default_clock_interval() -> u64 {
    1
}

fn default_refresh_interval() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_location() -> String {
    "calamba".to_string()
}

fn default_timezone() -> String {
    "Asia/Manila".to_string()
}

fn default_port() -> u16 {
    8080
}

fn fill_if_empty(field: &mut String, default: fn() -> String) {
    if field.is_empty() {
        *field = default();
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            forecast_base_url: default_forecast_base_url(),
            air_quality_base_url: default_air_quality_base_url(),
            air_quality_api_key: None,
            air_quality_radius_m: default_air_quality_radius(),
            solar_base_url: default_solar_base_url(),
            sun_times_base_url: default_sun_times_base_url(),
            alerts_feed_url: default_alerts_feed_url(),
            history_base_url: default_history_base_url(),
            history_days: default_history_days(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            clock_interval_seconds: default_clock_interval(),
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            timezone: default_timezone(),
            locations_file: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl ProvidersConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }

    fn urls(&self) -> [(&'static str, &str); 6] {
        [
            ("forecast", self.forecast_base_url.as_str()),
            ("air quality", self.air_quality_base_url.as_str()),
            ("solar", self.solar_base_url.as_str()),
            ("sun times", self.sun_times_base_url.as_str()),
            ("alerts", self.alerts_feed_url.as_str()),
            ("history", self.history_base_url.as_str()),
        ]
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn clock_interval(&self) -> Duration {
        Duration::from_secs(self.clock_interval_seconds)
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

impl DefaultsConfig {
    /// Parse the configured time zone
    pub fn timezone(&self) -> crate::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| EnviroSnapError::config(format!("Unknown time zone '{}'", self.timezone)))
    }
}

impl EnviroSnapConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. ENVIROSNAP_SCHEDULER__REFRESH_INTERVAL_SECONDS
        builder = builder.add_source(
            Environment::with_prefix("ENVIROSNAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: EnviroSnapConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("envirosnap").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        let providers = &mut self.providers;
        fill_if_empty(&mut providers.forecast_base_url, default_forecast_base_url);
        fill_if_empty(&mut providers.air_quality_base_url, default_air_quality_base_url);
        fill_if_empty(&mut providers.solar_base_url, default_solar_base_url);
        fill_if_empty(&mut providers.sun_times_base_url, default_sun_times_base_url);
        fill_if_empty(&mut providers.alerts_feed_url, default_alerts_feed_url);
        fill_if_empty(&mut providers.history_base_url, default_history_base_url);
        if providers.timeout_seconds == 0 {
            providers.timeout_seconds = default_timeout();
        }
        if providers.history_days == 0 {
            providers.history_days = default_history_days();
        }
        if providers.air_quality_radius_m == 0 {
            providers.air_quality_radius_m = default_air_quality_radius();
        }
        if providers
            .air_quality_api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            providers.air_quality_api_key = None;
        }
        if self.scheduler.clock_interval_seconds == 0 {
            self.scheduler.clock_interval_seconds = default_clock_interval();
        }
        if self.scheduler.refresh_interval_seconds == 0 {
            self.scheduler.refresh_interval_seconds = default_refresh_interval();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.timezone.is_empty() {
            self.defaults.timezone = default_timezone();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_urls()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_urls(&self) -> Result<()> {
        for (name, url) in self.providers.urls() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(EnviroSnapError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL, got '{url}'"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.providers.timeout_seconds > 300 {
            return Err(EnviroSnapError::config("Provider timeout cannot exceed 300 seconds").into());
        }

        if self.providers.air_quality_radius_m > 100_000 {
            return Err(
                EnviroSnapError::config("Air quality search radius cannot exceed 100000 m").into(),
            );
        }

        if self.providers.history_days > 366 {
            return Err(EnviroSnapError::config("History window cannot exceed 366 days").into());
        }

        if self.scheduler.refresh_interval_seconds < 60 {
            return Err(
                EnviroSnapError::config("Refresh interval must be at least 60 seconds").into(),
            );
        }

        if self.scheduler.clock_interval_seconds > self.scheduler.refresh_interval_seconds {
            return Err(EnviroSnapError::config(
                "Clock interval cannot exceed the refresh interval",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(EnviroSnapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(EnviroSnapError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.defaults.location.trim().is_empty() {
            return Err(EnviroSnapError::config("Default location cannot be empty").into());
        }

        self.defaults.timezone()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EnviroSnapConfig::default();
        assert_eq!(config.providers.forecast_base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.providers.timeout(), Duration::from_secs(30));
        assert_eq!(config.providers.history_days, 30);
        assert_eq!(config.scheduler.clock_interval(), Duration::from_secs(1));
        assert_eq!(config.scheduler.refresh_interval(), Duration::from_secs(600));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.location, "calamba");
        assert_eq!(config.defaults.timezone().unwrap(), chrono_tz::Asia::Manila);
        assert_eq!(config.server.port, 8080);
        assert!(config.providers.air_quality_api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = EnviroSnapConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = EnviroSnapConfig::default();
        config.providers.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = EnviroSnapConfig::default();
        config.scheduler.refresh_interval_seconds = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_urls() {
        let mut config = EnviroSnapConfig::default();
        config.providers.alerts_feed_url = "ftp://feeds.example.org/rss".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("alerts URL"));
    }

    #[test]
    fn test_config_validation_timezone() {
        let mut config = EnviroSnapConfig::default();
        config.defaults.timezone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Unknown time zone"));
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = EnviroSnapConfig::default();
        config.providers.solar_base_url.clear();
        config.providers.air_quality_api_key = Some("  ".to_string());
        config.scheduler.refresh_interval_seconds = 0;
        config.logging.format.clear();
        config.apply_defaults();

        assert_eq!(config.providers.solar_base_url, "https://power.larc.nasa.gov/api");
        assert!(config.providers.air_quality_api_key.is_none());
        assert_eq!(config.scheduler.refresh_interval_seconds, 600);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[providers]
timeout_seconds = 10
air_quality_api_key = "secret-key"

[scheduler]
refresh_interval_seconds = 300

[defaults]
location = "los-banos"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = EnviroSnapConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.providers.timeout_seconds, 10);
        assert_eq!(config.providers.air_quality_api_key.as_deref(), Some("secret-key"));
        assert_eq!(config.providers.history_days, 30);
        assert_eq!(config.scheduler.refresh_interval_seconds, 300);
        assert_eq!(config.defaults.location, "los-banos");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            EnviroSnapConfig::load_from_path(Some(dir.path().join("missing.toml"))).unwrap();
        assert_eq!(config.defaults.location, "calamba");
    }

    #[test]
    fn test_config_path_generation() {
        let path = EnviroSnapConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("envirosnap"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
