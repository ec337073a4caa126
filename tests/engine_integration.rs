//! End-to-end cycles through the engine with stub providers

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Notify;

use envirosnap::metrics::{AqiCategory, CompassPoint, PressureTrend, heat_index};
use envirosnap::models::{AirQualityReading, DailyPoint, HourlyPoint, PrimaryForecast, RawCurrent};
use envirosnap::{
    CycleOutcome, Engine, FixedSource, Location, LocationCatalog, Provider, ProviderError,
    ProviderKind, ProviderResult, ProviderSet, RefreshScheduler,
};

fn calamba_forecast(as_of: NaiveDate) -> PrimaryForecast {
    let observed_at = as_of.and_hms_opt(13, 0, 0).unwrap();
    PrimaryForecast {
        current: RawCurrent {
            observed_at,
            temperature: 30.0,
            humidity: 85.0,
            precipitation: Some(0.2),
            wind_speed: Some(2.5),
            wind_direction: Some(90.0),
            pressure: Some(1015.0),
            cloud_cover: Some(75.0),
            visibility_km: Some(9.5),
            is_day: Some(true),
            condition_code: Some(3),
        },
        hourly: (0..24)
            .map(|h| HourlyPoint {
                time: observed_at + chrono::Duration::hours(h),
                temperature: Some(29.0),
                humidity: Some(80.0),
                precipitation_probability: Some(30.0),
                precipitation: Some(0.0),
                wind_speed: Some(2.0),
                condition_code: Some(3),
            })
            .collect(),
        daily: (0..7)
            .map(|d| DailyPoint {
                date: as_of + chrono::Duration::days(d),
                temperature_max: Some(32.0),
                temperature_min: Some(25.0),
                precipitation_sum: Some(1.0),
                precipitation_probability: Some(40.0),
                wind_speed_max: Some(4.0),
                uv_index_max: Some(9.0),
                condition_code: Some(3),
            })
            .collect(),
        recent_precipitation: Some(vec![0.0; 24]),
    }
}

struct Down(ProviderKind);

#[async_trait]
impl<T: Send + 'static> Provider<T> for Down {
    fn kind(&self) -> ProviderKind {
        self.0
    }

    async fn fetch(&self, _location: &Location, _as_of: NaiveDate) -> ProviderResult<T> {
        ProviderResult::Unavailable(ProviderError::NetworkFailure("connection reset".into()))
    }
}

/// Forecast stub that counts calls and can hold each call until released
#[derive(Default)]
struct StubForecast {
    calls: AtomicUsize,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

#[async_trait]
impl Provider<PrimaryForecast> for StubForecast {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Forecast
    }

    async fn fetch(&self, _location: &Location, as_of: NaiveDate) -> ProviderResult<PrimaryForecast> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }
        ProviderResult::Available(calamba_forecast(as_of))
    }
}

struct StubAirQuality(f64);

#[async_trait]
impl Provider<AirQualityReading> for StubAirQuality {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AirQuality
    }

    async fn fetch(&self, _location: &Location, _as_of: NaiveDate) -> ProviderResult<AirQualityReading> {
        ProviderResult::Available(AirQualityReading {
            station: "Calamba Plaza".to_string(),
            distance_km: 0.4,
            pm25: Some(self.0),
            category: Some(AqiCategory::from_pm25(self.0)),
            measured_at: Some(Utc::now()),
        })
    }
}

fn all_down() -> ProviderSet {
    ProviderSet {
        forecast: Arc::new(Down(ProviderKind::Forecast)),
        air_quality: Arc::new(Down(ProviderKind::AirQuality)),
        solar: Arc::new(Down(ProviderKind::Solar)),
        sun_times: Arc::new(Down(ProviderKind::SunTimes)),
        alerts: Arc::new(Down(ProviderKind::Alerts)),
        history: Arc::new(Down(ProviderKind::History)),
    }
}

fn location(id: &str) -> Location {
    LocationCatalog::laguna().require(id).unwrap().clone()
}

fn engine(providers: ProviderSet) -> Arc<Engine> {
    Arc::new(Engine::new(
        providers,
        Arc::new(FixedSource::midpoint()),
        chrono_tz::Asia::Manila,
        location("calamba"),
    ))
}

#[tokio::test]
async fn test_calamba_scenario() {
    let mut providers = all_down();
    providers.forecast = Arc::new(StubForecast::default());
    providers.air_quality = Arc::new(StubAirQuality(120.0));
    let engine = engine(providers);

    assert_eq!(engine.refresh().await, CycleOutcome::Committed);
    let snapshot = engine.snapshot().unwrap();

    assert_eq!(snapshot.location.id, "calamba");
    assert!(!snapshot.degraded);
    assert_eq!(snapshot.current.feels_like, 39.1);
    assert_eq!(snapshot.current.feels_like, heat_index(30.0, 85.0));
    assert_eq!(snapshot.current.wind.bearing, Some(CompassPoint::E));
    assert_eq!(snapshot.current.pressure_trend, Some(PressureTrend::Rising));
    assert_eq!(snapshot.current.description, "Overcast");
    assert_eq!(snapshot.hourly.len(), 24);
    assert_eq!(snapshot.daily.len(), 7);

    let air = snapshot.air_quality.as_ref().unwrap();
    assert_eq!(air.category, Some(AqiCategory::UnhealthyForSensitiveGroups));
    assert_eq!(air.category.map(|c| c.color()), Some("orange"));
    assert_eq!(
        air.category.map(|c| c.to_string()),
        Some("Unhealthy for Sensitive Groups".to_string())
    );

    assert!(snapshot.is_available(ProviderKind::AirQuality));
    assert!(!snapshot.is_available(ProviderKind::Solar));
}

#[tokio::test]
async fn test_primary_only_bundle() {
    let mut providers = all_down();
    providers.forecast = Arc::new(StubForecast::default());
    let engine = engine(providers);
    engine.refresh().await;

    let snapshot = engine.snapshot().unwrap();
    assert!(!snapshot.degraded);
    assert!(snapshot.air_quality.is_none());
    assert!(snapshot.sun_times.is_none());
    assert!(snapshot.history.is_none());
    assert!(snapshot.alerts.is_empty());
    assert_eq!(snapshot.agriculture.solar_radiation, None);
    assert_eq!(snapshot.agriculture.soil_moisture_index, 45);
    assert_eq!(snapshot.agriculture.growing_degree_days, Some(18.5));
}

#[tokio::test]
async fn test_all_unavailable_is_degraded() {
    let engine = engine(all_down());
    assert_eq!(engine.refresh().await, CycleOutcome::Committed);

    let snapshot = engine.snapshot().unwrap();
    assert!(snapshot.degraded);
    assert_eq!(snapshot.location.id, "calamba");
    assert_eq!(snapshot.hourly.len(), 24);
    assert_eq!(snapshot.daily.len(), 7);
    assert!((26.0..=33.0).contains(&snapshot.current.temperature));
    assert_eq!(
        snapshot.current.feels_like,
        heat_index(snapshot.current.temperature, snapshot.current.humidity)
    );
    assert!(snapshot.sources.iter().all(|s| !s.available));
    assert_eq!(snapshot.sources.len(), 6);
}

#[tokio::test]
async fn test_repeated_cycles_are_stable() {
    let mut providers = all_down();
    providers.forecast = Arc::new(StubForecast::default());
    let engine = engine(providers);

    engine.refresh().await;
    let first = engine.snapshot().unwrap();
    engine.refresh().await;
    let second = engine.snapshot().unwrap();

    assert_eq!(first.current, second.current);
    assert_eq!(first.hourly, second.hourly);
    assert_eq!(first.daily, second.daily);
    assert_eq!(first.uv, second.uv);
    assert_eq!(first.agriculture, second.agriculture);
    assert_eq!(first.lake, second.lake);
    assert_eq!(first.sources, second.sources);
}

#[tokio::test]
async fn test_mid_cycle_switch_never_commits_old_location() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let mut providers = all_down();
    providers.forecast = Arc::new(StubForecast {
        calls: AtomicUsize::new(0),
        gate: Some((started.clone(), release.clone())),
    });
    let engine = engine(providers);
    let mut updates = engine.subscribe();

    let selection = engine.active_selection();
    let cycle = tokio::spawn({
        let engine = engine.clone();
        async move { engine.run_cycle(&selection).await }
    });

    started.notified().await;
    engine.select_location(location("san-pablo"));
    release.notify_one();

    assert_eq!(cycle.await.unwrap(), CycleOutcome::Superseded);
    assert!(engine.snapshot().is_none());
    assert_eq!(engine.active_selection().location.id, "san-pablo");

    // The only change observed is the switch clearing the snapshot
    assert!(updates.has_changed().unwrap());
    assert!(updates.borrow_and_update().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_refreshes_on_interval() {
    let forecast = Arc::new(StubForecast::default());
    let mut providers = all_down();
    providers.forecast = forecast.clone();
    let engine = engine(providers);

    let mut scheduler =
        RefreshScheduler::new(engine.clone(), Duration::from_secs(1), Duration::from_secs(600));
    scheduler.start();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 1);
    assert!(engine.snapshot().is_some());

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 2);

    scheduler.shutdown();
    tokio::time::sleep(Duration::from_secs(1200)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 2);
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_switch_refreshes_immediately() {
    let forecast = Arc::new(StubForecast::default());
    let mut providers = all_down();
    providers.forecast = forecast.clone();
    let engine = engine(providers);

    let mut scheduler =
        RefreshScheduler::new(engine.clone(), Duration::from_secs(1), Duration::from_secs(600));
    scheduler.start();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 1);

    scheduler.select_location(location("paete"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.snapshot().unwrap().location.id, "paete");

    drop(scheduler);
    tokio::time::sleep(Duration::from_secs(1200)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_clock_ticks_without_refreshing() {
    let forecast = Arc::new(StubForecast::default());
    let mut providers = all_down();
    providers.forecast = forecast.clone();
    let engine = engine(providers);
    let mut clock = engine.subscribe_clock();

    let mut scheduler =
        RefreshScheduler::new(engine.clone(), Duration::from_secs(1), Duration::from_secs(600));
    scheduler.start();

    for _ in 0..3 {
        clock.changed().await.unwrap();
    }
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 1);
    scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_follows_engine_switch() {
    let forecast = Arc::new(StubForecast::default());
    let mut providers = all_down();
    providers.forecast = forecast.clone();
    let engine = engine(providers);

    let mut scheduler =
        RefreshScheduler::new(engine.clone(), Duration::from_secs(1), Duration::from_secs(600));
    scheduler.start();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 1);

    engine.select_location(location("bay"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.snapshot().unwrap().location.id, "bay");
    assert!(scheduler.is_running());

    // The refresh period restarts from the switch
    tokio::time::sleep(Duration::from_secs(598)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 2);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(forecast.calls.load(Ordering::SeqCst), 3);

    scheduler.shutdown();
}
