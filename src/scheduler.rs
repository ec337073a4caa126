//! Periodic clock and refresh tasks scoped to the active location

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::engine::{CycleOutcome, Engine, Selection};
use crate::models::Location;

/// Drives an [`Engine`] with two independent timers.
///
/// The clock timer only advances the engine clock. The refresh timer runs one
/// full cycle per tick, the first immediately. Both are aborted on location
/// switch, on shutdown and when the scheduler is dropped.
///
/// A switch made directly through [`Engine::select_location`] is picked up by
/// the running refresh task, which cycles the new location right away and
/// restarts its period.
pub struct RefreshScheduler {
    engine: Arc<Engine>,
    clock_interval: Duration,
    refresh_interval: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshScheduler {
    #[must_use]
    pub fn new(engine: Arc<Engine>, clock_interval: Duration, refresh_interval: Duration) -> Self {
        Self {
            engine,
            clock_interval,
            refresh_interval,
            tasks: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_config(engine: Arc<Engine>, config: &SchedulerConfig) -> Self {
        Self::new(engine, config.clock_interval(), config.refresh_interval())
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Spawn both timers for the active selection. Restarts them if running.
    pub fn start(&mut self) {
        self.stop();
        if self.engine.is_torn_down() {
            debug!("Engine torn down, not starting timers");
            return;
        }

        let selection = self.engine.active_selection();
        info!(
            "Starting timers for {} (refresh every {}s)",
            selection.location.name,
            self.refresh_interval.as_secs()
        );

        self.tasks.push(self.spawn_clock());
        self.tasks.push(self.spawn_refresh());
    }

    fn spawn_clock(&self) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let period = self.clock_interval;
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                engine.tick_clock(Utc::now());
            }
        })
    }

    fn spawn_refresh(&self) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let period = self.refresh_interval;
        let mut selections = engine.subscribe_selection();
        tokio::spawn(async move {
            let mut selection = selections.borrow_and_update().clone();
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    changed = selections.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        selection = selections.borrow_and_update().clone();
                        ticker.reset();
                        debug!("Refreshing for {} (generation {})", selection.location.id, selection.generation);
                    }
                    _ = ticker.tick() => {}
                }
                match engine.run_cycle(&selection).await {
                    CycleOutcome::Committed => {}
                    // The pending switch wakes the loop again
                    CycleOutcome::Superseded => {
                        debug!("Cycle for generation {} superseded", selection.generation);
                    }
                    CycleOutcome::TornDown => break,
                }
            }
        })
    }

    fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Cancel both timers, switch the engine's location and restart them,
    /// which triggers an immediate refresh
    pub fn select_location(&mut self, location: Location) -> Selection {
        self.stop();
        let selection = self.engine.select_location(location);
        self.start();
        selection
    }

    /// Cancel both timers and tear the engine down
    pub fn shutdown(&mut self) {
        self.stop();
        self.engine.teardown();
        info!("Scheduler shut down");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationCatalog;
    use crate::providers::{Provider, ProviderError, ProviderKind, ProviderResult, ProviderSet};
    use crate::synthetic::FixedSource;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct Offline;

    #[async_trait]
    impl<T: Send + 'static> Provider<T> for Offline {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Solar
        }

        async fn fetch(&self, _location: &Location, _as_of: NaiveDate) -> ProviderResult<T> {
            ProviderResult::Unavailable(ProviderError::no_data("stub"))
        }
    }

    fn scheduler() -> RefreshScheduler {
        let providers = ProviderSet {
            forecast: Arc::new(Offline),
            air_quality: Arc::new(Offline),
            solar: Arc::new(Offline),
            sun_times: Arc::new(Offline),
            alerts: Arc::new(Offline),
            history: Arc::new(Offline),
        };
        let calamba = LocationCatalog::laguna().require("calamba").unwrap().clone();
        let engine = Engine::new(
            providers,
            Arc::new(FixedSource::midpoint()),
            chrono_tz::Asia::Manila,
            calamba,
        );
        RefreshScheduler::new(Arc::new(engine), Duration::from_secs(1), Duration::from_secs(600))
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_refreshes_immediately() {
        let mut scheduler = scheduler();
        let mut rx = scheduler.engine().subscribe();
        scheduler.start();
        assert!(scheduler.is_running());

        rx.changed().await.unwrap();
        assert!(scheduler.engine().snapshot().is_some());
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timers() {
        let mut scheduler = scheduler();
        scheduler.start();
        scheduler.shutdown();
        tokio::task::yield_now().await;

        assert!(!scheduler.is_running());
        assert!(scheduler.engine().is_torn_down());

        scheduler.start();
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_location_restarts_for_new_location() {
        let mut scheduler = scheduler();
        scheduler.start();
        let mut rx = scheduler.engine().subscribe();

        let bay = LocationCatalog::laguna().require("bay").unwrap().clone();
        let selection = scheduler.select_location(bay);
        assert_eq!(selection.generation, 1);

        loop {
            rx.changed().await.unwrap();
            if let Some(snapshot) = rx.borrow_and_update().clone() {
                assert_eq!(snapshot.location.id, "bay");
                break;
            }
        }
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_follows_switch_made_on_engine() {
        let mut scheduler = scheduler();
        scheduler.start();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let bay = LocationCatalog::laguna().require("bay").unwrap().clone();
        scheduler.engine().select_location(bay);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(scheduler.is_running());
        let snapshot = scheduler.engine().snapshot().unwrap();
        assert_eq!(snapshot.location.id, "bay");
        scheduler.shutdown();
    }
}
