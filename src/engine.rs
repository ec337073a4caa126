//! The engine instance owning the active location and the current snapshot
//!
//! State is held in `tokio::sync::watch` channels so any number of consumers can
//! read the latest value or await changes. The only mutations are
//! [`Engine::select_location`], a committing [`Engine::run_cycle`] and the clock
//! tick.
//!
//! Every cycle is tagged with the [`Selection`] it started under. A cycle only
//! commits if that selection is still active when its results are ready, so a
//! location switch mid-cycle can never publish data for the old location.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::builder::SnapshotBuilder;
use crate::config::EnviroSnapConfig;
use crate::models::{EnvironmentalSnapshot, Location, LocationCatalog};
use crate::orchestrator::Orchestrator;
use crate::providers::ProviderSet;
use crate::synthetic::{RandomSource, SyntheticSource};

/// A location together with the generation it was selected in
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub location: Location,
    pub generation: u64,
}

/// What happened to the results of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new snapshot was published
    Committed,
    /// Another location was selected while the cycle was in flight
    Superseded,
    /// The engine was torn down before the cycle could commit
    TornDown,
}

pub type SnapshotReceiver = watch::Receiver<Option<Arc<EnvironmentalSnapshot>>>;

pub struct Engine {
    orchestrator: Orchestrator,
    builder: SnapshotBuilder,
    timezone: Tz,
    selection: Mutex<Selection>,
    selection_tx: watch::Sender<Selection>,
    snapshot_tx: watch::Sender<Option<Arc<EnvironmentalSnapshot>>>,
    clock_tx: watch::Sender<DateTime<Utc>>,
    torn_down: AtomicBool,
}

impl Engine {
    #[must_use]
    pub fn new(
        providers: ProviderSet,
        synthetic: Arc<dyn SyntheticSource>,
        timezone: Tz,
        initial: Location,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        let (clock_tx, _) = watch::channel(Utc::now());
        let initial = Selection {
            location: initial,
            generation: 0,
        };
        let (selection_tx, _) = watch::channel(initial.clone());

        Self {
            orchestrator: Orchestrator::new(providers),
            builder: SnapshotBuilder::new(synthetic, timezone),
            timezone,
            selection: Mutex::new(initial),
            selection_tx,
            snapshot_tx,
            clock_tx,
            torn_down: AtomicBool::new(false),
        }
    }

    /// Engine with live HTTP providers, starting at the configured default location
    pub fn from_config(config: &EnviroSnapConfig, catalog: &LocationCatalog) -> anyhow::Result<Self> {
        let providers = ProviderSet::from_config(config)?;
        let timezone = config.defaults.timezone()?;
        let initial = catalog.require(&config.defaults.location)?.clone();

        Ok(Self::new(providers, Arc::new(RandomSource), timezone, initial))
    }

    fn lock_selection(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch the active location.
    ///
    /// Bumps the selection generation so in-flight cycles for the previous
    /// location are discarded, and clears the published snapshot.
    pub fn select_location(&self, location: Location) -> Selection {
        let mut selection = self.lock_selection();
        selection.generation += 1;
        selection.location = location;
        self.snapshot_tx.send_replace(None);
        self.selection_tx.send_replace(selection.clone());

        info!(
            "Selected {} (generation {})",
            selection.location.name, selection.generation
        );
        selection.clone()
    }

    #[must_use]
    pub fn active_selection(&self) -> Selection {
        self.lock_selection().clone()
    }

    /// Receiver notified on every location switch
    #[must_use]
    pub fn subscribe_selection(&self) -> watch::Receiver<Selection> {
        self.selection_tx.subscribe()
    }

    /// Latest committed snapshot, `None` before the first commit for the active location
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<EnvironmentalSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver notified on every commit and every location switch
    #[must_use]
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.snapshot_tx.subscribe()
    }

    #[must_use]
    pub fn clock(&self) -> DateTime<Utc> {
        *self.clock_tx.borrow()
    }

    #[must_use]
    pub fn subscribe_clock(&self) -> watch::Receiver<DateTime<Utc>> {
        self.clock_tx.subscribe()
    }

    /// Advance the presentation clock. Touches nothing else.
    pub fn tick_clock(&self, now: DateTime<Utc>) {
        self.clock_tx.send_replace(now);
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Run one fetch/build cycle for `selection` and commit it if still current
    #[instrument(skip(self, selection), fields(location = %selection.location.id, generation = selection.generation))]
    pub async fn run_cycle(&self, selection: &Selection) -> CycleOutcome {
        if self.is_torn_down() {
            return CycleOutcome::TornDown;
        }

        let start_time = Instant::now();
        let now = Utc::now();
        let as_of = now.with_timezone(&self.timezone).date_naive();
        let bundle = self.orchestrator.fetch_all(&selection.location, as_of).await;
        let snapshot = Arc::new(self.builder.build(bundle, now));

        // Generation check and publish happen under the same lock as select_location
        let active = self.lock_selection();
        if self.is_torn_down() {
            debug!("Engine torn down, discarding cycle");
            return CycleOutcome::TornDown;
        }
        if active.generation != selection.generation {
            debug!(
                "Selection moved to {} (generation {}), discarding cycle",
                active.location.id, active.generation
            );
            return CycleOutcome::Superseded;
        }

        let degraded = snapshot.degraded;
        self.snapshot_tx.send_replace(Some(snapshot));
        drop(active);

        info!(
            "Committed snapshot for {}{} in {:.3}s",
            selection.location.name,
            if degraded { " (degraded)" } else { "" },
            start_time.elapsed().as_secs_f64()
        );
        CycleOutcome::Committed
    }

    /// Run a cycle for whatever location is active right now
    pub async fn refresh(&self) -> CycleOutcome {
        let selection = self.active_selection();
        self.run_cycle(&selection).await
    }

    /// Stop accepting commits. Idempotent.
    pub fn teardown(&self) {
        let _guard = self.lock_selection();
        if !self.torn_down.swap(true, Ordering::SeqCst) {
            info!("Engine torn down");
        }
    }
}
