//! `EnviroSnap` - Live environmental snapshots from multiple public data providers
//!
//! This library fetches weather, air quality, solar, sun-time, alert and
//! historical data concurrently, derives secondary metrics, and assembles one
//! consistent snapshot per location and refresh cycle.

pub mod api;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod scheduler;
pub mod synthetic;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use builder::SnapshotBuilder;
pub use config::EnviroSnapConfig;
pub use engine::{CycleOutcome, Engine, Selection};
pub use error::EnviroSnapError;
pub use models::{EnvironmentalSnapshot, Location, LocationCatalog};
pub use orchestrator::{Orchestrator, PartialResultsBundle};
pub use providers::{Provider, ProviderError, ProviderKind, ProviderResult, ProviderSet};
pub use scheduler::RefreshScheduler;
pub use synthetic::{FixedSource, RandomSource, SyntheticSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EnviroSnapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
