use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    engine::Engine,
    models::{EnvironmentalSnapshot, LocationCatalog, LocationKind},
    scheduler::RefreshScheduler,
};

/// Shared state behind the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub scheduler: Arc<Mutex<RefreshScheduler>>,
    pub catalog: Arc<LocationCatalog>,
}

impl AppState {
    #[must_use]
    pub fn new(scheduler: RefreshScheduler, catalog: LocationCatalog) -> Self {
        Self {
            engine: Arc::clone(scheduler.engine()),
            scheduler: Arc::new(Mutex::new(scheduler)),
            catalog: Arc::new(catalog),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiLocation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: LocationKind,
    pub active: bool,
}

#[derive(Serialize, Deserialize)]
pub struct ApiSelection {
    pub id: String,
    pub name: String,
    pub generation: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/snapshot", get(get_snapshot))
        .route("/locations", get(get_locations))
        .route("/location/{id}", post(select_location))
        .with_state(state)
}

async fn get_snapshot(State(state): State<AppState>) -> Json<Option<EnvironmentalSnapshot>> {
    Json(state.engine.snapshot().map(|snapshot| snapshot.as_ref().clone()))
}

async fn get_locations(State(state): State<AppState>) -> Json<Vec<ApiLocation>> {
    let active = state.engine.active_selection().location.id;
    let locations = state
        .catalog
        .iter()
        .map(|l| ApiLocation {
            id: l.id.clone(),
            name: l.name.clone(),
            latitude: l.latitude,
            longitude: l.longitude,
            kind: l.kind,
            active: l.id == active,
        })
        .collect();
    Json(locations)
}

async fn select_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSelection>, StatusCode> {
    let location = state.catalog.find(&id).cloned().ok_or(StatusCode::NOT_FOUND)?;

    let selection = state.scheduler.lock().await.select_location(location);
    info!("Location switched to {} via API", selection.location.id);

    Ok(Json(ApiSelection {
        id: selection.location.id,
        name: selection.location.name,
        generation: selection.generation,
    }))
}
