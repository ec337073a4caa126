mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tracing::info;

use envirosnap::api::AppState;
use envirosnap::{Engine, EnviroSnapConfig, EnviroSnapError, LocationCatalog, RefreshScheduler, telemetry, web};

fn load_catalog(config: &EnviroSnapConfig) -> Result<LocationCatalog> {
    match &config.defaults.locations_file {
        Some(path) => LocationCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load locations from {}", path.display())),
        None => Ok(LocationCatalog::laguna()),
    }
}

fn build_engine(
    mut config: EnviroSnapConfig,
    catalog: &LocationCatalog,
    location: Option<String>,
) -> Result<Arc<Engine>> {
    if let Some(id) = location {
        config.defaults.location = id;
    }
    Ok(Arc::new(Engine::from_config(&config, catalog)?))
}

fn list_locations(catalog: &LocationCatalog) {
    println!("📍 {} locations", catalog.len());
    for location in catalog.iter() {
        println!(
            "   {:<12} {:<12} {:<13} {}",
            location.id,
            location.name,
            format!("{:?}", location.kind),
            location.format_coordinates()
        );
    }
}

async fn snapshot(config: EnviroSnapConfig, catalog: &LocationCatalog, location: Option<String>, json: bool) -> Result<()> {
    let engine = build_engine(config, catalog, location)?;
    let outcome = engine.refresh().await;
    info!("Cycle finished: {:?}", outcome);

    let snapshot = engine
        .snapshot()
        .with_context(|| "No snapshot was committed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
    } else {
        print!("{snapshot}");
    }
    Ok(())
}

async fn watch(config: EnviroSnapConfig, catalog: &LocationCatalog, location: Option<String>) -> Result<()> {
    let scheduler_config = config.scheduler.clone();
    let engine = build_engine(config, catalog, location)?;
    let mut updates = engine.subscribe();
    let mut scheduler = RefreshScheduler::from_config(engine, &scheduler_config);
    scheduler.start();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(snapshot) = updates.borrow_and_update().clone() {
                    println!("{snapshot}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    scheduler.shutdown();
    Ok(())
}

async fn serve(config: EnviroSnapConfig, catalog: LocationCatalog, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.server.port);
    let scheduler_config = config.scheduler.clone();
    let engine = build_engine(config, &catalog, None)?;
    let scheduler = RefreshScheduler::from_config(engine, &scheduler_config);
    web::run(port, AppState::new(scheduler, catalog)).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = EnviroSnapConfig::load_from_path(cli.config.clone())?;
    telemetry::init_tracing(&config.logging, cli.verbose)?;

    let catalog = load_catalog(&config)?;

    match cli.command {
        Commands::Locations {} => {
            list_locations(&catalog);
            Ok(())
        }
        Commands::Snapshot { location, json } => snapshot(config, &catalog, location, json).await,
        Commands::Watch { location } => watch(config, &catalog, location).await,
        Commands::Serve { port } => serve(config, catalog, port).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let result = run(Cli::parse()).await;
    if let Err(err) = &result
        && let Some(err) = err.downcast_ref::<EnviroSnapError>()
    {
        eprintln!("❌ {}", err.user_message());
    }
    result
}
