use anyhow::{Context, Result};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};

/// Full application router with the API mounted under `/api`
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Serve until Ctrl-C, then shut the scheduler down
pub async fn run(port: u16, state: AppState) -> Result<()> {
    let scheduler = state.scheduler.clone();
    scheduler.lock().await.start();

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .with_context(|| "Web server failed")?;

    scheduler.lock().await.shutdown();
    Ok(())
}
