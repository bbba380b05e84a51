mod config;
mod dto;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use rackview_infra::InventoryFetcher;
use rackview_state::InfrastructureController;
use rackview_store::{FileStorage, LocalEditStore, SessionStore, StorageBackend};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::routes::api_router;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().expect("invalid configuration");

    // Persisted snapshot, ticket and connection
    let backend: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(config.state_dir.clone()));
    let edits = LocalEditStore::new(backend.clone());
    let session = SessionStore::new(backend);
    tracing::info!(dir = %config.state_dir.display(), "state directory ready");

    let fetcher = Arc::new(InventoryFetcher::new(session.clone()));
    let controller = InfrastructureController::new(fetcher, edits, session, config.controller_settings());

    if controller.restore().await {
        // Live fields in the restored snapshot may be stale.
        let startup = controller.clone();
        tokio::spawn(async move {
            if let Err(e) = startup.refresh().await {
                tracing::warn!(error = %e, "initial refresh after restore failed");
            }
        });
    }

    let state = AppState { controller };

    let app = api_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!(addr = %config.listen_addr, "starting inventory API");

    axum::serve(listener, app).await.expect("server error");
}
