pub mod racks;
pub mod selection;
pub mod session;
pub mod settings;

use axum::Router;
use axum::routing::{delete, get, post, put};

use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    let api = Router::new()
        // Snapshot and session
        .route("/state", get(session::get_state))
        .route("/session", post(session::connect).delete(session::disconnect))
        .route("/refresh", post(session::refresh))
        // Details panel
        .route(
            "/selection",
            put(selection::select_device).delete(selection::close_details),
        )
        // Rack topology
        .route("/racks", post(racks::create_rack))
        .route("/racks/{id}", put(racks::rename_rack).delete(racks::delete_rack))
        .route("/devices/{id}/rack", put(racks::move_device))
        // Refresh settings
        .route("/settings/refresh", put(settings::update_refresh))
        .route("/error", delete(settings::dismiss_error));

    Router::new().nest("/api", api).with_state(state)
}
