use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rackview_state::ControllerView;

use crate::dto::{ConnectRequest, RefreshResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_state(State(state): State<AppState>) -> Json<ControllerView> {
    Json(state.controller.view().await)
}

pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ControllerView>, ApiError> {
    let (params, password) = req.into_parts()?;
    state.controller.connect(params, password).await?;
    Ok(Json(state.controller.view().await))
}

pub async fn disconnect(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.controller.disconnect().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let outcome = state.controller.refresh().await?;
    Ok(Json(outcome.into()))
}
