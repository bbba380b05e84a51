use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rackview_state::ControllerView;

use crate::dto::RefreshSettingsRequest;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn update_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshSettingsRequest>,
) -> Result<Json<ControllerView>, ApiError> {
    // Interval first so a bad value leaves auto refresh untouched.
    if let Some(secs) = req.interval_secs {
        state.controller.set_refresh_interval(secs).await?;
    }
    if let Some(enabled) = req.auto_refresh {
        state.controller.set_auto_refresh(enabled).await;
    }
    Ok(Json(state.controller.view().await))
}

pub async fn dismiss_error(State(state): State<AppState>) -> StatusCode {
    state.controller.dismiss_error().await;
    StatusCode::NO_CONTENT
}
