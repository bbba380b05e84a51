use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rackview_state::DeviceDetails;

use crate::dto::SelectRequest;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn select_device(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<DeviceDetails>, ApiError> {
    let details = state.controller.select_device(&req.id).await?;
    Ok(Json(details))
}

pub async fn close_details(State(state): State<AppState>) -> StatusCode {
    state.controller.close_device_details().await;
    StatusCode::NO_CONTENT
}
