use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::dto::{CreatedRack, DeletedRack, MoveDeviceRequest, RackRequest};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn create_rack(
    State(state): State<AppState>,
    Json(req): Json<RackRequest>,
) -> Result<(StatusCode, Json<CreatedRack>), ApiError> {
    let id = state.controller.create_rack(&req.name).await?;
    Ok((StatusCode::CREATED, Json(CreatedRack { id })))
}

pub async fn rename_rack(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RackRequest>,
) -> Result<StatusCode, ApiError> {
    state.controller.rename_rack(&id, &req.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_rack(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedRack>, ApiError> {
    let moved_devices = state.controller.delete_rack(&id).await?;
    Ok(Json(DeletedRack { moved_devices }))
}

pub async fn move_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MoveDeviceRequest>,
) -> Result<StatusCode, ApiError> {
    state.controller.move_device(&id, &req.rack_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
