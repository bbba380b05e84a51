use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rackview_infra::FetchError;
use rackview_state::ControllerError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Controller(e) => controller_status(e),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

fn controller_status(error: &ControllerError) -> StatusCode {
    match error {
        ControllerError::Validation(_) => StatusCode::BAD_REQUEST,
        ControllerError::NotConnected | ControllerError::Superseded => StatusCode::CONFLICT,
        ControllerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ControllerError::Fetch(fetch) => match fetch {
            FetchError::AuthenticationRequired
            | FetchError::AuthenticationFailed(_)
            | FetchError::SessionExpired => StatusCode::UNAUTHORIZED,
            FetchError::NetworkUnreachable(_)
            | FetchError::MalformedResponse(_)
            | FetchError::UnexpectedStatus { .. } => StatusCode::BAD_GATEWAY,
        },
    }
}
