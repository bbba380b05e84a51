use rackview_state::RefreshOutcome;
use rackview_store::ConnectionParams;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ── Requests ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    pub password: Option<String>,
    #[serde(default)]
    pub use_mock_data: bool,
}

impl ConnectRequest {
    /// Split into what gets persisted and the secret, which never is.
    pub fn into_parts(self) -> Result<(ConnectionParams, Option<String>), ApiError> {
        let password = self.password.filter(|p| !p.is_empty());

        if self.use_mock_data {
            let mut params = ConnectionParams::mock();
            if !self.url.trim().is_empty() {
                params.url = self.url.trim().to_string();
            }
            if !self.username.trim().is_empty() {
                params.username = self.username.trim().to_string();
            }
            return Ok((params, password));
        }

        let url = self.url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(ApiError::BadRequest("url is required".into()));
        }
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ApiError::BadRequest("username is required".into()));
        }

        let params = ConnectionParams {
            url: url.to_string(),
            username: username.to_string(),
            use_mock_data: false,
        };
        Ok((params, password))
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct RackRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDeviceRequest {
    pub rack_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSettingsRequest {
    pub auto_refresh: Option<bool>,
    pub interval_secs: Option<u64>,
}

// ── Responses ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreatedRack {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRack {
    pub moved_devices: usize,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub outcome: &'static str,
}

impl From<RefreshOutcome> for RefreshResponse {
    fn from(outcome: RefreshOutcome) -> Self {
        let outcome = match outcome {
            RefreshOutcome::NotConnected => "not_connected",
            RefreshOutcome::Skipped => "skipped",
            RefreshOutcome::Applied => "applied",
            RefreshOutcome::Discarded => "discarded",
        };
        Self { outcome }
    }
}
