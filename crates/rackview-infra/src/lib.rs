pub mod enrichment;
pub mod mock;
pub mod proxmox;
pub mod topology;

use std::time::Duration;

use async_trait::async_trait;
use rackview_model::InfrastructureSnapshot;
use rackview_store::{ConnectionParams, SessionStore};

use crate::mock::MockSource;
use crate::proxmox::ProxmoxSource;

/// Why a fetch produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("a password is required for the initial authentication")]
    AuthenticationRequired,

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("session expired, please sign in again")]
    SessionExpired,

    #[error(
        "cannot reach the management API ({0}); this is usually a CORS or connectivity problem, consider using mock data"
    )]
    NetworkUnreachable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("{endpoint} returned {status}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// One fetch: where to go and, on first connection, the secret to log in with.
#[derive(Clone, Copy)]
pub struct FetchRequest<'a> {
    pub params: &'a ConnectionParams,
    pub password: Option<&'a str>,
}

impl<'a> FetchRequest<'a> {
    pub fn new(params: &'a ConnectionParams, password: Option<&'a str>) -> Self {
        Self { params, password }
    }
}

/// Produces a complete inventory snapshot.
///
/// Implementations assign every placeable device a default rack; the
/// reconciler later replaces it with the operator's placement.
#[async_trait]
pub trait InventorySource: Send + Sync + 'static {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<InfrastructureSnapshot>;
}

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Picks the synthetic or the Proxmox source per request.
pub struct InventoryFetcher {
    proxmox: ProxmoxSource,
    mock: MockSource,
}

impl InventoryFetcher {
    pub fn new(session: SessionStore) -> Self {
        let http = match reqwest::Client::builder().timeout(HTTP_TIMEOUT).build() {
            Ok(http) => http,
            Err(e) => {
                tracing::warn!(error = %e, "failed to build http client, falling back to defaults");
                reqwest::Client::new()
            }
        };

        Self {
            proxmox: ProxmoxSource::new(session, http),
            mock: MockSource::new(),
        }
    }
}

#[async_trait]
impl InventorySource for InventoryFetcher {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<InfrastructureSnapshot> {
        if request.params.use_mock_data {
            self.mock.fetch(request).await
        } else {
            self.proxmox.fetch(request).await
        }
    }
}
