//! Typed Rust client for the Proxmox VE REST API.
//!
//! Covers the subset needed to build a cluster inventory:
//! ticket login, node listing and status, QEMU VM listing, VM config,
//! and guest-agent network interfaces.
//!
//! The base URL is the API root, e.g. `https://pve.example:8006/api2/json`.

mod types;

pub use types::*;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::types::Envelope;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("proxmox api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("proxmox api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("proxmox api {endpoint} returned no data")]
    MissingData { endpoint: &'static str },

    #[error("proxmox client has no ticket")]
    MissingTicket,
}

impl Error {
    /// HTTP status of an API error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status(),
            _ => None,
        }
    }

    /// 401 and 403 both mean the ticket is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }

    /// The response arrived but did not have the expected shape.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::MissingData { .. } => true,
            Self::Request(e) => e.is_decode(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the Proxmox VE REST API.
#[derive(Clone)]
pub struct PveClient {
    base_url: String,
    ticket: Option<String>,
    http: reqwest::Client,
}

impl PveClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, reqwest::Client::new())
    }

    /// Share an existing connection pool across clients.
    pub fn with_http(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ticket: None,
            http,
        }
    }

    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.ticket = Some(ticket.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn auth(&self) -> Result<String> {
        self.ticket
            .as_deref()
            .map(|t| format!("PVEAuthCookie={t}"))
            .ok_or(Error::MissingTicket)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    async fn data<T: DeserializeOwned>(resp: reqwest::Response, endpoint: &'static str) -> Result<T> {
        let envelope: Envelope<T> = Self::check(resp, endpoint).await?.json().await?;
        envelope.data.ok_or(Error::MissingData { endpoint })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, endpoint: &'static str) -> Result<T> {
        let resp = self
            .http
            .get(self.url(path))
            .header("Authorization", self.auth()?)
            .send()
            .await?;

        Self::data(resp, endpoint).await
    }

    // ── Access ───────────────────────────────────────────────────────

    /// Exchange credentials for a session ticket.
    pub async fn create_ticket(&self, username: &str, password: &str) -> Result<Ticket> {
        let resp = self
            .http
            .post(self.url("access/ticket"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        Self::data(resp, "create ticket").await
    }

    // ── Nodes ────────────────────────────────────────────────────────

    pub async fn list_nodes(&self) -> Result<Vec<NodeListItem>> {
        self.get("nodes", "list nodes").await
    }

    pub async fn node_status(&self, node: &str) -> Result<NodeStatus> {
        self.get(&format!("nodes/{node}/status"), "node status").await
    }

    // ── QEMU ─────────────────────────────────────────────────────────

    pub async fn list_qemu(&self, node: &str) -> Result<Vec<QemuListItem>> {
        self.get(&format!("nodes/{node}/qemu"), "list qemu").await
    }

    pub async fn qemu_config(&self, node: &str, vmid: u32) -> Result<QemuConfig> {
        self.get(&format!("nodes/{node}/qemu/{vmid}/config"), "qemu config")
            .await
    }

    /// Requires the QEMU guest agent to be running inside the VM.
    pub async fn agent_network_interfaces(&self, node: &str, vmid: u32) -> Result<AgentInterfaces> {
        self.get(
            &format!("nodes/{node}/qemu/{vmid}/agent/network-get-interfaces"),
            "agent network interfaces",
        )
        .await
    }
}
