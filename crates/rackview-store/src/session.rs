use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CONNECTION_KEY, Result, SESSION_KEY, StorageBackend, Stored, read_json, write_json};

/// Cached tickets are trusted for two hours after they were issued.
pub const TICKET_VALIDITY_MILLIS: i64 = 2 * 60 * 60 * 1000;

/// API ticket obtained from a credential exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTicket {
    pub ticket: String,
    pub csrf_token: String,
    pub saved_at_epoch_millis: i64,
}

impl SessionTicket {
    pub fn new(ticket: impl Into<String>, csrf_token: impl Into<String>, saved_at: DateTime<Utc>) -> Self {
        Self {
            ticket: ticket.into(),
            csrf_token: csrf_token.into(),
            saved_at_epoch_millis: saved_at.timestamp_millis(),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() < self.saved_at_epoch_millis.saturating_add(TICKET_VALIDITY_MILLIS)
    }
}

/// Where and how to fetch inventory. The secret is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionParams {
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub use_mock_data: bool,
}

impl ConnectionParams {
    pub fn mock() -> Self {
        Self {
            url: "mock://".into(),
            username: "demo".into(),
            use_mock_data: true,
        }
    }
}

/// Ticket and connection cache with an explicit lifecycle: created at start-up,
/// purged on session expiry, cleared on logout.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Ticket still inside its validity window.
    pub fn cached_ticket(&self) -> Option<SessionTicket> {
        self.cached_ticket_at(Utc::now())
    }

    pub fn cached_ticket_at(&self, now: DateTime<Utc>) -> Option<SessionTicket> {
        self.inspect_ticket()
            .into_option()
            .filter(|ticket| ticket.is_valid_at(now))
    }

    /// Raw slot contents, expired tickets included.
    pub fn inspect_ticket(&self) -> Stored<SessionTicket> {
        read_json(&*self.backend, SESSION_KEY)
    }

    pub fn save_ticket(&self, ticket: &SessionTicket) -> Result<()> {
        write_json(&*self.backend, SESSION_KEY, ticket)
    }

    pub fn purge_ticket(&self) -> Result<()> {
        self.backend.remove(SESSION_KEY)
    }

    pub fn connection(&self) -> Option<ConnectionParams> {
        self.inspect_connection().into_option()
    }

    pub fn inspect_connection(&self) -> Stored<ConnectionParams> {
        read_json(&*self.backend, CONNECTION_KEY)
    }

    pub fn save_connection(&self, params: &ConnectionParams) -> Result<()> {
        write_json(&*self.backend, CONNECTION_KEY, params)
    }

    /// Logout: forget ticket and connection, keep the inventory snapshot.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(SESSION_KEY)?;
        self.backend.remove(CONNECTION_KEY)
    }
}
