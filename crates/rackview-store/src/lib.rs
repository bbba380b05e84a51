//! Local persisted state.
//!
//! Three independent slots live on one [`StorageBackend`]:
//!
//! - `infrastructure`: the last inventory snapshot, rack edits included
//!   ([`LocalEditStore`]),
//! - `session`: the cached API ticket ([`SessionStore`]),
//! - `connection`: the last connection parameters ([`SessionStore`]).

mod backend;
mod edit_store;
mod session;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use edit_store::LocalEditStore;
pub use session::{ConnectionParams, SessionStore, SessionTicket, TICKET_VALIDITY_MILLIS};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub(crate) const SNAPSHOT_KEY: &str = "infrastructure";
pub(crate) const SESSION_KEY: &str = "session";
pub(crate) const CONNECTION_KEY: &str = "connection";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage io error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// What a slot held when it was read.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored<T> {
    Absent,
    Present(T),
    /// Unreadable or unparseable. Callers treat it as absent.
    Corrupt,
}

impl<T> Stored<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Corrupt => None,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt)
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(backend: &dyn StorageBackend, key: &'static str) -> Stored<T> {
    let raw = match backend.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Stored::Absent,
        Err(e) => {
            tracing::warn!(slot = key, error = %e, "failed to read persisted state");
            return Stored::Corrupt;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Stored::Present(value),
        Err(e) => {
            tracing::warn!(slot = key, error = %e, "persisted state is corrupt, ignoring it");
            Stored::Corrupt
        }
    }
}

pub(crate) fn write_json<T: Serialize>(backend: &dyn StorageBackend, key: &'static str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value).map_err(|source| Error::Serialize { key, source })?;
    backend.set(key, &raw)
}
