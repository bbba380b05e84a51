use std::sync::Arc;

use rackview_model::InfrastructureSnapshot;

use crate::{
    CONNECTION_KEY, Result, SESSION_KEY, SNAPSHOT_KEY, StorageBackend, Stored, read_json, write_json,
};

/// Persists the last known snapshot, including locally authored rack
/// topology.
#[derive(Clone)]
pub struct LocalEditStore {
    backend: Arc<dyn StorageBackend>,
}

impl LocalEditStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn save(&self, snapshot: &InfrastructureSnapshot) -> Result<()> {
        write_json(&*self.backend, SNAPSHOT_KEY, snapshot)
    }

    /// Last saved snapshot. Missing and corrupt payloads are both `None`.
    pub fn load(&self) -> Option<InfrastructureSnapshot> {
        self.inspect().into_option()
    }

    /// Like [`load`](Self::load) but tells a corrupt slot apart from an empty one.
    pub fn inspect(&self) -> Stored<InfrastructureSnapshot> {
        read_json(&*self.backend, SNAPSHOT_KEY)
    }

    /// Removes the snapshot together with the cached ticket and connection.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(SNAPSHOT_KEY)?;
        self.backend.remove(SESSION_KEY)?;
        self.backend.remove(CONNECTION_KEY)?;
        tracing::info!("cleared persisted infrastructure and session state");
        Ok(())
    }
}
