use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use rackview_infra::{FetchError, FetchRequest, InventorySource};
use rackview_model::{Device, DeviceStatus, InfrastructureSnapshot};
use rackview_store::{ConnectionParams, LocalEditStore, SessionStore, Stored};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::details::DeviceDetails;
use crate::error::{ControllerError, Result};
use crate::reconcile::reconcile;
use crate::refresh::RefreshTask;

pub const MIN_REFRESH_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing to refresh.
    NotConnected,
    /// Another refresh was already in flight.
    Skipped,
    Applied,
    /// The connection changed while fetching; the result was thrown away.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            refresh_interval_secs: 30,
        }
    }
}

/// Read-only copy of everything the views render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerView {
    pub connection: ConnectionState,
    #[serde(rename = "connectionParams")]
    pub params: Option<ConnectionParams>,
    pub snapshot: Option<InfrastructureSnapshot>,
    pub selected: Option<DeviceDetails>,
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
    pub last_error: Option<String>,
}

struct ControllerState {
    connection: ConnectionState,
    params: Option<ConnectionParams>,
    snapshot: Option<InfrastructureSnapshot>,
    selected: Option<String>,
    /// Bumped on every connect and disconnect; in-flight fetches from an
    /// older epoch are discarded.
    epoch: u64,
    auto_refresh: bool,
    refresh_interval: Duration,
    last_error: Option<String>,
    refresh_task: Option<RefreshTask>,
}

impl ControllerState {
    fn commit(&mut self, snapshot: InfrastructureSnapshot) {
        if let Some(id) = &self.selected
            && !snapshot.contains_id(id)
        {
            debug!(id = %id, "selected device vanished, closing details");
            self.selected = None;
        }
        self.snapshot = Some(snapshot);
    }
}

/// Single owner of the current inventory snapshot.
///
/// All transitions go through here: fetch-reconcile-persist cycles and rack
/// topology edits. State sits behind one async mutex that is never held
/// across a remote call.
pub struct InfrastructureController {
    source: Arc<dyn InventorySource>,
    edits: LocalEditStore,
    session: SessionStore,
    state: Mutex<ControllerState>,
    refreshing: AtomicBool,
    last_rack_stamp: AtomicI64,
}

impl InfrastructureController {
    pub fn new(
        source: Arc<dyn InventorySource>,
        edits: LocalEditStore,
        session: SessionStore,
        settings: ControllerSettings,
    ) -> Arc<Self> {
        let interval_secs = settings.refresh_interval_secs.max(MIN_REFRESH_INTERVAL_SECS);

        Arc::new(Self {
            source,
            edits,
            session,
            state: Mutex::new(ControllerState {
                connection: ConnectionState::Disconnected,
                params: None,
                snapshot: None,
                selected: None,
                epoch: 0,
                auto_refresh: settings.auto_refresh,
                refresh_interval: Duration::from_secs(interval_secs),
                last_error: None,
                refresh_task: None,
            }),
            refreshing: AtomicBool::new(false),
            last_rack_stamp: AtomicI64::new(0),
        })
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Silent start-up restore from persisted state. Returns whether the
    /// controller came up connected.
    pub async fn restore(self: &Arc<Self>) -> bool {
        let params = self.session.inspect_connection();
        let snapshot = self.edits.inspect();
        let ticket = self.session.inspect_ticket();

        if params.is_corrupt() || snapshot.is_corrupt() || ticket.is_corrupt() {
            warn!("persisted state is corrupt, starting disconnected");
            if let Err(e) = self.edits.clear() {
                warn!(error = %e, "failed to clear corrupt state");
            }
            return false;
        }

        let (Stored::Present(params), Stored::Present(snapshot)) = (params, snapshot) else {
            return false;
        };

        // Parses but breaks the snapshot invariants: handled like a corrupt blob.
        let violations = snapshot.validate();
        if !violations.is_empty() {
            warn!(?violations, "persisted snapshot is inconsistent, starting disconnected");
            if let Err(e) = self.edits.clear() {
                warn!(error = %e, "failed to clear inconsistent state");
            }
            return false;
        }

        if !params.use_mock_data {
            match ticket {
                Stored::Present(ticket) if ticket.is_valid_at(Utc::now()) => {}
                Stored::Present(_) => {
                    info!("cached session ticket expired, starting disconnected");
                    if let Err(e) = self.session.clear() {
                        warn!(error = %e, "failed to clear expired session");
                    }
                    return false;
                }
                _ => return false,
            }
        }

        let mut state = self.state.lock().await;
        info!(url = %params.url, username = %params.username, "restored previous session");
        state.epoch += 1;
        state.connection = ConnectionState::Connected;
        state.params = Some(params);
        state.commit(snapshot);
        if state.auto_refresh {
            self.start_refresh(&mut state);
        }
        true
    }

    /// Fetch, reconcile against the persisted snapshot, persist, and go
    /// connected. On failure nothing changes, and neither does it when a
    /// disconnect or another connect commits while the fetch is running.
    pub async fn connect(self: &Arc<Self>, params: ConnectionParams, password: Option<String>) -> Result<()> {
        info!(url = %params.url, username = %params.username, mock = params.use_mock_data, "connecting");
        let epoch = self.state.lock().await.epoch;
        let fresh = self
            .source
            .fetch(&FetchRequest::new(&params, password.as_deref()))
            .await?;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            info!("connection changed during connect, discarding result");
            return Err(ControllerError::Superseded);
        }
        let snapshot = reconcile(fresh, self.edits.load().as_ref());
        self.edits.save(&snapshot)?;
        self.session.save_connection(&params)?;

        state.epoch += 1;
        state.connection = ConnectionState::Connected;
        state.params = Some(params);
        state.last_error = None;
        state.commit(snapshot);
        if state.auto_refresh {
            self.start_refresh(&mut state);
        }

        info!("connected");
        Ok(())
    }

    /// Re-fetch and reconcile against the in-memory snapshot.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            return Ok(RefreshOutcome::Skipped);
        };

        let (params, epoch) = {
            let state = self.state.lock().await;
            match (&state.connection, &state.params) {
                (ConnectionState::Connected, Some(params)) => (params.clone(), state.epoch),
                _ => return Ok(RefreshOutcome::NotConnected),
            }
        };

        let fetched = self.source.fetch(&FetchRequest::new(&params, None)).await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch || state.connection != ConnectionState::Connected {
            info!("connection changed during refresh, discarding result");
            return Ok(RefreshOutcome::Discarded);
        }

        let fresh = match fetched {
            Ok(fresh) => fresh,
            Err(FetchError::SessionExpired) => {
                warn!("session expired during refresh, disconnecting");
                if let Err(e) = self.disconnect_locked(&mut state) {
                    warn!(error = %e, "failed to clear session after expiry");
                }
                // The scheduled task was just aborted and may not get to report this.
                let error = ControllerError::from(FetchError::SessionExpired);
                state.last_error = Some(error.to_string());
                return Err(error);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot = reconcile(fresh, state.snapshot.as_ref());
        self.edits.save(&snapshot)?;
        state.commit(snapshot);
        state.last_error = None;
        debug!("refresh applied");
        Ok(RefreshOutcome::Applied)
    }

    /// Forget the session. The persisted snapshot stays for the next connect.
    pub async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.disconnect_locked(&mut state)?;
        info!("disconnected");
        Ok(())
    }

    fn disconnect_locked(&self, state: &mut ControllerState) -> Result<()> {
        state.refresh_task = None;
        state.epoch += 1;
        state.connection = ConnectionState::Disconnected;
        state.params = None;
        state.snapshot = None;
        state.selected = None;
        self.session.clear()?;
        Ok(())
    }

    // ── Rack topology edits ──────────────────────────────────────────

    /// Apply `edit` to a copy of the snapshot, persist it, then swap it in.
    async fn edit<T>(&self, edit: impl FnOnce(&mut InfrastructureSnapshot) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock().await;
        let mut next = state.snapshot.clone().ok_or(ControllerError::NotConnected)?;
        let out = edit(&mut next)?;
        self.edits.save(&next)?;
        state.commit(next);
        Ok(out)
    }

    /// Returns the new rack's id.
    pub async fn create_rack(&self, name: &str) -> Result<String> {
        let name = rack_name(name)?;
        let id = self
            .edit(|snapshot| {
                let id = loop {
                    let id = format!("rack-{}", self.next_rack_stamp());
                    if !snapshot.contains_id(&id) {
                        break id;
                    }
                };
                snapshot.racks.push(
                    Device::rack(&id, name)
                        .with_status(DeviceStatus::Online)
                        .with_description("New server rack"),
                );
                Ok(id)
            })
            .await?;

        info!(rack_id = %id, name, "rack created");
        Ok(id)
    }

    pub async fn rename_rack(&self, rack_id: &str, name: &str) -> Result<()> {
        let name = rack_name(name)?;
        self.edit(|snapshot| {
            let rack = snapshot
                .rack_mut(rack_id)
                .ok_or_else(|| ControllerError::validation(format!("unknown rack {rack_id}")))?;
            rack.name = name.to_string();
            Ok(())
        })
        .await?;

        info!(rack_id, name, "rack renamed");
        Ok(())
    }

    /// Devices in the deleted rack move to the first remaining rack, or
    /// become unassigned. Returns how many devices moved.
    pub async fn delete_rack(&self, rack_id: &str) -> Result<usize> {
        let moved = self
            .edit(|snapshot| {
                let position = snapshot
                    .racks
                    .iter()
                    .position(|r| r.id == rack_id)
                    .ok_or_else(|| ControllerError::validation(format!("unknown rack {rack_id}")))?;
                snapshot.racks.remove(position);

                let fallback = snapshot.first_rack_id().map(str::to_string);
                let mut moved = 0;
                for device in snapshot.placeable_mut() {
                    if device.rack_id.as_deref() == Some(rack_id) {
                        device.rack_id = fallback.clone();
                        moved += 1;
                    }
                }
                Ok(moved)
            })
            .await?;

        info!(rack_id, moved, "rack deleted");
        Ok(moved)
    }

    /// Only nodes, storage, network and UPS devices can move.
    pub async fn move_device(&self, device_id: &str, target_rack_id: &str) -> Result<()> {
        self.edit(|snapshot| {
            if snapshot.rack(target_rack_id).is_none() {
                return Err(ControllerError::validation(format!("unknown rack {target_rack_id}")));
            }
            if snapshot.vm(device_id).is_some() {
                return Err(ControllerError::validation("virtual machines cannot be moved between racks"));
            }
            if snapshot.rack(device_id).is_some() {
                return Err(ControllerError::validation("racks cannot be placed in other racks"));
            }
            let device = snapshot
                .placeable_device_mut(device_id)
                .ok_or_else(|| ControllerError::validation(format!("unknown device {device_id}")))?;
            device.rack_id = Some(target_rack_id.to_string());
            Ok(())
        })
        .await?;

        info!(device_id, rack_id = target_rack_id, "device moved");
        Ok(())
    }

    /// Strictly increasing millisecond stamp, even within one millisecond.
    fn next_rack_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_rack_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    // ── Details panel ────────────────────────────────────────────────

    pub async fn select_device(&self, id: &str) -> Result<DeviceDetails> {
        let mut state = self.state.lock().await;
        let snapshot = state.snapshot.as_ref().ok_or(ControllerError::NotConnected)?;
        let details = DeviceDetails::lookup(snapshot, id)
            .ok_or_else(|| ControllerError::validation(format!("unknown device {id}")))?;
        state.selected = Some(id.to_string());
        Ok(details)
    }

    pub async fn close_device_details(&self) {
        self.state.lock().await.selected = None;
    }

    // ── Refresh settings ─────────────────────────────────────────────

    pub async fn set_auto_refresh(self: &Arc<Self>, enabled: bool) {
        let mut state = self.state.lock().await;
        state.auto_refresh = enabled;
        if !enabled {
            state.refresh_task = None;
        } else if state.connection == ConnectionState::Connected && state.refresh_task.is_none() {
            self.start_refresh(&mut state);
        }
        info!(enabled, "auto refresh updated");
    }

    pub async fn set_refresh_interval(self: &Arc<Self>, secs: u64) -> Result<()> {
        if secs < MIN_REFRESH_INTERVAL_SECS {
            return Err(ControllerError::validation(format!(
                "refresh interval must be at least {MIN_REFRESH_INTERVAL_SECS} seconds"
            )));
        }

        let mut state = self.state.lock().await;
        state.refresh_interval = Duration::from_secs(secs);
        if state.refresh_task.is_some() {
            self.start_refresh(&mut state);
        }
        info!(secs, "refresh interval updated");
        Ok(())
    }

    fn start_refresh(self: &Arc<Self>, state: &mut ControllerState) {
        // Replacing the old task aborts it.
        state.refresh_task = Some(RefreshTask::spawn(Arc::downgrade(self), state.refresh_interval));
    }

    pub(crate) async fn note_refresh_error(&self, error: &ControllerError) {
        self.state.lock().await.last_error = Some(error.to_string());
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.last_error = None;
    }

    // ── Views ────────────────────────────────────────────────────────

    pub async fn view(&self) -> ControllerView {
        let state = self.state.lock().await;
        let selected = match (&state.snapshot, &state.selected) {
            (Some(snapshot), Some(id)) => DeviceDetails::lookup(snapshot, id),
            _ => None,
        };

        ControllerView {
            connection: state.connection,
            params: state.params.clone(),
            snapshot: state.snapshot.clone(),
            selected,
            auto_refresh: state.auto_refresh,
            refresh_interval_secs: state.refresh_interval.as_secs(),
            last_error: state.last_error.clone(),
        }
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.state.lock().await.connection
    }

    pub async fn snapshot(&self) -> Option<InfrastructureSnapshot> {
        self.state.lock().await.snapshot.clone()
    }

    pub async fn is_refresh_scheduled(&self) -> bool {
        self.state.lock().await.refresh_task.is_some()
    }
}

fn rack_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ControllerError::validation("rack name must not be empty"));
    }
    Ok(name)
}

/// Marks a refresh in flight for as long as it lives.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
