//! Application state for the inventory dashboard.
//!
//! [`InfrastructureController`] owns the snapshot the views render. Fetches
//! go through an [`InventorySource`](rackview_infra::InventorySource), every
//! result is merged with the operator's rack topology by [`reconcile`], and
//! each committed snapshot is persisted before it becomes visible.

mod controller;
mod details;
mod error;
mod reconcile;
mod refresh;

pub use controller::{
    ConnectionState, ControllerSettings, ControllerView, InfrastructureController, MIN_REFRESH_INTERVAL_SECS,
    RefreshOutcome,
};
pub use details::DeviceDetails;
pub use error::{ControllerError, Result};
pub use reconcile::reconcile;
pub use refresh::RefreshTask;
