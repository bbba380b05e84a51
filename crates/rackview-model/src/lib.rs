//! Inventory data model shared by the fetcher, the local store and the
//! state controller.
//!
//! A snapshot holds racks, rack-placeable devices (nodes, storage, network,
//! UPS) and the virtual machines running on nodes. Device identifiers are
//! unique across the whole snapshot.

mod device;
mod snapshot;

pub use device::*;
pub use snapshot::*;
