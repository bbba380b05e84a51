use std::collections::{HashMap, HashSet};

use rackview_model::{Device, InfrastructureSnapshot};

/// Merge a freshly fetched snapshot with the previous one.
///
/// The remote side owns existence and live status; the previous snapshot owns
/// rack topology. So: entries come from `fresh`, rack assignments of known
/// devices and the rack collection come from `previous`, VMs come from
/// `fresh`. Devices that disappeared remotely are dropped.
///
/// Without a previous snapshot `fresh` is returned untouched.
pub fn reconcile(fresh: InfrastructureSnapshot, previous: Option<&InfrastructureSnapshot>) -> InfrastructureSnapshot {
    let Some(previous) = previous else {
        return fresh;
    };

    let racks = previous.racks.clone();
    let rack_ids: HashSet<&str> = racks.iter().map(|r| r.id.as_str()).collect();
    let fallback = racks.first().map(|r| r.id.clone());
    let placement = Placement {
        rack_ids: &rack_ids,
        fallback: fallback.as_deref(),
    };

    let nodes = placement.apply(fresh.nodes, &previous.nodes);
    let storage = placement.apply(fresh.storage, &previous.storage);
    let network = placement.apply(fresh.network, &previous.network);
    let ups = placement.apply(fresh.ups, &previous.ups);

    InfrastructureSnapshot {
        nodes,
        racks,
        storage,
        network,
        ups,
        vms: fresh.vms,
    }
}

struct Placement<'a> {
    rack_ids: &'a HashSet<&'a str>,
    fallback: Option<&'a str>,
}

impl Placement<'_> {
    fn apply(&self, fresh: Vec<Device>, previous: &[Device]) -> Vec<Device> {
        let kept: HashMap<&str, Option<&str>> = previous
            .iter()
            .map(|d| (d.id.as_str(), d.rack_id.as_deref()))
            .collect();

        fresh
            .into_iter()
            .map(|mut device| {
                if let Some(rack_id) = kept.get(device.id.as_str()) {
                    device.rack_id = rack_id.map(str::to_string);
                }

                // A default rack the operator has since deleted.
                let dangling = device
                    .rack_id
                    .as_deref()
                    .is_some_and(|id| !self.rack_ids.contains(id));
                if dangling {
                    tracing::debug!(
                        device_id = %device.id,
                        rack_id = ?device.rack_id,
                        fallback = ?self.fallback,
                        "reconcile: rack no longer exists, re-placing device"
                    );
                    device.rack_id = self.fallback.map(str::to_string);
                }

                device
            })
            .collect()
    }
}
