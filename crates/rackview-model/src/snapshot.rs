use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceType, VirtualMachine};

/// A broken snapshot invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("device {device_id} references unknown rack {rack_id}")]
    DanglingRack { device_id: String, rack_id: String },

    #[error("vm {vm_id} references unknown node {node_id}")]
    DanglingNode { vm_id: String, node_id: String },

    #[error("duplicate id {0}")]
    DuplicateId(String),

    #[error("rack {0} carries a rack assignment")]
    NestedRack(String),

    #[error("{device_type} device {id} stored in the {collection} collection")]
    MisplacedDevice {
        id: String,
        device_type: DeviceType,
        collection: DeviceType,
    },
}

/// Complete picture of the inventory at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureSnapshot {
    pub nodes: Vec<Device>,
    pub racks: Vec<Device>,
    pub storage: Vec<Device>,
    pub network: Vec<Device>,
    pub ups: Vec<Device>,
    pub vms: Vec<VirtualMachine>,
}

impl InfrastructureSnapshot {
    pub fn collection(&self, device_type: DeviceType) -> &[Device] {
        match device_type {
            DeviceType::Rack => &self.racks,
            DeviceType::Node => &self.nodes,
            DeviceType::Storage => &self.storage,
            DeviceType::Network => &self.network,
            DeviceType::Ups => &self.ups,
        }
    }

    /// Nodes, storage, network and UPS devices, in that order.
    pub fn placeable(&self) -> impl Iterator<Item = &Device> {
        self.nodes
            .iter()
            .chain(&self.storage)
            .chain(&self.network)
            .chain(&self.ups)
    }

    pub fn placeable_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.nodes
            .iter_mut()
            .chain(self.storage.iter_mut())
            .chain(self.network.iter_mut())
            .chain(self.ups.iter_mut())
    }

    /// Any device, racks included.
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.racks.iter().chain(self.placeable()).find(|d| d.id == id)
    }

    pub fn placeable_device_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.placeable_mut().find(|d| d.id == id)
    }

    pub fn rack(&self, id: &str) -> Option<&Device> {
        self.racks.iter().find(|r| r.id == id)
    }

    pub fn rack_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.racks.iter_mut().find(|r| r.id == id)
    }

    pub fn first_rack_id(&self) -> Option<&str> {
        self.racks.first().map(|r| r.id.as_str())
    }

    pub fn vm(&self, id: &str) -> Option<&VirtualMachine> {
        self.vms.iter().find(|vm| vm.id == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.device(id).is_some() || self.vm(id).is_some()
    }

    pub fn devices_in_rack<'a>(&'a self, rack_id: &'a str) -> impl Iterator<Item = &'a Device> {
        self.placeable()
            .filter(move |d| d.rack_id.as_deref() == Some(rack_id))
    }

    pub fn vms_on_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a VirtualMachine> {
        self.vms.iter().filter(move |vm| vm.node_id == node_id)
    }

    /// Every invariant violation, in collection order. Empty means valid.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        let mut seen = HashSet::new();
        let all_ids = self
            .racks
            .iter()
            .chain(self.placeable())
            .map(|d| d.id.as_str())
            .chain(self.vms.iter().map(|vm| vm.id.as_str()));
        for id in all_ids {
            if !seen.insert(id) {
                violations.push(Violation::DuplicateId(id.to_string()));
            }
        }

        for collection in [
            DeviceType::Rack,
            DeviceType::Node,
            DeviceType::Storage,
            DeviceType::Network,
            DeviceType::Ups,
        ] {
            for device in self.collection(collection) {
                if device.device_type() != collection {
                    violations.push(Violation::MisplacedDevice {
                        id: device.id.clone(),
                        device_type: device.device_type(),
                        collection,
                    });
                }
            }
        }

        for rack in &self.racks {
            if rack.rack_id.is_some() {
                violations.push(Violation::NestedRack(rack.id.clone()));
            }
        }

        for device in self.placeable() {
            if let Some(rack_id) = &device.rack_id
                && self.rack(rack_id).is_none()
            {
                violations.push(Violation::DanglingRack {
                    device_id: device.id.clone(),
                    rack_id: rack_id.clone(),
                });
            }
        }

        for vm in &self.vms {
            if !self.nodes.iter().any(|n| n.id == vm.node_id) {
                violations.push(Violation::DanglingNode {
                    vm_id: vm.id.clone(),
                    node_id: vm.node_id.clone(),
                });
            }
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceStatus, NodeSpec, StorageSpec, VmStatus};

    fn node(id: &str) -> Device {
        Device::node(
            id,
            id.trim_start_matches("node-"),
            NodeSpec {
                cpu_model: "AMD EPYC 7302".into(),
                cpu_cores: 16,
                memory: 256 << 30,
            },
        )
    }

    fn vm(id: &str, node_id: &str) -> VirtualMachine {
        VirtualMachine {
            id: id.into(),
            name: id.into(),
            status: VmStatus::Running,
            os: "Debian 12".into(),
            ip_address: "10.0.0.5".into(),
            cpu_cores: 2,
            memory: 4096,
            disk: 32.0,
            node_id: node_id.into(),
        }
    }

    fn sample() -> InfrastructureSnapshot {
        InfrastructureSnapshot {
            racks: vec![Device::rack("rack-1", "Rack A1"), Device::rack("rack-2", "Rack A2")],
            nodes: vec![node("node-pve1").in_rack("rack-1"), node("node-pve2").in_rack("rack-2")],
            storage: vec![Device::storage(
                "storage-1",
                "nas",
                StorageSpec {
                    storage_type: "NAS".into(),
                    storage_capacity: 48 << 40,
                },
            )
            .in_rack("rack-1")],
            vms: vec![vm("vm-101", "node-pve1")],
            ..Default::default()
        }
    }

    #[test]
    fn sample_snapshot_is_valid() {
        assert_eq!(sample().validate(), vec![]);
    }

    #[test]
    fn lookups_span_collections() {
        let snapshot = sample();
        assert!(snapshot.device("rack-2").unwrap().is_rack());
        assert_eq!(snapshot.device("storage-1").unwrap().device_type(), DeviceType::Storage);
        assert!(snapshot.device("vm-101").is_none());
        assert!(snapshot.contains_id("vm-101"));

        let in_rack_1: Vec<&str> = snapshot.devices_in_rack("rack-1").map(|d| d.id.as_str()).collect();
        assert_eq!(in_rack_1, vec!["node-pve1", "storage-1"]);
        assert_eq!(snapshot.vms_on_node("node-pve1").count(), 1);
        assert_eq!(snapshot.vms_on_node("node-pve2").count(), 0);
    }

    #[test]
    fn validate_reports_dangling_references() {
        let mut snapshot = sample();
        snapshot.nodes[1].rack_id = Some("rack-9".into());
        snapshot.vms.push(vm("vm-102", "node-gone"));

        assert_eq!(
            snapshot.validate(),
            vec![
                Violation::DanglingRack {
                    device_id: "node-pve2".into(),
                    rack_id: "rack-9".into(),
                },
                Violation::DanglingNode {
                    vm_id: "vm-102".into(),
                    node_id: "node-gone".into(),
                },
            ]
        );
    }

    #[test]
    fn validate_reports_duplicates_across_collections() {
        let mut snapshot = sample();
        snapshot.ups.push(Device::ups("node-pve1", "apc").in_rack("rack-1"));

        assert_eq!(snapshot.validate(), vec![Violation::DuplicateId("node-pve1".into())]);
    }

    #[test]
    fn validate_reports_misplaced_and_nested() {
        let mut snapshot = sample();
        snapshot.network.push(Device::ups("ups-1", "apc"));
        snapshot.racks[0].rack_id = Some("rack-2".into());

        let violations = snapshot.validate();
        assert!(violations.contains(&Violation::MisplacedDevice {
            id: "ups-1".into(),
            device_type: DeviceType::Ups,
            collection: DeviceType::Network,
        }));
        assert!(violations.contains(&Violation::NestedRack("rack-1".into())));
    }

    #[test]
    fn json_uses_type_tag_and_camel_case() {
        let device = node("node-pve1")
            .in_rack("rack-1")
            .with_status(DeviceStatus::Warning)
            .with_ip("192.168.1.101");
        let value = serde_json::to_value(&device).unwrap();

        assert_eq!(value["type"], "node");
        assert_eq!(value["rackId"], "rack-1");
        assert_eq!(value["ipAddress"], "192.168.1.101");
        assert_eq!(value["cpuModel"], "AMD EPYC 7302");
        assert_eq!(value["status"], "warning");
        assert!(value.get("description").is_none());

        let back: Device = serde_json::from_value(value).unwrap();
        assert_eq!(back, device);
    }
}
