//! Inventory the management API does not model.
//!
//! Proxmox knows nothing about racks, switches or power, so a remote fetch
//! starts from this fixed layout. Every device lands in [`DEFAULT_RACK_ID`]
//! until the operator moves it.

use rackview_model::{Device, NetworkSpec, StorageSpec};

pub const DEFAULT_RACK_ID: &str = "rack-1";

const TIB: u64 = 1 << 40;

pub fn default_racks() -> Vec<Device> {
    vec![
        Device::rack(DEFAULT_RACK_ID, "Rack A1").with_description("Primary server rack"),
        Device::rack("rack-2", "Rack A2").with_description("Secondary server rack"),
    ]
}

pub fn default_storage() -> Vec<Device> {
    vec![
        Device::storage(
            "storage-1",
            "synology-nas01",
            StorageSpec {
                storage_type: "NAS".into(),
                storage_capacity: 48 * TIB,
            },
        )
        .with_ip("192.168.1.20")
        .in_rack(DEFAULT_RACK_ID),
    ]
}

pub fn default_network() -> Vec<Device> {
    vec![
        Device::network(
            "network-1",
            "core-switch-01",
            NetworkSpec {
                network_ports: 48,
                network_speed: "10 Gbps".into(),
            },
        )
        .with_ip("192.168.1.254")
        .in_rack(DEFAULT_RACK_ID),
    ]
}

pub fn default_ups() -> Vec<Device> {
    vec![
        Device::ups("ups-1", "apc-ups-01")
            .with_ip("192.168.1.30")
            .with_description("APC Smart-UPS 3000VA")
            .in_rack(DEFAULT_RACK_ID),
    ]
}
