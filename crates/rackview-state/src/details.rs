use rackview_model::{Device, DeviceType, InfrastructureSnapshot, VirtualMachine};
use serde::Serialize;

/// What the details panel shows for the selected id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeviceDetails {
    #[serde(rename_all = "camelCase")]
    Device {
        device: Device,
        /// The rack holding this device, if any.
        rack: Option<Device>,
        /// Devices placed in this rack (racks only).
        contents: Vec<Device>,
        /// Guests running on this node (nodes only).
        vms: Vec<VirtualMachine>,
    },
    #[serde(rename_all = "camelCase")]
    Vm {
        vm: VirtualMachine,
        node: Option<Device>,
    },
}

impl DeviceDetails {
    pub fn lookup(snapshot: &InfrastructureSnapshot, id: &str) -> Option<Self> {
        if let Some(vm) = snapshot.vm(id) {
            return Some(Self::Vm {
                vm: vm.clone(),
                node: snapshot.device(&vm.node_id).cloned(),
            });
        }

        let device = snapshot.device(id)?;
        let rack = device
            .rack_id
            .as_deref()
            .and_then(|rack_id| snapshot.rack(rack_id))
            .cloned();
        let contents = match device.device_type() {
            DeviceType::Rack => snapshot.devices_in_rack(&device.id).cloned().collect(),
            _ => Vec::new(),
        };
        let vms = match device.device_type() {
            DeviceType::Node => snapshot.vms_on_node(&device.id).cloned().collect(),
            _ => Vec::new(),
        };

        Some(Self::Device {
            device: device.clone(),
            rack,
            contents,
            vms,
        })
    }
}
