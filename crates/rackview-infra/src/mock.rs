use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rackview_model::{
    Device, DeviceStatus, InfrastructureSnapshot, NetworkSpec, NodeSpec, StorageSpec, VirtualMachine,
    VmStatus,
};

use crate::topology::default_racks;
use crate::{FetchRequest, InventorySource, Result};

const GIB: u64 = 1 << 30;
const TIB: u64 = 1 << 40;

/// Synthetic inventory for demos and offline previews.
///
/// The shape is fixed (same ids, same placement every time); statuses, VM
/// run states and guest addresses are drawn at random.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    seed: Option<u64>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible output, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn generate(&self) -> InfrastructureSnapshot {
        let mut rng = StdRng::seed_from_u64(self.seed.unwrap_or_else(rand::random));

        let nodes = vec![
            node("pve1", "Intel Xeon E5-2680 v4", 14, 128, 101, &mut rng)
                .with_description("Primary Proxmox node")
                .in_rack("rack-1"),
            node("pve2", "AMD EPYC 7302", 16, 256, 102, &mut rng)
                .with_description("Secondary Proxmox node")
                .in_rack("rack-1"),
            node("pve3", "Intel Xeon E5-2680 v4", 14, 128, 103, &mut rng)
                .with_description("Tertiary Proxmox node")
                .in_rack("rack-2"),
        ];

        let storage = vec![
            Device::storage(
                "storage-1",
                "synology-nas01",
                StorageSpec {
                    storage_type: "NAS".into(),
                    storage_capacity: 48 * TIB,
                },
            )
            .with_status(device_status(&mut rng))
            .with_ip("192.168.1.20")
            .in_rack("rack-1"),
            Device::storage(
                "storage-2",
                "ceph-cluster",
                StorageSpec {
                    storage_type: "Ceph".into(),
                    storage_capacity: 120 * TIB,
                },
            )
            .with_status(device_status(&mut rng))
            .with_ip("192.168.1.21")
            .in_rack("rack-2"),
        ];

        let network = vec![
            Device::network(
                "network-1",
                "core-switch-01",
                NetworkSpec {
                    network_ports: 48,
                    network_speed: "10 Gbps".into(),
                },
            )
            .with_status(device_status(&mut rng))
            .with_ip("192.168.1.254")
            .in_rack("rack-1"),
            Device::network(
                "network-2",
                "access-switch-01",
                NetworkSpec {
                    network_ports: 24,
                    network_speed: "1 Gbps".into(),
                },
            )
            .with_status(device_status(&mut rng))
            .with_ip("192.168.1.253")
            .in_rack("rack-2"),
        ];

        let ups = vec![
            Device::ups("ups-1", "apc-ups-01")
                .with_status(device_status(&mut rng))
                .with_ip("192.168.1.30")
                .with_description("APC Smart-UPS 3000VA")
                .in_rack("rack-1"),
        ];

        let vms = vec![
            vm(101, "web-server-1", "Ubuntu 22.04", 4, 8192, 50.0, "pve1", &mut rng),
            vm(102, "db-server-1", "CentOS 8", 8, 16384, 200.0, "pve1", &mut rng),
            vm(103, "cache-server", "Debian 11", 2, 4096, 20.0, "pve2", &mut rng),
            vm(104, "monitoring", "Ubuntu 22.04", 2, 4096, 40.0, "pve2", &mut rng),
            vm(105, "backup-server", "Debian 11", 2, 8192, 500.0, "pve3", &mut rng),
        ];

        InfrastructureSnapshot {
            nodes,
            racks: default_racks(),
            storage,
            network,
            ups,
            vms,
        }
    }
}

#[async_trait]
impl InventorySource for MockSource {
    async fn fetch(&self, _request: &FetchRequest<'_>) -> Result<InfrastructureSnapshot> {
        tracing::info!("using synthetic inventory");
        Ok(self.generate())
    }
}

fn device_status(rng: &mut StdRng) -> DeviceStatus {
    match rng.random_range(0..20) {
        0..=15 => DeviceStatus::Online,
        16..=17 => DeviceStatus::Warning,
        18 => DeviceStatus::Offline,
        _ => DeviceStatus::Error,
    }
}

fn node(name: &str, cpu_model: &str, cpu_cores: u32, memory_gib: u64, host: u8, rng: &mut StdRng) -> Device {
    Device::node(
        format!("node-{name}"),
        name,
        NodeSpec {
            cpu_model: cpu_model.into(),
            cpu_cores,
            memory: memory_gib * GIB,
        },
    )
    .with_status(device_status(rng))
    .with_ip(format!("192.168.1.{host}"))
}

#[allow(clippy::too_many_arguments)]
fn vm(
    vmid: u32,
    name: &str,
    os: &str,
    cpu_cores: u32,
    memory: u64,
    disk: f64,
    node: &str,
    rng: &mut StdRng,
) -> VirtualMachine {
    let status = match rng.random_range(0..10) {
        0..=5 => VmStatus::Running,
        6..=8 => VmStatus::Stopped,
        _ => VmStatus::Paused,
    };

    VirtualMachine {
        id: format!("vm-{vmid}"),
        name: name.into(),
        status,
        os: os.into(),
        ip_address: format!("10.10.0.{}", rng.random_range(10..250)),
        cpu_cores,
        memory,
        disk,
        node_id: format!("node-{node}"),
    }
}
