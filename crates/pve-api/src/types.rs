use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every Proxmox response wraps its payload in `{"data": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
}

// ── Access ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    pub csrf_token: String,
}

// ── Nodes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NodeListItem {
    pub node: String,
    pub status: String,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub cpuinfo: Option<CpuInfo>,
    #[serde(default)]
    pub memory: Option<MemoryInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuInfo {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub cpus: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryInfo {
    #[serde(default)]
    pub total: u64,
}

// ── QEMU ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct QemuListItem {
    pub vmid: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub cpus: Option<u32>,
    #[serde(default)]
    pub maxmem: Option<u64>,
}

/// Raw VM configuration. Keys are dynamic (`scsi0`, `ide2`, `net0`, ...),
/// so it stays a JSON map with typed accessors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct QemuConfig(pub Map<String, Value>);

const DISK_BUSES: [&str; 4] = ["scsi", "ide", "sata", "virtio"];

impl QemuConfig {
    pub fn ostype(&self) -> Option<&str> {
        self.0.get("ostype").and_then(Value::as_str)
    }

    /// Disk entries as `(key, value)`, e.g. `("scsi0", "local-lvm:vm-100-disk-0,size=32G")`.
    pub fn disks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().filter_map(|(key, value)| {
            let is_disk = DISK_BUSES
                .iter()
                .any(|bus| key.strip_prefix(bus).is_some_and(|n| n.chars().all(|c| c.is_ascii_digit())));
            match (is_disk, value.as_str()) {
                (true, Some(v)) => Some((key.as_str(), v)),
                _ => None,
            }
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentInterfaces {
    #[serde(default)]
    pub result: Vec<AgentInterface>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentInterface {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "ip-addresses", default)]
    pub ip_addresses: Vec<AgentIpAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentIpAddress {
    #[serde(rename = "ip-address-type")]
    pub kind: String,
    #[serde(rename = "ip-address")]
    pub address: String,
}

impl AgentInterfaces {
    /// First IPv4 address across all interfaces, in reported order.
    pub fn first_ipv4(&self) -> Option<&str> {
        self.result
            .iter()
            .flat_map(|iface| iface.ip_addresses.iter())
            .find(|ip| ip.kind == "ipv4")
            .map(|ip| ip.address.as_str())
    }
}
