//! Best-effort secondary lookups.
//!
//! Every function here returns `Result<_, EnrichmentError>`; callers collapse
//! failures to the placeholder values below and keep going.

use pve_api::PveClient;
use rackview_model::NodeSpec;

/// Placeholder for descriptive fields that could not be discovered.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error(transparent)]
    Api(#[from] pve_api::Error),

    #[error("{0} not reported")]
    NotReported(&'static str),
}

pub type Result<T> = std::result::Result<T, EnrichmentError>;

pub fn unknown_node_spec() -> NodeSpec {
    NodeSpec {
        cpu_model: UNKNOWN.into(),
        cpu_cores: 0,
        memory: 0,
    }
}

/// CPU and memory facts from `nodes/{node}/status`.
pub async fn node_spec(client: &PveClient, node: &str) -> Result<NodeSpec> {
    let status = client.node_status(node).await?;
    let cpuinfo = status.cpuinfo.unwrap_or_default();

    Ok(NodeSpec {
        cpu_model: cpuinfo.model.unwrap_or_else(|| UNKNOWN.into()),
        cpu_cores: cpuinfo.cpus.unwrap_or(0),
        memory: status.memory.map(|m| m.total).unwrap_or(0),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct VmDetails {
    pub os: String,
    pub disk_gb: f64,
}

/// OS label and total disk size from the VM config.
pub async fn vm_details(client: &PveClient, node: &str, vmid: u32) -> Result<VmDetails> {
    let config = client.qemu_config(node, vmid).await?;

    Ok(VmDetails {
        os: os_label(config.ostype()),
        disk_gb: config.disks().filter_map(|(_, value)| disk_size_gb(value)).sum(),
    })
}

/// First IPv4 address reported by the guest agent.
pub async fn vm_address(client: &PveClient, node: &str, vmid: u32) -> Result<String> {
    let interfaces = client.agent_network_interfaces(node, vmid).await?;
    interfaces
        .first_ipv4()
        .map(str::to_string)
        .ok_or(EnrichmentError::NotReported("ipv4 address"))
}

pub fn os_label(ostype: Option<&str>) -> String {
    let label = match ostype {
        None => UNKNOWN,
        Some("win11") => "Windows 11",
        Some("win10") => "Windows 10",
        Some("win8") => "Windows 8",
        Some("win7") => "Windows 7",
        Some("l26") => "Linux 2.6/3.x/4.x/5.x",
        Some("debian") => "Debian Linux",
        Some("ubuntu") => "Ubuntu Linux",
        Some("centos") => "CentOS Linux",
        Some(other) => other,
    };
    label.to_string()
}

/// Size in GB of a disk entry such as `local-lvm:vm-100-disk-0,size=32G`.
pub fn disk_size_gb(entry: &str) -> Option<f64> {
    let size = entry.split(',').find_map(|part| part.trim().strip_prefix("size="))?;
    let digits_end = size.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = size.split_at(digits_end);
    let amount: f64 = digits.parse().ok()?;

    match unit {
        "K" => Some(amount / (1024.0 * 1024.0)),
        "M" => Some(amount / 1024.0),
        "G" => Some(amount),
        "T" => Some(amount * 1024.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_labels_follow_proxmox_ostype() {
        assert_eq!(os_label(Some("win11")), "Windows 11");
        assert_eq!(os_label(Some("l26")), "Linux 2.6/3.x/4.x/5.x");
        assert_eq!(os_label(Some("ubuntu")), "Ubuntu Linux");
        assert_eq!(os_label(Some("solaris")), "solaris");
        assert_eq!(os_label(None), UNKNOWN);
    }

    #[test]
    fn disk_sizes_convert_to_gb() {
        assert_eq!(disk_size_gb("local-lvm:vm-100-disk-0,size=32G"), Some(32.0));
        assert_eq!(disk_size_gb("local:100/vm-100-disk-1.qcow2,format=qcow2,size=512M"), Some(0.5));
        assert_eq!(disk_size_gb("size=1048576K"), Some(1.0));
        assert_eq!(disk_size_gb("ceph:vm-100-disk-2,size=2T"), Some(2048.0));
    }

    #[test]
    fn entries_without_size_are_ignored() {
        assert_eq!(disk_size_gb("none,media=cdrom"), None);
        assert_eq!(disk_size_gb("local:iso/debian.iso,media=cdrom,size="), None);
        assert_eq!(disk_size_gb("size=12"), None);
        assert_eq!(disk_size_gb("size=12P"), None);
    }
}
