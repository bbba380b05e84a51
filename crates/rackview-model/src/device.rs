use std::fmt;

use serde::{Deserialize, Serialize};

/// Health of a physical or logical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Warning,
    Error,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant tag without the variant payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Rack,
    Node,
    Storage,
    Network,
    Ups,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rack => "rack",
            Self::Node => "node",
            Self::Storage => "storage",
            Self::Network => "network",
            Self::Ups => "ups",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub cpu_model: String,
    pub cpu_cores: u32,
    /// Total memory in bytes.
    pub memory: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    pub storage_type: String,
    /// Raw capacity in bytes.
    pub storage_capacity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub network_ports: u32,
    pub network_speed: String,
}

/// Variant-specific attributes, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceKind {
    Rack,
    Node(NodeSpec),
    Storage(StorageSpec),
    Network(NetworkSpec),
    Ups,
}

impl DeviceKind {
    pub fn device_type(&self) -> DeviceType {
        match self {
            Self::Rack => DeviceType::Rack,
            Self::Node(_) => DeviceType::Node,
            Self::Storage(_) => DeviceType::Storage,
            Self::Network(_) => DeviceType::Network,
            Self::Ups => DeviceType::Ups,
        }
    }
}

/// Any inventory item that is not a virtual machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Always `None` for racks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<String>,
    #[serde(flatten)]
    pub kind: DeviceKind,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: DeviceStatus::Online,
            ip_address: None,
            description: None,
            rack_id: None,
            kind,
        }
    }

    pub fn rack(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, DeviceKind::Rack)
    }

    pub fn node(id: impl Into<String>, name: impl Into<String>, spec: NodeSpec) -> Self {
        Self::new(id, name, DeviceKind::Node(spec))
    }

    pub fn storage(id: impl Into<String>, name: impl Into<String>, spec: StorageSpec) -> Self {
        Self::new(id, name, DeviceKind::Storage(spec))
    }

    pub fn network(id: impl Into<String>, name: impl Into<String>, spec: NetworkSpec) -> Self {
        Self::new(id, name, DeviceKind::Network(spec))
    }

    pub fn ups(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, DeviceKind::Ups)
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn in_rack(mut self, rack_id: impl Into<String>) -> Self {
        self.rack_id = Some(rack_id.into());
        self
    }

    pub fn device_type(&self) -> DeviceType {
        self.kind.device_type()
    }

    pub fn is_rack(&self) -> bool {
        self.device_type() == DeviceType::Rack
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmStatus {
    Running,
    Stopped,
    Paused,
}

impl VmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for VmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guest running on exactly one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    pub status: VmStatus,
    pub os: String,
    pub ip_address: String,
    pub cpu_cores: u32,
    /// Memory in MB.
    pub memory: u64,
    /// Total disk in GB.
    pub disk: f64,
    pub node_id: String,
}
