//! Lab Configuration
//!
//! Everything the loaders would normally push into maps before attaching:
//! interface ports, VLAN roles, per-source thresholds, routes and sketch
//! parameters. Read from YAML or JSON and validated before any table is
//! populated.

use crate::admission::SketchConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xdplab_common::MacAddr;

/// Default number of forwarding ports
pub const DEFAULT_MAX_PORTS: u16 = 4;

/// Default VLAN pushed on access ingress
pub const DEFAULT_VLAN_ID: u16 = 100;

/// Largest valid 802.1Q VLAN ID
pub const MAX_VLAN_ID: u16 = 4095;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// YAML syntax or schema error
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or schema error
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Extension other than yaml/yml/json
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// `max_ports` of zero
    #[error("max_ports must be at least 1")]
    NoPorts,

    /// Port outside `1..=max_ports`
    #[error("port {port} outside 1..={max}")]
    InvalidPort {
        /// Offending port
        port: u16,
        /// Highest valid port
        max: u16,
    },

    /// Same port declared on two interfaces
    #[error("port {0} declared twice")]
    DuplicatePort(u16),

    /// Route or IP-port entry refers to a port with no interface
    #[error("port {0} has no interface")]
    UnknownPort(u16),

    /// VLAN ID does not fit in 12 bits
    #[error("VLAN ID {0} exceeds 4095")]
    InvalidVlanId(u16),

    /// Trunk and access are the same interface
    #[error("trunk and access interface are both {0}")]
    VlanInterfacesOverlap(u32),

    /// Sketch parameters unusable
    #[error("invalid sketch: {0}")]
    InvalidSketch(&'static str),

    /// Section a program needs is absent
    #[error("missing `{0}` section")]
    MissingSection(&'static str),
}

/// Interface attached to a forwarding port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Logical port, `1..=max_ports`
    pub port: u16,
    /// Egress interface index (devmap value)
    pub ifindex: u32,
    /// Source MAC stamped on frames leaving this port
    pub mac: MacAddr,
}

/// VLAN handler roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanConfig {
    /// Interface carrying tagged frames
    pub trunk_ifindex: u32,
    /// Interface carrying untagged frames
    pub access_ifindex: u32,
    /// VLAN ID pushed on access ingress
    #[serde(default = "default_vlan_id")]
    pub vlan_id: u16,
}

fn default_vlan_id() -> u16 {
    DEFAULT_VLAN_ID
}

/// Per-source packet budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Source address
    pub source: Ipv4Addr,
    /// Packets admitted before dropping
    pub threshold: u64,
}

/// Destination IP → port, for the threshold forwarder's return path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPortConfig {
    /// Destination address
    pub ip: Ipv4Addr,
    /// Output port
    pub port: u16,
}

/// Route entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Destination address
    pub ip: Ipv4Addr,
    /// Next-hop MAC
    pub mac: MacAddr,
    /// Output port
    pub port: u16,
    /// Gateway, informational only
    #[serde(default)]
    pub gw: Option<Ipv4Addr>,
}

/// Lab configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Forwarding ports
    pub interfaces: Vec<InterfaceConfig>,
    /// VLAN handler roles
    pub vlan: Option<VlanConfig>,
    /// Uplink for the threshold forwarder
    pub uplink_ifindex: Option<u32>,
    /// Per-source thresholds
    pub thresholds: Vec<ThresholdConfig>,
    /// Destination IP → port
    pub ip_ports: Vec<IpPortConfig>,
    /// Heavy-hitter sketch
    pub sketch: SketchConfig,
    /// Highest valid port
    pub max_ports: u16,
    /// Routes
    pub ips: Vec<RouteConfig>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            interfaces: Vec::new(),
            vlan: None,
            uplink_ifindex: None,
            thresholds: Vec::new(),
            ip_ports: Vec::new(),
            sketch: SketchConfig::default(),
            max_ports: DEFAULT_MAX_PORTS,
            ips: Vec::new(),
        }
    }
}

impl LabConfig {
    /// Load and validate from file, picking the format by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("yaml")
            .to_ascii_lowercase();

        let config = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        tracing::debug!(
            path = %path.display(),
            interfaces = config.interfaces.len(),
            routes = config.ips.len(),
            thresholds = config.thresholds.len(),
            "loaded lab configuration"
        );

        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ports, VLAN IDs and sketch parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ports == 0 {
            return Err(ConfigError::NoPorts);
        }

        let mut ports = HashSet::new();
        for iface in &self.interfaces {
            self.check_port(iface.port)?;
            if !ports.insert(iface.port) {
                return Err(ConfigError::DuplicatePort(iface.port));
            }
        }

        if let Some(vlan) = &self.vlan {
            if vlan.vlan_id > MAX_VLAN_ID {
                return Err(ConfigError::InvalidVlanId(vlan.vlan_id));
            }
            if vlan.trunk_ifindex == vlan.access_ifindex {
                return Err(ConfigError::VlanInterfacesOverlap(vlan.trunk_ifindex));
            }
        }

        if self.sketch.entries == 0 {
            return Err(ConfigError::InvalidSketch("entries must be greater than zero"));
        }

        let routed = self
            .ips
            .iter()
            .map(|r| r.port)
            .chain(self.ip_ports.iter().map(|p| p.port));
        for port in routed {
            self.check_port(port)?;
            if !ports.contains(&port) {
                return Err(ConfigError::UnknownPort(port));
            }
        }

        Ok(())
    }

    fn check_port(&self, port: u16) -> Result<(), ConfigError> {
        if port == 0 || port > self.max_ports {
            return Err(ConfigError::InvalidPort {
                port,
                max: self.max_ports,
            });
        }
        Ok(())
    }

    /// VLAN section, required by the VLAN handler
    pub fn vlan(&self) -> Result<&VlanConfig, ConfigError> {
        self.vlan.as_ref().ok_or(ConfigError::MissingSection("vlan"))
    }

    /// Uplink, required by the threshold forwarder
    pub fn uplink(&self) -> Result<u32, ConfigError> {
        self.uplink_ifindex
            .ok_or(ConfigError::MissingSection("uplink_ifindex"))
    }
}
