//! Forwarding Tables
//!
//! Maps populated at startup and read on every packet:
//!
//! - routes: destination IP → {next-hop MAC, output port}
//! - source MACs: output port → MAC stamped as source
//! - devmap: output port → egress interface index
//! - IP ports: destination IP → output port
//!
//! [`Tables`] bundles them with the admission state and the stats map so a
//! program can be built from one shared handle.

use crate::admission::{HeavyHitterSketch, SourceThresholds};
use crate::config::{ConfigError, LabConfig};
use crate::stats::StatsMap;
use dashmap::DashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use xdplab_common::{LookupMiss, MacAddr, XdpAction};

/// Route value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    /// Destination MAC to stamp
    pub dst_mac: MacAddr,
    /// Output port
    pub port: u16,
}

/// Destination-based forwarding state
#[derive(Debug)]
pub struct ForwardingTables {
    routes: DashMap<Ipv4Addr, NextHop>,
    src_macs: DashMap<u16, MacAddr>,
    devmap: DashMap<u16, u32>,
    ip_ports: DashMap<Ipv4Addr, u16>,
    max_ports: u16,
}

impl ForwardingTables {
    /// Empty tables for ports `1..=max_ports`
    pub fn new(max_ports: u16) -> Self {
        Self {
            routes: DashMap::new(),
            src_macs: DashMap::new(),
            devmap: DashMap::new(),
            ip_ports: DashMap::new(),
            max_ports,
        }
    }

    /// Highest valid port
    pub fn max_ports(&self) -> u16 {
        self.max_ports
    }

    /// Install a route
    pub fn insert_route(&self, dst: Ipv4Addr, next_hop: NextHop) {
        self.routes.insert(dst, next_hop);
    }

    /// Install the source MAC for a port
    pub fn insert_source_mac(&self, port: u16, mac: MacAddr) {
        self.src_macs.insert(port, mac);
    }

    /// Install the egress interface for a port
    pub fn insert_redirect(&self, port: u16, ifindex: u32) {
        self.devmap.insert(port, ifindex);
    }

    /// Install a destination IP → port entry
    pub fn insert_ip_port(&self, dst: Ipv4Addr, port: u16) {
        self.ip_ports.insert(dst, port);
    }

    /// Route for `dst`, with the port checked against `1..=max_ports`
    #[inline]
    pub fn lookup_route(&self, dst: Ipv4Addr) -> Result<NextHop, LookupMiss> {
        let next_hop = *self.routes.get(&dst).ok_or(LookupMiss::Route(dst))?;
        if next_hop.port == 0 || next_hop.port > self.max_ports {
            return Err(LookupMiss::PortRange {
                port: next_hop.port,
                max: self.max_ports,
            });
        }
        Ok(next_hop)
    }

    /// Source MAC for `port`
    #[inline]
    pub fn source_mac(&self, port: u16) -> Result<MacAddr, LookupMiss> {
        self.src_macs
            .get(&port)
            .map(|mac| *mac)
            .ok_or(LookupMiss::SourceMac(port))
    }

    /// Redirect to the interface behind `port`
    #[inline]
    pub fn redirect(&self, port: u16) -> Result<XdpAction, LookupMiss> {
        self.devmap
            .get(&port)
            .map(|ifindex| XdpAction::Redirect(*ifindex))
            .ok_or(LookupMiss::Redirect(port))
    }

    /// Output port for `dst`
    #[inline]
    pub fn port_for(&self, dst: Ipv4Addr) -> Result<u16, LookupMiss> {
        self.ip_ports
            .get(&dst)
            .map(|port| *port)
            .ok_or(LookupMiss::IpPort(dst))
    }

    /// Number of routes
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

/// Everything a program may read or count into
#[derive(Debug, Clone)]
pub struct Tables {
    /// Forwarding maps
    pub forwarding: Arc<ForwardingTables>,
    /// Per-source thresholds
    pub thresholds: Arc<SourceThresholds>,
    /// Heavy-hitter sketch
    pub sketch: Arc<HeavyHitterSketch>,
    /// Per-interface stats
    pub stats: Arc<StatsMap>,
}

impl Tables {
    /// Validate `config` and populate every table from it
    pub fn from_config(config: &LabConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let forwarding = ForwardingTables::new(config.max_ports);
        for iface in &config.interfaces {
            forwarding.insert_redirect(iface.port, iface.ifindex);
            forwarding.insert_source_mac(iface.port, iface.mac);
        }
        for route in &config.ips {
            tracing::debug!(
                ip = %route.ip,
                mac = %route.mac,
                port = route.port,
                gw = ?route.gw,
                "installing route"
            );
            forwarding.insert_route(
                route.ip,
                NextHop {
                    dst_mac: route.mac,
                    port: route.port,
                },
            );
        }
        for entry in &config.ip_ports {
            forwarding.insert_ip_port(entry.ip, entry.port);
        }

        let thresholds = SourceThresholds::new();
        for entry in &config.thresholds {
            thresholds.set_threshold(entry.source, entry.threshold);
        }

        Ok(Self {
            forwarding: Arc::new(forwarding),
            thresholds: Arc::new(thresholds),
            sketch: Arc::new(HeavyHitterSketch::new(config.sketch.clone())),
            stats: Arc::new(StatsMap::new()),
        })
    }
}
