//! Decision Dispatcher
//!
//! One program per lab exercise. A program is a `Result` pipeline over a
//! single frame: every stage either hands the next stage what it parsed or
//! fails with a [`PacketError`], and [`XdpProgram::run`] turns the outcome
//! into exactly one terminal action.
//!
//! | Program | Malformed | Unsupported |
//! |---------|-----------|-------------|
//! | [`EchoFilter`] | DROP | PASS |
//! | [`PortRewriter`] | ABORTED | ABORTED |
//! | [`VlanHandler`] | DROP | ABORTED |
//! | [`ThresholdForwarder`] | DROP | DROP |
//! | [`HeavyHitterForwarder`] | DROP | DROP |
//!
//! A frame too short for an Ethernet header is ABORTED by every program.

pub mod echo;
pub mod hhd_v1;
pub mod hhd_v2;
pub mod rewrite;
pub mod vlan;

pub use echo::EchoFilter;
pub use hhd_v1::ThresholdForwarder;
pub use hhd_v2::HeavyHitterForwarder;
pub use rewrite::PortRewriter;
pub use vlan::VlanHandler;

use crate::buffer::Frame;
use crate::config::{ConfigError, LabConfig};
use crate::tables::Tables;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use xdplab_common::{Layer, PacketError, PacketResult, XdpAction};

/// A per-packet program
pub trait XdpProgram: Send + Sync {
    /// Program name, used in logs and metrics
    fn name(&self) -> &'static str;

    /// Process one frame; the error class decides the action
    fn process(&self, frame: &mut Frame) -> PacketResult<XdpAction>;

    /// Action for a malformed header past Ethernet
    fn on_malformed(&self) -> XdpAction;

    /// Action for an unsupported ethertype, protocol or ingress
    fn on_unsupported(&self) -> XdpAction;

    /// Run to completion and return the terminal action
    #[inline]
    fn run(&self, frame: &mut Frame) -> XdpAction {
        let ingress = frame.ingress_ifindex();
        match self.process(frame) {
            Ok(action) => {
                tracing::trace!(program = self.name(), ingress, %action, "verdict");
                action
            }
            Err(err) => {
                let action = match err {
                    PacketError::Malformed(e) if e.layer() == Layer::Ethernet => {
                        XdpAction::Aborted
                    }
                    _ => err.action(self.on_malformed(), self.on_unsupported()),
                };
                tracing::trace!(program = self.name(), ingress, error = %err, %action, "verdict");
                action
            }
        }
    }
}

/// Program selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramKind {
    /// ICMP echo filter with per-interface stats
    Echo,
    /// L4 destination port rewriter
    Rewrite,
    /// VLAN trunk/access handler
    Vlan,
    /// Per-source threshold forwarder
    HhdV1,
    /// Sketch-based heavy-hitter forwarder
    HhdV2,
}

impl ProgramKind {
    /// Every program
    pub const ALL: [ProgramKind; 5] = [
        ProgramKind::Echo,
        ProgramKind::Rewrite,
        ProgramKind::Vlan,
        ProgramKind::HhdV1,
        ProgramKind::HhdV2,
    ];

    /// Command-line name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::Rewrite => "rewrite",
            Self::Vlan => "vlan",
            Self::HhdV1 => "hhd-v1",
            Self::HhdV2 => "hhd-v2",
        }
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown program name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown program `{0}` (expected echo, rewrite, vlan, hhd-v1 or hhd-v2)")]
pub struct UnknownProgram(pub String);

impl FromStr for ProgramKind {
    type Err = UnknownProgram;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownProgram(s.to_string()))
    }
}

/// Build a program over shared tables
pub fn build(
    kind: ProgramKind,
    config: &LabConfig,
    tables: &Tables,
) -> Result<Arc<dyn XdpProgram>, ConfigError> {
    let program: Arc<dyn XdpProgram> = match kind {
        ProgramKind::Echo => Arc::new(EchoFilter::new(tables.stats.clone())),
        ProgramKind::Rewrite => Arc::new(PortRewriter::new(tables.stats.clone())),
        ProgramKind::Vlan => Arc::new(VlanHandler::from_config(config.vlan()?)),
        ProgramKind::HhdV1 => Arc::new(ThresholdForwarder::new(
            config.uplink()?,
            tables.thresholds.clone(),
            tables.forwarding.clone(),
        )),
        ProgramKind::HhdV2 => Arc::new(HeavyHitterForwarder::new(
            tables.sketch.clone(),
            tables.forwarding.clone(),
        )),
    };

    tracing::debug!(program = program.name(), "program built");
    Ok(program)
}
