//! Per-source threshold forwarder
//!
//! Traffic from the hosts is counted per source address and forwarded to
//! the uplink while the source is within its budget. Return traffic from
//! the uplink is sent to the port its destination address is mapped to.

use super::XdpProgram;
use crate::admission::SourceThresholds;
use crate::buffer::Frame;
use crate::cursor::Cursor;
use crate::proto::eth::ETH_P_IP;
use crate::proto::{EthHdr, Ipv4Hdr};
use crate::tables::ForwardingTables;
use std::sync::Arc;
use xdplab_common::{PacketResult, PolicyViolation, XdpAction};

/// Threshold forwarder
pub struct ThresholdForwarder {
    uplink_ifindex: u32,
    thresholds: Arc<SourceThresholds>,
    forwarding: Arc<ForwardingTables>,
}

impl ThresholdForwarder {
    /// Forwarder sending admitted traffic to `uplink_ifindex`
    pub fn new(
        uplink_ifindex: u32,
        thresholds: Arc<SourceThresholds>,
        forwarding: Arc<ForwardingTables>,
    ) -> Self {
        Self {
            uplink_ifindex,
            thresholds,
            forwarding,
        }
    }
}

impl XdpProgram for ThresholdForwarder {
    fn name(&self) -> &'static str {
        "hhd-v1"
    }

    fn process(&self, frame: &mut Frame) -> PacketResult<XdpAction> {
        let data = frame.data();
        let mut cursor = Cursor::new();

        let (_, ether_type) = cursor.parse::<EthHdr>(data)?;
        if ether_type != ETH_P_IP {
            return Err(PolicyViolation::NotIpv4(ether_type).into());
        }
        let (ip, _) = cursor.parse::<Ipv4Hdr>(data)?;

        if frame.ingress_ifindex() != self.uplink_ifindex {
            let received = self.thresholds.admit(ip.src)?;
            tracing::trace!(src = %ip.src, received, "admitted");
            return Ok(XdpAction::Redirect(self.uplink_ifindex));
        }

        let port = self.forwarding.port_for(ip.dst)?;
        Ok(self.forwarding.redirect(port)?)
    }

    fn on_malformed(&self) -> XdpAction {
        XdpAction::Drop
    }

    fn on_unsupported(&self) -> XdpAction {
        XdpAction::Drop
    }
}
