//! Heavy-hitter forwarder
//!
//! Counts TCP and UDP flows in the two-hash sketch and drops the ones both
//! slots flag as heavy. Everything admitted is routed on its destination
//! address: MACs are rewritten for the output port and the frame is
//! redirected through the devmap.

use super::XdpProgram;
use crate::admission::HeavyHitterSketch;
use crate::buffer::Frame;
use crate::cursor::Cursor;
use crate::flow::FlowKey;
use crate::mutate::rewrite_macs;
use crate::proto::eth::{ETH_P_ARP, ETH_P_IP};
use crate::proto::{ip_proto, EthHdr, Ipv4Hdr, TcpHdr, UdpHdr};
use crate::tables::ForwardingTables;
use std::sync::Arc;
use xdplab_common::{PacketResult, PolicyViolation, XdpAction};

/// Heavy-hitter forwarder
pub struct HeavyHitterForwarder {
    sketch: Arc<HeavyHitterSketch>,
    forwarding: Arc<ForwardingTables>,
}

impl HeavyHitterForwarder {
    /// Forwarder over a shared sketch and forwarding tables
    pub fn new(sketch: Arc<HeavyHitterSketch>, forwarding: Arc<ForwardingTables>) -> Self {
        Self { sketch, forwarding }
    }

    /// 5-tuple of a TCP or UDP packet, `None` for other protocols
    fn flow_key(
        &self,
        cursor: &mut Cursor,
        data: &[u8],
        ip: &Ipv4Hdr,
    ) -> PacketResult<Option<FlowKey>> {
        let ports = match ip.protocol {
            ip_proto::TCP => {
                let (tcp, _) = cursor.parse::<TcpHdr>(data)?;
                (tcp.src_port, tcp.dst_port)
            }
            ip_proto::UDP => {
                let (udp, _) = cursor.parse::<UdpHdr>(data)?;
                (udp.src_port, udp.dst_port)
            }
            _ => return Ok(None),
        };
        Ok(Some(FlowKey::from_ipv4(ip, ports.0, ports.1)))
    }
}

impl XdpProgram for HeavyHitterForwarder {
    fn name(&self) -> &'static str {
        "hhd-v2"
    }

    fn process(&self, frame: &mut Frame) -> PacketResult<XdpAction> {
        let mut cursor = Cursor::new();

        let (_, ether_type) = cursor.parse::<EthHdr>(frame.data())?;
        match ether_type {
            ETH_P_ARP => return Ok(XdpAction::Pass),
            ETH_P_IP => {}
            other => return Err(PolicyViolation::NotIpv4(other).into()),
        }

        let (ip, _) = cursor.parse::<Ipv4Hdr>(frame.data())?;

        if let Some(key) = self.flow_key(&mut cursor, frame.data(), &ip)? {
            let obs = self.sketch.admit(&key)?;
            tracing::trace!(flow = %key, first = obs.first, second = obs.second, "flow admitted");
        }

        let next_hop = self.forwarding.lookup_route(ip.dst)?;
        let src_mac = self.forwarding.source_mac(next_hop.port)?;
        let action = self.forwarding.redirect(next_hop.port)?;

        rewrite_macs(frame, src_mac, next_hop.dst_mac)?;
        Ok(action)
    }

    fn on_malformed(&self) -> XdpAction {
        XdpAction::Drop
    }

    fn on_unsupported(&self) -> XdpAction {
        XdpAction::Drop
    }
}
