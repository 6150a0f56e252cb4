//! ICMP echo filter
//!
//! Drops echo requests with an even sequence number and counts every other
//! ICMP packet against the ingress interface. Non-ICMP traffic passes
//! untouched and uncounted.

use super::XdpProgram;
use crate::buffer::Frame;
use crate::cursor::Cursor;
use crate::proto::eth::ETH_P_IP;
use crate::proto::{ip_proto, EthHdr, IcmpHdr, Ipv4Hdr};
use crate::stats::StatsMap;
use std::sync::Arc;
use xdplab_common::{PacketResult, PolicyViolation, Unsupported, XdpAction};

/// Echo filter
pub struct EchoFilter {
    stats: Arc<StatsMap>,
}

impl EchoFilter {
    /// Filter counting into `stats`
    pub fn new(stats: Arc<StatsMap>) -> Self {
        Self { stats }
    }

    /// Stats map this filter counts into
    pub fn stats(&self) -> &StatsMap {
        &self.stats
    }
}

impl XdpProgram for EchoFilter {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn process(&self, frame: &mut Frame) -> PacketResult<XdpAction> {
        let data = frame.data();
        let mut cursor = Cursor::new();

        let (_, ether_type) = cursor.parse::<EthHdr>(data)?;
        if ether_type != ETH_P_IP {
            return Err(Unsupported::EtherType(ether_type).into());
        }

        let (_, protocol) = cursor.parse::<Ipv4Hdr>(data)?;
        if protocol != ip_proto::ICMP {
            return Err(Unsupported::IpProtocol(protocol).into());
        }

        let (icmp, _) = cursor.parse::<IcmpHdr>(data)?;
        if let Some(seq) = icmp.echo_sequence() {
            if seq % 2 == 0 {
                return Err(PolicyViolation::EvenEchoSequence(seq).into());
            }
        }

        self.stats
            .record(frame.ingress_ifindex(), frame.len() as u64)?;
        Ok(XdpAction::Pass)
    }

    fn on_malformed(&self) -> XdpAction {
        XdpAction::Drop
    }

    fn on_unsupported(&self) -> XdpAction {
        XdpAction::Pass
    }
}
