//! L4 destination port rewriter
//!
//! Decrements the TCP or UDP destination port in place and counts the
//! packet. Anything that is not IPv4 TCP/UDP is aborted.

use super::XdpProgram;
use crate::buffer::Frame;
use crate::cursor::Cursor;
use crate::mutate::decrement_dst_port;
use crate::proto::eth::ETH_P_IP;
use crate::proto::{ip_proto, EthHdr, Ipv4Hdr, TcpHdr, UdpHdr};
use crate::stats::StatsMap;
use std::sync::Arc;
use xdplab_common::{Layer, PacketResult, Unsupported, XdpAction};

/// Port rewriter
pub struct PortRewriter {
    stats: Arc<StatsMap>,
}

impl PortRewriter {
    /// Rewriter counting into `stats`
    pub fn new(stats: Arc<StatsMap>) -> Self {
        Self { stats }
    }

    /// Stats map this rewriter counts into
    pub fn stats(&self) -> &StatsMap {
        &self.stats
    }
}

impl XdpProgram for PortRewriter {
    fn name(&self) -> &'static str {
        "rewrite"
    }

    fn process(&self, frame: &mut Frame) -> PacketResult<XdpAction> {
        let mut cursor = Cursor::new();

        let (_, ether_type) = cursor.parse::<EthHdr>(frame.data())?;
        if ether_type != ETH_P_IP {
            return Err(Unsupported::EtherType(ether_type).into());
        }

        let (_, protocol) = cursor.parse::<Ipv4Hdr>(frame.data())?;
        let l4 = cursor.offset();
        let layer = match protocol {
            ip_proto::UDP => {
                cursor.parse::<UdpHdr>(frame.data())?;
                Layer::Udp
            }
            ip_proto::TCP => {
                cursor.parse::<TcpHdr>(frame.data())?;
                Layer::Tcp
            }
            other => return Err(Unsupported::IpProtocol(other).into()),
        };

        if let Some(port) = decrement_dst_port(frame, l4, layer)? {
            tracing::trace!(%layer, port, "destination port rewritten");
        }

        self.stats
            .record(frame.ingress_ifindex(), frame.len() as u64)?;
        Ok(XdpAction::Pass)
    }

    fn on_malformed(&self) -> XdpAction {
        XdpAction::Aborted
    }

    fn on_unsupported(&self) -> XdpAction {
        XdpAction::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::eth::ETH_P_ARP;
    use crate::testutil::*;

    fn rewriter() -> PortRewriter {
        PortRewriter::new(Arc::new(StatsMap::new()))
    }

    fn dst_port(frame: &Frame) -> u16 {
        u16::from_be_bytes([frame.data()[36], frame.data()[37]])
    }

    #[test]
    fn test_udp_port_decremented() {
        let rewriter = rewriter();
        let mut frame = Frame::from_bytes(3, &udp_frame(CLIENT, SERVER, 5000, 8080)).unwrap();

        assert_eq!(rewriter.run(&mut frame), XdpAction::Pass);
        assert_eq!(dst_port(&frame), 8079);
        assert_eq!(rewriter.stats().snapshot(3).unwrap().rx_packets, 1);
    }

    #[test]
    fn test_tcp_port_decremented() {
        let rewriter = rewriter();
        let bytes = ethernet(ETH_P_IP, &ipv4(CLIENT, SERVER, ip_proto::TCP, &tcp(40000, 443)));
        let mut frame = Frame::from_bytes(3, &bytes).unwrap();

        assert_eq!(rewriter.run(&mut frame), XdpAction::Pass);
        assert_eq!(dst_port(&frame), 442);
    }

    #[test]
    fn test_port_one_and_zero_unchanged() {
        let rewriter = rewriter();
        for port in [1, 0] {
            let mut frame = Frame::from_bytes(3, &udp_frame(CLIENT, SERVER, 5000, port)).unwrap();
            assert_eq!(rewriter.run(&mut frame), XdpAction::Pass);
            assert_eq!(dst_port(&frame), port);
        }
        assert_eq!(rewriter.stats().snapshot(3).unwrap().rx_packets, 2);
    }

    #[test]
    fn test_everything_else_aborted() {
        let rewriter = rewriter();
        let cases = [
            ethernet(ETH_P_ARP, &[0u8; 28]),
            ethernet(ETH_P_IP, &ipv4(CLIENT, SERVER, ip_proto::ICMP, &icmp_echo(1))),
            ethernet(ETH_P_IP, &ipv4(CLIENT, SERVER, ip_proto::UDP, &[0u8; 4])),
            ethernet(ETH_P_IP, &[0x45; 8]),
        ];

        for bytes in cases {
            let mut frame = Frame::from_bytes(3, &bytes).unwrap();
            assert_eq!(rewriter.run(&mut frame), XdpAction::Aborted);
        }
        assert_eq!(rewriter.stats().total().rx_packets, 0);
    }
}
