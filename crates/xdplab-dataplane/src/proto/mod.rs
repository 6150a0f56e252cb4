//! Protocol Parsers
//!
//! Ethernet, VLAN, IPv4, ICMP, TCP and UDP headers decoded at a
//! [`Cursor`](crate::cursor::Cursor). Each parser advances exactly one layer.

pub mod eth;
pub mod vlan;
pub mod ipv4;
pub mod icmp;
pub mod tcp;
pub mod udp;

pub use eth::EthHdr;
pub use vlan::VlanHdr;
pub use ipv4::Ipv4Hdr;
pub use icmp::IcmpHdr;
pub use tcp::TcpHdr;
pub use udp::UdpHdr;

/// Read a network-order u16 at `off`
#[inline(always)]
pub(crate) fn be16(bytes: &[u8], off: usize) -> u16 {
    u16::from_be_bytes([bytes[off], bytes[off + 1]])
}

/// IP protocol numbers
pub mod ip_proto {
    /// ICMP
    pub const ICMP: u8 = 1;
    /// TCP
    pub const TCP: u8 = 6;
    /// UDP
    pub const UDP: u8 = 17;
}
