//! Flow Key
//!
//! The 5-tuple identifying a transport flow, and the fixed wire encoding
//! the sketch hashes over.

use crate::proto::Ipv4Hdr;
use std::fmt;
use std::net::Ipv4Addr;

/// Length of the hashed encoding
pub const FLOW_KEY_LEN: usize = 16;

/// 5-tuple flow key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C, align(16))]
pub struct FlowKey {
    /// Source IP
    pub src_ip: u32,
    /// Destination IP
    pub dst_ip: u32,
    /// Source port
    pub src_port: u16,
    /// Destination port
    pub dst_port: u16,
    /// IP protocol (TCP=6, UDP=17)
    pub protocol: u8,
    /// Padding, always zero so the encoding is stable
    _pad: [u8; 3],
}

impl FlowKey {
    /// Create new flow key
    #[inline(always)]
    pub const fn new(
        src_ip: u32,
        dst_ip: u32,
        src_port: u16,
        dst_port: u16,
        protocol: u8,
    ) -> Self {
        Self {
            src_ip,
            dst_ip,
            src_port,
            dst_port,
            protocol,
            _pad: [0; 3],
        }
    }

    /// Build from a parsed IPv4 header and the L4 ports
    #[inline(always)]
    pub fn from_ipv4(ip: &Ipv4Hdr, src_port: u16, dst_port: u16) -> Self {
        Self::new(
            u32::from(ip.src),
            u32::from(ip.dst),
            src_port,
            dst_port,
            ip.protocol,
        )
    }

    /// Network-order encoding: addresses, ports, protocol, then zero padding
    #[inline(always)]
    pub fn as_bytes(&self) -> [u8; FLOW_KEY_LEN] {
        let mut out = [0u8; FLOW_KEY_LEN];
        out[0..4].copy_from_slice(&self.src_ip.to_be_bytes());
        out[4..8].copy_from_slice(&self.dst_ip.to_be_bytes());
        out[8..10].copy_from_slice(&self.src_port.to_be_bytes());
        out[10..12].copy_from_slice(&self.dst_port.to_be_bytes());
        out[12] = self.protocol;
        out
    }

    /// Source address
    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.src_ip)
    }

    /// Destination address
    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dst_ip)
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} proto {}",
            self.src_addr(),
            self.src_port,
            self.dst_addr(),
            self.dst_port,
            self.protocol
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_layout() {
        let key = FlowKey::new(0xc0a80101, 0x0a000001, 12345, 80, 6);
        let bytes = key.as_bytes();

        assert_eq!(&bytes[0..4], &[192, 168, 1, 1]);
        assert_eq!(&bytes[4..8], &[10, 0, 0, 1]);
        assert_eq!(&bytes[8..10], &12345u16.to_be_bytes());
        assert_eq!(&bytes[10..12], &80u16.to_be_bytes());
        assert_eq!(bytes[12], 6);
        assert_eq!(&bytes[13..], &[0, 0, 0]);
    }

    #[test]
    fn test_from_ipv4() {
        let ip = Ipv4Hdr {
            ihl: 5,
            total_len: 40,
            ttl: 64,
            protocol: 17,
            src: Ipv4Addr::new(10, 0, 0, 1),
            dst: Ipv4Addr::new(10, 0, 0, 2),
        };
        let key = FlowKey::from_ipv4(&ip, 5000, 53);

        assert_eq!(key.src_addr(), ip.src);
        assert_eq!(key.dst_addr(), ip.dst);
        assert_eq!(key.protocol, 17);
        assert_eq!(key.to_string(), "10.0.0.1:5000 -> 10.0.0.2:53 proto 17");
    }
}
