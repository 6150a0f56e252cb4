//! IPv4 header

use crate::cursor::Header;
use crate::proto::be16;
use std::net::Ipv4Addr;
use xdplab_common::Layer;

/// IPv4 header (options are skipped, not decoded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Hdr {
    /// Header length in 32-bit words
    pub ihl: u8,
    /// Total datagram length
    pub total_len: u16,
    /// Time to live
    pub ttl: u8,
    /// Payload protocol
    pub protocol: u8,
    /// Source address
    pub src: Ipv4Addr,
    /// Destination address
    pub dst: Ipv4Addr,
}

impl Header for Ipv4Hdr {
    const LAYER: Layer = Layer::Ipv4;
    const MIN_LEN: usize = 20;
    type Next = u8;

    #[inline(always)]
    fn decode(bytes: &[u8]) -> Self {
        Self {
            ihl: bytes[0] & 0x0f,
            total_len: be16(bytes, 2),
            ttl: bytes[8],
            protocol: bytes[9],
            src: Ipv4Addr::new(bytes[12], bytes[13], bytes[14], bytes[15]),
            dst: Ipv4Addr::new(bytes[16], bytes[17], bytes[18], bytes[19]),
        }
    }

    #[inline(always)]
    fn header_len(&self) -> usize {
        self.ihl as usize * 4
    }

    #[inline(always)]
    fn next(&self) -> u8 {
        self.protocol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use crate::proto::ip_proto;
    use xdplab_common::ParseError;

    fn ipv4(ihl: u8, len: usize) -> Vec<u8> {
        let mut hdr = vec![0u8; len];
        hdr[0] = 0x40 | ihl;
        hdr[9] = ip_proto::UDP;
        hdr[12..16].copy_from_slice(&[192, 168, 1, 1]);
        hdr[16..20].copy_from_slice(&[10, 0, 0, 1]);
        hdr
    }

    #[test]
    fn test_parse_minimal() {
        let data = ipv4(5, 28);
        let mut cursor = Cursor::new();

        let (ip, proto) = cursor.parse::<Ipv4Hdr>(&data).unwrap();
        assert_eq!(proto, ip_proto::UDP);
        assert_eq!(ip.src, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(ip.dst, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(cursor.offset(), 20);
    }

    #[test]
    fn test_parse_with_options() {
        let data = ipv4(6, 28);
        let mut cursor = Cursor::new();

        cursor.parse::<Ipv4Hdr>(&data).unwrap();
        assert_eq!(cursor.offset(), 24);
    }

    #[test]
    fn test_ihl_below_minimum() {
        let data = ipv4(4, 28);
        let mut cursor = Cursor::new();

        assert_eq!(
            cursor.parse::<Ipv4Hdr>(&data).unwrap_err(),
            ParseError::InvalidLength {
                layer: Layer::Ipv4,
                declared: 16,
                minimum: 20
            }
        );
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_options_past_end() {
        // IHL 15 declares 60 bytes but only 24 are present
        let data = ipv4(15, 24);
        let mut cursor = Cursor::new();

        assert!(matches!(
            cursor.parse::<Ipv4Hdr>(&data),
            Err(ParseError::Truncated { needed: 60, .. })
        ));
        assert_eq!(cursor.offset(), 0);
    }
}
