//! ICMP header

use crate::cursor::Header;
use crate::proto::be16;
use xdplab_common::Layer;

/// Echo reply type
pub const ICMP_ECHOREPLY: u8 = 0;
/// Echo request type
pub const ICMP_ECHO: u8 = 8;

/// ICMP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHdr {
    /// Message type
    pub icmp_type: u8,
    /// Message code
    pub code: u8,
    /// Checksum
    pub checksum: u16,
    /// Echo identifier (meaningful for echo messages only)
    pub id: u16,
    /// Echo sequence (meaningful for echo messages only)
    pub sequence: u16,
}

impl IcmpHdr {
    /// Sequence number if this is an echo request
    #[inline(always)]
    pub fn echo_sequence(&self) -> Option<u16> {
        (self.icmp_type == ICMP_ECHO).then_some(self.sequence)
    }
}

impl Header for IcmpHdr {
    const LAYER: Layer = Layer::Icmp;
    const MIN_LEN: usize = 8;
    type Next = u8;

    #[inline(always)]
    fn decode(bytes: &[u8]) -> Self {
        Self {
            icmp_type: bytes[0],
            code: bytes[1],
            checksum: be16(bytes, 2),
            id: be16(bytes, 4),
            sequence: be16(bytes, 6),
        }
    }

    #[inline(always)]
    fn next(&self) -> u8 {
        self.icmp_type
    }
}
