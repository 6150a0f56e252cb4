//! TCP header

use crate::cursor::Header;
use crate::proto::be16;
use xdplab_common::Layer;

/// Offset of the destination port within the header
pub const TCP_DPORT_OFFSET: usize = 2;

/// TCP header (ports and data offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHdr {
    /// Source port
    pub src_port: u16,
    /// Destination port
    pub dst_port: u16,
    /// Header length in 32-bit words (5..=15)
    pub doff: u8,
    /// Flag bits (FIN..CWR)
    pub flags: u8,
}

impl Header for TcpHdr {
    const LAYER: Layer = Layer::Tcp;
    const MIN_LEN: usize = 20;
    /// Real header length in bytes
    type Next = usize;

    #[inline(always)]
    fn decode(bytes: &[u8]) -> Self {
        Self {
            src_port: be16(bytes, 0),
            dst_port: be16(bytes, TCP_DPORT_OFFSET),
            doff: bytes[12] >> 4,
            flags: bytes[13],
        }
    }

    /// At most 60, since `doff` is four bits
    #[inline(always)]
    fn header_len(&self) -> usize {
        self.doff as usize * 4
    }

    #[inline(always)]
    fn next(&self) -> usize {
        self.header_len()
    }
}
