//! UDP header

use crate::cursor::Header;
use crate::proto::be16;
use xdplab_common::{Layer, ParseError};

/// Offset of the destination port within the header
pub const UDP_DPORT_OFFSET: usize = 2;

/// UDP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHdr {
    /// Source port
    pub src_port: u16,
    /// Destination port
    pub dst_port: u16,
    /// Header plus payload length
    pub len: u16,
    /// Checksum
    pub checksum: u16,
}

impl Header for UdpHdr {
    const LAYER: Layer = Layer::Udp;
    const MIN_LEN: usize = 8;
    /// Payload length taken from the length field
    type Next = usize;

    #[inline(always)]
    fn decode(bytes: &[u8]) -> Self {
        Self {
            src_port: be16(bytes, 0),
            dst_port: be16(bytes, UDP_DPORT_OFFSET),
            len: be16(bytes, 4),
            checksum: be16(bytes, 6),
        }
    }

    fn validate(&self) -> Result<(), ParseError> {
        if (self.len as usize) < Self::MIN_LEN {
            return Err(ParseError::InvalidLength {
                layer: Layer::Udp,
                declared: self.len as usize,
                minimum: Self::MIN_LEN,
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn next(&self) -> usize {
        self.len as usize - Self::MIN_LEN
    }
}
