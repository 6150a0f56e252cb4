//! Ethernet II header

use crate::cursor::Header;
use crate::proto::be16;
use xdplab_common::{Layer, MacAddr, ETH_HLEN};

/// IPv4 ethertype
pub const ETH_P_IP: u16 = 0x0800;
/// ARP ethertype
pub const ETH_P_ARP: u16 = 0x0806;
/// 802.1Q VLAN tag protocol identifier
pub const ETH_P_8021Q: u16 = 0x8100;
/// 802.1AD (QinQ) tag protocol identifier
pub const ETH_P_8021AD: u16 = 0x88A8;

/// Does this ethertype announce a VLAN tag?
#[inline(always)]
pub const fn proto_is_vlan(ether_type: u16) -> bool {
    ether_type == ETH_P_8021Q || ether_type == ETH_P_8021AD
}

/// Ethernet header (host-order ethertype)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthHdr {
    /// Destination MAC
    pub dst: MacAddr,
    /// Source MAC
    pub src: MacAddr,
    /// Ethertype
    pub ether_type: u16,
}

impl EthHdr {
    /// Header size
    pub const LEN: usize = ETH_HLEN;

    /// Write the header into the first 14 bytes of `out`
    ///
    /// `out` must already be bounds-checked to at least [`EthHdr::LEN`].
    #[inline(always)]
    pub fn encode(&self, out: &mut [u8]) {
        out[0..6].copy_from_slice(&self.dst.0);
        out[6..12].copy_from_slice(&self.src.0);
        out[12..14].copy_from_slice(&self.ether_type.to_be_bytes());
    }
}

impl Header for EthHdr {
    const LAYER: Layer = Layer::Ethernet;
    const MIN_LEN: usize = ETH_HLEN;
    type Next = u16;

    #[inline(always)]
    fn decode(bytes: &[u8]) -> Self {
        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&bytes[0..6]);
        src.copy_from_slice(&bytes[6..12]);
        Self {
            dst: MacAddr(dst),
            src: MacAddr(src),
            ether_type: be16(bytes, 12),
        }
    }

    #[inline(always)]
    fn next(&self) -> u16 {
        self.ether_type
    }
}
