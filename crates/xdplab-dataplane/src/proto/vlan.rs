//! 802.1Q / 802.1AD VLAN tag

use crate::cursor::Header;
use crate::proto::be16;
use xdplab_common::{Layer, VLAN_HLEN};

/// VLAN identifier bits of the TCI
pub const VLAN_VID_MASK: u16 = 0x0fff;

/// VLAN header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanHdr {
    /// Priority, DEI and VLAN ID
    pub tci: u16,
    /// Ethertype of the tagged payload
    pub encapsulated_proto: u16,
}

impl VlanHdr {
    /// Header size
    pub const LEN: usize = VLAN_HLEN;

    /// Tag carrying `vlan_id` with priority 0
    #[inline(always)]
    pub const fn new(vlan_id: u16, encapsulated_proto: u16) -> Self {
        Self {
            tci: vlan_id & VLAN_VID_MASK,
            encapsulated_proto,
        }
    }

    /// 12-bit VLAN ID
    #[inline(always)]
    pub const fn vlan_id(&self) -> u16 {
        self.tci & VLAN_VID_MASK
    }

    /// Write the tag into the first 4 bytes of `out`
    #[inline(always)]
    pub fn encode(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.tci.to_be_bytes());
        out[2..4].copy_from_slice(&self.encapsulated_proto.to_be_bytes());
    }
}

impl Header for VlanHdr {
    const LAYER: Layer = Layer::Vlan;
    const MIN_LEN: usize = VLAN_HLEN;
    type Next = u16;

    #[inline(always)]
    fn decode(bytes: &[u8]) -> Self {
        Self {
            tci: be16(bytes, 0),
            encapsulated_proto: be16(bytes, 2),
        }
    }

    #[inline(always)]
    fn next(&self) -> u16 {
        self.encapsulated_proto
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use crate::proto::eth::{EthHdr, ETH_P_8021Q, ETH_P_IP};

    #[test]
    fn test_parse_vlan_after_ethernet() {
        let mut frame = [0u8; 18];
        frame[12..14].copy_from_slice(&ETH_P_8021Q.to_be_bytes());
        // PCP 5, VID 100
        frame[14..16].copy_from_slice(&((5u16 << 13) | 100).to_be_bytes());
        frame[16..18].copy_from_slice(&ETH_P_IP.to_be_bytes());

        let mut cursor = Cursor::new();
        cursor.parse::<EthHdr>(&frame).unwrap();
        let (vlan, inner) = cursor.parse::<VlanHdr>(&frame).unwrap();

        assert_eq!(vlan.vlan_id(), 100);
        assert_eq!(inner, ETH_P_IP);
        assert_eq!(cursor.offset(), 18);
    }

    #[test]
    fn test_truncated_tag() {
        let frame = [0u8; 16];
        let mut cursor = Cursor::at(14);
        assert!(cursor.parse::<VlanHdr>(&frame).is_err());
        assert_eq!(cursor.offset(), 14);
    }

    #[test]
    fn test_new_masks_vlan_id() {
        assert_eq!(VlanHdr::new(0x1064, ETH_P_IP).tci, 0x064);
    }
}
