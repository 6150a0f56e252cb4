//! In-place frame mutation
//!
//! VLAN tag push/pop resize the frame head; port and MAC rewrites are
//! bounded writes at already-parsed offsets. After every resize the data
//! view is re-derived from the frame and bounds-checked again before any
//! access.

use crate::buffer::Frame;
use crate::cursor::{Cursor, Header};
use crate::proto::eth::{EthHdr, ETH_P_8021Q};
use crate::proto::vlan::VlanHdr;
use xdplab_common::{BufferError, Layer, MacAddr, PacketResult, ParseError};

/// Re-validation after a resize; the frame is already the new size
#[inline(always)]
fn revalidate(data: &mut [u8], len: usize) -> Result<&mut [u8], BufferError> {
    let available = data.len();
    Cursor::new()
        .peek_mut(data, len, Layer::Ethernet)
        .map_err(|_| BufferError::FrameTooShort {
            needed: len,
            len: available,
        })
}

/// Remove the outermost VLAN tag
///
/// `eth` is the Ethernet header parsed before the call and
/// `encapsulated_proto` the ethertype carried in the tag. The frame shrinks
/// by four bytes and the Ethernet header is rewritten at the new start with
/// the encapsulated ethertype.
pub fn vlan_tag_pop(frame: &mut Frame, eth: EthHdr, encapsulated_proto: u16) -> PacketResult<()> {
    let needed = EthHdr::LEN + VlanHdr::LEN;
    if frame.len() < needed {
        return Err(BufferError::FrameTooShort {
            needed,
            len: frame.len(),
        }
        .into());
    }

    // `eth` is an owned copy, so nothing below refers to the old head
    let data = frame.adjust_head(VlanHdr::LEN as i32)?;

    let hdr = match revalidate(data, EthHdr::LEN) {
        Ok(hdr) => hdr,
        Err(err) => {
            frame.adjust_head(-(VlanHdr::LEN as i32))?;
            return Err(err.into());
        }
    };

    EthHdr {
        ether_type: encapsulated_proto,
        ..eth
    }
    .encode(hdr);

    Ok(())
}

/// Insert a VLAN tag carrying `vlan_id` after the Ethernet header
///
/// The original ethertype moves into the tag and the outer ethertype
/// becomes 802.1Q.
pub fn vlan_tag_push(frame: &mut Frame, vlan_id: u16) -> PacketResult<()> {
    let (eth, ether_type) = Cursor::new().parse::<EthHdr>(frame.data())?;

    if frame.headroom() < VlanHdr::LEN {
        return Err(BufferError::HeadroomExhausted {
            requested: VlanHdr::LEN,
            available: frame.headroom(),
        }
        .into());
    }

    let data = frame.adjust_head(-(VlanHdr::LEN as i32))?;

    let hdr = match revalidate(data, EthHdr::LEN + VlanHdr::LEN) {
        Ok(hdr) => hdr,
        Err(err) => {
            frame.adjust_head(VlanHdr::LEN as i32)?;
            return Err(err.into());
        }
    };

    EthHdr {
        ether_type: ETH_P_8021Q,
        ..eth
    }
    .encode(&mut hdr[..EthHdr::LEN]);
    VlanHdr::new(vlan_id, ether_type).encode(&mut hdr[EthHdr::LEN..]);

    Ok(())
}

/// Decrement the L4 destination port at `l4_offset`
///
/// Works for TCP and UDP, whose destination port is the second 16-bit
/// field. The port is only written when the result stays above zero.
/// Returns the new port if it was rewritten.
pub fn decrement_dst_port(
    frame: &mut Frame,
    l4_offset: usize,
    layer: Layer,
) -> Result<Option<u16>, ParseError> {
    let ports = Cursor::at(l4_offset).peek_mut(frame.data_mut(), 4, layer)?;

    let port = u16::from_be_bytes([ports[2], ports[3]]);
    let rewritten = port.checked_sub(1).filter(|p| *p > 0);

    if let Some(new_port) = rewritten {
        ports[2..4].copy_from_slice(&new_port.to_be_bytes());
    }

    Ok(rewritten)
}

/// Stamp new source and destination MACs on the Ethernet header
pub fn rewrite_macs(frame: &mut Frame, src: MacAddr, dst: MacAddr) -> Result<(), ParseError> {
    let hdr = Cursor::new().peek_mut(frame.data_mut(), EthHdr::LEN, EthHdr::LAYER)?;
    hdr[0..6].copy_from_slice(&dst.0);
    hdr[6..12].copy_from_slice(&src.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::eth::ETH_P_IP;
    use crate::proto::udp::UdpHdr;
    use proptest::prelude::*;
    use xdplab_common::PacketError;

    const DST: [u8; 6] = [0x02, 0, 0, 0, 0, 0x0a];
    const SRC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x0b];

    fn untagged(payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(14 + payload.len());
        bytes.extend_from_slice(&DST);
        bytes.extend_from_slice(&SRC);
        bytes.extend_from_slice(&ETH_P_IP.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn pop(frame: &mut Frame) -> u16 {
        let mut cursor = Cursor::new();
        let (eth, _) = cursor.parse::<EthHdr>(frame.data()).unwrap();
        let (vlan, inner) = cursor.parse::<VlanHdr>(frame.data()).unwrap();
        vlan_tag_pop(frame, eth, inner).unwrap();
        vlan.vlan_id()
    }

    #[test]
    fn test_push_layout() {
        let mut frame = Frame::from_bytes(1, &untagged(&[0x45, 0x00])).unwrap();
        vlan_tag_push(&mut frame, 100).unwrap();

        let data = frame.data();
        assert_eq!(data.len(), 20);
        assert_eq!(&data[0..6], &DST);
        assert_eq!(&data[6..12], &SRC);
        assert_eq!(&data[12..14], &ETH_P_8021Q.to_be_bytes());
        assert_eq!(&data[14..16], &100u16.to_be_bytes());
        assert_eq!(&data[16..18], &ETH_P_IP.to_be_bytes());
        assert_eq!(&data[18..20], &[0x45, 0x00]);
    }

    #[test]
    fn test_pop_restores_ethertype() {
        let original = untagged(&[1, 2, 3, 4]);
        let mut frame = Frame::from_bytes(1, &original).unwrap();

        vlan_tag_push(&mut frame, 42).unwrap();
        assert_eq!(pop(&mut frame), 42);
        assert_eq!(frame.to_vec(), original);
        assert_eq!(frame.headroom(), crate::buffer::DEFAULT_HEADROOM);
    }

    #[test]
    fn test_push_without_headroom() {
        let mut frame = Frame::with_headroom(1, 0, &untagged(&[])).unwrap();

        let err = vlan_tag_push(&mut frame, 100).unwrap_err();
        assert!(matches!(
            err,
            PacketError::Mutation(BufferError::HeadroomExhausted { .. })
        ));
        assert_eq!(frame.to_vec(), untagged(&[]));
    }

    #[test]
    fn test_push_on_truncated_frame() {
        let mut frame = Frame::from_bytes(1, &[0u8; 10]).unwrap();
        assert!(matches!(
            vlan_tag_push(&mut frame, 100),
            Err(PacketError::Malformed(_))
        ));
        assert_eq!(frame.len(), 10);
    }

    #[test]
    fn test_pop_too_short() {
        let mut frame = Frame::from_bytes(1, &[0u8; 16]).unwrap();
        let eth = EthHdr::decode(&[0u8; 14]);

        assert!(matches!(
            vlan_tag_pop(&mut frame, eth, ETH_P_IP),
            Err(PacketError::Mutation(BufferError::FrameTooShort { needed: 18, len: 16 }))
        ));
        assert_eq!(frame.len(), 16);
    }

    #[test]
    fn test_decrement_udp_port() {
        let mut payload = [0u8; 28];
        payload[20 + 2..20 + 4].copy_from_slice(&8080u16.to_be_bytes());
        let mut frame = Frame::from_bytes(1, &untagged(&payload)).unwrap();

        let l4 = EthHdr::LEN + 20;
        assert_eq!(decrement_dst_port(&mut frame, l4, Layer::Udp).unwrap(), Some(8079));

        let udp = UdpHdr::decode(&frame.data()[l4..l4 + UdpHdr::MIN_LEN]);
        assert_eq!(udp.dst_port, 8079);
    }

    #[test]
    fn test_port_one_is_not_rewritten() {
        let mut payload = [0u8; 8];
        payload[2..4].copy_from_slice(&1u16.to_be_bytes());
        let mut frame = Frame::from_bytes(1, &untagged(&payload)).unwrap();

        assert_eq!(decrement_dst_port(&mut frame, 14, Layer::Udp).unwrap(), None);
        assert_eq!(&frame.data()[16..18], &1u16.to_be_bytes());
    }

    #[test]
    fn test_port_zero_does_not_wrap() {
        let mut frame = Frame::from_bytes(1, &untagged(&[0u8; 8])).unwrap();

        assert_eq!(decrement_dst_port(&mut frame, 14, Layer::Tcp).unwrap(), None);
        assert_eq!(&frame.data()[16..18], &[0, 0]);
    }

    #[test]
    fn test_decrement_out_of_bounds() {
        let mut frame = Frame::from_bytes(1, &untagged(&[0u8; 2])).unwrap();
        assert!(decrement_dst_port(&mut frame, 14, Layer::Udp).is_err());
    }

    #[test]
    fn test_rewrite_macs() {
        let mut frame = Frame::from_bytes(1, &untagged(&[])).unwrap();
        let src = MacAddr([0xaa; 6]);
        let dst = MacAddr([0xbb; 6]);

        rewrite_macs(&mut frame, src, dst).unwrap();
        let (eth, ether_type) = Cursor::new().parse::<EthHdr>(frame.data()).unwrap();
        assert_eq!(eth.src, src);
        assert_eq!(eth.dst, dst);
        assert_eq!(ether_type, ETH_P_IP);
    }

    proptest! {
        #[test]
        fn prop_push_pop_roundtrip(
            vlan_id in 0u16..4096,
            ether_type in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let mut original = untagged(&payload);
            original[12..14].copy_from_slice(&ether_type.to_be_bytes());
            let mut frame = Frame::from_bytes(7, &original).unwrap();

            vlan_tag_push(&mut frame, vlan_id).unwrap();
            prop_assert_eq!(frame.len(), original.len() + VlanHdr::LEN);
            prop_assert_eq!(pop(&mut frame), vlan_id);
            prop_assert_eq!(frame.to_vec(), original);
        }

        #[test]
        fn prop_decrement_dst_port(port in any::<u16>()) {
            let mut payload = [0u8; 8];
            payload[2..4].copy_from_slice(&port.to_be_bytes());
            let mut frame = Frame::from_bytes(1, &untagged(&payload)).unwrap();

            let result = decrement_dst_port(&mut frame, 14, Layer::Udp).unwrap();
            let written = u16::from_be_bytes([frame.data()[16], frame.data()[17]]);

            if port > 1 {
                prop_assert_eq!(result, Some(port - 1));
                prop_assert_eq!(written, port - 1);
            } else {
                prop_assert_eq!(result, None);
                prop_assert_eq!(written, port);
            }
        }
    }
}
