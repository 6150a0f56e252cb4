//! VLAN trunk/access handler
//!
//! Frames from the trunk must be tagged; the tag is popped and the frame
//! goes out the access interface. Frames from the access side must be
//! untagged; the configured tag is pushed and the frame goes out the trunk.

use super::XdpProgram;
use crate::buffer::Frame;
use crate::config::VlanConfig;
use crate::cursor::Cursor;
use crate::mutate::{vlan_tag_pop, vlan_tag_push};
use crate::proto::eth::proto_is_vlan;
use crate::proto::{EthHdr, VlanHdr};
use xdplab_common::{PacketResult, PolicyViolation, Unsupported, XdpAction};

/// VLAN handler
#[derive(Debug, Clone)]
pub struct VlanHandler {
    trunk_ifindex: u32,
    access_ifindex: u32,
    vlan_id: u16,
}

impl VlanHandler {
    /// Handler bridging `trunk_ifindex` and `access_ifindex`
    pub fn new(trunk_ifindex: u32, access_ifindex: u32, vlan_id: u16) -> Self {
        Self {
            trunk_ifindex,
            access_ifindex,
            vlan_id,
        }
    }

    /// Handler from the `vlan` configuration section
    pub fn from_config(config: &VlanConfig) -> Self {
        Self::new(config.trunk_ifindex, config.access_ifindex, config.vlan_id)
    }

    fn from_trunk(&self, frame: &mut Frame) -> PacketResult<XdpAction> {
        let mut cursor = Cursor::new();
        let (eth, ether_type) = cursor.parse::<EthHdr>(frame.data())?;
        if !proto_is_vlan(ether_type) {
            return Err(PolicyViolation::MissingVlanTag.into());
        }

        let (vlan, inner) = cursor.parse::<VlanHdr>(frame.data())?;
        vlan_tag_pop(frame, eth, inner)?;

        tracing::trace!(vlan_id = vlan.vlan_id(), "popped VLAN tag");
        Ok(XdpAction::Redirect(self.access_ifindex))
    }

    fn from_access(&self, frame: &mut Frame) -> PacketResult<XdpAction> {
        let (_, ether_type) = Cursor::new().parse::<EthHdr>(frame.data())?;
        if proto_is_vlan(ether_type) {
            return Err(PolicyViolation::UnexpectedVlanTag.into());
        }

        vlan_tag_push(frame, self.vlan_id)?;

        tracing::trace!(vlan_id = self.vlan_id, "pushed VLAN tag");
        Ok(XdpAction::Redirect(self.trunk_ifindex))
    }
}

impl XdpProgram for VlanHandler {
    fn name(&self) -> &'static str {
        "vlan"
    }

    fn process(&self, frame: &mut Frame) -> PacketResult<XdpAction> {
        Cursor::new().parse::<EthHdr>(frame.data())?;

        match frame.ingress_ifindex() {
            ifindex if ifindex == self.trunk_ifindex => self.from_trunk(frame),
            ifindex if ifindex == self.access_ifindex => self.from_access(frame),
            other => Err(Unsupported::Ingress(other).into()),
        }
    }

    fn on_malformed(&self) -> XdpAction {
        XdpAction::Drop
    }

    fn on_unsupported(&self) -> XdpAction {
        XdpAction::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::DEFAULT_HEADROOM;
    use crate::proto::eth::{ETH_P_8021Q, ETH_P_IP};
    use crate::testutil::*;

    const TRUNK: u32 = 3;
    const ACCESS: u32 = 4;

    fn handler() -> VlanHandler {
        VlanHandler::new(TRUNK, ACCESS, 100)
    }

    fn payload() -> Vec<u8> {
        ipv4(CLIENT, SERVER, 17, &udp(1, 2, &[]))
    }

    #[test]
    fn test_access_untagged_is_tagged_and_sent_to_trunk() {
        let original = ethernet(ETH_P_IP, &payload());
        let mut frame = Frame::from_bytes(ACCESS, &original).unwrap();

        assert_eq!(handler().run(&mut frame), XdpAction::Redirect(TRUNK));
        assert_eq!(frame.len(), original.len() + 4);

        let mut cursor = Cursor::new();
        let (_, ether_type) = cursor.parse::<EthHdr>(frame.data()).unwrap();
        let (vlan, inner) = cursor.parse::<VlanHdr>(frame.data()).unwrap();
        assert_eq!(ether_type, ETH_P_8021Q);
        assert_eq!(vlan.vlan_id(), 100);
        assert_eq!(inner, ETH_P_IP);
        assert_eq!(&frame.data()[18..], &original[14..]);
    }

    #[test]
    fn test_trunk_tagged_is_popped_and_sent_to_access() {
        let mut frame = Frame::from_bytes(TRUNK, &tagged(100, ETH_P_IP, &payload())).unwrap();

        assert_eq!(handler().run(&mut frame), XdpAction::Redirect(ACCESS));
        assert_eq!(frame.to_vec(), ethernet(ETH_P_IP, &payload()));
        assert_eq!(frame.headroom(), DEFAULT_HEADROOM + 4);
    }

    #[test]
    fn test_round_trip_through_both_sides() {
        let original = ethernet(ETH_P_IP, &payload());
        let mut frame = Frame::from_bytes(ACCESS, &original).unwrap();
        handler().run(&mut frame);

        let mut back = Frame::from_bytes(TRUNK, frame.data()).unwrap();
        assert_eq!(handler().run(&mut back), XdpAction::Redirect(ACCESS));
        assert_eq!(back.to_vec(), original);
    }

    #[test]
    fn test_wrong_tagging_dropped() {
        let mut tagged_on_access =
            Frame::from_bytes(ACCESS, &tagged(100, ETH_P_IP, &payload())).unwrap();
        assert_eq!(handler().run(&mut tagged_on_access), XdpAction::Drop);

        let mut untagged_on_trunk =
            Frame::from_bytes(TRUNK, &ethernet(ETH_P_IP, &payload())).unwrap();
        assert_eq!(handler().run(&mut untagged_on_trunk), XdpAction::Drop);
    }

    #[test]
    fn test_truncated_tag_dropped() {
        let mut bytes = ethernet(ETH_P_8021Q, &[0, 100]);
        bytes.truncate(16);
        let mut frame = Frame::from_bytes(TRUNK, &bytes).unwrap();
        assert_eq!(handler().run(&mut frame), XdpAction::Drop);
    }

    #[test]
    fn test_short_frame_aborted() {
        let mut frame = Frame::from_bytes(ACCESS, &[0u8; 10]).unwrap();
        assert_eq!(handler().run(&mut frame), XdpAction::Aborted);
    }

    #[test]
    fn test_unknown_ingress_aborted() {
        let mut frame = Frame::from_bytes(9, &ethernet(ETH_P_IP, &payload())).unwrap();
        assert_eq!(handler().run(&mut frame), XdpAction::Aborted);
    }

    #[test]
    fn test_push_without_headroom_aborted() {
        let mut frame = Frame::with_headroom(ACCESS, 2, &ethernet(ETH_P_IP, &payload())).unwrap();
        assert_eq!(handler().run(&mut frame), XdpAction::Aborted);
        assert_eq!(frame.len(), 14 + payload().len());
    }
}
