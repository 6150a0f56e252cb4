//! Frame builders for tests

use crate::proto::eth::{ETH_P_8021Q, ETH_P_IP};
use crate::proto::ip_proto;
use std::net::Ipv4Addr;

pub const DST_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x0a];
pub const SRC_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x0b];

pub const CLIENT: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
pub const SERVER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

/// Ethernet header followed by `payload`
pub fn ethernet(ether_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(14 + payload.len());
    out.extend_from_slice(&DST_MAC);
    out.extend_from_slice(&SRC_MAC);
    out.extend_from_slice(&ether_type.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// 802.1Q tagged Ethernet frame
pub fn tagged(vlan_id: u16, ether_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut tag = Vec::with_capacity(4 + payload.len());
    tag.extend_from_slice(&vlan_id.to_be_bytes());
    tag.extend_from_slice(&ether_type.to_be_bytes());
    tag.extend_from_slice(payload);
    ethernet(ETH_P_8021Q, &tag)
}

/// Option-less IPv4 header followed by `payload`
pub fn ipv4(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 20];
    out[0] = 0x45;
    out[2..4].copy_from_slice(&((20 + payload.len()) as u16).to_be_bytes());
    out[8] = 64;
    out[9] = protocol;
    out[12..16].copy_from_slice(&src.octets());
    out[16..20].copy_from_slice(&dst.octets());
    out.extend_from_slice(payload);
    out
}

/// ICMP echo request
pub fn icmp_echo(sequence: u16) -> Vec<u8> {
    let mut out = vec![8, 0, 0, 0, 0x12, 0x34];
    out.extend_from_slice(&sequence.to_be_bytes());
    out.extend_from_slice(&[0xaa; 8]);
    out
}

/// UDP header with a correct length field
pub fn udp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&src_port.to_be_bytes());
    out.extend_from_slice(&dst_port.to_be_bytes());
    out.extend_from_slice(&((8 + payload.len()) as u16).to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(payload);
    out
}

/// Option-less TCP header
pub fn tcp(src_port: u16, dst_port: u16) -> Vec<u8> {
    let mut out = vec![0u8; 20];
    out[0..2].copy_from_slice(&src_port.to_be_bytes());
    out[2..4].copy_from_slice(&dst_port.to_be_bytes());
    out[12] = 5 << 4;
    out[13] = 0x02;
    out
}

/// Complete Ethernet/IPv4/UDP frame
pub fn udp_frame(src: Ipv4Addr, dst: Ipv4Addr, src_port: u16, dst_port: u16) -> Vec<u8> {
    ethernet(
        ETH_P_IP,
        &ipv4(src, dst, ip_proto::UDP, &udp(src_port, dst_port, &[0u8; 4])),
    )
}

/// Complete Ethernet/IPv4/ICMP echo frame
pub fn echo_frame(sequence: u16) -> Vec<u8> {
    ethernet(
        ETH_P_IP,
        &ipv4(CLIENT, SERVER, ip_proto::ICMP, &icmp_echo(sequence)),
    )
}
