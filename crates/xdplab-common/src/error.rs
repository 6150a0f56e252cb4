//! Error types for the XDP lab data plane
//!
//! Every packet either reaches a terminal action or fails with a
//! [`PacketError`]. The error class decides the action: policy violations
//! drop, lookup misses and mutation failures abort, and malformed headers
//! take whichever action the program chooses.

use crate::XdpAction;
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Protocol layer a parser works on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Ethernet II
    Ethernet,
    /// 802.1Q / 802.1AD tag
    Vlan,
    /// IPv4
    Ipv4,
    /// ICMP
    Icmp,
    /// TCP
    Tcp,
    /// UDP
    Udp,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ethernet => "ethernet",
            Self::Vlan => "vlan",
            Self::Ipv4 => "ipv4",
            Self::Icmp => "icmp",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        })
    }
}

/// Header parsing failure; the cursor is left where it was
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Not enough bytes left for the header
    #[error("{layer} header truncated: need {needed} bytes at offset {offset}, frame has {available}")]
    Truncated {
        /// Layer being parsed
        layer: Layer,
        /// Cursor offset
        offset: usize,
        /// Bytes required from the offset
        needed: usize,
        /// Frame length
        available: usize,
    },

    /// Declared length field below the protocol minimum
    #[error("{layer} header declares {declared} bytes, minimum is {minimum}")]
    InvalidLength {
        /// Layer being parsed
        layer: Layer,
        /// Length taken from the header
        declared: usize,
        /// Protocol minimum
        minimum: usize,
    },
}

impl ParseError {
    /// Layer that failed
    pub const fn layer(&self) -> Layer {
        match self {
            Self::Truncated { layer, .. } | Self::InvalidLength { layer, .. } => *layer,
        }
    }
}

/// Frame resize or bounds failure
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Not enough head-room to grow the frame
    #[error("head-room exhausted: requested {requested} bytes, {available} available")]
    HeadroomExhausted {
        /// Bytes requested
        requested: usize,
        /// Head-room left
        available: usize,
    },

    /// Frame would become (or already is) shorter than required
    #[error("frame too short: need {needed} bytes, have {len}")]
    FrameTooShort {
        /// Bytes needed
        needed: usize,
        /// Current data length
        len: usize,
    },

    /// Payload does not fit in the frame buffer
    #[error("payload of {len} bytes exceeds frame capacity {capacity}")]
    TooLarge {
        /// Payload length
        len: usize,
        /// Usable capacity
        capacity: usize,
    },
}

/// Deliberate filtering decision
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    /// Trunk ingress carried an untagged frame
    #[error("frame is not VLAN tagged on trunk interface")]
    MissingVlanTag,

    /// Access ingress carried a tagged frame
    #[error("frame is already VLAN tagged on access interface")]
    UnexpectedVlanTag,

    /// Ethertype other than IPv4 where IPv4 is required
    #[error("ethertype {0:#06x} is not IPv4")]
    NotIpv4(u16),

    /// No per-source record (fail closed)
    #[error("no threshold configured for {0}")]
    NoThresholdConfigured(Ipv4Addr),

    /// Per-source count exceeded
    #[error("{src} exceeded threshold {threshold} ({received} packets)")]
    OverThreshold {
        /// Source address
        src: Ipv4Addr,
        /// Packets counted so far
        received: u64,
        /// Configured threshold
        threshold: u64,
    },

    /// Both sketch slots exceeded the threshold
    #[error("heavy hitter: sketch counts {first}/{second} over threshold {threshold}")]
    HeavyHitter {
        /// First hash slot count
        first: u64,
        /// Second hash slot count
        second: u64,
        /// Configured threshold
        threshold: u64,
    },

    /// ICMP echo request with an even sequence number
    #[error("ICMP echo sequence {0} is even")]
    EvenEchoSequence(u16),
}

/// Table entry missing for an otherwise well-formed packet
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    /// Destination IP not in the forwarding table
    #[error("no route for {0}")]
    Route(Ipv4Addr),

    /// Destination IP not in the IP-to-port table
    #[error("no port for {0}")]
    IpPort(Ipv4Addr),

    /// Output port outside the configured range
    #[error("port {port} outside 1..={max}")]
    PortRange {
        /// Port from the table
        port: u16,
        /// Highest valid port
        max: u16,
    },

    /// No source MAC for the output port
    #[error("no source MAC for port {0}")]
    SourceMac(u16),

    /// No devmap entry for the output port
    #[error("no devmap entry for port {0}")]
    Redirect(u16),

    /// Stats slot out of range
    #[error("no stats slot {0}")]
    StatsSlot(u32),
}

/// Unsupported next layer for a program that requires one
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// Ethertype not handled
    #[error("unsupported ethertype {0:#06x}")]
    EtherType(u16),

    /// IP protocol not handled
    #[error("unsupported IP protocol {0}")]
    IpProtocol(u8),

    /// Frame arrived on an interface the program has no role for
    #[error("unknown ingress interface {0}")]
    Ingress(u32),
}

/// Per-packet failure
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    /// Truncated or invalid header
    #[error("malformed packet: {0}")]
    Malformed(#[from] ParseError),

    /// Deliberately filtered
    #[error("policy: {0}")]
    Policy(#[from] PolicyViolation),

    /// Configuration miss
    #[error("lookup miss: {0}")]
    Lookup(#[from] LookupMiss),

    /// Resize or re-validation failed
    #[error("mutation failed: {0}")]
    Mutation(#[from] BufferError),

    /// Next layer not handled by this program
    #[error("{0}")]
    Unsupported(#[from] Unsupported),
}

impl PacketError {
    /// Map to the terminal action
    ///
    /// `malformed` and `unsupported` are program policy; the other classes
    /// are fixed.
    #[inline]
    pub fn action(&self, malformed: XdpAction, unsupported: XdpAction) -> XdpAction {
        match self {
            Self::Malformed(_) => malformed,
            Self::Policy(_) => XdpAction::Drop,
            Self::Lookup(_) | Self::Mutation(_) => XdpAction::Aborted,
            Self::Unsupported(_) => unsupported,
        }
    }
}

/// Result type for per-packet processing
pub type PacketResult<T> = Result<T, PacketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_actions() {
        let malformed = PacketError::from(ParseError::InvalidLength {
            layer: Layer::Ipv4,
            declared: 8,
            minimum: 20,
        });
        assert_eq!(malformed.action(XdpAction::Drop, XdpAction::Pass), XdpAction::Drop);
        assert_eq!(malformed.action(XdpAction::Aborted, XdpAction::Pass), XdpAction::Aborted);

        let policy = PacketError::from(PolicyViolation::MissingVlanTag);
        assert_eq!(policy.action(XdpAction::Aborted, XdpAction::Pass), XdpAction::Drop);

        let miss = PacketError::from(LookupMiss::SourceMac(2));
        assert_eq!(miss.action(XdpAction::Drop, XdpAction::Pass), XdpAction::Aborted);

        let resize = PacketError::from(BufferError::FrameTooShort { needed: 14, len: 10 });
        assert_eq!(resize.action(XdpAction::Drop, XdpAction::Pass), XdpAction::Aborted);

        let other = PacketError::from(Unsupported::IpProtocol(47));
        assert_eq!(other.action(XdpAction::Drop, XdpAction::Pass), XdpAction::Pass);
    }

    #[test]
    fn test_display() {
        let err = ParseError::Truncated {
            layer: Layer::Ethernet,
            offset: 0,
            needed: 14,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "ethernet header truncated: need 14 bytes at offset 0, frame has 10"
        );
        assert_eq!(err.layer(), Layer::Ethernet);
    }
}
