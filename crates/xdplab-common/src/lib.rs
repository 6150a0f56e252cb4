//! XDP Lab Common - Shared types for the per-packet data plane
//!
//! This crate provides the vocabulary every program speaks:
//! - Action codes returned to the driver hook
//! - Hardware addresses
//! - The per-packet error taxonomy (malformed / policy / lookup / mutation)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod error;
pub mod mac;

pub use action::XdpAction;
pub use error::*;
pub use mac::MacAddr;

/// Ethernet header length
pub const ETH_HLEN: usize = 14;

/// VLAN header length
pub const VLAN_HLEN: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_sizes() {
        assert_eq!(ETH_HLEN, 14);
        assert_eq!(ETH_HLEN + VLAN_HLEN, 18);
    }
}
