//! Action codes returned to the driver hook

use serde::Serialize;
use std::fmt;

/// Final verdict for one packet
///
/// Numeric codes follow the kernel's `enum xdp_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "action", content = "ifindex", rename_all = "lowercase")]
pub enum XdpAction {
    /// Processing error, distinct from a policy drop
    Aborted,
    /// Silently discard
    Drop,
    /// Continue normal stack processing
    Pass,
    /// Transmit out the given egress interface
    Redirect(u32),
}

impl XdpAction {
    /// Kernel action code
    #[inline(always)]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Aborted => 0,
            Self::Drop => 1,
            Self::Pass => 2,
            Self::Redirect(_) => 4,
        }
    }

    /// Short lowercase name, used as a metrics label
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Aborted => "aborted",
            Self::Drop => "drop",
            Self::Pass => "pass",
            Self::Redirect(_) => "redirect",
        }
    }

    /// Egress interface, if this is a redirect
    pub const fn egress(&self) -> Option<u32> {
        match self {
            Self::Redirect(ifindex) => Some(*ifindex),
            _ => None,
        }
    }
}

impl fmt::Display for XdpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redirect(ifindex) => write!(f, "XDP_REDIRECT({})", ifindex),
            Self::Aborted => f.write_str("XDP_ABORTED"),
            Self::Drop => f.write_str("XDP_DROP"),
            Self::Pass => f.write_str("XDP_PASS"),
        }
    }
}
