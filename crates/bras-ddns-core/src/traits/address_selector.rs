// # Address Selector Trait
//
// Maps the addresses the portal knows about onto a local network interface,
// and reports the addresses bound to that interface.
//
// ## Implementations
//
// - rtnetlink link, address and route dumps (Linux): `bras-ddns-iface` crate

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Addresses discovered for the authenticated interface
///
/// `None` means "unknown": it is logged as `none` and never sent to a
/// DNS provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveredAddresses {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

impl DiscoveredAddresses {
    pub fn new(ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> Self {
        Self { ipv4, ipv6 }
    }

    /// The "no interface matched" pair
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none()
    }
}

impl fmt::Display for DiscoveredAddresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ipv4 {
            Some(ip) => write!(f, "IPv4: {}", ip)?,
            None => write!(f, "IPv4: none")?,
        }
        match self.ipv6 {
            Some(ip) => write!(f, ", IPv6: {}", ip),
            None => write!(f, ", IPv6: none"),
        }
    }
}

/// Trait for address selector implementations
///
/// Selection is synchronous: it only inspects local state.
pub trait AddressSelector: Send + Sync {
    /// Pick the local interface carrying one of `candidates`
    ///
    /// # Returns
    ///
    /// - `Ok(DiscoveredAddresses)`: the interface's first IPv4 and IPv6
    ///   addresses, or [`DiscoveredAddresses::none`] when nothing matched
    /// - `Err(Error)`: if the local interfaces could not be inspected
    fn select(&self, candidates: &[Ipv4Addr]) -> Result<DiscoveredAddresses, crate::Error>;
}
