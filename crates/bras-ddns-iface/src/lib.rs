// # Interface Address Selector
//
// This crate implements the `AddressSelector` trait by inspecting the
// host's network interfaces.
//
// ## Selection Rule
//
// 1. Keep interfaces that are up and have at least one gateway
// 2. In enumeration order, take the first one whose non-loopback IPv4
//    addresses include one of the portal-reported addresses
// 3. Report that interface's first IPv4 and first IPv6 address
//
// No match is not an error: both addresses come back as `None`.
//
// ## Platform Support
//
// `SystemInterfaces` dumps links, addresses and routes over rtnetlink and
// is only functional on Linux. The selection rule itself is platform
// independent and works with any `InterfaceInventory`.

use bras_ddns_core::traits::{AddressSelector, DiscoveredAddresses};
use bras_ddns_core::Result;
use std::net::{IpAddr, Ipv4Addr};

pub mod system;

pub use system::SystemInterfaces;

/// A network interface as seen by the selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    pub name: String,
    /// Administratively and operationally up
    pub is_up: bool,
    /// At least one route through this interface has a next hop
    pub has_gateway: bool,
    /// Unicast addresses in enumeration order
    pub addresses: Vec<IpAddr>,
}

impl LocalInterface {
    /// Non-loopback addresses
    fn unicast(&self) -> impl Iterator<Item = &IpAddr> {
        self.addresses.iter().filter(|ip| !ip.is_loopback())
    }
}

/// Source of the interface list
pub trait InterfaceInventory: Send + Sync {
    fn interfaces(&self) -> Result<Vec<LocalInterface>>;
}

/// Selects the interface the portal session is bound to
pub struct InterfaceSelector<I = SystemInterfaces> {
    inventory: I,
}

impl InterfaceSelector<SystemInterfaces> {
    /// Selector over the host's interfaces
    pub fn system() -> Self {
        Self::new(SystemInterfaces::new())
    }
}

impl<I: InterfaceInventory> InterfaceSelector<I> {
    pub fn new(inventory: I) -> Self {
        Self { inventory }
    }
}

impl<I: InterfaceInventory> AddressSelector for InterfaceSelector<I> {
    fn select(&self, candidates: &[Ipv4Addr]) -> Result<DiscoveredAddresses> {
        let interfaces = self.inventory.interfaces()?;

        for interface in interfaces.iter().filter(|i| i.is_up && i.has_gateway) {
            let matched = interface.unicast().any(|ip| match ip {
                IpAddr::V4(v4) => candidates.contains(v4),
                IpAddr::V6(_) => false,
            });
            if !matched {
                continue;
            }

            let ipv4 = interface.unicast().find_map(|ip| match ip {
                IpAddr::V4(v4) => Some(*v4),
                IpAddr::V6(_) => None,
            });
            let ipv6 = interface.unicast().find_map(|ip| match ip {
                IpAddr::V6(v6) => Some(*v6),
                IpAddr::V4(_) => None,
            });

            tracing::debug!("Portal session bound to interface {}", interface.name);
            return Ok(DiscoveredAddresses::new(ipv4, ipv6));
        }

        tracing::debug!(
            "None of {} interface(s) carries {:?}",
            interfaces.len(),
            candidates
        );
        Ok(DiscoveredAddresses::none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bras_ddns_core::Error;
    use std::net::Ipv6Addr;

    struct FixedInventory(Vec<LocalInterface>);

    impl InterfaceInventory for FixedInventory {
        fn interfaces(&self) -> Result<Vec<LocalInterface>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenInventory;

    impl InterfaceInventory for BrokenInventory {
        fn interfaces(&self) -> Result<Vec<LocalInterface>> {
            Err(Error::address_selector("netlink dump failed"))
        }
    }

    fn iface(name: &str, up: bool, gateway: bool, addresses: &[&str]) -> LocalInterface {
        LocalInterface {
            name: name.to_string(),
            is_up: up,
            has_gateway: gateway,
            addresses: addresses.iter().map(|a| a.parse().unwrap()).collect(),
        }
    }

    fn selector(interfaces: Vec<LocalInterface>) -> InterfaceSelector<FixedInventory> {
        InterfaceSelector::new(FixedInventory(interfaces))
    }

    #[test]
    fn test_matching_interface_selected() {
        let selector = selector(vec![
            iface("lo", true, false, &["127.0.0.1", "::1"]),
            iface("eth0", true, true, &["203.0.113.5", "2001:db8::5", "fe80::1"]),
        ]);

        let addrs = selector.select(&[Ipv4Addr::new(203, 0, 113, 5)]).unwrap();
        assert_eq!(addrs.ipv4, Some(Ipv4Addr::new(203, 0, 113, 5)));
        assert_eq!(addrs.ipv6, Some("2001:db8::5".parse::<Ipv6Addr>().unwrap()));
    }

    #[test]
    fn test_matching_interface_without_ipv6() {
        let selector = selector(vec![iface("eth0", true, true, &["203.0.113.5"])]);

        let addrs = selector.select(&[Ipv4Addr::new(203, 0, 113, 5)]).unwrap();
        assert_eq!(addrs.ipv4, Some(Ipv4Addr::new(203, 0, 113, 5)));
        assert_eq!(addrs.ipv6, None);
    }

    #[test]
    fn test_no_match_returns_sentinels() {
        let selector = selector(vec![iface("eth0", true, true, &["192.0.2.7", "2001:db8::7"])]);

        let addrs = selector.select(&[Ipv4Addr::new(203, 0, 113, 5)]).unwrap();
        assert!(addrs.is_none());
    }

    #[test]
    fn test_down_or_gatewayless_interfaces_ignored() {
        let selector = selector(vec![
            iface("eth0", false, true, &["203.0.113.5"]),
            iface("eth1", true, false, &["203.0.113.5"]),
        ]);

        assert!(selector.select(&[Ipv4Addr::new(203, 0, 113, 5)]).unwrap().is_none());
    }

    #[test]
    fn test_first_matching_interface_wins() {
        let selector = selector(vec![
            iface("eth0", true, true, &["10.0.0.2", "2001:db8::a"]),
            iface("eth1", true, true, &["10.0.0.3", "2001:db8::b"]),
        ]);

        let addrs = selector
            .select(&[Ipv4Addr::new(10, 0, 0, 3), Ipv4Addr::new(10, 0, 0, 2)])
            .unwrap();
        assert_eq!(addrs.ipv4, Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(addrs.ipv6, Some("2001:db8::a".parse::<Ipv6Addr>().unwrap()));
    }

    #[test]
    fn test_reports_first_ipv4_even_if_second_matched() {
        let selector = selector(vec![iface("eth0", true, true, &["192.0.2.1", "203.0.113.5"])]);

        let addrs = selector.select(&[Ipv4Addr::new(203, 0, 113, 5)]).unwrap();
        assert_eq!(addrs.ipv4, Some(Ipv4Addr::new(192, 0, 2, 1)));
    }

    #[test]
    fn test_loopback_never_matches() {
        let selector = selector(vec![iface("lo", true, true, &["127.0.0.1"])]);

        assert!(selector.select(&[Ipv4Addr::LOCALHOST]).unwrap().is_none());
    }

    #[test]
    fn test_inventory_error_propagates() {
        let selector = InterfaceSelector::new(BrokenInventory);
        assert!(matches!(
            selector.select(&[Ipv4Addr::LOCALHOST]),
            Err(Error::AddressSelector(_))
        ));
    }
}
