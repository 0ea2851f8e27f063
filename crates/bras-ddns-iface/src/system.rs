//! Interface inventory backed by the running system
//!
//! Linux only: links, addresses and routes come from rtnetlink dumps
//! (`RTM_GETLINK`, `RTM_GETADDR`, `RTM_GETROUTE`).

use bras_ddns_core::Result;
#[cfg(not(target_os = "linux"))]
use bras_ddns_core::Error;

use crate::{InterfaceInventory, LocalInterface};

/// The host's network interfaces
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl SystemInterfaces {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "linux")]
impl InterfaceInventory for SystemInterfaces {
    fn interfaces(&self) -> Result<Vec<LocalInterface>> {
        let dumps = netlink::dump_all()?;
        Ok(netlink::assemble(&dumps.links, &dumps.addresses, &dumps.routes))
    }
}

#[cfg(not(target_os = "linux"))]
impl InterfaceInventory for SystemInterfaces {
    fn interfaces(&self) -> Result<Vec<LocalInterface>> {
        Err(Error::address_selector(
            "Interface inspection is only supported on Linux",
        ))
    }
}

#[cfg(target_os = "linux")]
pub(crate) mod netlink {
    use super::*;
    use bras_ddns_core::Error;
    use netlink_packet_core::{
        NLM_F_DUMP, NLM_F_REQUEST, NetlinkHeader, NetlinkMessage, NetlinkPayload,
    };
    use netlink_packet_route::address::nlas::Nla as AddressNla;
    use netlink_packet_route::link::nlas::Nla as LinkNla;
    use netlink_packet_route::route::nlas::Nla as RouteNla;
    use netlink_packet_route::{AddressMessage, LinkMessage, RouteMessage, RtnlMessage};
    use netlink_sys::protocols::NETLINK_ROUTE;
    use netlink_sys::{Socket, SocketAddr};
    use std::collections::HashSet;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    pub(crate) struct Dumps {
        pub links: Vec<LinkMessage>,
        pub addresses: Vec<AddressMessage>,
        pub routes: Vec<RouteMessage>,
    }

    /// Dump links, addresses and routes over one rtnetlink socket
    pub(crate) fn dump_all() -> Result<Dumps> {
        let mut socket = Socket::new(NETLINK_ROUTE)
            .map_err(|e| Error::address_selector(format!("Cannot open netlink socket: {}", e)))?;
        socket
            .bind_auto()
            .map_err(|e| Error::address_selector(format!("Cannot bind netlink socket: {}", e)))?;
        socket
            .connect(&SocketAddr::new(0, 0))
            .map_err(|e| Error::address_selector(format!("Cannot connect netlink socket: {}", e)))?;

        let links = dump(&socket, 1, RtnlMessage::GetLink(LinkMessage::default()))?
            .into_iter()
            .filter_map(|m| match m {
                RtnlMessage::NewLink(link) => Some(link),
                _ => None,
            })
            .collect();

        let addresses = dump(&socket, 2, RtnlMessage::GetAddress(AddressMessage::default()))?
            .into_iter()
            .filter_map(|m| match m {
                RtnlMessage::NewAddress(address) => Some(address),
                _ => None,
            })
            .collect();

        let routes = dump(&socket, 3, RtnlMessage::GetRoute(RouteMessage::default()))?
            .into_iter()
            .filter_map(|m| match m {
                RtnlMessage::NewRoute(route) => Some(route),
                _ => None,
            })
            .collect();

        Ok(Dumps {
            links,
            addresses,
            routes,
        })
    }

    /// Send one dump request and collect replies until `NLMSG_DONE`
    fn dump(socket: &Socket, sequence: u32, request: RtnlMessage) -> Result<Vec<RtnlMessage>> {
        let mut header = NetlinkHeader::default();
        header.flags = NLM_F_REQUEST | NLM_F_DUMP;
        header.sequence_number = sequence;

        let mut packet = NetlinkMessage::new(header, NetlinkPayload::InnerMessage(request));
        packet.finalize();
        let mut buf = vec![0u8; packet.buffer_len()];
        packet.serialize(&mut buf[..]);

        socket
            .send(&buf, 0)
            .map_err(|e| Error::address_selector(format!("netlink send failed: {}", e)))?;

        let mut replies = Vec::new();
        loop {
            let (bytes, _) = socket
                .recv_from_full()
                .map_err(|e| Error::address_selector(format!("netlink recv failed: {}", e)))?;

            let mut offset = 0;
            while offset < bytes.len() {
                let message = NetlinkMessage::<RtnlMessage>::deserialize(&bytes[offset..])
                    .map_err(|e| {
                        Error::address_selector(format!("Malformed netlink message: {}", e))
                    })?;
                let length = message.header.length as usize;

                match message.payload {
                    NetlinkPayload::Done(_) => return Ok(replies),
                    NetlinkPayload::Error(err) => {
                        return Err(Error::address_selector(format!(
                            "netlink dump failed: {:?}",
                            err
                        )));
                    }
                    NetlinkPayload::InnerMessage(inner) => replies.push(inner),
                    _ => {}
                }

                if length == 0 {
                    return Err(Error::address_selector("Zero-length netlink message"));
                }
                offset += length;
            }
        }
    }

    /// Build the inventory from the three dumps, in link order
    pub(crate) fn assemble(
        links: &[LinkMessage],
        addresses: &[AddressMessage],
        routes: &[RouteMessage],
    ) -> Vec<LocalInterface> {
        let gateway_indexes: HashSet<u32> = routes
            .iter()
            .filter(|route| {
                route
                    .nlas
                    .iter()
                    .any(|nla| matches!(nla, RouteNla::Gateway(gw) if gw.iter().any(|b| *b != 0)))
            })
            .filter_map(|route| {
                route.nlas.iter().find_map(|nla| match nla {
                    RouteNla::Oif(index) => Some(*index),
                    _ => None,
                })
            })
            .collect();

        let running = libc::IFF_UP as u32 | libc::IFF_RUNNING as u32;

        links
            .iter()
            .filter_map(|link| {
                let name = link.nlas.iter().find_map(|nla| match nla {
                    LinkNla::IfName(name) => Some(name.clone()),
                    _ => None,
                })?;
                let index = link.header.index;

                Some(LocalInterface {
                    name,
                    is_up: link.header.flags & running == running,
                    has_gateway: gateway_indexes.contains(&index),
                    addresses: addresses
                        .iter()
                        .filter(|address| address.header.index == index)
                        .filter_map(address_ip)
                        .collect(),
                })
            })
            .collect()
    }

    /// `IFA_LOCAL` when present (point-to-point peers put the remote end in
    /// `IFA_ADDRESS`), otherwise `IFA_ADDRESS`
    fn address_ip(message: &AddressMessage) -> Option<IpAddr> {
        let local = message.nlas.iter().find_map(|nla| match nla {
            AddressNla::Local(bytes) => Some(bytes),
            _ => None,
        });
        let address = message.nlas.iter().find_map(|nla| match nla {
            AddressNla::Address(bytes) => Some(bytes),
            _ => None,
        });
        bytes_to_ip(local.or(address)?)
    }

    fn bytes_to_ip(bytes: &[u8]) -> Option<IpAddr> {
        if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
            return Some(IpAddr::V4(Ipv4Addr::from(octets)));
        }
        <[u8; 16]>::try_from(bytes)
            .ok()
            .map(|octets| IpAddr::V6(Ipv6Addr::from(octets)))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_system_inventory_lists_loopback() {
        let interfaces = SystemInterfaces::new().interfaces().unwrap();
        assert!(interfaces.iter().any(|i| i
            .addresses
            .iter()
            .any(|a| a.is_loopback())));
    }

    #[test]
    #[cfg(not(target_os = "linux"))]
    fn test_system_inventory_unsupported() {
        assert!(SystemInterfaces::new().interfaces().is_err());
    }
}
