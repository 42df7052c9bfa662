use crate::net::interface::NetworkInterface;
use std::net::Ipv4Addr;

/// One routing table entry: a network prefix, the interface to use, and an
/// optional next hop (absent when the destination is directly attached)
#[derive(Debug, Clone)]
struct Route {
    prefix_length: u8,
    mask: u32,
    net_id: u32,
    next_hop: Option<Ipv4Addr>,
    interface_idx: usize,
}

impl Route {
    fn new(
        route_prefix: Ipv4Addr,
        prefix_length: u8,
        next_hop: Option<Ipv4Addr>,
        interface_idx: usize,
    ) -> Self {
        // prefix_length 0 matches everything; 32 requires an exact match
        let mask = (!0u32).checked_shl(32 - prefix_length as u32).unwrap_or(0);
        Route {
            prefix_length,
            mask,
            net_id: u32::from(route_prefix) & mask,
            next_hop,
            interface_idx,
        }
    }

    fn matches(&self, dst: u32) -> bool {
        dst & self.mask == self.net_id
    }
}

/// An IPv4 router: a set of interfaces plus a longest-prefix-match table.
///
/// `route()` drains every interface's inbound queue and forwards each
/// datagram out the interface of its most specific matching route.
pub struct Router {
    interfaces: Vec<NetworkInterface>,
    routing_table: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Router {
            interfaces: Vec::new(),
            routing_table: Vec::new(),
        }
    }

    /// Attach an interface; returns its index for `add_route`
    pub fn add_interface(&mut self, interface: NetworkInterface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    pub fn interface(&mut self, n: usize) -> &mut NetworkInterface {
        &mut self.interfaces[n]
    }

    /// Add a route for `route_prefix/prefix_length` out `interface_idx`
    pub fn add_route(
        &mut self,
        route_prefix: Ipv4Addr,
        prefix_length: u8,
        next_hop: Option<Ipv4Addr>,
        interface_idx: usize,
    ) {
        log::debug!(
            "adding route {}/{} => {} on interface {}",
            route_prefix,
            prefix_length,
            next_hop.map_or("(direct)".to_string(), |hop| hop.to_string()),
            interface_idx
        );
        self.routing_table
            .push(Route::new(route_prefix, prefix_length, next_hop, interface_idx));
    }

    /// Forward every queued inbound datagram that has a route and TTL to spare
    pub fn route(&mut self) {
        for i in 0..self.interfaces.len() {
            while let Some(mut dgram) = self.interfaces[i].datagrams_received().pop_front() {
                if dgram.header.ttl <= 1 {
                    continue; // Expired in transit
                }

                let Some(route) = self.find_route(u32::from(dgram.header.dst_ip)) else {
                    continue; // No matching route
                };

                dgram.header.ttl -= 1;
                dgram.header.compute_checksum();

                let next_hop = route.next_hop.unwrap_or(dgram.header.dst_ip);
                let interface_idx = route.interface_idx;
                self.interfaces[interface_idx].send_datagram(dgram, next_hop);
            }
        }
    }

    /// The most specific route matching `dst`, if any
    fn find_route(&self, dst: u32) -> Option<Route> {
        self.routing_table
            .iter()
            .filter(|route| route.matches(dst))
            .max_by_key(|route| route.prefix_length)
            .cloned()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// -- Unit tests --
