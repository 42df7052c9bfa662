use crate::ip::datagram::Ipv4Datagram;
use crate::net::arp::ArpMessage;
use crate::net::ethernet::{EthernetAddress, EthernetFrame, EthernetHeader};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::rc::Rc;

/// The link sink an interface transmits frames into. Shared by every
/// interface on the same link.
pub trait OutputPort {
    fn transmit(&mut self, frame: &EthernetFrame);
}

/// A learned IP-to-Ethernet mapping and its age
#[derive(Debug)]
struct AddressMapping {
    ethernet_address: EthernetAddress,
    age_ms: u64,
}

/// A network interface connecting an IP datagram queue to an Ethernet link.
///
/// Outbound datagrams whose next hop has no known Ethernet address wait while
/// a broadcast ARP request resolves it; inbound frames are filtered by
/// destination, parsed, and queued (IPv4) or answered (ARP).
pub struct NetworkInterface {
    name: String,
    port: Rc<RefCell<dyn OutputPort>>,
    ethernet_address: EthernetAddress,
    ip_address: Ipv4Addr,

    datagrams_received: VecDeque<Ipv4Datagram>,
    mapping_table: HashMap<u32, AddressMapping>,
    arp_recorder: HashMap<u32, u64>, // In-flight ARP requests and their ages
    dgrams_waiting: HashMap<u32, VecDeque<Ipv4Datagram>>,
}

impl NetworkInterface {
    /// How long a learned mapping stays valid
    const MAPPING_TTL_MS: u64 = 30_000;
    /// Minimum interval between ARP requests for the same address
    const ARP_REISSUE_MS: u64 = 5_000;

    pub fn new(
        name: &str,
        port: Rc<RefCell<dyn OutputPort>>,
        ethernet_address: EthernetAddress,
        ip_address: Ipv4Addr,
    ) -> Self {
        log::debug!(
            "network interface {} has ethernet address {} and ip address {}",
            name,
            ethernet_address,
            ip_address
        );
        NetworkInterface {
            name: name.to_string(),
            port,
            ethernet_address,
            ip_address,
            datagrams_received: VecDeque::new(),
            mapping_table: HashMap::new(),
            arp_recorder: HashMap::new(),
            dgrams_waiting: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ethernet_address(&self) -> EthernetAddress {
        self.ethernet_address
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.ip_address
    }

    /// Datagrams received and waiting for the next `Router::route` pass
    pub fn datagrams_received(&mut self) -> &mut VecDeque<Ipv4Datagram> {
        &mut self.datagrams_received
    }

    /// Send `dgram` toward `next_hop`, resolving its Ethernet address first
    /// if necessary
    pub fn send_datagram(&mut self, dgram: Ipv4Datagram, next_hop: Ipv4Addr) {
        let target_ip = u32::from(next_hop);

        let cached = self
            .mapping_table
            .get(&target_ip)
            .map(|mapping| mapping.ethernet_address);

        match cached {
            Some(dst) => {
                self.transmit(self.make_frame(
                    EthernetHeader::TYPE_IPV4,
                    dgram.serialize(),
                    Some(dst),
                ));
            }
            None => {
                self.dgrams_waiting
                    .entry(target_ip)
                    .or_default()
                    .push_back(dgram);

                // Ask at most once per reissue interval
                if !self.arp_recorder.contains_key(&target_ip) {
                    let request =
                        ArpMessage::request(self.ethernet_address, self.ip_address, next_hop);
                    self.transmit(self.make_frame(
                        EthernetHeader::TYPE_ARP,
                        request.serialize(),
                        None,
                    ));
                    self.arp_recorder.insert(target_ip, 0);
                }
            }
        }
    }

    /// Process a frame arriving from the link
    pub fn recv_frame(&mut self, frame: &EthernetFrame) {
        if !frame.header.dst.is_broadcast() && frame.header.dst != self.ethernet_address {
            return; // Not for us
        }

        match frame.header.ethertype {
            EthernetHeader::TYPE_IPV4 => {
                let Ok(dgram) = Ipv4Datagram::parse(&frame.payload) else {
                    return;
                };
                self.datagrams_received.push_back(dgram);
            }
            EthernetHeader::TYPE_ARP => {
                let Ok(message) = ArpMessage::parse(&frame.payload) else {
                    return;
                };
                self.handle_arp(message);
            }
            _ => {}
        }
    }

    /// Age mappings and in-flight requests; expire the stale ones
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        self.mapping_table.retain(|_, mapping| {
            mapping.age_ms += ms_since_last_tick;
            mapping.age_ms <= Self::MAPPING_TTL_MS
        });
        self.arp_recorder.retain(|_, age_ms| {
            *age_ms += ms_since_last_tick;
            *age_ms <= Self::ARP_REISSUE_MS
        });
    }

    fn handle_arp(&mut self, message: ArpMessage) {
        // Every ARP heard teaches us the sender's mapping
        log::trace!(
            "{}: learned {} => {}",
            self.name,
            Ipv4Addr::from(message.sender_ip_address),
            message.sender_ethernet_address
        );
        self.mapping_table.insert(
            message.sender_ip_address,
            AddressMapping {
                ethernet_address: message.sender_ethernet_address,
                age_ms: 0,
            },
        );

        match message.opcode {
            ArpMessage::OPCODE_REQUEST => {
                if message.target_ip_address == u32::from(self.ip_address) {
                    let reply = ArpMessage::reply(
                        self.ethernet_address,
                        self.ip_address,
                        message.sender_ethernet_address,
                        Ipv4Addr::from(message.sender_ip_address),
                    );
                    self.transmit(self.make_frame(
                        EthernetHeader::TYPE_ARP,
                        reply.serialize(),
                        Some(message.sender_ethernet_address),
                    ));
                }
            }
            ArpMessage::OPCODE_REPLY => {
                // The address resolved; everything that waited on it can go
                if let Some(waiting) = self.dgrams_waiting.remove(&message.sender_ip_address) {
                    for dgram in waiting {
                        self.transmit(self.make_frame(
                            EthernetHeader::TYPE_IPV4,
                            dgram.serialize(),
                            Some(message.sender_ethernet_address),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    fn make_frame(
        &self,
        ethertype: u16,
        payload: Vec<u8>,
        dst: Option<EthernetAddress>,
    ) -> EthernetFrame {
        EthernetFrame {
            header: EthernetHeader {
                dst: dst.unwrap_or(EthernetAddress::BROADCAST),
                src: self.ethernet_address,
                ethertype,
            },
            payload,
        }
    }

    fn transmit(&self, frame: EthernetFrame) {
        self.port.borrow_mut().transmit(&frame);
    }
}

// -- Unit tests --
