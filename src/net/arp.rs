use crate::net::errors::HeaderError;
use crate::net::ethernet::EthernetAddress;
use std::net::Ipv4Addr;

/// An ARP message for Ethernet/IPv4 (28 bytes on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: u16,
    pub sender_ethernet_address: EthernetAddress,
    pub sender_ip_address: u32,
    pub target_ethernet_address: EthernetAddress,
    pub target_ip_address: u32,
}

impl ArpMessage {
    pub const LENGTH: usize = 28;
    pub const OPCODE_REQUEST: u16 = 1;
    pub const OPCODE_REPLY: u16 = 2;

    const TYPE_ETHERNET: u16 = 1;
    const TYPE_IPV4: u16 = 0x0800;

    /// A broadcast request asking who holds `target_ip`
    pub fn request(
        sender_ethernet_address: EthernetAddress,
        sender_ip: Ipv4Addr,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpMessage {
            opcode: Self::OPCODE_REQUEST,
            sender_ethernet_address,
            sender_ip_address: u32::from(sender_ip),
            target_ethernet_address: EthernetAddress([0; 6]), // Requests carry a blank target
            target_ip_address: u32::from(target_ip),
        }
    }

    /// A reply telling `target` our own address pair
    pub fn reply(
        sender_ethernet_address: EthernetAddress,
        sender_ip: Ipv4Addr,
        target_ethernet_address: EthernetAddress,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpMessage {
            opcode: Self::OPCODE_REPLY,
            sender_ethernet_address,
            sender_ip_address: u32::from(sender_ip),
            target_ethernet_address,
            target_ip_address: u32::from(target_ip),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::LENGTH];
        buf[0..2].copy_from_slice(&Self::TYPE_ETHERNET.to_be_bytes());
        buf[2..4].copy_from_slice(&Self::TYPE_IPV4.to_be_bytes());
        buf[4] = 6; // Hardware address length
        buf[5] = 4; // Protocol address length
        buf[6..8].copy_from_slice(&self.opcode.to_be_bytes());
        buf[8..14].copy_from_slice(&self.sender_ethernet_address.0);
        buf[14..18].copy_from_slice(&self.sender_ip_address.to_be_bytes());
        buf[18..24].copy_from_slice(&self.target_ethernet_address.0);
        buf[24..28].copy_from_slice(&self.target_ip_address.to_be_bytes());
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < Self::LENGTH {
            return Err(HeaderError::BufferTooSmall {
                expected: Self::LENGTH,
                found: buf.len(),
            });
        }

        let hardware_type = u16::from_be_bytes([buf[0], buf[1]]);
        let protocol_type = u16::from_be_bytes([buf[2], buf[3]]);
        if hardware_type != Self::TYPE_ETHERNET || protocol_type != Self::TYPE_IPV4 || buf[4] != 6 || buf[5] != 4 {
            return Err(HeaderError::Unsupported("ARP hardware/protocol".to_string()));
        }

        let opcode = u16::from_be_bytes([buf[6], buf[7]]);
        if opcode != Self::OPCODE_REQUEST && opcode != Self::OPCODE_REPLY {
            return Err(HeaderError::Unsupported("ARP opcode".to_string()));
        }

        let mut sender_mac = [0u8; 6];
        let mut target_mac = [0u8; 6];
        sender_mac.copy_from_slice(&buf[8..14]);
        target_mac.copy_from_slice(&buf[18..24]);

        Ok(ArpMessage {
            opcode,
            sender_ethernet_address: EthernetAddress(sender_mac),
            sender_ip_address: u32::from_be_bytes([buf[14], buf[15], buf[16], buf[17]]),
            target_ethernet_address: EthernetAddress(target_mac),
            target_ip_address: u32::from_be_bytes([buf[24], buf[25], buf[26], buf[27]]),
        })
    }
}

// -- Unit tests --
