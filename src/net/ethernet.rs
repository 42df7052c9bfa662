use crate::net::errors::HeaderError;
use std::fmt;

/// A 48-bit Ethernet (hardware) address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthernetAddress(pub [u8; 6]);

impl EthernetAddress {
    pub const BROADCAST: EthernetAddress = EthernetAddress([0xff; 6]);

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for EthernetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

/// The 14-byte Ethernet frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: EthernetAddress,
    pub src: EthernetAddress,
    pub ethertype: u16,
}

impl EthernetHeader {
    pub const LENGTH: usize = 14;
    pub const TYPE_IPV4: u16 = 0x0800;
    pub const TYPE_ARP: u16 = 0x0806;

    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, HeaderError> {
        if buf.len() < Self::LENGTH {
            return Err(HeaderError::BufferTooSmall {
                expected: Self::LENGTH,
                found: buf.len(),
            });
        }

        buf[0..6].copy_from_slice(&self.dst.0);
        buf[6..12].copy_from_slice(&self.src.0);
        buf[12..14].copy_from_slice(&self.ethertype.to_be_bytes());
        Ok(Self::LENGTH)
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < Self::LENGTH {
            return Err(HeaderError::BufferTooSmall {
                expected: Self::LENGTH,
                found: buf.len(),
            });
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&buf[0..6]);
        src.copy_from_slice(&buf[6..12]);
        let ethertype = u16::from_be_bytes([buf[12], buf[13]]);

        Ok(EthernetHeader {
            dst: EthernetAddress(dst),
            src: EthernetAddress(src),
            ethertype,
        })
    }
}

/// An Ethernet frame: header plus payload bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub header: EthernetHeader,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; EthernetHeader::LENGTH + self.payload.len()];
        // The buffer is sized for the header, so this cannot fail
        let n = self.header.serialize(&mut buf).unwrap_or(EthernetHeader::LENGTH);
        buf[n..].copy_from_slice(&self.payload);
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        let header = EthernetHeader::parse(buf)?;
        Ok(EthernetFrame {
            header,
            payload: buf[EthernetHeader::LENGTH..].to_vec(),
        })
    }
}

// -- Unit tests --
