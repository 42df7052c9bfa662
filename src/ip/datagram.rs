use crate::ip::ip_header::Ipv4Header;
use crate::net::errors::HeaderError;

/// An IPv4 datagram: header plus opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl Ipv4Datagram {
    pub fn new(header: Ipv4Header, payload: Vec<u8>) -> Self {
        Ipv4Datagram { header, payload }
    }

    /// Serialize the whole datagram into a fresh byte vector
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Ipv4Header::LENGTH + self.payload.len()];
        // The buffer is sized for the header, so this cannot fail
        let n = self.header.serialize(&mut buf).unwrap_or(Ipv4Header::LENGTH);
        buf[n..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a datagram, verifying the header checksum and length fields
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        let header = Ipv4Header::parse(buf)?;

        let total_len = header.total_len as usize;
        if total_len < Ipv4Header::LENGTH || buf.len() < total_len {
            return Err(HeaderError::Malformed("IPv4 total length".to_string()));
        }

        Ok(Ipv4Datagram {
            header,
            payload: buf[Ipv4Header::LENGTH..total_len].to_vec(),
        })
    }
}

// -- Unit tests --
