use crate::tcp::wrap32::Wrap32;

/// The segment-level message a TCP sender puts on the wire: sequence number,
/// SYN/FIN/RST flags and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSenderMessage {
    pub seqno: Wrap32,
    pub syn: bool,
    pub payload: Vec<u8>,
    pub fin: bool,
    pub rst: bool,
}

impl TcpSenderMessage {
    /// How many sequence numbers this segment occupies (SYN and FIN each
    /// consume one)
    pub fn sequence_length(&self) -> u64 {
        self.syn as u64 + self.payload.len() as u64 + self.fin as u64
    }
}

/// The acknowledgment a TCP receiver sends back: ackno (absent before the
/// handshake), window size and RST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpReceiverMessage {
    pub ackno: Option<Wrap32>,
    pub window_size: u16,
    pub rst: bool,
}

// -- Unit tests --
