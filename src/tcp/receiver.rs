use crate::tcp::byte_stream::ByteStream;
use crate::tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::reassembler::Reassembler;
use crate::tcp::wrap32::Wrap32;

/// The receiving side of a TCP connection.
///
/// Translates wire sequence numbers into stream indices and feeds payloads to
/// the reassembler; reports the ackno and window back to the peer.
#[derive(Debug)]
pub struct TcpReceiver {
    reassembler: Reassembler,
    isn: Option<Wrap32>, // Set once the first SYN arrives
}

impl TcpReceiver {
    pub fn new(reassembler: Reassembler) -> Self {
        TcpReceiver {
            reassembler,
            isn: None,
        }
    }

    /// Process a segment from the peer
    pub fn receive(&mut self, message: TcpSenderMessage) {
        // Next expected absolute seqno; the SYN occupies absolute 0
        let checkpoint = self.reassembler.output().bytes_pushed() + self.isn.is_some() as u64;

        if message.rst {
            self.reassembler.output_mut().set_error();
            return;
        }

        // A bare retransmission of the ISN carries nothing new once the
        // stream is underway
        if checkpoint > 0 && checkpoint <= u32::MAX as u64 && Some(message.seqno) == self.isn {
            return;
        }

        let isn = match self.isn {
            Some(isn) => isn,
            None => {
                if !message.syn {
                    return; // Nothing to anchor sequence numbers to yet
                }
                self.isn = Some(message.seqno);
                message.seqno
            }
        };

        let abs_seqno = message.seqno.unwrap(isn, checkpoint);
        // Payload index: absolute seqno 0 is the SYN itself
        let stream_index = if abs_seqno == 0 { 0 } else { abs_seqno - 1 };
        self.reassembler
            .insert(stream_index, &message.payload, message.fin);
    }

    /// The acknowledgment to send back to the peer
    pub fn send(&self) -> TcpReceiverMessage {
        let capacity = self.reassembler.output().available_capacity();
        let window_size = capacity.min(u16::MAX as u64) as u16;

        let ackno = self.isn.map(|isn| {
            // One seqno for the SYN, and one more for the FIN once the
            // stream has closed
            let acked = self.reassembler.output().bytes_pushed()
                + 1
                + self.reassembler.output().is_closed() as u64;
            Wrap32::wrap(acked, isn)
        });

        TcpReceiverMessage {
            ackno,
            window_size,
            rst: self.reassembler.output().has_error(),
        }
    }

    /// The reassembler feeding the inbound stream
    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// The assembled inbound stream
    pub fn stream(&self) -> &ByteStream {
        self.reassembler.output()
    }

    pub fn stream_mut(&mut self) -> &mut ByteStream {
        self.reassembler.output_mut()
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::byte_stream::ByteStream;

    fn create_receiver(capacity: u64) -> TcpReceiver {
        TcpReceiver::new(Reassembler::new(ByteStream::new(capacity)))
    }

    fn segment(seqno: u32, syn: bool, payload: &[u8], fin: bool) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::new(seqno),
            syn,
            payload: payload.to_vec(),
            fin,
            rst: false,
        }
    }

    #[test]
    fn test_no_ackno_before_syn() {
        let rx = create_receiver(4);
        let msg = rx.send();
        assert_eq!(msg.ackno, None);
        assert_eq!(msg.window_size, 4);
        assert!(!msg.rst);
    }

    #[test]
    fn test_data_before_syn_is_dropped() {
        let mut rx = create_receiver(4);
        rx.receive(segment(1000, false, b"ab", false));
        assert_eq!(rx.stream().bytes_pushed(), 0);
        assert_eq!(rx.send().ackno, None);
    }

    #[test]
    fn test_syn_with_data() {
        let mut rx = create_receiver(4);
        rx.receive(segment(1000, true, b"ab", false));

        assert_eq!(rx.stream().bytes_pushed(), 2);
        assert_eq!(rx.stream().peek(), b"ab");

        let msg = rx.send();
        assert_eq!(msg.ackno, Some(Wrap32::new(1003)));
        assert_eq!(msg.window_size, 2);
    }

    #[test]
    fn test_bare_syn_acks_one() {
        let mut rx = create_receiver(4);
        rx.receive(segment(7, true, b"", false));
        assert_eq!(rx.send().ackno, Some(Wrap32::new(8)));
    }

    #[test]
    fn test_out_of_order_then_fill() {
        let mut rx = create_receiver(16);
        rx.receive(segment(5, true, b"", false));

        // Payload "cd" sits at stream index 2, waiting for "ab"
        rx.receive(segment(8, false, b"cd", false));
        assert_eq!(rx.stream().bytes_pushed(), 0);
        assert_eq!(rx.reassembler().bytes_pending(), 2);
        assert_eq!(rx.send().ackno, Some(Wrap32::new(6)));

        rx.receive(segment(6, false, b"ab", false));
        assert_eq!(rx.stream().bytes_pushed(), 4);
        assert_eq!(rx.send().ackno, Some(Wrap32::new(10)));
    }

    #[test]
    fn test_fin_credits_one_seqno() {
        let mut rx = create_receiver(16);
        rx.receive(segment(0, true, b"abcd", true));

        assert!(rx.stream().is_closed());
        // 1 (SYN) + 4 (payload) + 1 (FIN)
        assert_eq!(rx.send().ackno, Some(Wrap32::new(6)));
    }

    #[test]
    fn test_fin_held_until_gap_fills() {
        let mut rx = create_receiver(16);
        rx.receive(segment(0, true, b"", false));
        rx.receive(segment(3, false, b"cd", true));

        assert!(!rx.stream().is_closed());
        assert_eq!(rx.send().ackno, Some(Wrap32::new(1)));

        rx.receive(segment(1, false, b"ab", false));
        assert!(rx.stream().is_closed());
        assert_eq!(rx.send().ackno, Some(Wrap32::new(6)));
    }

    #[test]
    fn test_rst_sets_stream_error() {
        let mut rx = create_receiver(16);
        rx.receive(segment(0, true, b"ab", false));

        let mut rst = segment(3, false, b"", false);
        rst.rst = true;
        rx.receive(rst);

        assert!(rx.stream().has_error());
        assert!(rx.send().rst);
    }

    #[test]
    fn test_window_size_saturates() {
        let rx = create_receiver(1 << 20);
        assert_eq!(rx.send().window_size, u16::MAX);
    }

    #[test]
    fn test_window_shrinks_with_buffered_bytes() {
        let mut rx = create_receiver(10);
        rx.receive(segment(0, true, b"abcde", false));
        assert_eq!(rx.send().window_size, 5);

        rx.stream_mut().pop(3);
        assert_eq!(rx.send().window_size, 8);
    }

    #[test]
    fn test_retransmitted_isn_is_ignored() {
        let mut rx = create_receiver(16);
        rx.receive(segment(100, true, b"ab", false));
        assert_eq!(rx.send().ackno, Some(Wrap32::new(103)));

        // A duplicate handshake segment must not disturb the stream
        rx.receive(segment(100, true, b"ab", false));
        assert_eq!(rx.stream().bytes_pushed(), 2);
        assert_eq!(rx.send().ackno, Some(Wrap32::new(103)));
    }

    #[test]
    fn test_seqno_wraps_around_zero() {
        let mut rx = create_receiver(16);
        rx.receive(segment(u32::MAX, true, b"", false));
        rx.receive(segment(0, false, b"ab", false));

        assert_eq!(rx.stream().bytes_pushed(), 2);
        assert_eq!(rx.send().ackno, Some(Wrap32::new(2)));
    }
}
