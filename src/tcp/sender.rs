use crate::tcp::byte_stream::ByteStream;
use crate::tcp::config::MAX_PAYLOAD_SIZE;
use crate::tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::wrap32::Wrap32;
use std::collections::VecDeque;

/// Times out the oldest outstanding segment.
///
/// Elapsed time accumulates only while the timer is active; the driver
/// supplies deltas through `tick`.
#[derive(Debug)]
pub struct RetransmissionTimer {
    rto: u64,
    elapsed: u64,
    active: bool,
}

impl RetransmissionTimer {
    pub fn new(initial_rto_ms: u64) -> Self {
        RetransmissionTimer {
            rto: initial_rto_ms,
            elapsed: 0,
            active: false,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_expired(&self) -> bool {
        self.active && self.elapsed >= self.rto
    }

    /// Double the RTO (exponential backoff)
    pub fn backoff(&mut self) {
        self.rto <<= 1;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0;
    }

    pub fn tick(&mut self, ms_since_last_tick: u64) -> &mut Self {
        if self.active {
            self.elapsed += ms_since_last_tick;
        }
        self
    }
}

/// The sending side of a TCP connection.
///
/// Drains its input stream into segments no larger than the peer's window or
/// MAX_PAYLOAD_SIZE, keeps them until acknowledged, and retransmits the
/// oldest on timeout with exponential backoff.
#[derive(Debug)]
pub struct TcpSender {
    input: ByteStream,
    isn: Wrap32,
    initial_rto_ms: u64,

    window_size: u16,  // Peer's advertised window; assume 1 before the first ack
    next_seqno: u64,   // Next absolute seqno to send
    acked_seqno: u64,  // Highest fully acknowledged absolute seqno
    in_flight: u64,    // Sequence numbers sent but not yet acknowledged

    syn_sent: bool,
    fin_pending: bool, // Input finished; a FIN still has to go out
    fin_sent: bool,

    outstanding: VecDeque<TcpSenderMessage>,
    timer: RetransmissionTimer,
    retransmission_cnt: u64,
}

impl TcpSender {
    pub fn new(input: ByteStream, isn: Wrap32, initial_rto_ms: u64) -> Self {
        TcpSender {
            input,
            isn,
            initial_rto_ms,
            window_size: 1,
            next_seqno: 0,
            acked_seqno: 0,
            in_flight: 0,
            syn_sent: false,
            fin_pending: false,
            fin_sent: false,
            outstanding: VecDeque::new(),
            timer: RetransmissionTimer::new(initial_rto_ms),
            retransmission_cnt: 0,
        }
    }

    /// Fill the window with segments drained from the input stream
    pub fn push(&mut self, mut transmit: impl FnMut(&TcpSenderMessage)) {
        self.fin_pending |= self.input.is_finished();

        // A zero window is probed with a single sequence number
        let effective_window = if self.window_size == 0 { 1 } else { self.window_size as u64 };

        while !self.fin_sent && self.in_flight < effective_window {
            let syn = !self.syn_sent;
            if !syn && self.input.bytes_buffered() == 0 && !self.fin_pending {
                break;
            }

            let limit = MAX_PAYLOAD_SIZE.min(effective_window - self.in_flight - syn as u64);
            let mut payload = Vec::new();
            while (payload.len() as u64) < limit && self.input.bytes_buffered() > 0 {
                let take = ((limit - payload.len() as u64) as usize).min(self.input.peek().len());
                payload.extend_from_slice(&self.input.peek()[..take]);
                self.input.pop(take as u64);
                self.fin_pending |= self.input.is_finished();
            }

            let mut msg = self.make_message(self.next_seqno, payload, syn, self.fin_pending);

            // The FIN rides along only if it fits in what is left of the window
            if msg.fin && self.in_flight + msg.sequence_length() > effective_window {
                msg.fin = false;
            }
            if msg.fin {
                self.fin_sent = true;
            }

            let length = msg.sequence_length();
            if length == 0 {
                break;
            }

            self.in_flight += length;
            self.next_seqno += length;
            self.syn_sent = true;
            transmit(&msg);
            self.outstanding.push_back(msg);
            if !self.timer.is_active() {
                self.timer.activate();
            }
        }
    }

    /// Process an acknowledgment from the peer
    pub fn receive(&mut self, msg: &TcpReceiverMessage) {
        self.window_size = msg.window_size;

        let Some(ackno) = msg.ackno else {
            // An ack-less message with a closed window means the peer is gone
            if msg.window_size == 0 {
                self.input.set_error();
            }
            return;
        };

        let ack_abs = ackno.unwrap(self.isn, self.next_seqno);
        if ack_abs > self.next_seqno {
            return; // Acks data we never sent
        }

        let mut acknowledged = false;
        while let Some(front) = self.outstanding.front() {
            let end = self.acked_seqno + front.sequence_length();
            if ack_abs < end {
                break; // Only fully covered segments leave the queue
            }
            self.in_flight -= front.sequence_length();
            self.acked_seqno = end;
            self.outstanding.pop_front();
            acknowledged = true;
        }

        if acknowledged {
            self.timer = RetransmissionTimer::new(self.initial_rto_ms);
            if !self.outstanding.is_empty() {
                self.timer.activate();
            }
            self.retransmission_cnt = 0;
        }
    }

    /// Advance time; retransmit the oldest outstanding segment on expiry
    pub fn tick(&mut self, ms_since_last_tick: u64, mut transmit: impl FnMut(&TcpSenderMessage)) {
        if self.timer.tick(ms_since_last_tick).is_expired() {
            let Some(front) = self.outstanding.front() else {
                return;
            };
            transmit(front);
            self.retransmission_cnt += 1;
            if self.window_size > 0 {
                // A probe against a closed window is not a congestion signal
                self.timer.backoff();
            }
            self.timer.reset();
        }
    }

    /// A zero-length segment carrying the current seqno (and RST on error)
    pub fn make_empty_message(&self) -> TcpSenderMessage {
        self.make_message(self.next_seqno, Vec::new(), false, false)
    }

    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.in_flight
    }

    pub fn consecutive_retransmissions(&self) -> u64 {
        self.retransmission_cnt
    }

    /// The outbound stream the application writes into
    pub fn stream(&self) -> &ByteStream {
        &self.input
    }

    pub fn stream_mut(&mut self) -> &mut ByteStream {
        &mut self.input
    }

    fn make_message(&self, seqno: u64, payload: Vec<u8>, syn: bool, fin: bool) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::wrap(seqno, self.isn),
            syn,
            payload,
            fin,
            rst: self.input.has_error(),
        }
    }
}

// -- Unit tests --
