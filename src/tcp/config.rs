use crate::tcp::wrap32::Wrap32;

/// Largest payload a single segment may carry, in bytes
pub const MAX_PAYLOAD_SIZE: u64 = 1000;

/// Configuration for TCP endpoints
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Initial retransmission timeout, in milliseconds
    pub rt_timeout: u64,
    /// Receive-side stream capacity, in bytes
    pub recv_capacity: u64,
    /// Send-side stream capacity, in bytes
    pub send_capacity: u64,
    /// Retransmission count at which the connection gives up
    pub max_retx_attempts: u64,
    /// Fixed ISN, mostly for tests; a fresh random one is drawn when unset
    pub fixed_isn: Option<Wrap32>,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            rt_timeout: 1000,
            recv_capacity: 64000,
            send_capacity: 64000,
            max_retx_attempts: 8,
            fixed_isn: None,
        }
    }
}

impl TcpConfig {
    /// The initial sequence number for a new connection
    pub fn isn(&self) -> Wrap32 {
        self.fixed_isn.unwrap_or_else(|| Wrap32::new(rand::random()))
    }
}

// -- Unit tests --
