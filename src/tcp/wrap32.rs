use std::ops::Add;

/// A 32-bit sequence number, wrapping relative to an initial sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    /// The raw 32-bit value
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Wrap an absolute `seq_no` given a `zero_point` (the ISN)
    pub fn wrap(n: u64, zero_point: Wrap32) -> Self {
        Wrap32::new(zero_point.value.wrapping_add(n as u32))
    }

    /// Unwrap to the absolute `seq_no` closest to `checkpoint`.
    ///
    /// Candidates differ by multiples of 2^32; ties break toward the smaller
    /// value, and a candidate below zero is replaced by the next one up.
    pub fn unwrap(&self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        const WRAP_SIZE: u64 = 1 << 32;

        let ckpt_mod = Wrap32::wrap(checkpoint, zero_point).value;
        let distance = self.value.wrapping_sub(ckpt_mod) as u64;
        let candidate = checkpoint + distance;

        if distance <= WRAP_SIZE / 2 || candidate < WRAP_SIZE {
            candidate
        } else {
            candidate - WRAP_SIZE
        }
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(rhs))
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    // -- Test wrapping --

    #[test]
    fn test_wrap_zero_offset() {
        let seq_no = 3 * (1u64 << 32);
        let isn = Wrap32::new(0);
        assert_eq!(Wrap32::wrap(seq_no, isn), Wrap32::new(0));
    }

    #[test]
    fn test_wrap_positive_offset() {
        let seq_no = 3 * (1u64 << 32) + 17;
        let isn = Wrap32::new(15);
        assert_eq!(Wrap32::wrap(seq_no, isn), Wrap32::new(32));
    }

    #[test]
    fn test_wrap_negative_offset() {
        let seq_no = 7 * (1u64 << 32) - 2;
        let isn = Wrap32::new(15);
        assert_eq!(Wrap32::wrap(seq_no, isn), Wrap32::new(13));
    }

    // -- Test unwrapping --

    #[test]
    fn test_unwrap_first_sequence_after_isn_zero() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), 0);
        assert_eq!(unwrapped, 1u64)
    }

    #[test]
    fn test_unwrap_first_sequence_after_first_wraparound() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), u32::MAX as u64);
        assert_eq!(unwrapped, (1u64 << 32) + 1)
    }

    #[test]
    fn test_unwrap_last_sequence_before_third_wraparound() {
        let unwrapped = Wrap32::new(u32::MAX - 1).unwrap(Wrap32::new(0), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) - 2);
    }

    #[test]
    fn test_unwrap_tenth_before_third_wraparound() {
        let unwrapped = Wrap32::new(u32::MAX - 10).unwrap(Wrap32::new(0), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) - 11);
    }

    #[test]
    fn test_unwrap_with_nonzero_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(10), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) - 11);
    }

    #[test]
    fn test_unwrap_max_wrapped_value_with_zero_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(0), 0);
        assert_eq!(unwrapped, u32::MAX as u64);
    }

    #[test]
    fn test_unwrap_value_equals_isn_returns_zero() {
        let unwrapped = Wrap32::new(16).unwrap(Wrap32::new(16), 0);
        assert_eq!(unwrapped, 0u64);
    }

    #[test]
    fn test_unwrap_max_value_with_nonzero_isn() {
        let unwrapped = Wrap32::new(15).unwrap(Wrap32::new(16), 0);
        assert_eq!(unwrapped, u32::MAX as u64);
    }

    #[test]
    fn test_unwrap_zero_value_with_large_isn() {
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(i32::MAX as u32), 0);
        assert_eq!(unwrapped, (i32::MAX as u64) + 2);
    }

    #[test]
    fn test_unwrap_max_value_with_max_isn_returns_half_wrap() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(i32::MAX as u32), 0);
        assert_eq!(unwrapped, 1u64 << 31);
    }

    #[test]
    fn test_unwrap_max_value_with_half_wrap_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(1 << 31), 0);
        assert_eq!(unwrapped, (u32::MAX as u64) >> 1);
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let isn = Wrap32::new(1 << 31);
        let n = 3 * (1u64 << 32) + 17;
        let checkpoint = 3 * (1u64 << 32);

        let wrapped = Wrap32::wrap(n, isn);
        assert_eq!(wrapped, Wrap32::new((1 << 31) + 17));
        assert_eq!(wrapped.unwrap(isn, checkpoint), n);
    }

    #[test]
    fn test_round_trip_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let isn = Wrap32::new(rng.gen());
            let n: u64 = rng.gen_range(0..(1u64 << 63));
            // Checkpoint within half the sequence space of n
            let offset = rng.gen_range(0..(1u64 << 31));
            let checkpoint = if rng.gen() { n.saturating_sub(offset) } else { n + offset };

            assert_eq!(Wrap32::wrap(n, isn).unwrap(isn, checkpoint), n);
        }
    }

    // -- Test `+` operator overload --

    #[test]
    fn test_add() {
        assert_eq!(Wrap32::new(1) + 2, Wrap32::new(3));
    }

    #[test]
    fn test_add_overflow() {
        assert_eq!(Wrap32::new(u32::MAX) + 1, Wrap32::new(0));
    }
}
