use crate::tcp::byte_stream::ByteStream;
use std::collections::BTreeMap;

/// An out-of-order segment buffered for reassembly
#[derive(Debug)]
struct Segment {
    data: Vec<u8>,
    is_last: bool,
}

/// Reassembles indexed substrings into a contiguous byte stream.
///
/// Substrings may arrive out of order and may overlap; the contiguous prefix
/// is written straight to the output stream, everything else waits in a gap
/// buffer keyed by start index. Only indices inside the window
/// `[next_index, next_index + available_capacity)` are accepted.
#[derive(Debug)]
pub struct Reassembler {
    buffered: BTreeMap<u64, Segment>, // Out-of-order segments. key = start index
    output: ByteStream,               // The assembled ByteStream, ready to be read
    pending: u64,                     // Total bytes sitting in the gap buffer
}

impl Reassembler {
    /// New `Reassembler` writing into the provided `ByteStream`
    pub fn new(output: ByteStream) -> Self {
        Reassembler {
            buffered: BTreeMap::new(),
            output,
            pending: 0,
        }
    }

    /// Insert a substring starting at absolute stream index `first_index`
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool) {
        let capacity_left = self.output.available_capacity();
        let cap_index = self.next_index() + capacity_left;
        if self.output.is_closed() || capacity_left == 0 || first_index >= cap_index {
            return;
        }

        let mut data = data.to_vec();
        let mut is_last = is_last;
        if first_index + data.len() as u64 > cap_index {
            // The tail falls outside the window, so the final byte is gone
            is_last = false;
            data.truncate((cap_index - first_index) as usize);
        }

        if first_index > self.next_index() {
            self.cache_bytes(first_index, data, is_last);
        } else {
            self.push_bytes(first_index, data, is_last);
        }
        self.flush_buffer();
    }

    /// The total number of bytes waiting in the gap buffer
    pub fn bytes_pending(&self) -> u64 {
        self.pending
    }

    /// The underlying output `ByteStream`
    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }

    /// The next stream index expected by the output
    pub fn next_index(&self) -> u64 {
        self.output.bytes_pushed()
    }

    /// Write bytes starting at or before the next expected index
    fn push_bytes(&mut self, first_index: u64, mut data: Vec<u8>, is_last: bool) {
        let next = self.next_index();
        if first_index < next {
            let overlap = ((next - first_index) as usize).min(data.len());
            data.drain(..overlap);
        }
        self.output.push(&data);

        if is_last {
            self.output.close();
            self.buffered.clear();
            self.pending = 0;
        }
    }

    /// Merge bytes beyond the next expected index into the gap buffer
    fn cache_bytes(&mut self, first_index: u64, data: Vec<u8>, is_last: bool) {
        let mut start = first_index;
        let mut merged = data;
        let mut last = is_last;
        let end = start + merged.len() as u64;

        // Collect every existing segment that overlaps or touches
        // [start, end]; adjacent ranges merge too, keeping the buffer
        // pairwise disjoint and non-adjacent.
        let overlapping: Vec<u64> = self
            .buffered
            .range(..=end)
            .filter(|&(&idx, seg)| idx + seg.data.len() as u64 >= start)
            .map(|(&idx, _)| idx)
            .collect();

        for idx in overlapping {
            let Some(seg) = self.buffered.remove(&idx) else {
                continue;
            };
            self.pending -= seg.data.len() as u64;
            last |= seg.is_last;

            let seg_end = idx + seg.data.len() as u64;
            let new_start = start.min(idx);
            let new_end = (start + merged.len() as u64).max(seg_end);

            let mut combined = vec![0u8; (new_end - new_start) as usize];
            combined[(idx - new_start) as usize..][..seg.data.len()].copy_from_slice(&seg.data);
            combined[(start - new_start) as usize..][..merged.len()].copy_from_slice(&merged);

            start = new_start;
            merged = combined;
        }

        self.pending += merged.len() as u64;
        self.buffered.insert(
            start,
            Segment {
                data: merged,
                is_last: last,
            },
        );
    }

    /// Drain the front of the gap buffer while it lines up with the stream
    fn flush_buffer(&mut self) {
        loop {
            let next = self.next_index();
            let Some(entry) = self.buffered.first_entry() else {
                break;
            };
            if *entry.key() > next {
                break;
            }
            let (idx, seg) = entry.remove_entry();
            self.pending -= seg.data.len() as u64;
            self.push_bytes(idx, seg.data, seg.is_last);
        }
    }
}

// -- Unit tests --
