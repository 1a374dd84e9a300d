//! Packet slicing.

use std::ops::Range;

use crate::error::{Result, TransferError};

/// Splits an asset of `len` bytes into MTU-sized data slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packetizer {
    len: usize,
    chunk: usize,
    total: usize,
}

impl Packetizer {
    /// `mtu` must exceed the envelope `overhead`.
    pub fn new(len: usize, mtu: u16, overhead: usize) -> Result<Self> {
        let mtu_len = usize::from(mtu);
        if mtu_len <= overhead {
            return Err(TransferError::InvalidMtu { mtu, overhead });
        }
        let chunk = mtu_len - overhead;
        Ok(Packetizer {
            len,
            chunk,
            total: len.div_ceil(chunk),
        })
    }

    pub fn total_packets(&self) -> usize {
        self.total
    }

    /// Data bytes carried per full packet.
    pub fn chunk_size(&self) -> usize {
        self.chunk
    }

    pub fn total_bytes(&self) -> usize {
        self.len
    }

    /// Byte range of packet `index`, `None` past the end.
    pub fn slice(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.total {
            return None;
        }
        let start = index * self.chunk;
        Some(start..(start + self.chunk).min(self.len))
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.total
    }

    /// Bytes covered by the first `packets` packets.
    pub fn bytes_through(&self, packets: usize) -> usize {
        (packets * self.chunk).min(self.len)
    }

    /// Progress byte carried by packet `index`: 1..=100, reaching 100 on the
    /// last packet.
    pub fn progress_byte(&self, index: usize) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = ((index + 1).min(self.total) * 100) / self.total;
        pct as u8
    }

    /// Iterate over every slice in order.
    pub fn slices(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.total).filter_map(move |i| self.slice(i))
    }
}
