// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{Result, SyncError};

/// A fixed-capacity FIFO of transport bytes.
///
/// Bytes go in at the tail with [ByteRing::write] and come out of the head
/// with the `read_*` family. Multi-byte reads are all-or-nothing: if fewer
/// bytes are buffered than a read needs, it fails without consuming anything,
/// so a decoder can check, wait for the next tick, and try again.
///
/// Both ends of the underlying SPSC queue live in this one struct. The queue
/// is never shared across threads; we use it for its cursor bookkeeping and
/// wrap-around chunk handling.
#[derive(Debug)]
pub struct ByteRing {
    tx: rtrb::Producer<u8>,
    rx: rtrb::Consumer<u8>,
}
impl ByteRing {
    pub fn new_with(capacity: usize) -> Self {
        let (tx, rx) = rtrb::RingBuffer::new(capacity);
        Self { tx, rx }
    }

    pub fn capacity(&self) -> usize {
        self.tx.buffer().capacity()
    }

    /// The number of unread bytes.
    pub fn len(&self) -> usize {
        self.rx.slots()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// How many bytes [ByteRing::write] will accept right now. Callers pulling
    /// from a transport must never ask for more than this.
    pub fn available_write_capacity(&self) -> usize {
        self.tx.slots()
    }

    /// Appends `bytes` to the tail. Rejects the whole write, rather than
    /// truncating it, if it doesn't fit.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let available = self.available_write_capacity();
        if bytes.len() > available {
            return Err(SyncError::RingOverflow {
                requested: bytes.len(),
                available,
            });
        }
        if bytes.is_empty() {
            return Ok(());
        }
        let chunk = self
            .tx
            .write_chunk_uninit(bytes.len())
            .map_err(|_| SyncError::RingOverflow {
                requested: bytes.len(),
                available,
            })?;
        let written = chunk.fill_from_iter(bytes.iter().copied());
        debug_assert_eq!(written, bytes.len());
        Ok(())
    }

    /// The next unread byte, without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek().ok().copied()
    }

    /// Discards the next `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let available = self.len();
        self.rx
            .read_chunk(n)
            .map_err(|_| SyncError::RingUnderflow {
                requested: n,
                available,
            })?
            .commit_all();
        Ok(())
    }

    /// Discards up to `n` bytes, as many as are buffered, and returns how
    /// many went.
    pub fn skip_up_to(&mut self, n: usize) -> usize {
        let n = n.min(self.len());
        if n > 0 {
            if let Ok(chunk) = self.rx.read_chunk(n) {
                chunk.commit_all();
            }
        }
        n
    }

    /// Drops everything buffered.
    pub fn clear(&mut self) {
        self.skip_up_to(usize::MAX);
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.rx.pop().map_err(|_| SyncError::RingUnderflow {
            requested: 1,
            available: 0,
        })
    }

    /// Reads a big-endian (network order) u32.
    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Reads an IEEE-754 single whose bit pattern arrives in network order.
    pub fn read_f32_be(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32_be()?))
    }

    /// Reads exactly `buf.len()` bytes, or nothing at all.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let available = self.len();
        let chunk = self
            .rx
            .read_chunk(buf.len())
            .map_err(|_| SyncError::RingUnderflow {
                requested: buf.len(),
                available,
            })?;
        let (head, tail) = chunk.as_slices();
        buf[..head.len()].copy_from_slice(head);
        buf[head.len()..].copy_from_slice(tail);
        chunk.commit_all();
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_to_capacity_then_drain_in_order() {
        let mut ring = ByteRing::new_with(8);
        assert_eq!(ring.capacity(), 8);
        assert!(ring.is_empty());

        let bytes: Vec<u8> = (1..=8).collect();
        ring.write(&bytes).unwrap();
        assert_eq!(ring.len(), 8);
        assert_eq!(ring.available_write_capacity(), 0);

        let mut out = Vec::default();
        while let Ok(b) = ring.read_byte() {
            out.push(b);
        }
        assert_eq!(out, bytes);
        assert!(ring.is_empty());
    }

    #[test]
    fn overflow_is_rejected_not_truncated() {
        let mut ring = ByteRing::new_with(4);
        ring.write(&[1, 2, 3]).unwrap();
        let r = ring.write(&[4, 5]);
        assert!(matches!(
            r,
            Err(SyncError::RingOverflow {
                requested: 2,
                available: 1
            })
        ));

        // Nothing from the rejected write made it in.
        assert_eq!(ring.len(), 3);
        ring.write(&[4]).unwrap();
        assert_eq!(ring.read_u32_be().unwrap(), 0x01020304);
    }

    #[test]
    fn big_endian_reads_across_the_wrap_point() {
        let mut ring = ByteRing::new_with(6);

        // Advance the cursors so the next u32 straddles the end of storage.
        ring.write(&[0, 0, 0, 0]).unwrap();
        ring.skip(4).unwrap();

        ring.write(&[0x3F, 0x80, 0x00, 0x00]).unwrap();
        assert_eq!(ring.peek(), Some(0x3F));
        assert_eq!(ring.read_f32_be().unwrap(), 1.0);

        ring.write(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(ring.read_u32_be().unwrap(), 0xDEADBEEF);
        assert!(ring.is_empty());
    }

    #[test]
    fn short_reads_consume_nothing() {
        let mut ring = ByteRing::new_with(16);
        ring.write(&[0xAA, 0xBB, 0xCC]).unwrap();

        assert!(matches!(
            ring.read_u32_be(),
            Err(SyncError::RingUnderflow {
                requested: 4,
                available: 3
            })
        ));
        assert!(ring.skip(4).is_err());
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.peek(), Some(0xAA));

        ring.write(&[0xDD]).unwrap();
        assert_eq!(ring.read_u32_be().unwrap(), 0xAABBCCDD);
    }

    #[test]
    fn peek_and_read_byte_on_empty_ring() {
        let mut ring = ByteRing::new_with(2);
        assert_eq!(ring.peek(), None);
        assert!(ring.read_byte().is_err());
    }

    #[test]
    fn skip_up_to_stops_at_what_is_buffered() {
        let mut ring = ByteRing::new_with(8);
        assert_eq!(ring.skip_up_to(3), 0);

        ring.write(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(ring.skip_up_to(2), 2);
        assert_eq!(ring.peek(), Some(3));
        assert_eq!(ring.skip_up_to(12), 3);
        assert!(ring.is_empty());
        assert_eq!(ring.available_write_capacity(), 8);
    }

    #[test]
    fn clear_discards_everything() {
        let mut ring = ByteRing::new_with(5);
        ring.write(&[9, 9, 9]).unwrap();
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.available_write_capacity(), 5);
    }
}
