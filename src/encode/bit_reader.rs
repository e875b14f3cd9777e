// src/encode/bit_reader.rs

//! Sequential LSB-first bit reader over a borrowed byte buffer.
//!
//! The reader keeps a guard-bit buffer instead of a bit index: a byte is loaded
//! as `0x100 | byte`, so once its 8 data bits have been shifted out only the
//! sentinel 1 remains and `buffer >> 1 == 0` signals "reload".

use crate::utils::error::{BitplaneError, Result};

const SENTINEL: u32 = 0x100;

#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    buffer: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buffer: 1,
        }
    }

    /// Reads the next bit, failing with `BufferUnderrun` past the end of input.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.buffer >> 1 == 0 {
            let byte = *self
                .data
                .get(self.pos)
                .ok_or(BitplaneError::BufferUnderrun {
                    needed: 1,
                    available: 0,
                })?;
            self.pos += 1;
            self.buffer = SENTINEL | byte as u32;
        }
        let bit = self.buffer & 1 != 0;
        self.buffer >>= 1;
        Ok(bit)
    }

    /// Number of bytes loaded so far, including a partially consumed one.
    ///
    /// This is the plain read position: it grows by one when a byte is loaded,
    /// not when its last bit is served, and no extra byte is added while the
    /// guard buffer still holds unread bits. Readers that count a partially
    /// consumed byte only once it is exhausted can compare
    /// [`pending_bits`](Self::pending_bits) against 0.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Bits of the current byte not yet served.
    #[inline]
    pub fn pending_bits(&self) -> u32 {
        // the sentinel itself is not a data bit
        31 - self.buffer.leading_zeros()
    }

    /// Whole bytes still available after the current one.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_first() {
        let data = [0b1010_0001u8, 0xff];
        let mut reader = BitReader::new(&data);
        let bits: Vec<bool> = (0..8).map(|_| reader.read_bit().unwrap()).collect();
        assert_eq!(
            bits,
            vec![true, false, false, false, false, true, false, true]
        );
        assert_eq!(reader.consumed(), 1);
        assert_eq!(reader.pending_bits(), 0);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.consumed(), 2);
        assert_eq!(reader.pending_bits(), 7);
        assert_eq!(reader.remaining_bytes(), 0);
    }

    #[test]
    fn test_exactly_eight_reads_per_byte() {
        let data = [0u8; 3];
        let mut reader = BitReader::new(&data);
        for _ in 0..24 {
            assert!(!reader.read_bit().unwrap());
        }
        assert_eq!(reader.consumed(), 3);
        assert!(matches!(
            reader.read_bit(),
            Err(BitplaneError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn test_empty_input_underruns() {
        let mut reader = BitReader::new(&[]);
        assert_eq!(reader.consumed(), 0);
        assert!(reader.read_bit().is_err());
    }

    #[test]
    fn test_consumed_counts_loaded_bytes() {
        let data = [0xa5u8, 0x3c];
        let mut reader = BitReader::new(&data);
        reader.read_bit().unwrap();
        assert_eq!(reader.consumed(), 1);
        assert_eq!(reader.pending_bits(), 7);

        for _ in 1..8 {
            reader.read_bit().unwrap();
        }
        // byte fully served, next one not yet loaded
        assert_eq!(reader.consumed(), 1);
        assert_eq!(reader.pending_bits(), 0);

        reader.read_bit().unwrap();
        assert_eq!(reader.consumed(), 2);
        assert_eq!(reader.pending_bits(), 7);
    }
}
