// src/encode/rle.rs

//! Run-length coding of a single bitplane.
//!
//! A bit sequence is stored as the lengths of alternating runs, starting from
//! an implicit 0 bit. Runs are capped at [`MAX_RUN`]: a run that reaches the
//! cap is recorded, and the next bit of the same value opens a 0-length run of
//! the opposite value so that strict alternation still holds.
//!
//! Serialized component:
//!
//! ```text
//! [u64 inner length][lossless( [u64 run count][entropy(runs)] )]
//! ```

use super::huffman::{EntropyBackend, HuffmanCoder};
use super::lossless::{LosslessBackend, ZstdBackend};
use crate::config::{ENTROPY_ALPHABET, MAX_RUN};
use crate::utils::error::{BitplaneError, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::trace;

const HEADER_BYTES: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct RunLengthEncoder {
    lengths: Vec<u32>,
    lastbit: bool,
    count: u32,
}

impl RunLengthEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn encode(&mut self, bit: bool) {
        if self.lastbit == bit {
            self.count += 1;
            if self.count == MAX_RUN {
                self.lengths.push(self.count);
                self.count = 0;
                // inverted, not toggled: the next equal bit starts a fresh run
                self.lastbit = !bit;
            }
        } else {
            self.lengths.push(self.count);
            self.count = 1;
            self.lastbit = bit;
        }
    }

    pub fn flush(&mut self) {
        if self.count != 0 {
            self.lengths.push(self.count);
            self.count = 0;
            self.lastbit = false;
        }
    }

    pub fn lengths(&self) -> &[u32] {
        &self.lengths
    }

    pub fn into_lengths(mut self) -> Vec<u32> {
        self.flush();
        self.lengths
    }
}

#[derive(Debug, Clone)]
pub struct RunLengthDecoder {
    lengths: Vec<u32>,
    index: usize,
    count: u32,
    lastbit: bool,
}

impl RunLengthDecoder {
    pub fn from_lengths(lengths: Vec<u32>) -> Self {
        Self {
            lengths,
            index: 0,
            count: 0,
            // flipped to the implicit initial 0 by the first decode
            lastbit: true,
        }
    }

    #[inline]
    pub fn decode(&mut self) -> Result<bool> {
        loop {
            if self.count > 0 {
                self.count -= 1;
                return Ok(self.lastbit);
            }
            let next = *self
                .lengths
                .get(self.index)
                .ok_or(BitplaneError::BufferUnderrun {
                    needed: 1,
                    available: 0,
                })?;
            self.index += 1;
            self.count = next;
            self.lastbit = !self.lastbit;
        }
    }
}

/// Run-length coder bound to an entropy and a lossless backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLengthCodec<E = HuffmanCoder, L = ZstdBackend> {
    pub entropy: E,
    pub lossless: L,
}

impl<E: EntropyBackend, L: LosslessBackend> RunLengthCodec<E, L> {
    pub fn new(entropy: E, lossless: L) -> Self {
        Self { entropy, lossless }
    }

    /// Serializes a run-length table into a self-contained component.
    pub fn save(&self, lengths: &[u32]) -> Result<Vec<u8>> {
        let mut inner = vec![0u8; HEADER_BYTES];
        LittleEndian::write_u64(&mut inner, lengths.len() as u64);
        inner.extend_from_slice(&self.entropy.encode(lengths, ENTROPY_ALPHABET)?);

        let packed = self.lossless.compress(&inner)?;
        let mut out = Vec::new();
        out.try_reserve_exact(HEADER_BYTES + packed.len())
            .map_err(|_| BitplaneError::AllocationFailure {
                bytes: HEADER_BYTES + packed.len(),
            })?;
        out.resize(HEADER_BYTES, 0);
        LittleEndian::write_u64(&mut out, inner.len() as u64);
        out.extend_from_slice(&packed);
        trace!(
            "rle: {} runs, {} entropy bytes, {} stored bytes",
            lengths.len(),
            inner.len(),
            out.len()
        );
        Ok(out)
    }

    /// Inverse of [`save`](Self::save).
    pub fn load(&self, bytes: &[u8]) -> Result<Vec<u32>> {
        let inner_len = read_header(bytes)?;
        let inner = self.lossless.decompress(&bytes[HEADER_BYTES..], inner_len)?;
        let count = read_header(&inner)?;
        self.entropy.decode(&inner[HEADER_BYTES..], count)
    }

    pub fn encode_bits<I: IntoIterator<Item = bool>>(&self, bits: I) -> Result<Vec<u8>> {
        let mut encoder = RunLengthEncoder::new();
        for bit in bits {
            encoder.encode(bit);
        }
        self.save(&encoder.into_lengths())
    }

    pub fn decoder(&self, bytes: &[u8]) -> Result<RunLengthDecoder> {
        Ok(RunLengthDecoder::from_lengths(self.load(bytes)?))
    }
}

fn read_header(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < HEADER_BYTES {
        return Err(BitplaneError::BufferUnderrun {
            needed: HEADER_BYTES,
            available: bytes.len(),
        });
    }
    let value = LittleEndian::read_u64(&bytes[..HEADER_BYTES]);
    usize::try_from(value)
        .map_err(|_| BitplaneError::Corrupt(format!("length header {value} does not fit usize")))
}
