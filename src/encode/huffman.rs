// src/encode/huffman.rs

//! Canonical Huffman coding over small non-negative integers.
//!
//! Layout of an encoded block (all integers little-endian):
//!
//! ```text
//! [u32 used symbols][(u32 symbol, u8 code length) * used][payload, MSB-first]
//! ```
//!
//! The symbol count is not stored; callers supply it when decoding.

use crate::utils::error::{BitplaneError, Result};
use bitvec::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::Cursor;

/// Longest code the coder will emit.
const MAX_CODE_LEN: u8 = 64;

/// Contract of the entropy stage used by the run-length strategy.
pub trait EntropyBackend {
    fn encode(&self, symbols: &[u32], alphabet: usize) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8], count: usize) -> Result<Vec<u32>>;
}

/// Order-0 canonical Huffman coder.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanCoder;

impl EntropyBackend for HuffmanCoder {
    fn encode(&self, symbols: &[u32], alphabet: usize) -> Result<Vec<u8>> {
        let mut freq = vec![0u64; alphabet];
        for &s in symbols {
            let slot = freq
                .get_mut(s as usize)
                .ok_or(BitplaneError::SymbolOutOfRange { symbol: s, alphabet })?;
            *slot += 1;
        }

        let lengths = code_lengths(&freq)?;
        let table = CanonicalTable::new(&lengths);

        let mut out = Vec::with_capacity(4 + table.sorted.len() * 5 + symbols.len() / 4);
        out.write_u32::<LittleEndian>(table.sorted.len() as u32)?;
        for &(symbol, len) in &table.sorted {
            out.write_u32::<LittleEndian>(symbol)?;
            out.write_u8(len)?;
        }

        let codes = table.codes(alphabet);
        let mut bits: BitVec<u8, Msb0> = BitVec::with_capacity(symbols.len() * 2);
        for &s in symbols {
            let (code, len) = codes[s as usize];
            for shift in (0..len).rev() {
                bits.push((code >> shift) & 1 != 0);
            }
        }
        out.extend_from_slice(bits.as_raw_slice());
        Ok(out)
    }

    fn decode(&self, bytes: &[u8], count: usize) -> Result<Vec<u32>> {
        let mut cursor = Cursor::new(bytes);
        let used = cursor.read_u32::<LittleEndian>().map_err(|_| underrun(4, bytes.len()))? as usize;
        let mut sorted = Vec::with_capacity(used.min(bytes.len() / 5));
        for _ in 0..used {
            let symbol = cursor
                .read_u32::<LittleEndian>()
                .map_err(|_| underrun(5, remaining(&cursor)))?;
            let len = cursor.read_u8().map_err(|_| underrun(1, remaining(&cursor)))?;
            if len == 0 || len > MAX_CODE_LEN {
                return Err(BitplaneError::Corrupt(format!(
                    "invalid huffman code length {len} for symbol {symbol}"
                )));
            }
            sorted.push((symbol, len));
        }
        if count > 0 && sorted.is_empty() {
            return Err(BitplaneError::Corrupt(
                "huffman table is empty but symbols were requested".to_string(),
            ));
        }

        let table = CanonicalTable::from_sorted(sorted);
        let payload = &bytes[cursor.position() as usize..];
        let bits = payload.view_bits::<Msb0>();
        if count > bits.len() {
            // every symbol costs at least one bit
            return Err(underrun(count, bits.len()));
        }
        let mut pos = 0usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let mut code = 0u64;
            let mut len = 0u8;
            loop {
                let bit = *bits.get(pos).ok_or(underrun(1, 0))?;
                pos += 1;
                code = (code << 1) | bit as u64;
                len += 1;
                if let Some(symbol) = table.lookup(code, len) {
                    out.push(symbol);
                    break;
                }
                if len >= table.max_len {
                    return Err(BitplaneError::Corrupt(format!(
                        "no huffman code matches {code:#b}"
                    )));
                }
            }
        }
        Ok(out)
    }
}

fn underrun(needed: usize, available: usize) -> BitplaneError {
    BitplaneError::BufferUnderrun { needed, available }
}

fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}

/// Code length per symbol (0 = unused). Ties are broken by node index so the
/// result is deterministic.
fn code_lengths(freq: &[u64]) -> Result<Vec<u8>> {
    let mut lengths = vec![0u8; freq.len()];
    let used: Vec<usize> = (0..freq.len()).filter(|&s| freq[s] > 0).collect();
    match used.len() {
        0 => return Ok(lengths),
        1 => {
            lengths[used[0]] = 1;
            return Ok(lengths);
        }
        _ => {}
    }

    // leaves are nodes 0..used.len(); internal nodes are appended after them
    let mut parent: Vec<usize> = vec![usize::MAX; used.len()];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = used
        .iter()
        .enumerate()
        .map(|(node, &s)| Reverse((freq[s], node)))
        .collect();
    while heap.len() > 1 {
        let (Some(Reverse((fa, a))), Some(Reverse((fb, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        let node = parent.len();
        parent.push(usize::MAX);
        parent[a] = node;
        parent[b] = node;
        heap.push(Reverse((fa + fb, node)));
    }

    for (leaf, &s) in used.iter().enumerate() {
        let mut depth = 0usize;
        let mut node = leaf;
        while parent[node] != usize::MAX {
            node = parent[node];
            depth += 1;
        }
        if depth > MAX_CODE_LEN as usize {
            return Err(BitplaneError::Corrupt(format!(
                "huffman code for symbol {s} needs {depth} bits"
            )));
        }
        lengths[s] = depth as u8;
    }
    Ok(lengths)
}

/// Canonical code assignment, shared by encoder and decoder.
struct CanonicalTable {
    /// (symbol, length) ordered by (length, symbol).
    sorted: Vec<(u32, u8)>,
    /// Per length: first code, index of its first symbol in `sorted`, count.
    first_code: Vec<u64>,
    first_index: Vec<usize>,
    count: Vec<usize>,
    max_len: u8,
}

impl CanonicalTable {
    fn new(lengths: &[u8]) -> Self {
        let sorted = lengths
            .iter()
            .enumerate()
            .filter(|&(_, &len)| len > 0)
            .map(|(s, &len)| (s as u32, len))
            .collect();
        Self::from_sorted(sorted)
    }

    fn from_sorted(mut sorted: Vec<(u32, u8)>) -> Self {
        sorted.sort_unstable_by_key(|&(s, len)| (len, s));
        let max_len = sorted.last().map_or(0, |&(_, len)| len);
        let slots = max_len as usize + 1;
        let mut first_code = vec![0u64; slots];
        let mut first_index = vec![0usize; slots];
        let mut count = vec![0usize; slots];

        let mut code = 0u64;
        let mut prev_len = 0u8;
        for (i, &(_, len)) in sorted.iter().enumerate() {
            if len != prev_len {
                // corrupt tables may request a full-width shift
                code = code.checked_shl((len - prev_len) as u32).unwrap_or(0);
                first_code[len as usize] = code;
                first_index[len as usize] = i;
                prev_len = len;
            }
            count[len as usize] += 1;
            code = code.wrapping_add(1);
        }

        Self {
            sorted,
            first_code,
            first_index,
            count,
            max_len,
        }
    }

    fn codes(&self, alphabet: usize) -> Vec<(u64, u8)> {
        let mut codes = vec![(0u64, 0u8); alphabet];
        for (len, &n) in self.count.iter().enumerate() {
            for k in 0..n {
                let (symbol, _) = self.sorted[self.first_index[len] + k];
                codes[symbol as usize] = (self.first_code[len] + k as u64, len as u8);
            }
        }
        codes
    }

    #[inline]
    fn lookup(&self, code: u64, len: u8) -> Option<u32> {
        let len = len as usize;
        let n = *self.count.get(len)?;
        if n == 0 || code < self.first_code[len] {
            return None;
        }
        let offset = (code - self.first_code[len]) as usize;
        (offset < n).then(|| self.sorted[self.first_index[len] + offset].0)
    }
}
