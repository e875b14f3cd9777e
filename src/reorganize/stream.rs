// src/reorganize/stream.rs

//! The reorganized byte stream and prefix queries over it.
//!
//! A stream is the concatenation of every (level, unit) in emission order.
//! Because each level's bitplanes are emitted in their own order, any byte
//! prefix of the stream holds a leading run of complete bitplanes per level,
//! possibly followed by one partially included bitplane.

use std::ops::Range;

/// One emitted unit and where it landed in the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub level: usize,
    pub unit: usize,
    pub bitplanes: Range<usize>,
    pub bytes: Range<usize>,
    /// Error removed by this unit.
    pub gain: f64,
}

/// Per-level count of complete bitplanes once the stream is cut at `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixEntry {
    pub end: usize,
    pub bitplanes: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCompleteness {
    pub complete: usize,
    /// The next bitplane has some, but not all, of its bytes in the prefix.
    pub partial: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReorganizedStream {
    bytes: Vec<u8>,
    segments: Vec<Segment>,
    // byte range of every (level, bitplane)
    planes: Vec<Vec<Range<usize>>>,
    indicators: Vec<Vec<u8>>,
    prefix_map: Vec<PrefixEntry>,
}

impl ReorganizedStream {
    pub(crate) fn from_parts(
        bytes: Vec<u8>,
        segments: Vec<Segment>,
        planes: Vec<Vec<Range<usize>>>,
        indicators: Vec<Vec<u8>>,
    ) -> Self {
        let mut counts = vec![0usize; planes.len()];
        let mut prefix_map: Vec<PrefixEntry> = Vec::with_capacity(segments.len());
        for segment in &segments {
            counts[segment.level] = segment.bitplanes.end;
            let entry = PrefixEntry {
                end: segment.bytes.end,
                bitplanes: counts.clone(),
            };
            // empty segments share their end with the previous one
            match prefix_map.last_mut() {
                Some(last) if last.end == entry.end => *last = entry,
                _ => prefix_map.push(entry),
            }
        }
        Self {
            bytes,
            segments,
            planes,
            indicators,
            prefix_map,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Units in emission order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// One entry per distinct segment end offset, in stream order.
    pub fn prefix_map(&self) -> &[PrefixEntry] {
        &self.prefix_map
    }

    pub fn num_levels(&self) -> usize {
        self.planes.len()
    }

    /// # Panics
    /// If `level` is out of range.
    pub fn num_bitplanes(&self, level: usize) -> usize {
        self.planes[level].len()
    }

    /// Encoding indicators of `level`, needed to decode its extracted bitplanes.
    ///
    /// # Panics
    /// If `level` is out of range.
    pub fn indicators(&self, level: usize) -> &[u8] {
        &self.indicators[level]
    }

    pub fn completeness_at(&self, prefix_len: usize) -> Vec<LevelCompleteness> {
        self.planes
            .iter()
            .map(|ranges| {
                let complete = ranges.iter().take_while(|r| r.end <= prefix_len).count();
                let partial = ranges
                    .get(complete)
                    .is_some_and(|r| r.start < prefix_len);
                LevelCompleteness { complete, partial }
            })
            .collect()
    }

    /// Splits the first `prefix_len` bytes back into per-level components.
    ///
    /// Complete bitplanes are `Some`, everything else `None`, which is the
    /// shape [`decode_partial`](crate::encode::bitplane::decode_partial) takes.
    pub fn extract(&self, prefix_len: usize) -> Vec<Vec<Option<&[u8]>>> {
        let prefix_len = prefix_len.min(self.bytes.len());
        self.planes
            .iter()
            .map(|ranges| {
                let complete = ranges.iter().take_while(|r| r.end <= prefix_len).count();
                ranges
                    .iter()
                    .enumerate()
                    .map(|(plane, r)| (plane < complete).then(|| &self.bytes[r.clone()]))
                    .collect()
            })
            .collect()
    }
}
