// src/encode/bitplane/mod.rs

//! Per-level bitplane strategies and their shared component model.
//!
//! Every strategy turns one level into `B` [`EncodedComponent`]s: bitplane 0
//! holds the signs, bitplanes `1..B` hold magnitude bits from most to least
//! significant. Decoding pulls one bit per coefficient from each bitplane's
//! [`PlaneDecoder`] and applies the inverse fixed-point transform.

pub mod direct;
pub mod hybrid;
pub mod runlength;

pub use direct::{decode_direct, encode_direct};
pub use hybrid::{decode_hybrid, decode_hybrid_with, encode_hybrid, encode_hybrid_with};
pub use runlength::{
    decode_runlength, decode_runlength_with, encode_runlength, encode_runlength_with,
};

use super::bit_reader::BitReader;
use super::fixed_point::{check_bitplanes, from_fixed, FixedPoint};
use super::huffman::EntropyBackend;
use super::lossless::LosslessBackend;
use super::rle::{RunLengthCodec, RunLengthDecoder};
use crate::config::Strategy;
use crate::utils::error::{BitplaneError, Result};
use crate::utils::float::Coefficient;

/// How a single bitplane was encoded. The discriminant is the on-disk indicator byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingKind {
    Direct = 0,
    RunLength = 1,
}

impl TryFrom<u8> for EncodingKind {
    type Error = BitplaneError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(EncodingKind::Direct),
            1 => Ok(EncodingKind::RunLength),
            other => Err(BitplaneError::UnsupportedIndicator(other)),
        }
    }
}

impl From<EncodingKind> for u8 {
    fn from(kind: EncodingKind) -> u8 {
        kind as u8
    }
}

/// One encoded (level, bitplane) buffer. Its length is the reported size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedComponent {
    kind: EncodingKind,
    bytes: Vec<u8>,
}

impl EncodedComponent {
    pub fn new(kind: EncodingKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    pub fn kind(&self) -> EncodingKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for EncodedComponent {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// All bitplanes of one level, in bitplane order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedLevel {
    components: Vec<EncodedComponent>,
}

impl EncodedLevel {
    pub fn new(components: Vec<EncodedComponent>) -> Self {
        Self { components }
    }

    pub fn num_bitplanes(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[EncodedComponent] {
        &self.components
    }

    pub fn into_components(self) -> Vec<EncodedComponent> {
        self.components
    }

    /// Stored byte size of every bitplane.
    pub fn sizes(&self) -> Vec<usize> {
        self.components.iter().map(EncodedComponent::len).collect()
    }

    /// One indicator byte per bitplane, to be persisted next to the sizes.
    pub fn indicators(&self) -> Vec<u8> {
        self.components.iter().map(|c| c.kind.into()).collect()
    }

    pub fn total_size(&self) -> usize {
        self.components.iter().map(EncodedComponent::len).sum()
    }

    /// Decodes with each bitplane's own recorded kind.
    pub fn decode<T: Coefficient>(&self, n: usize, level_exp: i32) -> Result<Vec<T>> {
        let num_bitplanes = self.num_bitplanes();
        let slots: Vec<Option<&[u8]>> = self.components.iter().map(|c| Some(c.as_bytes())).collect();
        decode_partial(&slots, &self.indicators(), n, level_exp, num_bitplanes)
    }
}

/// Bit source for one bitplane.
#[derive(Debug, Clone)]
pub enum PlaneDecoder<'a> {
    Direct(BitReader<'a>),
    RunLength(RunLengthDecoder),
    /// A bitplane that was not received; reads as zeros.
    Absent,
}

impl<'a> PlaneDecoder<'a> {
    pub fn open<E: EntropyBackend, L: LosslessBackend>(
        kind: EncodingKind,
        bytes: &'a [u8],
        codec: &RunLengthCodec<E, L>,
    ) -> Result<Self> {
        Ok(match kind {
            EncodingKind::Direct => PlaneDecoder::Direct(BitReader::new(bytes)),
            EncodingKind::RunLength => PlaneDecoder::RunLength(codec.decoder(bytes)?),
        })
    }

    #[inline]
    pub fn decode(&mut self) -> Result<bool> {
        match self {
            PlaneDecoder::Direct(reader) => reader.read_bit(),
            PlaneDecoder::RunLength(decoder) => decoder.decode(),
            PlaneDecoder::Absent => Ok(false),
        }
    }
}

/// Reassembles `n` coefficients from one decoder per bitplane.
pub(crate) fn reconstruct<T: Coefficient>(
    decoders: &mut [PlaneDecoder<'_>],
    n: usize,
    level_exp: i32,
) -> Result<Vec<T>> {
    let num_bitplanes = decoders.len();
    let mut out: Vec<T> = Vec::new();
    out.try_reserve_exact(n)
        .map_err(|_| BitplaneError::AllocationFailure {
            bytes: n * std::mem::size_of::<T>(),
        })?;
    let Some((sign, magnitude)) = decoders.split_first_mut() else {
        return Ok(out);
    };
    for _ in 0..n {
        let negative = sign.decode()?;
        let mut fp = 0u64;
        for decoder in magnitude.iter_mut() {
            fp = (fp << 1) | decoder.decode()? as u64;
        }
        let fixed = FixedPoint {
            negative,
            magnitude: fp,
        };
        out.push(T::from_f32(from_fixed(fixed, level_exp, num_bitplanes)));
    }
    Ok(out)
}

pub(crate) fn check_component_count(actual: usize, num_bitplanes: usize) -> Result<()> {
    if actual != num_bitplanes {
        return Err(BitplaneError::LengthMismatch {
            what: "bitplane components",
            expected: num_bitplanes,
            actual,
        });
    }
    Ok(())
}

/// Decodes a level from whichever bitplanes are available.
///
/// `None` slots read as zero bits, so passing the first `k` bitplanes yields
/// the reconstruction that keeps only the leading `k - 1` magnitude bits.
pub fn decode_partial<T: Coefficient>(
    components: &[Option<&[u8]>],
    indicators: &[u8],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
) -> Result<Vec<T>> {
    let codec: RunLengthCodec = RunLengthCodec::default();
    decode_partial_with(components, indicators, n, level_exp, num_bitplanes, &codec)
}

/// [`decode_partial`] reading run-length bitplanes through `codec`.
pub fn decode_partial_with<T: Coefficient, E: EntropyBackend, L: LosslessBackend>(
    components: &[Option<&[u8]>],
    indicators: &[u8],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
    codec: &RunLengthCodec<E, L>,
) -> Result<Vec<T>> {
    check_bitplanes::<T>(num_bitplanes)?;
    check_component_count(components.len(), num_bitplanes)?;
    check_component_count(indicators.len(), num_bitplanes)?;

    let mut decoders = Vec::with_capacity(num_bitplanes);
    for (slot, &indicator) in components.iter().zip(indicators) {
        let kind = EncodingKind::try_from(indicator)?;
        decoders.push(match slot {
            Some(bytes) => PlaneDecoder::open(kind, bytes, codec)?,
            None => PlaneDecoder::Absent,
        });
    }
    reconstruct(&mut decoders, n, level_exp)
}

/// Encodes one level with the chosen strategy.
pub fn encode_level<T: Coefficient>(
    data: &[T],
    level_exp: i32,
    num_bitplanes: usize,
    strategy: &Strategy,
) -> Result<EncodedLevel> {
    let codec: RunLengthCodec = RunLengthCodec::default();
    encode_level_with(data, level_exp, num_bitplanes, strategy, &codec)
}

/// [`encode_level`] with the backends of the run-length layer supplied by the caller.
pub fn encode_level_with<T: Coefficient, E: EntropyBackend, L: LosslessBackend>(
    data: &[T],
    level_exp: i32,
    num_bitplanes: usize,
    strategy: &Strategy,
    codec: &RunLengthCodec<E, L>,
) -> Result<EncodedLevel> {
    match strategy {
        Strategy::Direct => encode_direct(data, level_exp, num_bitplanes),
        Strategy::RunLength => encode_runlength_with(data, level_exp, num_bitplanes, codec),
        Strategy::Hybrid(params) => {
            encode_hybrid_with(data, level_exp, num_bitplanes, params, codec)
        }
    }
}

/// Inverse of [`encode_level`]. `indicators` is only read for the hybrid strategy.
pub fn decode_level<T: Coefficient, C: AsRef<[u8]>>(
    components: &[C],
    indicators: &[u8],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
    strategy: &Strategy,
) -> Result<Vec<T>> {
    let codec: RunLengthCodec = RunLengthCodec::default();
    decode_level_with(components, indicators, n, level_exp, num_bitplanes, strategy, &codec)
}

/// Inverse of [`encode_level_with`]; `codec` must match the one used to encode.
pub fn decode_level_with<T, C, E, L>(
    components: &[C],
    indicators: &[u8],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
    strategy: &Strategy,
    codec: &RunLengthCodec<E, L>,
) -> Result<Vec<T>>
where
    T: Coefficient,
    C: AsRef<[u8]>,
    E: EntropyBackend,
    L: LosslessBackend,
{
    match strategy {
        Strategy::Direct => decode_direct(components, n, level_exp, num_bitplanes),
        Strategy::RunLength => {
            decode_runlength_with(components, n, level_exp, num_bitplanes, codec)
        }
        Strategy::Hybrid(_) => {
            decode_hybrid_with(components, n, level_exp, num_bitplanes, indicators, codec)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_conversion() {
        assert_eq!(EncodingKind::try_from(0).unwrap(), EncodingKind::Direct);
        assert_eq!(EncodingKind::try_from(1).unwrap(), EncodingKind::RunLength);
        assert!(matches!(
            EncodingKind::try_from(2),
            Err(BitplaneError::UnsupportedIndicator(2))
        ));
        assert_eq!(u8::from(EncodingKind::RunLength), 1);
    }

    #[test]
    fn test_level_accessors() {
        let level = EncodedLevel::new(vec![
            EncodedComponent::new(EncodingKind::Direct, vec![0; 3]),
            EncodedComponent::new(EncodingKind::RunLength, vec![0; 20]),
        ]);
        assert_eq!(level.sizes(), vec![3, 20]);
        assert_eq!(level.indicators(), vec![0, 1]);
        assert_eq!(level.total_size(), 23);
        assert_eq!(level.num_bitplanes(), 2);
    }

    #[test]
    fn test_absent_planes_read_zero() {
        let mut decoders = vec![PlaneDecoder::Absent, PlaneDecoder::Absent];
        let out: Vec<f32> = reconstruct(&mut decoders, 4, 3).unwrap();
        assert_eq!(out, vec![0.0; 4]);
    }

    #[test]
    fn test_level_dispatch() {
        let data: Vec<f32> = (0..50).map(|i| i as f32 * 0.3 - 7.0).collect();
        for strategy in [Strategy::Direct, Strategy::RunLength, Strategy::hybrid()] {
            let level = encode_level(&data, 4, 10, &strategy).unwrap();
            let from_dispatch: Vec<f32> =
                decode_level(level.components(), &level.indicators(), 50, 4, 10, &strategy).unwrap();
            let from_level: Vec<f32> = level.decode(50, 4).unwrap();
            assert_eq!(from_dispatch, from_level);
        }
    }

    #[test]
    fn test_partial_rejects_bad_indicator() {
        let slots: Vec<Option<&[u8]>> = vec![None, None];
        assert!(matches!(
            decode_partial::<f32>(&slots, &[0, 9], 1, 0, 2),
            Err(BitplaneError::UnsupportedIndicator(9))
        ));
    }
}
