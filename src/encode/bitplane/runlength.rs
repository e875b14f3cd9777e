// src/encode/bitplane/runlength.rs

//! Run-length strategy: every bitplane goes through run-length, entropy and
//! lossless coding.

use super::{check_component_count, reconstruct, EncodedComponent, EncodedLevel, EncodingKind, PlaneDecoder};
use crate::encode::fixed_point::{check_bitplanes, to_fixed};
use crate::encode::huffman::EntropyBackend;
use crate::encode::lossless::LosslessBackend;
use crate::encode::rle::{RunLengthCodec, RunLengthEncoder};
use crate::utils::error::Result;
use crate::utils::float::Coefficient;
use log::{debug, trace};

/// [`encode_runlength_with`] using the default Huffman and zstd backends.
pub fn encode_runlength<T: Coefficient>(
    data: &[T],
    level_exp: i32,
    num_bitplanes: usize,
) -> Result<EncodedLevel> {
    let codec: RunLengthCodec = RunLengthCodec::default();
    encode_runlength_with(data, level_exp, num_bitplanes, &codec)
}

pub fn encode_runlength_with<T: Coefficient, E: EntropyBackend, L: LosslessBackend>(
    data: &[T],
    level_exp: i32,
    num_bitplanes: usize,
    codec: &RunLengthCodec<E, L>,
) -> Result<EncodedLevel> {
    check_bitplanes::<T>(num_bitplanes)?;
    debug!(
        "runlength: {} elements, {} bitplanes",
        data.len(),
        num_bitplanes
    );

    let mut encoders = vec![RunLengthEncoder::new(); num_bitplanes];
    for &value in data {
        let fixed = to_fixed(value, level_exp, num_bitplanes);
        encoders[0].encode(fixed.negative);
        let mut fp = fixed.magnitude;
        for encoder in encoders[1..].iter_mut().rev() {
            encoder.encode(fp & 1 != 0);
            fp >>= 1;
        }
    }

    let mut components = Vec::with_capacity(num_bitplanes);
    for (k, encoder) in encoders.into_iter().enumerate() {
        let bytes = codec.save(&encoder.into_lengths())?;
        trace!("runlength: bitplane {} -> {} bytes", k, bytes.len());
        components.push(EncodedComponent::new(EncodingKind::RunLength, bytes));
    }
    Ok(EncodedLevel::new(components))
}

pub fn decode_runlength<T: Coefficient, C: AsRef<[u8]>>(
    components: &[C],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
) -> Result<Vec<T>> {
    let codec: RunLengthCodec = RunLengthCodec::default();
    decode_runlength_with(components, n, level_exp, num_bitplanes, &codec)
}

pub fn decode_runlength_with<T, C, E, L>(
    components: &[C],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
    codec: &RunLengthCodec<E, L>,
) -> Result<Vec<T>>
where
    T: Coefficient,
    C: AsRef<[u8]>,
    E: EntropyBackend,
    L: LosslessBackend,
{
    check_bitplanes::<T>(num_bitplanes)?;
    check_component_count(components.len(), num_bitplanes)?;
    let mut decoders = components
        .iter()
        .map(|c| codec.decoder(c.as_ref()).map(PlaneDecoder::RunLength))
        .collect::<Result<Vec<_>>>()?;
    reconstruct(&mut decoders, n, level_exp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::bitplane::direct::{decode_direct, encode_direct};

    #[test]
    fn test_matches_direct_reconstruction() {
        let data: Vec<f32> = (0..777).map(|i| ((i as f32) * 0.173).sin() * 40.0).collect();
        let rle = encode_runlength(&data, 6, 16).unwrap();
        let direct = encode_direct(&data, 6, 16).unwrap();
        assert_eq!(rle.indicators(), vec![1; 16]);

        let from_rle: Vec<f32> = decode_runlength(rle.components(), data.len(), 6, 16).unwrap();
        let from_direct: Vec<f32> = decode_direct(direct.components(), data.len(), 6, 16).unwrap();
        assert_eq!(from_rle, from_direct);
    }

    #[test]
    fn test_constant_level_is_small() {
        let data = vec![0.0f32; 100_000];
        let level = encode_runlength(&data, 0, 8).unwrap();
        for size in level.sizes() {
            assert!(size < 200, "bitplane of zeros took {size} bytes");
        }
    }

    #[test]
    fn test_custom_level_round_trip() {
        use crate::encode::huffman::HuffmanCoder;
        use crate::encode::lossless::ZstdBackend;

        let data: Vec<f32> = (0..2000).map(|i| ((i as f32) * 0.01).sin()).collect();
        let codec = RunLengthCodec::new(HuffmanCoder, ZstdBackend { level: 19 });
        let level = encode_runlength_with(&data, 0, 12, &codec).unwrap();
        let decoded: Vec<f32> =
            decode_runlength_with(level.components(), data.len(), 0, 12, &codec).unwrap();

        let default_level = encode_runlength(&data, 0, 12).unwrap();
        let expected: Vec<f32> =
            decode_runlength(default_level.components(), data.len(), 0, 12).unwrap();
        assert_eq!(decoded, expected);
    }
}
