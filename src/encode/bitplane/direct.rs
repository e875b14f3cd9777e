// src/encode/bitplane/direct.rs

//! Direct strategy: one bit per coefficient per bitplane, packed LSB-first.

use super::{check_component_count, reconstruct, EncodedComponent, EncodedLevel, EncodingKind, PlaneDecoder};
use crate::config::DIRECT_PADDING_BYTES;
use crate::encode::bit_reader::BitReader;
use crate::encode::fixed_point::{check_bitplanes, to_fixed};
use crate::utils::error::{try_alloc_bytes, BitplaneError, Result};
use crate::utils::float::Coefficient;
use bitvec::prelude::*;
use log::debug;

/// Allocation bound for one direct bitplane of `n` elements.
///
/// Covers the `ceil(n / 8)` bytes actually written as long as
/// `num_bitplanes <= 8 * size_of::<T>()`.
pub fn direct_component_capacity<T: Coefficient>(n: usize, num_bitplanes: usize) -> usize {
    (n * std::mem::size_of::<T>()).div_ceil(num_bitplanes) + DIRECT_PADDING_BYTES
}

/// Fans the fixed-point bits of `data` out to one buffer per bitplane.
///
/// Returns the number of bytes written to each buffer (the same for all).
pub fn pack_bitplanes<T: Coefficient>(
    data: &[T],
    level_exp: i32,
    outputs: &mut [Vec<u8>],
) -> Result<usize> {
    let num_bitplanes = outputs.len();
    check_bitplanes::<T>(num_bitplanes)?;
    let written = data.len().div_ceil(8);
    if let Some(short) = outputs.iter().find(|b| b.len() < written) {
        return Err(BitplaneError::BufferUnderrun {
            needed: written,
            available: short.len(),
        });
    }

    let mut planes: Vec<&mut BitSlice<u8, Lsb0>> =
        outputs.iter_mut().map(|b| b.view_bits_mut::<Lsb0>()).collect();
    for (i, &value) in data.iter().enumerate() {
        let fixed = to_fixed(value, level_exp, num_bitplanes);
        planes[0].set(i, fixed.negative);
        let mut fp = fixed.magnitude;
        for plane in planes[1..].iter_mut().rev() {
            plane.set(i, fp & 1 != 0);
            fp >>= 1;
        }
    }
    Ok(written)
}

/// Runs the packing pass and returns the raw per-bitplane buffers, each
/// truncated to the bytes written.
pub(crate) fn pack_level<T: Coefficient>(
    data: &[T],
    level_exp: i32,
    num_bitplanes: usize,
) -> Result<(Vec<Vec<u8>>, usize)> {
    check_bitplanes::<T>(num_bitplanes)?;
    let capacity = direct_component_capacity::<T>(data.len(), num_bitplanes);
    debug!(
        "direct: {} elements, {} bitplanes, component capacity {}",
        data.len(),
        num_bitplanes,
        capacity
    );

    let mut buffers = (0..num_bitplanes)
        .map(|_| try_alloc_bytes(capacity))
        .collect::<Result<Vec<_>>>()?;
    let written = pack_bitplanes(data, level_exp, &mut buffers)?;
    for buffer in buffers.iter_mut() {
        buffer.truncate(written);
    }
    Ok((buffers, capacity))
}

pub fn encode_direct<T: Coefficient>(
    data: &[T],
    level_exp: i32,
    num_bitplanes: usize,
) -> Result<EncodedLevel> {
    let (buffers, _) = pack_level(data, level_exp, num_bitplanes)?;
    Ok(EncodedLevel::new(
        buffers
            .into_iter()
            .map(|bytes| EncodedComponent::new(EncodingKind::Direct, bytes))
            .collect(),
    ))
}

pub fn decode_direct<T: Coefficient, C: AsRef<[u8]>>(
    components: &[C],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
) -> Result<Vec<T>> {
    check_bitplanes::<T>(num_bitplanes)?;
    check_component_count(components.len(), num_bitplanes)?;
    let mut decoders: Vec<PlaneDecoder<'_>> = components
        .iter()
        .map(|c| PlaneDecoder::Direct(BitReader::new(c.as_ref())))
        .collect();
    reconstruct(&mut decoders, n, level_exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_bound() {
        assert_eq!(direct_component_capacity::<f32>(10, 8), 5 + 8);
        assert_eq!(direct_component_capacity::<f32>(0, 8), 8);
        // tightest case: 32 bitplanes of f32 need n/8 bytes, bound gives n/8 + 8
        assert!(direct_component_capacity::<f32>(1000, 32) >= 1000usize.div_ceil(8));
    }

    #[test]
    fn test_pack_layout() {
        // E = 1, B = 4: magnitudes scale by 4
        let data = [1.0f32, -0.25, 1.75];
        let mut outputs = vec![vec![0u8; 1]; 4];
        let written = pack_bitplanes(&data, 1, &mut outputs).unwrap();
        assert_eq!(written, 1);
        // magnitudes: 4 = 100, 1 = 001, 7 = 111
        assert_eq!(outputs[0], vec![0b010]);
        assert_eq!(outputs[1], vec![0b101]);
        assert_eq!(outputs[2], vec![0b100]);
        assert_eq!(outputs[3], vec![0b110]);
    }

    #[test]
    fn test_pack_rejects_short_buffer() {
        let data = [0.5f32; 9];
        let mut outputs = vec![vec![0u8; 1]; 2];
        assert!(matches!(
            pack_bitplanes(&data, 0, &mut outputs),
            Err(BitplaneError::BufferUnderrun { needed: 2, available: 1 })
        ));
    }

    #[test]
    fn test_sizes_are_symmetric() {
        let data: Vec<f32> = (0..100).map(|i| i as f32 * 0.37 - 12.0).collect();
        let level = encode_direct(&data, 5, 12).unwrap();
        assert_eq!(level.sizes(), vec![13; 12]);
        assert_eq!(level.indicators(), vec![0; 12]);
    }

    #[test]
    fn test_decode_underrun() {
        let data = [0.5f32; 16];
        let level = encode_direct(&data, 0, 4).unwrap();
        assert!(matches!(
            decode_direct::<f32, _>(level.components(), 17, 0, 4),
            Err(BitplaneError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn test_wrong_component_count() {
        let level = encode_direct(&[1.0f32], 1, 4).unwrap();
        assert!(matches!(
            decode_direct::<f32, _>(&level.components()[..3], 1, 1, 4),
            Err(BitplaneError::LengthMismatch { .. })
        ));
    }
}
