// src/encode/bitplane/hybrid.rs

//! Hybrid strategy: direct packing everywhere, with run-length coding swapped
//! in per bitplane while it keeps paying off.
//!
//! The sign bitplane is always direct. Magnitude bitplanes are visited from the
//! most significant one down; run-length coding is attempted while `try_rle`
//! holds or once the index passes `retry_threshold`, and an attempted
//! bitplane always keeps its run-length form. An attempt whose size, scaled by
//! `size_penalty`, exceeds the direct allocation bound turns `try_rle` off.

use super::direct::pack_level;
use super::{check_component_count, EncodedComponent, EncodedLevel, EncodingKind};
use crate::config::HybridParams;
use crate::encode::huffman::EntropyBackend;
use crate::encode::lossless::LosslessBackend;
use crate::encode::rle::RunLengthCodec;
use crate::utils::error::Result;
use crate::utils::float::Coefficient;
use bitvec::prelude::*;
use log::{debug, trace};

pub fn encode_hybrid<T: Coefficient>(
    data: &[T],
    level_exp: i32,
    num_bitplanes: usize,
    params: &HybridParams,
) -> Result<EncodedLevel> {
    let codec: RunLengthCodec = RunLengthCodec::default();
    encode_hybrid_with(data, level_exp, num_bitplanes, params, &codec)
}

/// Hybrid encoding with run-length bitplanes written through `codec`.
pub fn encode_hybrid_with<T: Coefficient, E: EntropyBackend, L: LosslessBackend>(
    data: &[T],
    level_exp: i32,
    num_bitplanes: usize,
    params: &HybridParams,
    codec: &RunLengthCodec<E, L>,
) -> Result<EncodedLevel> {
    let (buffers, direct_size) = pack_level(data, level_exp, num_bitplanes)?;
    debug!(
        "hybrid: {} elements, {} bitplanes, retry threshold {}, penalty {}",
        data.len(),
        num_bitplanes,
        params.retry_threshold,
        params.size_penalty
    );

    let mut try_rle = true;
    let mut components = Vec::with_capacity(num_bitplanes);
    for (k, bytes) in buffers.into_iter().enumerate() {
        if k == 0 || !(try_rle || k > params.retry_threshold) {
            components.push(EncodedComponent::new(EncodingKind::Direct, bytes));
            continue;
        }
        // padding bits of the last byte are coded too; decoders never read them
        let rle = codec.encode_bits(bytes.view_bits::<Lsb0>().iter().by_vals())?;
        if rle.len() as f64 * params.size_penalty > direct_size as f64 {
            try_rle = false;
        }
        trace!(
            "hybrid: bitplane {} run-length {} bytes vs direct {} (try_rle = {})",
            k,
            rle.len(),
            bytes.len(),
            try_rle
        );
        components.push(EncodedComponent::new(EncodingKind::RunLength, rle));
    }
    Ok(EncodedLevel::new(components))
}

pub fn decode_hybrid<T: Coefficient, C: AsRef<[u8]>>(
    components: &[C],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
    indicators: &[u8],
) -> Result<Vec<T>> {
    let codec: RunLengthCodec = RunLengthCodec::default();
    decode_hybrid_with(components, n, level_exp, num_bitplanes, indicators, &codec)
}

pub fn decode_hybrid_with<T, C, E, L>(
    components: &[C],
    n: usize,
    level_exp: i32,
    num_bitplanes: usize,
    indicators: &[u8],
    codec: &RunLengthCodec<E, L>,
) -> Result<Vec<T>>
where
    T: Coefficient,
    C: AsRef<[u8]>,
    E: EntropyBackend,
    L: LosslessBackend,
{
    check_component_count(components.len(), num_bitplanes)?;
    let slots: Vec<Option<&[u8]>> = components.iter().map(|c| Some(c.as_ref())).collect();
    super::decode_partial_with(&slots, indicators, n, level_exp, num_bitplanes, codec)
}
