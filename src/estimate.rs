// src/estimate.rs

//! Per-level reconstruction error tables.
//!
//! Entry `i` of a table is the error left when only the first `i` magnitude
//! bitplanes of every coefficient are kept, so a level coded on `B` bitplanes
//! gets `B` entries and the last one is the error of the full encoding.
//!
//! Residuals are produced by clearing f32 mantissa bits in place, lowest
//! first, which is only meaningful for single-precision input. Every other
//! element width is rejected with [`BitplaneError::UnsupportedPrecision`].

use crate::config::ErrorMetric;
use crate::encode::fixed_point::check_bitplanes;
use crate::utils::error::{BitplaneError, Result};
use crate::utils::float::{frexp_exp, Coefficient};
use log::debug;
use std::ops::Deref;

const F32_MANTISSA_BITS: i32 = 23;

/// Non-increasing error values indexed by retained magnitude bitplanes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorTable {
    values: Vec<f64>,
}

impl ErrorTable {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Error removed by each reorganizer unit: `err[j] - err[j + 1]`.
    pub fn gains(&self) -> Vec<f64> {
        self.values.windows(2).map(|w| w[0] - w[1]).collect()
    }

    pub fn is_monotone(&self) -> bool {
        self.values.windows(2).all(|w| w[0] >= w[1])
    }
}

impl Deref for ErrorTable {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for ErrorTable {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

fn check_single_precision<T: Coefficient>() -> Result<()> {
    if T::BITS != 32 {
        return Err(BitplaneError::UnsupportedPrecision { bits: T::BITS });
    }
    Ok(())
}

/// Feeds `record(index, residual)` for every table index of one coefficient.
///
/// Indices above the element's own precision are skipped (no error there);
/// indices below the last mantissa bit get the whole value.
fn for_each_residual<F>(value: f32, num_bitplanes: usize, level_exp: i32, mut record: F)
where
    F: FnMut(usize, f32),
{
    let encode_prec = num_bitplanes as i32 - 1;
    let data_exp = frexp_exp(value as f64);
    let mut exp_diff = level_exp - data_exp + F32_MANTISSA_BITS - encode_prec;
    let mut index = encode_prec;
    let mut bits = value.to_bits();
    if exp_diff > 0 {
        // bits below the last coded bitplane never reach the decoder
        bits &= u32::MAX.checked_shl(exp_diff as u32).unwrap_or(0);
    } else {
        index += exp_diff;
        exp_diff = 0;
    }
    for b in exp_diff..F32_MANTISSA_BITS {
        bits &= !(1u32 << b);
        if index >= 0 {
            record(index as usize, value - f32::from_bits(bits));
        }
        index -= 1;
    }
    while index >= 0 {
        record(index as usize, value);
        index -= 1;
    }
}

fn accumulate<T, F>(data: &[T], num_bitplanes: usize, level_exp: i32, mut fold: F) -> Result<ErrorTable>
where
    T: Coefficient,
    F: FnMut(&mut f64, f32),
{
    check_single_precision::<T>()?;
    check_bitplanes::<T>(num_bitplanes)?;
    let mut table = vec![0.0f64; num_bitplanes];
    for &value in data {
        // exact: T is f32 here
        let value = value.to_f64() as f32;
        for_each_residual(value, num_bitplanes, level_exp, |index, residual| {
            fold(&mut table[index], residual);
        });
    }
    Ok(ErrorTable::new(table))
}

/// Worst-case absolute error per retained bitplane count.
pub fn estimate_max_error<T: Coefficient>(
    data: &[T],
    num_bitplanes: usize,
    level_exp: i32,
) -> Result<ErrorTable> {
    let table = accumulate(data, num_bitplanes, level_exp, |slot, residual| {
        *slot = slot.max(residual.abs() as f64);
    })?;
    debug!(
        "max error: {} elements, {} bitplanes, full-precision error {:?}",
        data.len(),
        num_bitplanes,
        table.last()
    );
    Ok(table)
}

/// Sum of squared errors per retained bitplane count. Not divided by `n`.
pub fn estimate_mse<T: Coefficient>(
    data: &[T],
    num_bitplanes: usize,
    level_exp: i32,
) -> Result<ErrorTable> {
    let table = accumulate(data, num_bitplanes, level_exp, |slot, residual| {
        *slot += (residual * residual) as f64;
    })?;
    debug!(
        "squared error: {} elements, {} bitplanes, full-precision error {:?}",
        data.len(),
        num_bitplanes,
        table.last()
    );
    Ok(table)
}

pub fn estimate<T: Coefficient>(
    metric: ErrorMetric,
    data: &[T],
    num_bitplanes: usize,
    level_exp: i32,
) -> Result<ErrorTable> {
    match metric {
        ErrorMetric::MaxError => estimate_max_error(data, num_bitplanes, level_exp),
        ErrorMetric::SquaredError => estimate_mse(data, num_bitplanes, level_exp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::fixed_point::reconstruct_truncated;
    use crate::utils::float::level_exponent;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_level(n: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-3.0f32..3.0)).collect()
    }

    #[test]
    fn test_hand_computed_tables() {
        // E = 0, B = 4: three magnitude bits of weight 1/2, 1/4, 1/8
        let data = [0.75f32, 0.1];
        let max = estimate_max_error(&data, 4, 0).unwrap();
        let tenth = 0.1f32 as f64;
        assert_eq!(max.values(), &[0.75, 0.25, tenth, tenth]);

        let mse = estimate_mse(&data, 4, 0).unwrap();
        let sq = (0.1f32 * 0.1f32) as f64;
        let expected = [0.5625 + sq, 0.0625 + sq, sq, sq];
        for (got, want) in mse.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
    }

    #[test]
    fn test_table_length_is_bitplane_count() {
        let data = random_level(64, 1);
        for b in [1, 2, 9, 24, 32] {
            assert_eq!(estimate_max_error(&data, b, 2).unwrap().len(), b);
            assert_eq!(estimate_mse(&data, b, 2).unwrap().len(), b);
        }
    }

    #[test]
    fn test_tables_are_monotone() {
        let data = random_level(5000, 2);
        let exp = level_exponent(&data);
        for b in [4, 12, 20, 28, 32] {
            for metric in [ErrorMetric::MaxError, ErrorMetric::SquaredError] {
                let table = estimate(metric, &data, b, exp).unwrap();
                assert!(table.is_monotone(), "{metric:?} B={b}: {:?}", table.values());
                assert!(table.gains().iter().all(|&g| g >= 0.0));
            }
        }
    }

    #[test]
    fn test_max_error_matches_truncated_reconstruction() {
        let data = random_level(2000, 3);
        let exp = level_exponent(&data);
        let b = 12;
        let table = estimate_max_error(&data, b, exp).unwrap();
        for retained in 0..b {
            let worst = data
                .iter()
                .map(|&v| (v - reconstruct_truncated(v, exp, b, retained)).abs() as f64)
                .fold(0.0f64, f64::max);
            assert_eq!(table[retained], worst, "retained {retained}");
        }
    }

    #[test]
    fn test_full_precision_has_no_error() {
        // 24 bitplanes cover every mantissa bit of the largest element
        let data = [1.5f32, -0.375, 0.984375];
        let table = estimate_max_error(&data, 24, 1).unwrap();
        assert_eq!(table[23], 0.0);
        assert_eq!(table[0], 1.5);
    }

    #[test]
    fn test_double_precision_rejected() {
        let data = [1.0f64, 2.0];
        assert!(matches!(
            estimate_max_error(&data, 8, 2),
            Err(BitplaneError::UnsupportedPrecision { bits: 64 })
        ));
        assert!(matches!(
            estimate_mse(&data, 8, 2),
            Err(BitplaneError::UnsupportedPrecision { bits: 64 })
        ));
    }

    #[test]
    fn test_empty_level() {
        let table = estimate_mse::<f32>(&[], 6, 0).unwrap();
        assert_eq!(table.values(), &[0.0; 6]);
    }
}
