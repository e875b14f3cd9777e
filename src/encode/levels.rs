// src/encode/levels.rs

//! Whole-decomposition drivers. Levels are independent, so with the `rayon`
//! feature they are processed in parallel; results come back in level order
//! either way.

use super::bitplane::{encode_level, EncodedLevel};
use crate::config::{ErrorMetric, Strategy};
use crate::estimate::{estimate, ErrorTable};
use crate::utils::error::Result;
use crate::utils::float::{level_exponent, Coefficient};
use log::info;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// A borrowed level with its encoding parameters.
#[derive(Debug, Clone, Copy)]
pub struct LevelSpec<'a, T> {
    pub data: &'a [T],
    pub level_exp: i32,
    pub num_bitplanes: usize,
}

impl<'a, T: Coefficient> LevelSpec<'a, T> {
    pub fn new(data: &'a [T], level_exp: i32, num_bitplanes: usize) -> Self {
        Self {
            data,
            level_exp,
            num_bitplanes,
        }
    }

    /// Uses the exponent of the largest element as `level_exp`.
    pub fn from_data(data: &'a [T], num_bitplanes: usize) -> Self {
        Self::new(data, level_exponent(data), num_bitplanes)
    }
}

pub fn encode_levels<T: Coefficient>(
    levels: &[LevelSpec<'_, T>],
    strategy: &Strategy,
) -> Result<Vec<EncodedLevel>> {
    info!("encoding {} levels with {:?}", levels.len(), strategy);
    let encode = |level: &LevelSpec<'_, T>| {
        encode_level(level.data, level.level_exp, level.num_bitplanes, strategy)
    };

    #[cfg(feature = "rayon")]
    let encoded = levels.par_iter().map(encode).collect();
    #[cfg(not(feature = "rayon"))]
    let encoded = levels.iter().map(encode).collect();

    encoded
}

pub fn estimate_levels<T: Coefficient>(
    levels: &[LevelSpec<'_, T>],
    metric: ErrorMetric,
) -> Result<Vec<ErrorTable>> {
    info!("estimating {:?} for {} levels", metric, levels.len());
    let table = |level: &LevelSpec<'_, T>| {
        estimate(metric, level.data, level.num_bitplanes, level.level_exp)
    };

    #[cfg(feature = "rayon")]
    let tables = levels.par_iter().map(table).collect();
    #[cfg(not(feature = "rayon"))]
    let tables = levels.iter().map(table).collect();

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::BitplaneError;

    fn levels() -> Vec<Vec<f32>> {
        (0..4)
            .map(|l| {
                (0..300 << l)
                    .map(|i| ((i as f32) * 0.05).cos() * (l + 1) as f32)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_matches_per_level_calls() {
        let data = levels();
        let specs: Vec<_> = data.iter().map(|d| LevelSpec::from_data(d, 16)).collect();
        let encoded = encode_levels(&specs, &Strategy::default()).unwrap();
        assert_eq!(encoded.len(), 4);
        for (spec, level) in specs.iter().zip(&encoded) {
            let single = encode_level(spec.data, spec.level_exp, 16, &Strategy::default()).unwrap();
            assert_eq!(&single, level);
        }

        let tables = estimate_levels(&specs, ErrorMetric::MaxError).unwrap();
        assert!(tables.iter().all(|t| t.len() == 16 && t.is_monotone()));
    }

    #[test]
    fn test_invalid_level_fails() {
        let data = levels();
        let mut specs: Vec<_> = data.iter().map(|d| LevelSpec::from_data(d, 16)).collect();
        specs[2].num_bitplanes = 0;
        assert!(matches!(
            encode_levels(&specs, &Strategy::Direct),
            Err(BitplaneError::InvalidBitplaneCount { count: 0, .. })
        ));
    }
}
