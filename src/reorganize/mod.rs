// src/reorganize/mod.rs

//! Greedy rate-error ordering of bitplanes across levels.
//!
//! Each level is cut into units: unit 0 is the sign bitplane together with
//! the first magnitude bitplane, unit `j >= 1` is magnitude bitplane `j + 1`.
//! Unit `j` removes `err[j] - err[j + 1]` of error. A max-heap keyed by
//! error removed per byte holds the next unit of every level, so the emitted
//! order always takes the most efficient next step while each level keeps its
//! own bitplane order.

pub mod stream;

pub use stream::{LevelCompleteness, PrefixEntry, ReorganizedStream, Segment};

use crate::encode::bitplane::EncodedLevel;
use crate::estimate::ErrorTable;
use crate::utils::error::{BitplaneError, Result};
use log::debug;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::ops::Range;

/// One level as seen by the reorganizer.
#[derive(Debug, Clone, Copy)]
pub struct ReorganizeInput<'a> {
    pub level: &'a EncodedLevel,
    pub errors: &'a ErrorTable,
}

impl<'a> ReorganizeInput<'a> {
    pub fn new(level: &'a EncodedLevel, errors: &'a ErrorTable) -> Self {
        Self { level, errors }
    }
}

/// Bitplanes making up `unit` of a level coded on `num_bitplanes` bitplanes.
pub fn unit_bitplanes(unit: usize, num_bitplanes: usize) -> Range<usize> {
    if unit == 0 {
        0..num_bitplanes.min(2)
    } else {
        unit + 1..unit + 2
    }
}

/// Error gain and byte size of every unit of one level.
///
/// A level with a single bitplane has one zero-gain unit so that its sign
/// bytes still end up in the stream.
pub fn unit_costs(level: &EncodedLevel, errors: &ErrorTable) -> Result<(Vec<f64>, Vec<usize>)> {
    let num_bitplanes = level.num_bitplanes();
    if errors.len() != num_bitplanes {
        return Err(BitplaneError::LengthMismatch {
            what: "error table",
            expected: num_bitplanes,
            actual: errors.len(),
        });
    }
    let sizes = level.sizes();
    match num_bitplanes {
        0 => Ok((Vec::new(), Vec::new())),
        1 => Ok((vec![0.0], vec![sizes[0]])),
        _ => {
            let unit_sizes = (0..num_bitplanes - 1)
                .map(|j| unit_bitplanes(j, num_bitplanes).map(|k| sizes[k]).sum::<usize>())
                .collect();
            Ok((errors.gains(), unit_sizes))
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Efficiency {
    efficiency: f64,
    level: usize,
    unit: usize,
}

impl Efficiency {
    fn new(gain: f64, size: usize, level: usize, unit: usize) -> Self {
        let efficiency = match size {
            0 if gain > 0.0 => f64::INFINITY,
            0 => 0.0,
            _ => gain / size as f64,
        };
        Self {
            efficiency,
            level,
            unit,
        }
    }
}

impl PartialEq for Efficiency {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Efficiency {}

impl PartialOrd for Efficiency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Efficiency {
    // max-heap: higher efficiency first, then lower (level, unit)
    fn cmp(&self, other: &Self) -> Ordering {
        self.efficiency
            .total_cmp(&other.efficiency)
            .then_with(|| other.level.cmp(&self.level))
            .then_with(|| other.unit.cmp(&self.unit))
    }
}

/// Greedy emission order over per-level unit gains and sizes.
///
/// Returns `(level, unit)` pairs. Every unit appears exactly once and units
/// of the same level appear in increasing order.
pub fn plan_order(gains: &[Vec<f64>], sizes: &[Vec<usize>]) -> Result<Vec<(usize, usize)>> {
    if gains.len() != sizes.len() {
        return Err(BitplaneError::LengthMismatch {
            what: "unit size levels",
            expected: gains.len(),
            actual: sizes.len(),
        });
    }
    for (level, (g, s)) in gains.iter().zip(sizes).enumerate() {
        if g.len() != s.len() {
            return Err(BitplaneError::LengthMismatch {
                what: "unit sizes",
                expected: g.len(),
                actual: s.len(),
            });
        }
        if let Some(unit) = g.iter().position(|&gain| gain < 0.0 || gain.is_nan()) {
            return Err(BitplaneError::NegativeGain { level, unit });
        }
    }

    let total = gains.iter().map(Vec::len).sum();
    let mut order = Vec::with_capacity(total);
    let mut heap: BinaryHeap<Efficiency> = gains
        .iter()
        .zip(sizes)
        .enumerate()
        .filter(|(_, (g, _))| !g.is_empty())
        .map(|(level, (g, s))| Efficiency::new(g[0], s[0], level, 0))
        .collect();

    while let Some(top) = heap.pop() {
        let Efficiency { level, unit, .. } = top;
        debug!(
            "reorganize: level {} unit {} (efficiency {})",
            level, unit, top.efficiency
        );
        order.push((level, unit));
        let next = unit + 1;
        if next < gains[level].len() {
            heap.push(Efficiency::new(gains[level][next], sizes[level][next], level, next));
        }
    }
    Ok(order)
}

/// Orders every bitplane of every level into one progressive stream.
pub fn reorganize(levels: &[ReorganizeInput<'_>]) -> Result<ReorganizedStream> {
    let mut gains = Vec::with_capacity(levels.len());
    let mut sizes = Vec::with_capacity(levels.len());
    for input in levels {
        let (g, s) = unit_costs(input.level, input.errors)?;
        gains.push(g);
        sizes.push(s);
    }
    let order = plan_order(&gains, &sizes)?;

    let total: usize = levels.iter().map(|l| l.level.total_size()).sum();
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(total)
        .map_err(|_| BitplaneError::AllocationFailure { bytes: total })?;
    let mut planes: Vec<Vec<Range<usize>>> = levels
        .iter()
        .map(|l| vec![0..0; l.level.num_bitplanes()])
        .collect();
    let mut segments = Vec::with_capacity(order.len());

    for (level, unit) in order {
        let components = levels[level].level.components();
        let bitplanes = unit_bitplanes(unit, components.len());
        let start = bytes.len();
        for plane in bitplanes.clone() {
            let plane_start = bytes.len();
            bytes.extend_from_slice(components[plane].as_bytes());
            planes[level][plane] = plane_start..bytes.len();
        }
        segments.push(Segment {
            level,
            unit,
            bitplanes,
            bytes: start..bytes.len(),
            gain: gains[level][unit],
        });
    }
    debug!(
        "reorganize: {} levels, {} segments, {} bytes",
        levels.len(),
        segments.len(),
        bytes.len()
    );

    let indicators = levels.iter().map(|l| l.level.indicators()).collect();
    Ok(ReorganizedStream::from_parts(bytes, segments, planes, indicators))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic() -> (Vec<Vec<f64>>, Vec<Vec<usize>>) {
        (
            vec![vec![10.0, 4.0], vec![8.0, 8.0]],
            vec![vec![2, 4], vec![4, 4]],
        )
    }

    #[test]
    fn test_unit_bitplanes() {
        assert_eq!(unit_bitplanes(0, 8), 0..2);
        assert_eq!(unit_bitplanes(1, 8), 2..3);
        assert_eq!(unit_bitplanes(6, 8), 7..8);
        assert_eq!(unit_bitplanes(0, 1), 0..1);
    }

    #[test]
    fn test_synthetic_order() {
        let (gains, sizes) = synthetic();
        assert_eq!(
            plan_order(&gains, &sizes).unwrap(),
            vec![(0, 0), (1, 0), (1, 1), (0, 1)]
        );
    }

    #[test]
    fn test_ties_prefer_lower_level() {
        let gains = vec![vec![4.0], vec![4.0], vec![4.0]];
        let sizes = vec![vec![2], vec![2], vec![2]];
        assert_eq!(plan_order(&gains, &sizes).unwrap(), vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn test_zero_size_units() {
        // free gain goes first, free nothing goes last
        let gains = vec![vec![1.0], vec![0.0], vec![0.5]];
        let sizes = vec![vec![0], vec![0], vec![10]];
        assert_eq!(plan_order(&gains, &sizes).unwrap(), vec![(0, 0), (2, 0), (1, 0)]);
    }

    #[test]
    fn test_negative_gain_rejected() {
        let gains = vec![vec![1.0, 2.0], vec![3.0, -0.5]];
        let sizes = vec![vec![1, 1], vec![1, 1]];
        assert!(matches!(
            plan_order(&gains, &sizes),
            Err(BitplaneError::NegativeGain { level: 1, unit: 1 })
        ));
    }

    #[test]
    fn test_unit_costs() {
        use crate::encode::bitplane::{EncodedComponent, EncodingKind};
        let level = EncodedLevel::new(
            [3, 5, 7, 11]
                .iter()
                .map(|&s| EncodedComponent::new(EncodingKind::Direct, vec![0; s]))
                .collect(),
        );
        let errors = ErrorTable::new(vec![9.0, 5.0, 2.0, 1.0]);
        let (gains, sizes) = unit_costs(&level, &errors).unwrap();
        assert_eq!(gains, vec![4.0, 3.0, 1.0]);
        assert_eq!(sizes, vec![8, 7, 11]);

        let short = ErrorTable::new(vec![1.0]);
        assert!(matches!(
            unit_costs(&level, &short),
            Err(BitplaneError::LengthMismatch { .. })
        ));
    }
}
