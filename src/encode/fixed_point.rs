// src/encode/fixed_point.rs

//! Sign/magnitude fixed-point mapping of level coefficients.
//!
//! A coefficient `v` of a level with reference exponent `E`, coded on `B`
//! bitplanes, becomes `sign = v < 0` and
//! `magnitude = trunc(|v| * 2^(B-1-E))`. Truncation (never rounding) keeps the
//! mapping bit-exact across encode/decode.

use crate::utils::error::{BitplaneError, Result};
use crate::utils::float::{ldexp, ldexp_f32, Coefficient};

/// Largest supported bitplane count; magnitudes are held in a `u64`.
pub const MAX_BITPLANES: usize = 64;

/// The sign/magnitude form of one coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    pub negative: bool,
    pub magnitude: u64,
}

impl FixedPoint {
    /// Bit of magnitude bitplane `plane` (1 = most significant).
    #[inline]
    pub fn plane_bit(&self, plane: usize, num_bitplanes: usize) -> bool {
        debug_assert!(plane >= 1 && plane < num_bitplanes);
        (self.magnitude >> (num_bitplanes - 1 - plane)) & 1 != 0
    }

    /// Keeps only the leading `retained` magnitude bits.
    pub fn truncated(self, retained: usize, num_bitplanes: usize) -> Self {
        let magnitude_bits = num_bitplanes - 1;
        let dropped = magnitude_bits.saturating_sub(retained);
        let magnitude = if dropped >= 64 {
            0
        } else {
            (self.magnitude >> dropped) << dropped
        };
        Self { magnitude, ..self }
    }
}

/// Checks that `num_bitplanes` fits the element type.
///
/// The direct buffer bound `ceil(n * size / B) + 8` only covers one bit per
/// coefficient while `B <= 8 * size`, so the same ceiling applies to every
/// strategy.
pub fn check_bitplanes<T: Coefficient>(num_bitplanes: usize) -> Result<()> {
    let max = T::BITS.min(MAX_BITPLANES);
    if num_bitplanes == 0 || num_bitplanes > max {
        return Err(BitplaneError::InvalidBitplaneCount {
            count: num_bitplanes,
            max,
        });
    }
    Ok(())
}

/// Forward transform.
#[inline]
pub fn to_fixed<T: Coefficient>(value: T, level_exp: i32, num_bitplanes: usize) -> FixedPoint {
    let v = value.to_f64();
    let scaled = ldexp(v, num_bitplanes as i32 - 1 - level_exp);
    // `as` truncates toward zero and saturates, which is what we want here
    let fix = scaled as i64;
    FixedPoint {
        negative: v < 0.0,
        magnitude: fix.unsigned_abs(),
    }
}

/// Inverse transform.
///
/// The result is always computed in single precision, whatever the element
/// type: `(±magnitude as f32) * 2^(E-(B-1))`.
#[inline]
pub fn from_fixed(fixed: FixedPoint, level_exp: i32, num_bitplanes: usize) -> f32 {
    let mut fix = fixed.magnitude as i64;
    if fixed.negative {
        fix = -fix;
    }
    ldexp_f32(fix as f32, -(num_bitplanes as i32) + 1 + level_exp)
}

/// Reconstruction of `value` when only `retained` magnitude bitplanes survive.
pub fn reconstruct_truncated<T: Coefficient>(
    value: T,
    level_exp: i32,
    num_bitplanes: usize,
    retained: usize,
) -> T {
    let fixed = to_fixed(value, level_exp, num_bitplanes).truncated(retained, num_bitplanes);
    T::from_f32(from_fixed(fixed, level_exp, num_bitplanes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_truncates() {
        // E = 1, B = 8: scale by 2^6
        let fixed = to_fixed(1.99f32, 1, 8);
        assert_eq!(fixed.magnitude, 127);
        assert!(!fixed.negative);

        let fixed = to_fixed(-0.51f32, 1, 8);
        assert_eq!(fixed.magnitude, 32);
        assert!(fixed.negative);

        let fixed = to_fixed(0.001f32, 1, 8);
        assert_eq!(fixed.magnitude, 0);
    }

    #[test]
    fn test_plane_bits_msb_first() {
        let fixed = FixedPoint {
            negative: false,
            magnitude: 0b1000001,
        };
        assert!(fixed.plane_bit(1, 8));
        assert!(!fixed.plane_bit(2, 8));
        assert!(fixed.plane_bit(7, 8));
    }

    #[test]
    fn test_from_fixed() {
        let fixed = FixedPoint {
            negative: true,
            magnitude: 96,
        };
        assert_eq!(from_fixed(fixed, 1, 8), -1.5);
        let zero = FixedPoint {
            negative: true,
            magnitude: 0,
        };
        assert_eq!(from_fixed(zero, 1, 8).to_bits(), 0.0f32.to_bits());
    }

    #[test]
    fn test_truncated() {
        let fixed = FixedPoint {
            negative: false,
            magnitude: 0b1011011,
        };
        assert_eq!(fixed.truncated(3, 8).magnitude, 0b1010000);
        assert_eq!(fixed.truncated(0, 8).magnitude, 0);
        assert_eq!(fixed.truncated(7, 8).magnitude, 0b1011011);
        assert_eq!(reconstruct_truncated(1.4f32, 1, 8, 2), 1.0);
    }

    #[test]
    fn test_check_bitplanes() {
        assert!(check_bitplanes::<f32>(32).is_ok());
        assert!(check_bitplanes::<f32>(33).is_err());
        assert!(check_bitplanes::<f64>(64).is_ok());
        assert!(matches!(
            check_bitplanes::<f32>(0),
            Err(BitplaneError::InvalidBitplaneCount { count: 0, max: 32 })
        ));
    }

    #[test]
    fn test_double_precision_is_capped() {
        let v = 1.0f64 + f64::EPSILON * 4.0;
        let fixed = to_fixed(v, 1, 60);
        let back = f64::from_f32(from_fixed(fixed, 1, 60));
        assert_eq!(back, 1.0);
    }
}
