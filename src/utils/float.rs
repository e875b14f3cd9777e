// src/utils/float.rs

//! Floating-point element support.
//!
//! Rust has no `frexp`/`ldexp` in `std`, so both are implemented here on top of
//! explicit IEEE-754 bit reinterpretation (`to_bits`/`from_bits`).

/// An element type that can be refactored into bitplanes.
pub trait Coefficient: Copy + PartialOrd + Send + Sync + 'static {
    /// Width of the IEEE-754 representation in bits.
    const BITS: usize;

    fn to_f64(self) -> f64;

    /// Widens (or keeps) a single-precision reconstruction into this type.
    fn from_f32(value: f32) -> Self;
}

impl Coefficient for f32 {
    const BITS: usize = 32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }
}

impl Coefficient for f64 {
    const BITS: usize = 64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value as f64
    }
}

const F64_EXP_BIAS: i32 = 1023;
const F64_MANTISSA_BITS: u32 = 52;

/// Exactly 2^exp for exponents in the normal range.
#[inline]
fn pow2(exp: i32) -> f64 {
    debug_assert!((-1022..=1023).contains(&exp));
    f64::from_bits(((exp + F64_EXP_BIAS) as u64) << F64_MANTISSA_BITS)
}

/// Binary exponent `e` such that `x = m * 2^e` with `0.5 <= |m| < 1`.
///
/// Matches C `frexp` for finite inputs; zero, infinities and NaN report 0.
pub fn frexp_exp(x: f64) -> i32 {
    if x == 0.0 || !x.is_finite() {
        return 0;
    }
    let bits = x.to_bits();
    let biased = ((bits >> F64_MANTISSA_BITS) & 0x7ff) as i32;
    if biased == 0 {
        // subnormal: value = mantissa * 2^-1074
        let mantissa = bits & ((1u64 << F64_MANTISSA_BITS) - 1);
        let msb = 63 - mantissa.leading_zeros() as i32;
        return msb + 1 - 1074;
    }
    biased - (F64_EXP_BIAS - 1)
}

/// `x * 2^exp`, scaling in steps so no intermediate power of two overflows.
pub fn ldexp(mut x: f64, mut exp: i32) -> f64 {
    while exp > 1023 {
        x *= pow2(1023);
        exp -= 1023;
        if x.is_infinite() {
            return x;
        }
    }
    while exp < -1022 {
        x *= pow2(-1022);
        exp += 1022;
        if x == 0.0 {
            return x;
        }
    }
    x * pow2(exp)
}

/// Single-precision `ldexp`. The product is exact in f64, so the final cast
/// is the only rounding step.
#[inline]
pub fn ldexp_f32(x: f32, exp: i32) -> f32 {
    ldexp(x as f64, exp) as f32
}

/// `frexp` exponent of the largest-magnitude element, 0 for an empty slice.
pub fn level_exponent<T: Coefficient>(data: &[T]) -> i32 {
    let max = data
        .iter()
        .map(|v| v.to_f64().abs())
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);
    frexp_exp(max)
}
