// src/utils/error.rs

use thiserror::Error;

/// Main error type for the bitplane codec library.
///
/// Every failure is scoped to a single (level, bitplane) operation; buffers
/// belonging to sibling components are never touched on an error path.
#[derive(Error, Debug)]
pub enum BitplaneError {
    /// Error estimation is only defined for single-precision elements.
    #[error("Unsupported precision: error estimation requires 32-bit floats, got {bits}-bit elements")]
    UnsupportedPrecision { bits: usize },
    /// A hybrid indicator named an encoding other than direct (0) or run-length (1).
    #[error("Unsupported bitplane indicator {0}: only direct (0) and run-length (1) are supported")]
    UnsupportedIndicator(u8),
    /// A buffer could not be reserved.
    #[error("Allocation of {bytes} bytes failed")]
    AllocationFailure { bytes: usize },
    /// Decoding ran past the end of the supplied input.
    #[error("Buffer underrun: needed {needed} more, {available} available")]
    BufferUnderrun { needed: usize, available: usize },
    /// The bitplane count cannot be represented for this element type.
    #[error("Invalid bitplane count {count}: must be in 1..={max}")]
    InvalidBitplaneCount { count: usize, max: usize },
    /// Two parallel inputs disagree in length.
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// An error table grew when more bitplanes were retained.
    #[error("Error table of level {level} increases at unit {unit}")]
    NegativeGain { level: usize, unit: usize },
    /// A serialized payload is malformed.
    #[error("Corrupt stream: {0}")]
    Corrupt(String),
    /// An entropy-coder input symbol does not fit the alphabet.
    #[error("Symbol {symbol} outside alphabet of size {alphabet}")]
    SymbolOutOfRange { symbol: u32, alphabet: usize },
    /// Reading or writing a serialized layer failed, including in the lossless backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for bitplane coding operations.
pub type Result<T> = std::result::Result<T, BitplaneError>;

/// Reserves a zeroed byte buffer, reporting allocation failure instead of aborting.
pub fn try_alloc_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| BitplaneError::AllocationFailure { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}
