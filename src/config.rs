// src/config.rs

//! Tunable parameters and format constants.

/// A run reaching this length is force-terminated and split with a 0-length run.
pub const MAX_RUN: u32 = 256;

/// Alphabet handed to the entropy coder for run lengths.
pub const ENTROPY_ALPHABET: usize = 2 * MAX_RUN as usize;

/// Slack appended to every direct bitplane buffer.
pub const DIRECT_PADDING_BYTES: usize = 8;

/// Bitplanes past this index are always retried with run-length coding.
pub const DEFAULT_RETRY_THRESHOLD: usize = 25;

/// Run-length coding is abandoned once `rle_size * penalty` exceeds the direct size.
pub const DEFAULT_SIZE_PENALTY: f64 = 1.5;

/// zstd level used by the lossless backend.
pub const LOSSLESS_LEVEL: i32 = 3;

/// Knobs for the adaptive hybrid strategy.
///
/// Both defaults were tuned empirically and are not derived from any bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridParams {
    /// Bitplanes with an index above this are always re-attempted with run-length coding.
    pub retry_threshold: usize,
    /// Multiplier applied to the run-length size before comparing it with the direct size.
    pub size_penalty: f64,
}

impl Default for HybridParams {
    fn default() -> Self {
        Self {
            retry_threshold: DEFAULT_RETRY_THRESHOLD,
            size_penalty: DEFAULT_SIZE_PENALTY,
        }
    }
}

/// Which bitplane strategy to run on a level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Direct,
    RunLength,
    Hybrid(HybridParams),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::hybrid()
    }
}

impl Strategy {
    pub fn hybrid() -> Self {
        Strategy::Hybrid(HybridParams::default())
    }
}

/// Which error table to compute per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMetric {
    /// Worst-case absolute error.
    #[default]
    MaxError,
    /// Unnormalized sum of squared errors.
    SquaredError,
}
