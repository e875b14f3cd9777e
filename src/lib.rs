//! # Bitplane Refactor Library
//!
//! Progressive bitplane coding of multilevel scientific data, with
//! per-bitplane error bounds and a greedy rate-error ordering of the result.
//!
//! This library is organized into several modules:
//! - `utils`: Error type and floating-point helpers
//! - `config`: Format constants and tunable parameters
//! - `encode`: Fixed-point transform, bit I/O and the bitplane strategies
//! - `estimate`: Per-level error tables
//! - `reorganize`: Greedy ordering of all bitplanes into one stream
//!
//! A typical pipeline encodes and estimates every level, then hands both to
//! [`reorganize`](reorganize::reorganize):
//!
//! ```
//! use bitplane_refactor::{
//!     encode_levels, estimate_levels, reorganize, ErrorMetric, LevelSpec, ReorganizeInput,
//!     Strategy,
//! };
//!
//! let coarse: Vec<f32> = (0..64).map(|i| (i as f32 * 0.2).sin() * 8.0).collect();
//! let fine: Vec<f32> = (0..256).map(|i| (i as f32 * 0.7).cos() * 0.5).collect();
//! let specs = [LevelSpec::from_data(&coarse, 16), LevelSpec::from_data(&fine, 16)];
//!
//! let encoded = encode_levels(&specs, &Strategy::default())?;
//! let errors = estimate_levels(&specs, ErrorMetric::MaxError)?;
//! let inputs: Vec<_> = encoded
//!     .iter()
//!     .zip(&errors)
//!     .map(|(level, table)| ReorganizeInput::new(level, table))
//!     .collect();
//! let stream = reorganize(&inputs)?;
//! assert_eq!(stream.len(), encoded.iter().map(|l| l.total_size()).sum::<usize>());
//! # Ok::<(), bitplane_refactor::BitplaneError>(())
//! ```

// Re-export commonly used types at the crate root
pub use utils::error::{BitplaneError, Result};

pub mod utils {
    pub mod error;
    pub mod float;
}

pub mod config;

pub mod encode {
    pub mod bit_reader;
    pub mod bitplane;
    pub mod fixed_point;
    pub mod huffman;
    pub mod levels;
    pub mod lossless;
    pub mod rle;

    pub use self::bitplane::{
        decode_direct, decode_hybrid, decode_hybrid_with, decode_level, decode_level_with,
        decode_partial, decode_partial_with, decode_runlength, decode_runlength_with,
        encode_direct, encode_hybrid, encode_hybrid_with, encode_level, encode_level_with,
        encode_runlength, encode_runlength_with, EncodedComponent, EncodedLevel, EncodingKind,
    };
    pub use self::huffman::{EntropyBackend, HuffmanCoder};
    pub use self::lossless::{LosslessBackend, ZstdBackend};
    pub use self::rle::RunLengthCodec;
    pub use self::levels::{encode_levels, estimate_levels, LevelSpec};
}

pub mod estimate;
pub mod reorganize;

// Public API exports
pub use config::{ErrorMetric, HybridParams, Strategy};
pub use encode::{
    decode_direct, decode_hybrid, decode_hybrid_with, decode_level, decode_level_with,
    decode_partial, decode_partial_with, decode_runlength, decode_runlength_with, encode_direct,
    encode_hybrid, encode_hybrid_with, encode_level, encode_level_with, encode_levels,
    encode_runlength, encode_runlength_with, estimate_levels, EncodedComponent, EncodedLevel,
    EncodingKind, EntropyBackend, HuffmanCoder, LevelSpec, LosslessBackend, RunLengthCodec,
    ZstdBackend,
};
pub use estimate::{estimate_max_error, estimate_mse, ErrorTable};
pub use reorganize::{reorganize, LevelCompleteness, ReorganizeInput, ReorganizedStream};
pub use utils::float::{level_exponent, Coefficient};

// Constants
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
