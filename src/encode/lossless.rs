// src/encode/lossless.rs

use crate::config::LOSSLESS_LEVEL;
use crate::utils::error::{BitplaneError, Result};

/// Contract of the generic byte-stream compressor wrapping entropy payloads.
pub trait LosslessBackend {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>>;
    /// Inverts `compress`; the output must be exactly `original_len` bytes.
    /// Implementations must not allocate more than `original_len` for the
    /// output, whatever the input claims.
    fn decompress(&self, bytes: &[u8], original_len: usize) -> Result<Vec<u8>>;
}

/// zstd single-frame backend.
#[derive(Debug, Clone, Copy)]
pub struct ZstdBackend {
    pub level: i32,
}

impl Default for ZstdBackend {
    fn default() -> Self {
        Self {
            level: LOSSLESS_LEVEL,
        }
    }
}

impl LosslessBackend for ZstdBackend {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(zstd::encode_all(bytes, self.level)?)
    }

    fn decompress(&self, bytes: &[u8], original_len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.try_reserve_exact(original_len)
            .map_err(|_| BitplaneError::AllocationFailure {
                bytes: original_len,
            })?;
        // writes stop at the reserved capacity, so an oversized frame fails instead of expanding
        zstd::bulk::Decompressor::new()?
            .decompress_to_buffer(bytes, &mut out)
            .map_err(|e| {
                BitplaneError::Corrupt(format!(
                    "lossless payload does not fit the {original_len} bytes its header declares: {e}"
                ))
            })?;
        if out.len() != original_len {
            return Err(BitplaneError::Corrupt(format!(
                "lossless payload expanded to {} bytes, header says {}",
                out.len(),
                original_len
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 13) as u8).collect();
        let backend = ZstdBackend::default();
        let packed = backend.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(backend.decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_length_mismatch_is_corrupt() {
        let backend = ZstdBackend::default();
        let packed = backend.compress(b"abcdef").unwrap();
        assert!(matches!(
            backend.decompress(&packed, 5),
            Err(BitplaneError::Corrupt(_))
        ));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let backend = ZstdBackend::default();
        assert!(matches!(
            backend.decompress(&[1, 2, 3, 4, 5], 5),
            Err(BitplaneError::Corrupt(_))
        ));
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let backend = ZstdBackend::default();
        let packed = backend.compress(&vec![0u8; 1 << 20]).unwrap();
        assert!(packed.len() < 1024);
        assert!(matches!(
            backend.decompress(&packed, 16),
            Err(BitplaneError::Corrupt(_))
        ));
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let backend = ZstdBackend::default();
        let packed = backend.compress(b"abc").unwrap();
        assert!(matches!(
            backend.decompress(&packed, 64),
            Err(BitplaneError::Corrupt(_))
        ));
    }
}
