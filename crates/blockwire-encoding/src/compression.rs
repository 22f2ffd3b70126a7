//! Byte-array transforms for chunk data.
//!
//! Only one field on the wire is compressed: the column data carried by
//! the chunk packet. The protocol crate treats the transform as opaque and
//! goes through the [`ChunkCodec`] trait, so tests can swap in
//! [`Passthrough`] when they want to look at raw bytes.

use crate::EncodingError;

/// A reversible transform applied to chunk data on the wire.
pub trait ChunkCodec: Send + Sync + 'static {
    /// Transforms decoded bytes into their wire form.
    ///
    /// # Errors
    /// Returns [`EncodingError::Compression`] if the transform fails.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, EncodingError>;

    /// Transforms wire bytes back into decoded bytes.
    ///
    /// # Errors
    /// Returns [`EncodingError::Compression`] if the input is malformed.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, EncodingError>;
}

// ---------------------------------------------------------------------------
// Passthrough
// ---------------------------------------------------------------------------

/// Identity transform. Wire bytes are the decoded bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ChunkCodec for Passthrough {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, EncodingError> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, EncodingError> {
        Ok(data.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Zlib
// ---------------------------------------------------------------------------

/// Upper bound on a decompressed chunk unless `Zlib::with_limit` says
/// otherwise. A full beta column is 80 KiB.
pub const DEFAULT_CHUNK_LIMIT: usize = 4 * 1024 * 1024;

/// zlib (RFC 1950) via `flate2`.
///
/// Output is deterministic for a given input and level, so encoding the
/// same decoded chunk twice yields identical packets. Decompression stops
/// with [`EncodingError::ChunkTooLarge`] once the output passes `limit`.
#[cfg(feature = "zlib")]
#[derive(Debug, Clone, Copy)]
pub struct Zlib {
    level: u32,
    limit: usize,
}

#[cfg(feature = "zlib")]
impl Zlib {
    /// Creates a zlib transform with the given level (0–9, clamped).
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
            limit: DEFAULT_CHUNK_LIMIT,
        }
    }

    /// Caps decompressed output at `limit` bytes.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(feature = "zlib")]
impl Default for Zlib {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(feature = "zlib")]
impl ChunkCodec for Zlib {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, EncodingError> {
        use std::io::Write;

        use flate2::{Compression, write::ZlibEncoder};

        let mut encoder =
            ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(data).map_err(EncodingError::Compression)?;
        let out = encoder.finish().map_err(EncodingError::Compression)?;
        tracing::trace!(raw = data.len(), compressed = out.len(), "chunk compressed");
        Ok(out)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, EncodingError> {
        use std::io::Read;

        use flate2::read::ZlibDecoder;

        let cap = u64::try_from(self.limit).unwrap_or(u64::MAX).saturating_add(1);
        let mut out = Vec::new();
        ZlibDecoder::new(data)
            .take(cap)
            .read_to_end(&mut out)
            .map_err(EncodingError::Compression)?;
        if out.len() > self.limit {
            tracing::debug!(limit = self.limit, wire = data.len(), "chunk over limit");
            return Err(EncodingError::ChunkTooLarge { limit: self.limit });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_is_identity() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(Passthrough.compress(&data).unwrap(), data);
        assert_eq!(Passthrough.decompress(&data).unwrap(), data);
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_zlib_round_trip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 7) as u8).collect();
        let zlib = Zlib::default();
        let wire = zlib.compress(&data).unwrap();
        assert!(wire.len() < data.len());
        assert_eq!(zlib.decompress(&wire).unwrap(), data);
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_zlib_is_deterministic() {
        let data = b"the same column twice";
        let zlib = Zlib::default();
        assert_eq!(zlib.compress(data).unwrap(), zlib.compress(data).unwrap());
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_zlib_rejects_garbage() {
        let err = Zlib::default().decompress(b"definitely not zlib").unwrap_err();
        assert!(matches!(err, EncodingError::Compression(_)));
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_zlib_stops_at_the_limit() {
        let zlib = Zlib::default().with_limit(1024);
        let bomb = Zlib::default().compress(&[0u8; 8192]).unwrap();
        assert!(bomb.len() < 1024);
        let err = zlib.decompress(&bomb).unwrap_err();
        assert!(matches!(err, EncodingError::ChunkTooLarge { limit: 1024 }));
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_zlib_output_exactly_at_the_limit() {
        let zlib = Zlib::default().with_limit(1024);
        let wire = zlib.compress(&[9u8; 1024]).unwrap();
        assert_eq!(zlib.decompress(&wire).unwrap(), [9u8; 1024]);
        assert_eq!(Zlib::default().limit(), DEFAULT_CHUNK_LIMIT);
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_zlib_level_is_clamped() {
        let zlib = Zlib::new(42);
        let wire = zlib.compress(b"abc").unwrap();
        assert_eq!(zlib.decompress(&wire).unwrap(), b"abc");
    }
}
