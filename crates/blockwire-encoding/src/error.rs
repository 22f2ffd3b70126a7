//! Error types for the encoding layer.

/// Errors raised while transcoding text or transforming chunk bytes.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// The byte input is not a whole number of code units.
    #[error("{codec}: {len} bytes is not a multiple of {width}")]
    TruncatedUnit {
        codec: &'static str,
        len: usize,
        width: usize,
    },

    /// A code unit does not map to a character (e.g. a lone surrogate).
    #[error("{codec}: invalid code unit {unit:#06x}")]
    InvalidCodeUnit { codec: &'static str, unit: u32 },

    /// A character cannot be represented in this encoding.
    #[error("{codec}: character {ch:?} is not representable")]
    Unrepresentable { codec: &'static str, ch: char },

    /// Decompressed chunk data would exceed the configured limit.
    #[error("decompressed chunk exceeds {limit} bytes")]
    ChunkTooLarge { limit: usize },

    /// Compressing or decompressing chunk data failed.
    #[error("chunk compression failed: {0}")]
    Compression(#[source] std::io::Error),
}
