//! Codec configuration.

use blockwire_encoding::DEFAULT_CHUNK_LIMIT;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChunkCompression
// ---------------------------------------------------------------------------

/// The transform applied to compressed chunk fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkCompression {
    /// zlib, as the game client expects. Falls back to passthrough when the
    /// crate is built without the `zlib` feature.
    #[default]
    Zlib,

    /// Chunk bytes are carried as-is.
    Passthrough,
}

// ---------------------------------------------------------------------------
// CodecConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`PacketCodec`](crate::PacketCodec).
///
/// Every field has a default, so a partial JSON/TOML document is enough:
///
/// ```rust
/// use blockwire_protocol::CodecConfig;
///
/// let config = CodecConfig {
///     dump_packets: true,
///     ..CodecConfig::default()
/// };
/// assert_eq!(config.text_encoding, "ucs2");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Log every parsed and built packet at `debug` level.
    pub dump_packets: bool,

    /// Name of the text codec used for string fields.
    pub text_encoding: String,

    /// Transform for chunk column data.
    pub chunk_compression: ChunkCompression,

    /// zlib level (0-9) used when building chunk packets.
    pub compression_level: u32,

    /// Largest decompressed chunk accepted when parsing, in bytes.
    pub max_chunk_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            dump_packets: false,
            text_encoding: "ucs2".to_owned(),
            chunk_compression: ChunkCompression::Zlib,
            compression_level: 6,
            max_chunk_size: DEFAULT_CHUNK_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert!(!config.dump_packets);
        assert_eq!(config.text_encoding, "ucs2");
        assert_eq!(config.chunk_compression, ChunkCompression::Zlib);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: CodecConfig =
            serde_json::from_str(r#"{ "chunk_compression": "passthrough" }"#).unwrap();
        assert_eq!(config.chunk_compression, ChunkCompression::Passthrough);
        assert_eq!(config.text_encoding, "ucs2");
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.max_chunk_size, DEFAULT_CHUNK_LIMIT);
    }
}
