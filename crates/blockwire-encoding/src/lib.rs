//! External collaborators for the Blockwire packet codec.
//!
//! The codec itself only knows about field layouts. Two transforms it
//! needs live here, behind traits so they can be swapped:
//!
//! - **Text** ([`TextCodec`], [`Ucs2`]) — fixed-width string transcoding,
//!   looked up by name with [`text_codec`].
//! - **Chunk data** ([`ChunkCodec`], [`Passthrough`], `Zlib`) — the
//!   opaque byte transform applied to chunk columns.
//!
//! # Feature Flags
//!
//! - `zlib` (default) — zlib chunk compression via `flate2`

mod compression;
mod error;
mod text;

#[cfg(feature = "zlib")]
pub use compression::Zlib;
pub use compression::{ChunkCodec, DEFAULT_CHUNK_LIMIT, Passthrough};
pub use error::EncodingError;
pub use text::{TextCodec, Ucs2, text_codec};
