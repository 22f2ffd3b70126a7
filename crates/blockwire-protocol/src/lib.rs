//! Packet codec for the Blockwire game protocol.
//!
//! Every packet is one opcode byte followed by a payload whose layout is
//! fixed per opcode. This crate knows all of those layouts and converts
//! between raw bytes and named field values:
//!
//! - **Values** ([`Value`], [`Record`], [`Metadata`], [`ItemStack`]) — the
//!   decoded form of a payload.
//! - **Registry** ([`registry`], [`Schema`], [`Field`]) — the static
//!   opcode → layout table, described declaratively and interpreted by
//!   one generic engine.
//! - **Codec** ([`PacketCodec`], [`PacketStream`]) — bulk and incremental
//!   decoding of byte streams, and building packets by name.
//! - **Errors** ([`ProtocolError`]) — "need more bytes" versus everything
//!   else.
//!
//! # Architecture
//!
//! ```text
//! primitive (ints, floats, flags)
//!     → composite (text, blobs)
//!         → item / metadata sub-schemas
//!             → field engine + registry
//!                 → codec (bulk, incremental, build)
//! ```
//!
//! The codec does no I/O. Feed it whatever the transport has read so far
//! and keep the leftovers for the next call:
//!
//! ```rust
//! use blockwire_protocol::{Record, make_packet, parse_packets};
//!
//! let bytes = make_packet("chat", &Record::new().with("message", "hello"), &[]).unwrap();
//! let (packets, leftovers) = parse_packets(&bytes[..4]).unwrap();
//! assert!(packets.is_empty());
//! assert_eq!(leftovers, &bytes[..4]);
//! ```
//!
//! # Feature Flags
//!
//! - `zlib` (default) — compress chunk column data with zlib

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod composite;
mod config;
mod error;
mod field;
mod item;
mod metadata;
mod primitive;
mod registry;
mod value;

pub mod enums;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{
    Packet, PacketCodec, PacketStream, default_codec, make_error_packet, make_packet,
    parse_packets, parse_packets_incrementally,
};
pub use config::{ChunkCompression, CodecConfig};
pub use error::{BulkError, ProtocolError};
pub use field::{Encodings, Field, Predicate, decode_fields, encode_fields};
pub use item::{ITEM_SENTINEL, ITEM_STACK, ItemStack};
pub use metadata::{Metadata, MetadataKind, MetadataValue, TERMINATOR};
pub use primitive::{Float, Int, Reader};
pub use registry::{PACKETS, Registry, Schema, registry};
pub use value::{Record, Value};
