//! Error types for the protocol layer.
//!
//! Decoding distinguishes two kinds of failure. [`InsufficientData`]
//! means "the bytes so far are a valid prefix, send more"; everything
//! else means the stream is corrupt from this packet onward and the
//! caller should not try to resynchronize.
//!
//! [`InsufficientData`]: ProtocolError::InsufficientData

use blockwire_encoding::EncodingError;

use crate::Packet;

/// Errors that can occur while decoding or encoding packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The buffer ended before the current field was complete.
    ///
    /// Recoverable: retry from the same starting offset once at least
    /// `needed` more bytes are available.
    #[error("insufficient data: need {needed} more bytes")]
    InsufficientData { needed: usize },

    /// A decoded integer has no symbolic name in the field's table.
    #[error("invalid value {value} for enum field `{field}`")]
    InvalidEnumValue { field: &'static str, value: i64 },

    /// Fixed marker bytes did not match.
    #[error("bad sentinel in `{field}`: expected {expected:02x?}, found {found:02x?}")]
    InvalidSentinel {
        field: &'static str,
        expected: &'static [u8],
        found: Vec<u8>,
    },

    /// The opcode byte has no registered schema.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// Encode was asked for a packet name that is not registered.
    #[error("unknown packet name `{0}`")]
    UnknownPacketName(String),

    /// A field required by the schema was not supplied.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// A supplied value has the wrong shape for its field.
    #[error("field `{field}` expects {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    /// A numeric value does not fit the field's wire width.
    #[error("value {value} out of range for field `{field}`")]
    OutOfRange { field: &'static str, value: String },

    /// An enum field was given a name that is not in its table.
    #[error("unknown symbol `{symbol}` for enum field `{field}`")]
    UnknownSymbol { field: &'static str, symbol: String },

    /// A count field disagrees with the length of the data it describes.
    #[error("field `{field}` declares {declared} elements but has {actual}")]
    LengthMismatch {
        field: &'static str,
        declared: u64,
        actual: usize,
    },

    /// A string is longer than its `u16` character count can express.
    #[error("text field `{field}` has {chars} characters (max 65535)")]
    TextTooLong { field: &'static str, chars: usize },

    /// Metadata slot indices occupy five bits.
    #[error("metadata slot {0} does not fit in 5 bits")]
    MetadataSlotOutOfRange(u8),

    /// A non-first metadata entry whose header byte equals the list
    /// terminator; a decoder would stop before it.
    #[error("metadata entry in slot {0} has a header equal to the terminator")]
    AmbiguousMetadataEntry(u8),

    /// Text transcoding or chunk compression failed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The configuration names a text encoding that is not registered.
    #[error("unknown text encoding `{0}`")]
    UnknownTextEncoding(String),
}

impl ProtocolError {
    /// Returns `true` for the recoverable "need more bytes" condition.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// A bulk parse that hit a structural error part-way through a buffer.
///
/// Packets decoded before the failure are kept, in arrival order.
#[derive(Debug, thiserror::Error)]
#[error("bulk parse stopped at offset {offset} after {} packets: {source}", .packets.len())]
pub struct BulkError {
    pub packets: Vec<Packet>,
    /// Offset of the failing packet's opcode byte.
    pub offset: usize,
    /// The buffer from `offset` on.
    pub remaining: Vec<u8>,
    pub source: ProtocolError,
}
