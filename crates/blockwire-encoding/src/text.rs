//! Fixed-width text transcoding.
//!
//! Strings on the wire are a `u16` character count followed by the
//! characters themselves, each written as a single 16-bit code unit
//! (Java's `writeChar`). The protocol crate needs to turn a character
//! count into a byte count and back, so every [`TextCodec`] here is
//! fixed-width: it reports how many bytes one character occupies and
//! guarantees that width for every character it accepts.

use crate::EncodingError;

/// A fixed-width text encoding, looked up by name via [`text_codec`].
pub trait TextCodec: Send + Sync + 'static {
    /// The name this codec is registered under.
    fn name(&self) -> &'static str;

    /// Bytes per encoded character. Constant for every character.
    fn bytes_per_char(&self) -> usize;

    /// Decodes a byte slice into text.
    ///
    /// # Errors
    /// Returns an [`EncodingError`] if `bytes` is not a whole number of
    /// characters or contains a unit that does not map to a character.
    fn decode(&self, bytes: &[u8]) -> Result<String, EncodingError>;

    /// Encodes text into bytes.
    ///
    /// # Errors
    /// Returns an [`EncodingError`] if a character cannot be represented
    /// in `bytes_per_char` bytes.
    fn encode(&self, text: &str) -> Result<Vec<u8>, EncodingError>;
}

// ---------------------------------------------------------------------------
// Ucs2
// ---------------------------------------------------------------------------

/// Big-endian UCS-2: one 16-bit unit per character, BMP only.
///
/// Surrogates are rejected in both directions. Accepting a surrogate pair
/// would make one character occupy four bytes and break the character
/// count carried in the length prefix.
///
/// ```rust
/// use blockwire_encoding::{TextCodec, Ucs2};
///
/// let bytes = Ucs2.encode("hi").unwrap();
/// assert_eq!(bytes, [0x00, b'h', 0x00, b'i']);
/// assert_eq!(Ucs2.decode(&bytes).unwrap(), "hi");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Ucs2;

impl TextCodec for Ucs2 {
    fn name(&self) -> &'static str {
        "ucs2"
    }

    fn bytes_per_char(&self) -> usize {
        2
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, EncodingError> {
        if bytes.len() % 2 != 0 {
            return Err(EncodingError::TruncatedUnit {
                codec: self.name(),
                len: bytes.len(),
                width: 2,
            });
        }

        bytes
            .chunks_exact(2)
            .map(|pair| {
                let unit = u32::from(u16::from_be_bytes([pair[0], pair[1]]));
                char::from_u32(unit).ok_or(EncodingError::InvalidCodeUnit {
                    codec: self.name(),
                    unit,
                })
            })
            .collect()
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>, EncodingError> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for ch in text.chars() {
            let unit = u16::try_from(u32::from(ch)).map_err(|_| {
                EncodingError::Unrepresentable {
                    codec: self.name(),
                    ch,
                }
            })?;
            out.extend_from_slice(&unit.to_be_bytes());
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

static UCS2: Ucs2 = Ucs2;

/// Looks up a registered text codec by name.
///
/// Returns `None` for unknown names; callers decide whether that is a
/// configuration error.
pub fn text_codec(name: &str) -> Option<&'static dyn TextCodec> {
    match name {
        "ucs2" | "ucs-2" => Some(&UCS2),
        _ => None,
    }
}
