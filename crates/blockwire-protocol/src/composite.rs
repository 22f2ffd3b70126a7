//! Length-prefixed composite codecs: text and opaque byte blobs.
//!
//! Both read a prefix and then a body. They work on a copy of the reader
//! and only commit it once the body is fully available, so a short buffer
//! leaves the caller's offset on the prefix.

use blockwire_encoding::TextCodec;
use bytes::BufMut;

use crate::ProtocolError;
use crate::primitive::{Int, Reader};

/// Reads a `u16` character count, then `count * width` bytes of text.
pub fn decode_text(
    r: &mut Reader<'_>,
    codec: &dyn TextCodec,
) -> Result<String, ProtocolError> {
    let mut ahead = r.clone();
    let chars = usize::from(ahead.read_u16()?);
    let bytes = ahead.take(chars * codec.bytes_per_char())?;
    let text = codec.decode(bytes)?;
    *r = ahead;
    Ok(text)
}

/// Writes a `u16` character count followed by the encoded text.
///
/// The count is the number of characters, recovered from the encoded
/// length by dividing by the codec's fixed width. It is never the UTF-8
/// byte length of `text`.
pub fn encode_text(
    field: &'static str,
    text: &str,
    codec: &dyn TextCodec,
    buf: &mut impl BufMut,
) -> Result<(), ProtocolError> {
    let bytes = codec.encode(text)?;
    let chars = bytes.len() / codec.bytes_per_char();
    let count = u16::try_from(chars)
        .map_err(|_| ProtocolError::TextTooLong { field, chars })?;
    buf.put_u16(count);
    buf.put_slice(&bytes);
    Ok(())
}

/// Reads a length of the given (unsigned) width, then exactly that many
/// bytes.
pub fn decode_blob<'a>(
    r: &mut Reader<'a>,
    len: Int,
) -> Result<&'a [u8], ProtocolError> {
    let mut ahead = r.clone();
    let n = len.read_raw(&mut ahead)?;
    let bytes = ahead.take(usize::try_from(n).unwrap_or(usize::MAX))?;
    *r = ahead;
    Ok(bytes)
}

/// Writes a length of the given width followed by the bytes.
pub fn encode_blob(
    field: &'static str,
    data: &[u8],
    len: Int,
    buf: &mut impl BufMut,
) -> Result<(), ProtocolError> {
    let n = i128::try_from(data.len()).map_err(|_| ProtocolError::OutOfRange {
        field,
        value: data.len().to_string(),
    })?;
    len.write_raw(field, n, buf)?;
    buf.put_slice(data);
    Ok(())
}
