//! Declarative field descriptors and the engine that interprets them.
//!
//! A packet schema is a slice of [`Field`]s. Decoding walks the slice in
//! order, reading each field from a [`Reader`] and inserting its value into
//! a [`Record`]; encoding walks the same slice, pulling values out of a
//! record and writing them to a buffer. Nothing is generated per packet:
//! one decoder and one encoder cover every schema.
//!
//! Fields that depend on earlier ones (array counts, conditional groups,
//! sized blobs) look those values up by name in the record being built
//! (when decoding) or the record being written (when encoding).

use std::fmt;

use blockwire_encoding::{ChunkCodec, TextCodec};
use bytes::BufMut;

use crate::composite::{decode_blob, decode_text, encode_blob, encode_text};
use crate::enums::EnumTable;
use crate::metadata::Metadata;
use crate::primitive::{Float, Int, Reader, decode_flag, encode_flag};
use crate::{ProtocolError, Record, Value};

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// A condition over already-known sibling fields.
#[derive(Clone, Copy)]
pub struct Predicate {
    /// Human-readable form, used in debug output.
    pub description: &'static str,
    pub test: fn(&Record) -> bool,
}

impl Predicate {
    pub fn holds(&self, record: &Record) -> bool {
        (self.test)(record)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.description)
    }
}

/// How to read and write one field.
#[derive(Debug, Clone, Copy)]
pub enum Field {
    /// A fixed-width integer.
    Int(&'static str, Int),
    /// An IEEE-754 float.
    Float(&'static str, Float),
    /// A one-byte flag.
    Bool(&'static str),
    /// An integer exposed through a symbolic table.
    Enum(&'static str, Int, &'static EnumTable),
    /// A `u16` character count followed by fixed-width text.
    Text(&'static str),
    /// A length prefix of the given width followed by raw bytes.
    Blob(&'static str, Int),
    /// Like [`Field::Blob`], but the body goes through the chunk codec.
    Compressed(&'static str, Int),
    /// Raw bytes whose length is `scale` times an earlier sibling field.
    Sized {
        name: &'static str,
        len_from: &'static str,
        scale: usize,
    },
    /// `count_from` repetitions of `element`. Named after the element.
    Array {
        count_from: &'static str,
        element: &'static Field,
    },
    /// A nested sub-structure, exposed as its own [`Record`].
    Struct(&'static str, &'static [Field]),
    /// A sub-structure whose fields are spliced into the parent record.
    Embed(&'static [Field]),
    /// Fields present only when the predicate holds. Spliced into the
    /// parent like [`Field::Embed`]; absent fields consume nothing.
    If(Predicate, &'static [Field]),
    /// Fixed marker bytes, consumed and produced but never exposed.
    Magic(&'static str, &'static [u8]),
    /// An entity metadata list.
    Metadata(&'static str),
}

impl Field {
    /// The record key this field is stored under.
    ///
    /// Spliced fields ([`Field::Embed`], [`Field::If`]) have no key of
    /// their own and report a descriptive label instead.
    pub fn name(&self) -> &'static str {
        match *self {
            Self::Int(name, _)
            | Self::Float(name, _)
            | Self::Bool(name)
            | Self::Enum(name, _, _)
            | Self::Text(name)
            | Self::Blob(name, _)
            | Self::Compressed(name, _)
            | Self::Sized { name, .. }
            | Self::Struct(name, _)
            | Self::Magic(name, _)
            | Self::Metadata(name) => name,
            Self::Array { element, .. } => element.name(),
            Self::Embed(_) => "embedded",
            Self::If(predicate, _) => predicate.description,
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The external transforms the engine delegates to.
#[derive(Clone, Copy)]
pub struct Encodings<'a> {
    pub text: &'a dyn TextCodec,
    pub chunk: &'a dyn ChunkCodec,
}

impl fmt::Debug for Encodings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encodings")
            .field("text", &self.text.name())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes `fields` in order, inserting values into `out`.
///
/// On error neither `r` nor `out` is touched: the reader stays where it
/// was and no partial fields are inserted.
pub fn decode_fields(
    fields: &[Field],
    r: &mut Reader<'_>,
    out: &mut Record,
    enc: Encodings<'_>,
) -> Result<(), ProtocolError> {
    let mut ahead = r.clone();
    let mut staged = out.clone();
    decode_seq(fields, &mut ahead, &mut staged, enc)?;
    *r = ahead;
    *out = staged;
    Ok(())
}

fn decode_seq(
    fields: &[Field],
    r: &mut Reader<'_>,
    out: &mut Record,
    enc: Encodings<'_>,
) -> Result<(), ProtocolError> {
    for field in fields {
        decode_field(field, r, out, enc)?;
    }
    Ok(())
}

fn decode_field(
    field: &Field,
    r: &mut Reader<'_>,
    out: &mut Record,
    enc: Encodings<'_>,
) -> Result<(), ProtocolError> {
    match *field {
        Field::Embed(fields) => decode_seq(fields, r, out, enc),
        Field::If(predicate, fields) => {
            if predicate.holds(out) {
                decode_seq(fields, r, out, enc)
            } else {
                Ok(())
            }
        }
        Field::Magic(name, expected) => {
            let found = r.take(expected.len())?;
            if found == expected {
                Ok(())
            } else {
                Err(ProtocolError::InvalidSentinel {
                    field: name,
                    expected,
                    found: found.to_vec(),
                })
            }
        }
        _ => {
            let value = decode_value(field, r, out, enc)?;
            out.insert(field.name(), value);
            Ok(())
        }
    }
}

/// Decodes a single field as a standalone value.
///
/// `siblings` is the record decoded so far, used for counts and lengths.
fn decode_value(
    field: &Field,
    r: &mut Reader<'_>,
    siblings: &Record,
    enc: Encodings<'_>,
) -> Result<Value, ProtocolError> {
    match *field {
        Field::Int(_, kind) => kind.decode(r),
        Field::Float(_, kind) => kind.decode(r),
        Field::Bool(_) => Ok(Value::Bool(decode_flag(r)?)),
        Field::Enum(name, kind, table) => {
            let raw = kind.read_raw(r)?;
            let value = i64::try_from(raw).unwrap_or(i64::MAX);
            table
                .symbol(value)
                .map(Value::symbol)
                .ok_or(ProtocolError::InvalidEnumValue { field: name, value })
        }
        Field::Text(_) => Ok(Value::Text(decode_text(r, enc.text)?)),
        Field::Blob(_, len) => Ok(Value::Bytes(decode_blob(r, len)?.to_vec())),
        Field::Compressed(_, len) => {
            let wire = decode_blob(r, len)?;
            Ok(Value::Bytes(enc.chunk.decompress(wire)?))
        }
        Field::Sized {
            len_from, scale, ..
        } => {
            let n = count_of(siblings, len_from)?.saturating_mul(scale);
            Ok(Value::Bytes(r.take(n)?.to_vec()))
        }
        Field::Array {
            count_from,
            element,
        } => {
            let count = count_of(siblings, count_from)?;
            // Cap the preallocation; the count comes off the wire.
            let mut items = Vec::with_capacity(count.min(256));
            let empty = Record::new();
            for _ in 0..count {
                items.push(decode_value(element, r, &empty, enc)?);
            }
            Ok(Value::List(items))
        }
        Field::Struct(_, fields) => {
            let mut inner = Record::new();
            decode_seq(fields, r, &mut inner, enc)?;
            Ok(Value::Record(inner))
        }
        Field::Metadata(_) => Ok(Value::Metadata(Metadata::decode(r, enc.text)?)),
        Field::Embed(_) | Field::If(..) | Field::Magic(..) => {
            let mut inner = Record::new();
            decode_field(field, r, &mut inner, enc)?;
            Ok(Value::Record(inner))
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes `fields` in order, reading values from `record`.
pub fn encode_fields(
    fields: &[Field],
    record: &Record,
    buf: &mut impl BufMut,
    enc: Encodings<'_>,
) -> Result<(), ProtocolError> {
    for field in fields {
        encode_field(field, record, buf, enc)?;
    }
    Ok(())
}

fn encode_field(
    field: &Field,
    record: &Record,
    buf: &mut impl BufMut,
    enc: Encodings<'_>,
) -> Result<(), ProtocolError> {
    match *field {
        Field::Embed(fields) => encode_fields(fields, record, buf, enc),
        Field::If(predicate, fields) => {
            if predicate.holds(record) {
                encode_fields(fields, record, buf, enc)
            } else {
                Ok(())
            }
        }
        // Always the canonical marker, whatever the record says.
        Field::Magic(_, bytes) => {
            buf.put_slice(bytes);
            Ok(())
        }
        _ => {
            let name = field.name();
            let value = record
                .get(name)
                .ok_or_else(|| ProtocolError::MissingField(name.to_owned()))?;
            encode_value(field, value, record, buf, enc)
        }
    }
}

fn encode_value(
    field: &Field,
    value: &Value,
    siblings: &Record,
    buf: &mut impl BufMut,
    enc: Encodings<'_>,
) -> Result<(), ProtocolError> {
    match *field {
        Field::Int(name, kind) => kind.encode(name, value, buf),
        Field::Float(name, kind) => kind.encode(name, value, buf),
        Field::Bool(name) => {
            let flag = value.as_bool().ok_or(ProtocolError::TypeMismatch {
                field: name,
                expected: "a bool",
            })?;
            encode_flag(flag, buf);
            Ok(())
        }
        Field::Enum(name, kind, table) => {
            let symbol = value.as_str().ok_or(ProtocolError::TypeMismatch {
                field: name,
                expected: "an enum symbol",
            })?;
            let raw = table.value(symbol).ok_or_else(|| ProtocolError::UnknownSymbol {
                field: name,
                symbol: symbol.to_owned(),
            })?;
            kind.write_raw(name, i128::from(raw), buf)
        }
        Field::Text(name) => match value {
            Value::Text(text) => encode_text(name, text, enc.text, buf),
            _ => Err(ProtocolError::TypeMismatch {
                field: name,
                expected: "text",
            }),
        },
        Field::Blob(name, len) => encode_blob(name, bytes_of(name, value)?, len, buf),
        Field::Compressed(name, len) => {
            let wire = enc.chunk.compress(bytes_of(name, value)?)?;
            encode_blob(name, &wire, len, buf)
        }
        Field::Sized {
            name,
            len_from,
            scale,
        } => {
            let data = bytes_of(name, value)?;
            let declared = count_of(siblings, len_from)?;
            if declared.saturating_mul(scale) != data.len() {
                return Err(ProtocolError::LengthMismatch {
                    field: name,
                    declared: declared as u64,
                    actual: data.len() / scale.max(1),
                });
            }
            buf.put_slice(data);
            Ok(())
        }
        Field::Array {
            count_from,
            element,
        } => {
            let name = element.name();
            let items = value.as_list().ok_or(ProtocolError::TypeMismatch {
                field: name,
                expected: "a list",
            })?;
            let declared = count_of(siblings, count_from)?;
            if declared != items.len() {
                return Err(ProtocolError::LengthMismatch {
                    field: name,
                    declared: declared as u64,
                    actual: items.len(),
                });
            }
            for item in items {
                encode_value(element, item, siblings, buf, enc)?;
            }
            Ok(())
        }
        Field::Struct(name, fields) => {
            let inner = record_of(name, value)?;
            encode_fields(fields, inner, buf, enc)
        }
        Field::Metadata(name) => {
            let meta = value.as_metadata().ok_or(ProtocolError::TypeMismatch {
                field: name,
                expected: "metadata",
            })?;
            meta.encode(enc.text, buf)
        }
        Field::Embed(_) | Field::If(..) | Field::Magic(..) => {
            let inner = record_of(field.name(), value)?;
            encode_field(field, inner, buf, enc)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reads a previously decoded (or supplied) count field.
fn count_of(record: &Record, name: &'static str) -> Result<usize, ProtocolError> {
    let value = record
        .get(name)
        .ok_or_else(|| ProtocolError::MissingField(name.to_owned()))?;
    let n = value.as_u64().ok_or(ProtocolError::TypeMismatch {
        field: name,
        expected: "a non-negative count",
    })?;
    Ok(usize::try_from(n).unwrap_or(usize::MAX))
}

fn bytes_of<'v>(name: &'static str, value: &'v Value) -> Result<&'v [u8], ProtocolError> {
    value.as_bytes().ok_or(ProtocolError::TypeMismatch {
        field: name,
        expected: "bytes",
    })
}

fn record_of<'v>(name: &'static str, value: &'v Value) -> Result<&'v Record, ProtocolError> {
    value.as_record().ok_or(ProtocolError::TypeMismatch {
        field: name,
        expected: "a record",
    })
}
