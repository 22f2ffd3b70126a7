//! Entity metadata: a self-terminating list of typed slot values.
//!
//! # Wire format
//!
//! ```text
//! ┌──────────┬───────┐     ┌──────────┬───────┐ ┌──────┐
//! │ ttt sssss│ value │ ... │ ttt sssss│ value │ │ 0x7F │
//! └──────────┴───────┘     └──────────┴───────┘ └──────┘
//!   3-bit type, 5-bit slot
//! ```
//!
//! The list always has at least one entry. After each entry the decoder
//! peeks at the next byte: `0x7F` ends the list (and is consumed),
//! anything else is the header of another entry.

use std::collections::BTreeMap;

use blockwire_encoding::TextCodec;
use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::composite::{decode_text, encode_text};
use crate::primitive::{Reader, join_3_5, split_3_5};

/// The byte that ends a metadata list.
pub const TERMINATOR: u8 = 0x7f;

// ---------------------------------------------------------------------------
// Kinds and values
// ---------------------------------------------------------------------------

/// The seven value shapes selected by the 3-bit type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Byte,
    Short,
    Int,
    Float,
    String,
    Slot,
    Coords,
}

impl MetadataKind {
    /// Maps a type tag to its kind. Tag 7 is unassigned.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Byte),
            1 => Some(Self::Short),
            2 => Some(Self::Int),
            3 => Some(Self::Float),
            4 => Some(Self::String),
            5 => Some(Self::Slot),
            6 => Some(Self::Coords),
            _ => None,
        }
    }

    pub const fn tag(self) -> u8 {
        match self {
            Self::Byte => 0,
            Self::Short => 1,
            Self::Int => 2,
            Self::Float => 3,
            Self::String => 4,
            Self::Slot => 5,
            Self::Coords => 6,
        }
    }

    /// The type name callers see: `"byte"`, `"short"`, and so on.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Slot => "slot",
            Self::Coords => "coords",
        }
    }
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One metadata value. The variant is the type; the payload is the value.
///
/// Integer kinds are unsigned on the wire. The slot kind carries its item
/// fields unconditionally (no empty-slot short form here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetadataValue {
    Byte(u8),
    Short(u16),
    Int(u32),
    Float(f32),
    String(String),
    Slot { primary: u16, count: u8, secondary: u16 },
    Coords { x: u32, y: u32, z: u32 },
}

impl MetadataValue {
    pub fn kind(&self) -> MetadataKind {
        match self {
            Self::Byte(_) => MetadataKind::Byte,
            Self::Short(_) => MetadataKind::Short,
            Self::Int(_) => MetadataKind::Int,
            Self::Float(_) => MetadataKind::Float,
            Self::String(_) => MetadataKind::String,
            Self::Slot { .. } => MetadataKind::Slot,
            Self::Coords { .. } => MetadataKind::Coords,
        }
    }

    /// Shorthand for `self.kind().name()`.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    fn decode(
        kind: MetadataKind,
        r: &mut Reader<'_>,
        text: &dyn TextCodec,
    ) -> Result<Self, ProtocolError> {
        Ok(match kind {
            MetadataKind::Byte => Self::Byte(r.read_u8()?),
            MetadataKind::Short => Self::Short(r.read_u16()?),
            MetadataKind::Int => Self::Int(r.read_u32()?),
            MetadataKind::Float => Self::Float(r.read_f32()?),
            MetadataKind::String => Self::String(decode_text(r, text)?),
            MetadataKind::Slot => Self::Slot {
                primary: r.read_u16()?,
                count: r.read_u8()?,
                secondary: r.read_u16()?,
            },
            MetadataKind::Coords => Self::Coords {
                x: r.read_u32()?,
                y: r.read_u32()?,
                z: r.read_u32()?,
            },
        })
    }

    fn encode(
        &self,
        text: &dyn TextCodec,
        buf: &mut impl BufMut,
    ) -> Result<(), ProtocolError> {
        match self {
            Self::Byte(v) => buf.put_u8(*v),
            Self::Short(v) => buf.put_u16(*v),
            Self::Int(v) => buf.put_u32(*v),
            Self::Float(v) => buf.put_f32(*v),
            Self::String(s) => encode_text("metadata", s, text, buf)?,
            Self::Slot {
                primary,
                count,
                secondary,
            } => {
                buf.put_u16(*primary);
                buf.put_u8(*count);
                buf.put_u16(*secondary);
            }
            Self::Coords { x, y, z } => {
                buf.put_u32(*x);
                buf.put_u32(*y);
                buf.put_u32(*z);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Decoded metadata: slot index (0–31) → typed value.
///
/// Wire order is not preserved. Encoding always writes slots in
/// ascending order, so the same map always produces the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<u8, MetadataValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: u8, value: MetadataValue) -> Self {
        self.insert(slot, value);
        self
    }

    pub fn insert(&mut self, slot: u8, value: MetadataValue) -> Option<MetadataValue> {
        self.0.insert(slot, value)
    }

    pub fn get(&self, slot: u8) -> Option<&MetadataValue> {
        self.0.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &MetadataValue)> {
        self.0.iter().map(|(slot, value)| (*slot, value))
    }

    /// Decodes one metadata list, including its terminator.
    ///
    /// A list whose only entry is `(slot 0, byte 0)` decodes as empty:
    /// that is exactly what [`Metadata::encode`] writes for an empty map.
    pub fn decode(
        r: &mut Reader<'_>,
        text: &dyn TextCodec,
    ) -> Result<Self, ProtocolError> {
        let mut ahead = r.clone();
        let mut entries = Vec::new();
        loop {
            let (tag, slot) = split_3_5(ahead.read_u8()?);
            let kind = MetadataKind::from_tag(tag).ok_or(
                ProtocolError::InvalidEnumValue {
                    field: "metadata type",
                    value: i64::from(tag),
                },
            )?;
            entries.push((slot, MetadataValue::decode(kind, &mut ahead, text)?));

            // One byte of lookahead; the reader is not advanced.
            if ahead.peek_u8()? == TERMINATOR {
                break;
            }
        }
        ahead.read_u8()?;
        *r = ahead;

        if let [(0, MetadataValue::Byte(0))] = entries.as_slice() {
            return Ok(Self::new());
        }
        Ok(Self(entries.into_iter().collect()))
    }

    /// Encodes the list and its terminator.
    ///
    /// An empty map is written as a single `(slot 0, byte 0)` entry, since
    /// the wire form cannot express zero entries.
    pub fn encode(
        &self,
        text: &dyn TextCodec,
        buf: &mut impl BufMut,
    ) -> Result<(), ProtocolError> {
        let placeholder = MetadataValue::Byte(0);
        let mut entries: Vec<Entry<'_>> = if self.is_empty() {
            vec![Entry {
                slot: 0,
                value: &placeholder,
                last: false,
            }]
        } else {
            self.iter()
                .map(|(slot, value)| Entry {
                    slot,
                    value,
                    last: false,
                })
                .collect()
        };
        // The decoder stops on lookahead; here the final entry is flagged
        // explicitly instead.
        if let Some(final_entry) = entries.last_mut() {
            final_entry.last = true;
        }

        // Validate before writing anything.
        for (i, entry) in entries.iter().enumerate() {
            if entry.slot > 0x1f {
                return Err(ProtocolError::MetadataSlotOutOfRange(entry.slot));
            }
            if i > 0 && entry.header() == TERMINATOR {
                return Err(ProtocolError::AmbiguousMetadataEntry(entry.slot));
            }
        }

        for entry in &entries {
            buf.put_u8(entry.header());
            entry.value.encode(text, buf)?;
            if entry.last {
                buf.put_u8(TERMINATOR);
            }
        }
        Ok(())
    }
}

/// One entry as it is about to be written.
struct Entry<'a> {
    slot: u8,
    value: &'a MetadataValue,
    last: bool,
}

impl Entry<'_> {
    fn header(&self) -> u8 {
        join_3_5(self.value.kind().tag(), self.slot)
    }
}

impl FromIterator<(u8, MetadataValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (u8, MetadataValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
