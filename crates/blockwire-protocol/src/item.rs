//! The item-stack sub-schema.
//!
//! ```text
//! primary: i16 ─┬─ < 0  → empty slot, nothing else follows
//!               └─ >= 0 → count: u8, secondary: u16, 0xFF 0xFF
//! ```
//!
//! Packets splice these fields directly into their own record (see
//! [`ITEM_STACK`]); the inventory packet carries a list of them, each as its
//! own record.

use crate::field::{Field, Predicate};
use crate::primitive::Int;
use crate::{ProtocolError, Record, Value};

/// The two marker bytes that close a non-empty item stack.
pub const ITEM_SENTINEL: &[u8] = &[0xff, 0xff];

fn has_item(record: &Record) -> bool {
    record
        .get("primary")
        .and_then(Value::as_i64)
        .is_some_and(|primary| primary >= 0)
}

/// Extended fields are present iff `primary >= 0`.
pub const HAS_ITEM: Predicate = Predicate {
    description: "primary >= 0",
    test: has_item,
};

const ITEM_EXTENSION: &[Field] = &[
    Field::Int("count", Int::U8),
    Field::Int("secondary", Int::U16),
    Field::Magic("item_information", ITEM_SENTINEL),
];

/// Field layout of one item stack.
pub const ITEM_STACK: &[Field] = &[
    Field::Int("primary", Int::I16),
    Field::If(HAS_ITEM, ITEM_EXTENSION),
];

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// A typed view of the item-stack fields in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStack {
    /// An empty slot. `primary` is negative (conventionally -1).
    Empty { primary: i16 },
    Present {
        primary: i16,
        count: u8,
        secondary: u16,
    },
}

impl ItemStack {
    /// The conventional empty slot.
    pub const EMPTY: Self = Self::Empty { primary: -1 };

    /// A stack of `count` items with id `primary` and damage/data
    /// `secondary`. Negative ids produce an empty slot.
    pub fn new(primary: i16, count: u8, secondary: u16) -> Self {
        if primary < 0 {
            Self::Empty { primary }
        } else {
            Self::Present {
                primary,
                count,
                secondary,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    /// Bytes this stack occupies on the wire.
    pub fn wire_len(&self) -> usize {
        match self {
            Self::Empty { .. } => 2,
            Self::Present { .. } => 2 + 1 + 2 + ITEM_SENTINEL.len(),
        }
    }

    /// Reads the item-stack fields out of a record.
    ///
    /// # Errors
    /// [`ProtocolError::MissingField`] if a required field is absent, or
    /// [`ProtocolError::OutOfRange`] if a value does not fit its width.
    pub fn from_record(record: &Record) -> Result<Self, ProtocolError> {
        let primary: i16 = field_as(record, "primary")?;
        if primary < 0 {
            return Ok(Self::Empty { primary });
        }
        Ok(Self::Present {
            primary,
            count: field_as(record, "count")?,
            secondary: field_as(record, "secondary")?,
        })
    }

    /// Writes the item-stack fields into `record`.
    ///
    /// Extended fields left over from a previous non-empty stack are
    /// removed when writing an empty one.
    pub fn write_to(&self, record: &mut Record) {
        match *self {
            Self::Empty { primary } => {
                record.insert("primary", primary);
                record.remove("count");
                record.remove("secondary");
            }
            Self::Present {
                primary,
                count,
                secondary,
            } => {
                record.insert("primary", primary);
                record.insert("count", count);
                record.insert("secondary", secondary);
            }
        }
    }

    /// The item-stack fields as a standalone record (an inventory entry).
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        self.write_to(&mut record);
        record
    }
}

impl From<ItemStack> for Value {
    fn from(item: ItemStack) -> Self {
        Value::Record(item.into_record())
    }
}

fn field_as<T: TryFrom<i64>>(record: &Record, name: &'static str) -> Result<T, ProtocolError> {
    let value = record
        .get(name)
        .ok_or_else(|| ProtocolError::MissingField(name.to_owned()))?;
    let raw = value.as_i64().ok_or(ProtocolError::TypeMismatch {
        field: name,
        expected: "an integer",
    })?;
    T::try_from(raw).map_err(|_| ProtocolError::OutOfRange {
        field: name,
        value: raw.to_string(),
    })
}
