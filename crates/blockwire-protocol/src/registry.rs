//! The packet registry: every opcode, its name, and its field layout.
//!
//! The table is fixed at compile time. [`Registry`] indexes it both ways
//! (opcode → schema for decoding, name → opcode for encoding) and is built
//! once per process; see [`registry`].

use std::collections::HashMap;
use std::sync::LazyLock;

use bytes::BufMut;

use crate::enums::{
    ACTION, ANIMATION, DIFFICULTY, DIG_STATE, DIMENSION, EFFECT, ENTITY_STATUS,
    FACE, GAME_STATE, MOB, MODE, SOUND, VEHICLE, WINDOW,
};
use crate::field::{Encodings, Field, decode_fields, encode_fields};
use crate::item::ITEM_STACK;
use crate::primitive::{Float, Int, Reader};
use crate::{ProtocolError, Record};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// The layout of one packet's payload.
#[derive(Debug)]
pub struct Schema {
    pub opcode: u8,
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    /// Decodes a payload (without the opcode byte).
    pub fn decode(
        &self,
        r: &mut Reader<'_>,
        enc: Encodings<'_>,
    ) -> Result<Record, ProtocolError> {
        let mut payload = Record::new();
        decode_fields(self.fields, r, &mut payload, enc)?;
        Ok(payload)
    }

    /// Encodes a payload (without the opcode byte).
    pub fn encode(
        &self,
        payload: &Record,
        buf: &mut impl BufMut,
        enc: Encodings<'_>,
    ) -> Result<(), ProtocolError> {
        encode_fields(self.fields, payload, buf, enc)
    }
}

// ---------------------------------------------------------------------------
// Shared sub-structures
// ---------------------------------------------------------------------------

const GROUNDED: &[Field] = &[Field::Int("grounded", Int::U8)];

const POSITION: &[Field] = &[
    Field::Float("x", Float::F64),
    Field::Float("y", Float::F64),
    Field::Float("stance", Float::F64),
    Field::Float("z", Float::F64),
];

const ORIENTATION: &[Field] = &[
    Field::Float("rotation", Float::F32),
    Field::Float("pitch", Float::F32),
];

const FACE_FIELD: Field = Field::Enum("face", Int::I8, &FACE);
const DIMENSION_FIELD: Field = Field::Enum("dimension", Int::U8, &DIMENSION);
const DIFFICULTY_FIELD: Field = Field::Enum("difficulty", Int::U8, &DIFFICULTY);
const MODE_FIELD: Field = Field::Enum("mode", Int::U8, &MODE);
const EFFECT_FIELD: Field = Field::Enum("effect", Int::U8, &EFFECT);

const fn u8f(name: &'static str) -> Field {
    Field::Int(name, Int::U8)
}

const fn i8f(name: &'static str) -> Field {
    Field::Int(name, Int::I8)
}

const fn u16f(name: &'static str) -> Field {
    Field::Int(name, Int::U16)
}

const fn i16f(name: &'static str) -> Field {
    Field::Int(name, Int::I16)
}

const fn u32f(name: &'static str) -> Field {
    Field::Int(name, Int::U32)
}

const fn i32f(name: &'static str) -> Field {
    Field::Int(name, Int::I32)
}

const fn u64f(name: &'static str) -> Field {
    Field::Int(name, Int::U64)
}

const fn f32f(name: &'static str) -> Field {
    Field::Float(name, Float::F32)
}

const fn f64f(name: &'static str) -> Field {
    Field::Float(name, Float::F64)
}

const fn text(name: &'static str) -> Field {
    Field::Text(name)
}

// ---------------------------------------------------------------------------
// Packet table
// ---------------------------------------------------------------------------

/// Every registered packet, in opcode order.
pub static PACKETS: &[Schema] = &[
    Schema {
        opcode: 0,
        name: "ping",
        fields: &[u32f("pid")],
    },
    Schema {
        opcode: 1,
        name: "login",
        fields: &[
            u32f("eid"),
            // default, flat, largeBiomes
            text("leveltype"),
            MODE_FIELD,
            DIMENSION_FIELD,
            DIFFICULTY_FIELD,
            u8f("unused"),
            u8f("maxplayers"),
        ],
    },
    Schema {
        opcode: 2,
        name: "handshake",
        fields: &[u8f("protocol"), text("username"), text("host"), u32f("port")],
    },
    Schema {
        opcode: 3,
        name: "chat",
        fields: &[text("message")],
    },
    Schema {
        opcode: 4,
        name: "time",
        fields: &[u64f("timestamp"), u64f("time")],
    },
    Schema {
        opcode: 5,
        name: "entity-equipment",
        fields: &[u32f("eid"), u16f("slot"), Field::Embed(ITEM_STACK)],
    },
    Schema {
        opcode: 6,
        name: "spawn",
        fields: &[i32f("x"), i32f("y"), i32f("z")],
    },
    Schema {
        opcode: 7,
        name: "use",
        fields: &[u32f("eid"), u32f("target"), u8f("button")],
    },
    Schema {
        opcode: 8,
        name: "health",
        fields: &[u16f("hp"), u16f("fp"), f32f("saturation")],
    },
    Schema {
        opcode: 9,
        name: "respawn",
        fields: &[
            DIMENSION_FIELD,
            DIFFICULTY_FIELD,
            MODE_FIELD,
            u16f("height"),
            text("leveltype"),
        ],
    },
    Schema {
        opcode: 10,
        name: "grounded",
        fields: GROUNDED,
    },
    Schema {
        opcode: 11,
        name: "position",
        fields: &[
            Field::Struct("position", POSITION),
            Field::Struct("grounded", GROUNDED),
        ],
    },
    Schema {
        opcode: 12,
        name: "orientation",
        fields: &[
            Field::Struct("orientation", ORIENTATION),
            Field::Struct("grounded", GROUNDED),
        ],
    },
    Schema {
        opcode: 13,
        name: "location",
        fields: &[
            Field::Struct("position", POSITION),
            Field::Struct("orientation", ORIENTATION),
            Field::Struct("grounded", GROUNDED),
        ],
    },
    Schema {
        opcode: 14,
        name: "digging",
        fields: &[
            Field::Enum("state", Int::U8, &DIG_STATE),
            i32f("x"),
            u8f("y"),
            i32f("z"),
            FACE_FIELD,
        ],
    },
    Schema {
        opcode: 15,
        name: "build",
        fields: &[
            i32f("x"),
            u8f("y"),
            i32f("z"),
            FACE_FIELD,
            Field::Embed(ITEM_STACK),
            u8f("cursorx"),
            u8f("cursory"),
            u8f("cursorz"),
        ],
    },
    // Hold item change; slot is 0-8.
    Schema {
        opcode: 16,
        name: "equip",
        fields: &[u16f("slot")],
    },
    Schema {
        opcode: 17,
        name: "bed",
        fields: &[u32f("eid"), u8f("unknown"), i32f("x"), u8f("y"), i32f("z")],
    },
    Schema {
        opcode: 18,
        name: "animate",
        fields: &[u32f("eid"), Field::Enum("animation", Int::U8, &ANIMATION)],
    },
    Schema {
        opcode: 19,
        name: "action",
        fields: &[u32f("eid"), Field::Enum("action", Int::U8, &ACTION)],
    },
    Schema {
        opcode: 20,
        name: "player",
        fields: &[
            u32f("eid"),
            text("username"),
            i32f("x"),
            i32f("y"),
            i32f("z"),
            u8f("yaw"),
            u8f("pitch"),
            // Held item; 0 means none here, unlike item stacks.
            i16f("item"),
            Field::Metadata("metadata"),
        ],
    },
    // Spawn dropped item.
    Schema {
        opcode: 21,
        name: "pickup",
        fields: &[
            u32f("eid"),
            Field::Embed(ITEM_STACK),
            i32f("x"),
            i32f("y"),
            i32f("z"),
            u8f("yaw"),
            u8f("pitch"),
            u8f("roll"),
        ],
    },
    Schema {
        opcode: 22,
        name: "collect",
        fields: &[u32f("eid"), u32f("destination")],
    },
    Schema {
        opcode: 23,
        name: "vehicle",
        fields: &[
            u32f("eid"),
            Field::Enum("type", Int::U8, &VEHICLE),
            i32f("x"),
            i32f("y"),
            i32f("z"),
            i32f("data"),
            // Zero when data is zero.
            i16f("speedx"),
            i16f("speedy"),
            i16f("speedz"),
        ],
    },
    Schema {
        opcode: 24,
        name: "mob",
        fields: &[
            u32f("eid"),
            Field::Enum("type", Int::U8, &MOB),
            i32f("x"),
            i32f("y"),
            i32f("z"),
            i8f("yaw"),
            i8f("pitch"),
            i8f("head_yaw"),
            i16f("vx"),
            i16f("vy"),
            i16f("vz"),
            Field::Metadata("metadata"),
        ],
    },
    Schema {
        opcode: 25,
        name: "painting",
        fields: &[
            u32f("eid"),
            text("title"),
            i32f("x"),
            i32f("y"),
            i32f("z"),
            FACE_FIELD,
        ],
    },
    Schema {
        opcode: 26,
        name: "experience",
        fields: &[
            u32f("eid"),
            i32f("x"),
            i32f("y"),
            i32f("z"),
            u16f("quantity"),
        ],
    },
    Schema {
        opcode: 28,
        name: "velocity",
        fields: &[u32f("eid"), i16f("dx"), i16f("dy"), i16f("dz")],
    },
    Schema {
        opcode: 29,
        name: "destroy",
        fields: &[
            u8f("count"),
            Field::Array {
                count_from: "count",
                element: &Field::Int("eid", Int::U32),
            },
        ],
    },
    Schema {
        opcode: 30,
        name: "create",
        fields: &[u32f("eid")],
    },
    Schema {
        opcode: 31,
        name: "entity-position",
        fields: &[u32f("eid"), i8f("dx"), i8f("dy"), i8f("dz")],
    },
    Schema {
        opcode: 32,
        name: "entity-orientation",
        fields: &[u32f("eid"), u8f("yaw"), u8f("pitch")],
    },
    Schema {
        opcode: 33,
        name: "entity-location",
        fields: &[
            u32f("eid"),
            i8f("dx"),
            i8f("dy"),
            i8f("dz"),
            u8f("yaw"),
            u8f("pitch"),
        ],
    },
    Schema {
        opcode: 34,
        name: "teleport",
        fields: &[
            u32f("eid"),
            i32f("x"),
            i32f("y"),
            i32f("z"),
            u8f("yaw"),
            u8f("pitch"),
        ],
    },
    Schema {
        opcode: 35,
        name: "entity-head",
        fields: &[u32f("eid"), u8f("yaw")],
    },
    Schema {
        opcode: 38,
        name: "status",
        fields: &[u32f("eid"), Field::Enum("status", Int::U8, &ENTITY_STATUS)],
    },
    Schema {
        opcode: 39,
        name: "attach",
        // vid is 0xFFFFFFFF when detaching.
        fields: &[u32f("eid"), u32f("vid")],
    },
    Schema {
        opcode: 40,
        name: "metadata",
        fields: &[u32f("eid"), Field::Metadata("metadata")],
    },
    Schema {
        opcode: 41,
        name: "effect",
        fields: &[u32f("eid"), EFFECT_FIELD, u8f("amount"), u16f("duration")],
    },
    Schema {
        opcode: 42,
        name: "uneffect",
        fields: &[u32f("eid"), EFFECT_FIELD],
    },
    Schema {
        opcode: 43,
        name: "levelup",
        fields: &[f32f("current"), u16f("level"), u16f("total")],
    },
    Schema {
        opcode: 51,
        name: "chunk",
        fields: &[
            i32f("x"),
            i32f("z"),
            Field::Bool("continuous"),
            u16f("primary"),
            u16f("add"),
            Field::Compressed("data", Int::U32),
        ],
    },
    Schema {
        opcode: 52,
        name: "batch",
        fields: &[
            i32f("x"),
            i32f("z"),
            u16f("count"),
            Field::Blob("data", Int::U32),
        ],
    },
    Schema {
        opcode: 53,
        name: "block",
        fields: &[i32f("x"), u8f("y"), i32f("z"), u16f("type"), u8f("meta")],
    },
    // Covers every tile action, not only note blocks.
    Schema {
        opcode: 54,
        name: "block-action",
        fields: &[
            i32f("x"),
            i16f("y"),
            i32f("z"),
            u8f("byte1"),
            u8f("byte2"),
            u16f("blockid"),
        ],
    },
    Schema {
        opcode: 55,
        name: "block-break-anim",
        fields: &[u32f("eid"), u32f("x"), u32f("y"), u32f("z"), u8f("stage")],
    },
    // TODO: add the column lengths, data, and per-column metadata once the
    // map chunk bulk layout is pinned down.
    Schema {
        opcode: 56,
        name: "bulk-chunk",
        fields: &[u16f("count")],
    },
    Schema {
        opcode: 60,
        name: "explosion",
        fields: &[
            f64f("x"),
            f64f("y"),
            f64f("z"),
            f32f("radius"),
            u32f("count"),
            // Three signed offsets per destroyed block.
            Field::Sized {
                name: "blocks",
                len_from: "count",
                scale: 3,
            },
            f32f("motionx"),
            f32f("motiony"),
            f32f("motionz"),
        ],
    },
    Schema {
        opcode: 61,
        name: "sound",
        fields: &[
            Field::Enum("sid", Int::U32, &SOUND),
            i32f("x"),
            u8f("y"),
            i32f("z"),
            u32f("data"),
            Field::Bool("volume-mod"),
        ],
    },
    Schema {
        opcode: 62,
        name: "named-sound",
        fields: &[
            text("name"),
            u32f("x"),
            u32f("y"),
            u32f("z"),
            f32f("volume"),
            u8f("pitch"),
        ],
    },
    Schema {
        opcode: 70,
        name: "state",
        fields: &[Field::Enum("state", Int::U8, &GAME_STATE), MODE_FIELD],
    },
    Schema {
        opcode: 71,
        name: "thunderbolt",
        fields: &[u32f("eid"), u8f("gid"), i32f("x"), i32f("y"), i32f("z")],
    },
    Schema {
        opcode: 100,
        name: "window-open",
        fields: &[
            u8f("wid"),
            Field::Enum("type", Int::U8, &WINDOW),
            text("title"),
            u8f("slots"),
        ],
    },
    Schema {
        opcode: 101,
        name: "window-close",
        fields: &[u8f("wid")],
    },
    Schema {
        opcode: 102,
        name: "window-action",
        fields: &[
            u8f("wid"),
            u16f("slot"),
            u8f("button"),
            u16f("token"),
            Field::Bool("shift"),
            Field::Embed(ITEM_STACK),
        ],
    },
    Schema {
        opcode: 103,
        name: "window-slot",
        fields: &[u8f("wid"), u16f("slot"), Field::Embed(ITEM_STACK)],
    },
    Schema {
        opcode: 104,
        name: "inventory",
        fields: &[
            u8f("wid"),
            u16f("length"),
            Field::Array {
                count_from: "length",
                element: &Field::Struct("items", ITEM_STACK),
            },
        ],
    },
    Schema {
        opcode: 105,
        name: "window-progress",
        fields: &[u8f("wid"), u16f("bar"), u16f("progress")],
    },
    Schema {
        opcode: 106,
        name: "window-token",
        fields: &[u8f("wid"), u16f("token"), Field::Bool("acknowledged")],
    },
    Schema {
        opcode: 107,
        name: "window-creative",
        fields: &[u16f("slot"), Field::Embed(ITEM_STACK)],
    },
    Schema {
        opcode: 108,
        name: "enchant",
        fields: &[u8f("wid"), u8f("enchantment")],
    },
    Schema {
        opcode: 130,
        name: "sign",
        fields: &[
            i32f("x"),
            u16f("y"),
            i32f("z"),
            text("line1"),
            text("line2"),
            text("line3"),
            text("line4"),
        ],
    },
    Schema {
        opcode: 131,
        name: "map",
        fields: &[u16f("type"), u16f("itemid"), Field::Blob("data", Int::U8)],
    },
    // TODO: the trailing NBT payload is not read yet.
    Schema {
        opcode: 132,
        name: "tile-update",
        fields: &[i32f("x"), u16f("y"), i32f("z"), u8f("action")],
    },
    Schema {
        opcode: 200,
        name: "statistics",
        fields: &[u32f("sid"), u8f("count")],
    },
    Schema {
        opcode: 201,
        name: "players",
        fields: &[text("name"), Field::Bool("online"), u16f("ping")],
    },
    Schema {
        opcode: 202,
        name: "abilities",
        fields: &[u8f("flags"), u8f("fly-speed"), u8f("walk-speed")],
    },
    Schema {
        opcode: 203,
        name: "tab",
        fields: &[text("autocomplete")],
    },
    Schema {
        opcode: 204,
        name: "settings",
        fields: &[
            text("locale"),
            u8f("distance"),
            u8f("chat"),
            DIFFICULTY_FIELD,
            Field::Bool("cape"),
        ],
    },
    Schema {
        opcode: 205,
        name: "statuses",
        fields: &[u8f("payload")],
    },
    Schema {
        opcode: 250,
        name: "plugin-message",
        fields: &[
            text("channel"),
            u16f("length"),
            Field::Sized {
                name: "data",
                len_from: "length",
                scale: 1,
            },
        ],
    },
    Schema {
        opcode: 252,
        name: "key-response",
        fields: &[
            u16f("shared-len"),
            Field::Sized {
                name: "shared-secret",
                len_from: "shared-len",
                scale: 1,
            },
            u16f("token-len"),
            Field::Sized {
                name: "token",
                len_from: "token-len",
                scale: 1,
            },
        ],
    },
    Schema {
        opcode: 253,
        name: "key-request",
        fields: &[
            text("server"),
            u16f("key-len"),
            Field::Sized {
                name: "key",
                len_from: "key-len",
                scale: 1,
            },
            u16f("token-len"),
            Field::Sized {
                name: "token",
                len_from: "token-len",
                scale: 1,
            },
        ],
    },
    Schema {
        opcode: 254,
        name: "poll",
        fields: &[u8f("unused")],
    },
    Schema {
        opcode: 255,
        name: "error",
        fields: &[text("message")],
    },
];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Bidirectional index over [`PACKETS`].
pub struct Registry {
    by_opcode: [Option<&'static Schema>; 256],
    by_name: HashMap<&'static str, u8>,
}

impl Registry {
    fn build(packets: &'static [Schema]) -> Self {
        let mut by_opcode = [None; 256];
        let mut by_name = HashMap::with_capacity(packets.len());
        for schema in packets {
            by_opcode[usize::from(schema.opcode)] = Some(schema);
            by_name.insert(schema.name, schema.opcode);
        }
        tracing::debug!(packets = packets.len(), "packet registry built");
        Self { by_opcode, by_name }
    }

    /// The schema for an opcode, or `None` if it is not registered.
    pub fn schema(&self, opcode: u8) -> Option<&'static Schema> {
        self.by_opcode[usize::from(opcode)]
    }

    /// The opcode for a packet name.
    pub fn opcode(&self, name: &str) -> Option<u8> {
        self.by_name.get(name).copied()
    }

    /// The schema for a packet name.
    pub fn by_name(&self, name: &str) -> Option<&'static Schema> {
        self.opcode(name).and_then(|op| self.schema(op))
    }

    /// The packet name for an opcode.
    pub fn name(&self, opcode: u8) -> Option<&'static str> {
        self.schema(opcode).map(|s| s.name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// `(opcode, schema)` pairs in ascending opcode order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &'static Schema)> + '_ {
        self.by_opcode
            .iter()
            .filter_map(|s| *s)
            .map(|schema| (schema.opcode, schema))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("packets", &self.len())
            .finish()
    }
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| Registry::build(PACKETS));

/// The process-wide registry. Built on first use, read-only afterwards.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in PACKETS.windows(2) {
            assert!(pair[0].opcode < pair[1].opcode, "{} / {}", pair[0].name, pair[1].name);
        }
        assert_eq!(registry().len(), PACKETS.len());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = PACKETS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PACKETS.len());
    }

    #[test]
    fn test_lookup_both_directions() {
        let reg = registry();
        assert_eq!(reg.opcode("error"), Some(255));
        assert_eq!(reg.name(255), Some("error"));
        assert_eq!(reg.opcode("chunk"), Some(51));
        assert_eq!(reg.by_name("ping").map(|s| s.opcode), Some(0));
        assert_eq!(reg.schema(104).map(|s| s.name), Some("inventory"));
    }

    #[test]
    fn test_gaps_are_unregistered() {
        let reg = registry();
        for op in [27u8, 36, 37, 44, 50, 57, 99, 109, 129, 133, 206, 251] {
            assert!(reg.schema(op).is_none(), "opcode {op} should be a gap");
        }
        assert_eq!(reg.opcode("not-a-real-packet"), None);
    }

    #[test]
    fn test_iter_is_ascending() {
        let ops: Vec<u8> = registry().iter().map(|(op, _)| op).collect();
        assert_eq!(ops.first(), Some(&0));
        assert_eq!(ops.last(), Some(&255));
        assert!(ops.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ops.len(), registry().len());
    }

    #[test]
    fn test_iter_pairs_agree_with_lookups() {
        let reg = registry();
        for (op, schema) in reg.iter() {
            assert_eq!(schema.opcode, op);
            assert_eq!(reg.name(op), Some(schema.name));
            assert_eq!(reg.opcode(schema.name), Some(op));
        }
    }

    #[test]
    fn test_short_payload_leaves_reader_in_place() {
        let enc = Encodings {
            text: &blockwire_encoding::Ucs2,
            chunk: &blockwire_encoding::Passthrough,
        };
        let bytes = [0u8; 20];
        let mut r = Reader::new(&bytes);
        let schema = registry().by_name("position").unwrap();
        let err = schema.decode(&mut r, enc).unwrap_err();
        assert!(matches!(err, ProtocolError::InsufficientData { .. }));
        assert_eq!(r.offset(), 0);
    }
}
