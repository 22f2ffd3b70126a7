//! Round-trip tests over the packet registry.

use blockwire_encoding::EncodingError;
use blockwire_protocol::{
    ChunkCompression, CodecConfig, Field, ItemStack, Metadata, MetadataValue, PacketCodec,
    ProtocolError, Record, Value, registry,
};

// =========================================================================
// Helpers
// =========================================================================

fn codec() -> PacketCodec {
    PacketCodec::new(CodecConfig::default()).unwrap()
}

/// Builds `name`, parses it back, and checks both directions.
fn round_trip(codec: &PacketCodec, name: &str, payload: &Record) -> Vec<u8> {
    let bytes = codec.build(name, payload, &[]).unwrap();
    let (packets, leftovers) = codec.parse(&bytes).unwrap();
    assert!(leftovers.is_empty(), "{name}: {} leftover bytes", leftovers.len());
    assert_eq!(packets.len(), 1, "{name}");

    let packet = &packets[0];
    assert_eq!(Some(packet.opcode), registry().opcode(name));
    assert_eq!(&packet.payload, payload, "{name}: decode(encode(p)) != p");

    let rebuilt = codec.build(name, &packet.payload, &[]).unwrap();
    assert_eq!(rebuilt, bytes, "{name}: encode(decode(b)) != b");
    bytes
}

/// A representative value for every keyed field: counts are 1, so arrays
/// and sized blobs hold one element and conditional item fields are present.
fn sample(field: &Field) -> Value {
    match *field {
        Field::Int(_, kind) if kind.is_signed() => Value::Int(1),
        Field::Int(..) => Value::UInt(1),
        Field::Float(..) => Value::Float(0.5),
        Field::Bool(_) => Value::Bool(true),
        Field::Enum(_, _, table) => Value::symbol(table.entries()[0].0),
        Field::Text(_) => Value::from("abc"),
        Field::Blob(..) | Field::Compressed(..) => Value::from(vec![1u8, 2, 3]),
        Field::Sized { scale, .. } => Value::from(vec![7u8; scale]),
        Field::Array { element, .. } => Value::List(vec![sample(element)]),
        Field::Struct(_, fields) => {
            let mut inner = Record::new();
            fill(fields, &mut inner);
            Value::Record(inner)
        }
        Field::Metadata(_) => Value::from(Metadata::new().with(1, MetadataValue::Short(5))),
        Field::Embed(_) | Field::If(..) | Field::Magic(..) => unreachable!("spliced field"),
    }
}

fn fill(fields: &[Field], out: &mut Record) {
    for field in fields {
        match *field {
            Field::Embed(inner) | Field::If(_, inner) => fill(inner, out),
            Field::Magic(..) => {}
            _ => {
                out.insert(field.name(), sample(field));
            }
        }
    }
}

fn pos(x: f64, y: f64, stance: f64, z: f64) -> Record {
    Record::new()
        .with("x", x)
        .with("y", y)
        .with("stance", stance)
        .with("z", z)
}

// =========================================================================
// Every registered packet
// =========================================================================

#[test]
fn test_every_registered_packet_round_trips() {
    let codec = codec();
    for (opcode, schema) in registry().iter() {
        let mut payload = Record::new();
        fill(schema.fields, &mut payload);
        let bytes = round_trip(&codec, schema.name, &payload);
        assert_eq!(bytes[0], opcode);
    }
}

#[test]
fn test_registry_covers_the_known_table() {
    let reg = registry();
    assert_eq!(reg.len(), 75);
    for (op, name) in [
        (0, "ping"),
        (10, "grounded"),
        (13, "location"),
        (29, "destroy"),
        (51, "chunk"),
        (60, "explosion"),
        (104, "inventory"),
        (132, "tile-update"),
        (250, "plugin-message"),
        (254, "poll"),
        (255, "error"),
    ] {
        assert_eq!(reg.name(op), Some(name));
        assert_eq!(reg.opcode(name), Some(op));
    }
}

// =========================================================================
// Primitive-only
// =========================================================================

#[test]
fn test_login_fields_in_order() {
    let payload = Record::new()
        .with("eid", 42u32)
        .with("leveltype", "flat")
        .with("mode", Value::symbol("creative"))
        .with("dimension", Value::symbol("nether"))
        .with("difficulty", Value::symbol("hard"))
        .with("unused", 0u8)
        .with("maxplayers", 20u8);
    let bytes = round_trip(&codec(), "login", &payload);
    assert_eq!(
        bytes,
        [
            0x01, 0, 0, 0, 42, // opcode, eid
            0, 4, 0, b'f', 0, b'l', 0, b'a', 0, b't', // leveltype
            1, 255, 3, 0, 20,
        ]
    );
}

#[test]
fn test_location_nests_position_orientation_grounded() {
    let payload = Record::new()
        .with("position", pos(1.0, 64.0, 65.62, -3.5))
        .with(
            "orientation",
            Record::new().with("rotation", 90.0f32).with("pitch", -12.5f32),
        )
        .with("grounded", Record::new().with("grounded", 1u8));
    let bytes = round_trip(&codec(), "location", &payload);
    assert_eq!(bytes.len(), 1 + 4 * 8 + 2 * 4 + 1);
}

#[test]
fn test_flag_decodes_nonzero_as_true() {
    // window-token with acknowledged = 0x02
    let (packets, _) = codec().parse(&[106, 1, 0, 9, 0x02]).unwrap();
    assert_eq!(packets[0].payload.get("acknowledged"), Some(&Value::Bool(true)));
}

// =========================================================================
// Item stacks (conditional present / absent)
// =========================================================================

#[test]
fn test_equipment_with_empty_slot() {
    let mut payload = Record::new().with("eid", 5u32).with("slot", 0u16);
    ItemStack::EMPTY.write_to(&mut payload);
    let bytes = round_trip(&codec(), "entity-equipment", &payload);
    assert_eq!(bytes, [5, 0, 0, 0, 5, 0, 0, 0xFF, 0xFF]);
}

#[test]
fn test_build_with_item_present() {
    let mut payload = Record::new()
        .with("x", -10i32)
        .with("y", 64u8)
        .with("z", 300i32)
        .with("face", Value::symbol("+y"))
        .with("cursorx", 8u8)
        .with("cursory", 16u8)
        .with("cursorz", 8u8);
    ItemStack::new(4, 64, 0).write_to(&mut payload);
    let bytes = round_trip(&codec(), "build", &payload);
    // opcode + x y z face + item(7) + cursors
    assert_eq!(bytes.len(), 1 + 4 + 1 + 4 + 1 + 7 + 3);
    assert_eq!(&bytes[11..18], &[0, 4, 64, 0, 0, 0xFF, 0xFF]);
}

#[test]
fn test_item_sentinel_is_emitted_even_if_record_says_otherwise() {
    let mut payload = Record::new().with("slot", 36u16);
    ItemStack::new(1, 1, 0).write_to(&mut payload);
    payload.insert("item_information", vec![0u8, 0]);
    let bytes = codec().build("window-creative", &payload, &[]).unwrap();
    assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xFF]);
}

#[test]
fn test_window_slot_bad_sentinel() {
    // wid 0, slot 1, primary 1, count 1, secondary 0, sentinel FF 00
    let bytes = [103, 0, 0, 1, 0, 1, 1, 0, 0, 0xFF, 0x00];
    let err = codec().parse(&bytes).unwrap_err();
    assert!(matches!(err.source, ProtocolError::InvalidSentinel { .. }));
    assert!(err.packets.is_empty());
}

// =========================================================================
// Arrays
// =========================================================================

#[test]
fn test_destroy_with_zero_and_many_ids() {
    let codec = codec();
    let none = Record::new()
        .with("count", 0u8)
        .with("eid", Vec::<Value>::new());
    assert_eq!(round_trip(&codec, "destroy", &none), [29, 0]);

    let ids: Vec<Value> = [7u32, 8, 9].into_iter().map(Value::from).collect();
    let many = Record::new().with("count", 3u8).with("eid", ids);
    let bytes = round_trip(&codec, "destroy", &many);
    assert_eq!(bytes, [29, 3, 0, 0, 0, 7, 0, 0, 0, 8, 0, 0, 0, 9]);
}

#[test]
fn test_inventory_mixes_empty_and_present_slots() {
    let items = vec![
        Value::from(ItemStack::EMPTY),
        Value::from(ItemStack::new(276, 1, 12)),
        Value::from(ItemStack::EMPTY),
    ];
    let payload = Record::new()
        .with("wid", 0u8)
        .with("length", 3u16)
        .with("items", items);
    let bytes = round_trip(&codec(), "inventory", &payload);
    assert_eq!(bytes.len(), 1 + 1 + 2 + 2 + 7 + 2);

    let (packets, _) = codec().parse(&bytes).unwrap();
    let decoded = packets[0].payload.get("items").and_then(Value::as_list).unwrap();
    let stacks: Vec<ItemStack> = decoded
        .iter()
        .map(|v| ItemStack::from_record(v.as_record().unwrap()).unwrap())
        .collect();
    assert_eq!(
        stacks,
        [ItemStack::EMPTY, ItemStack::new(276, 1, 12), ItemStack::EMPTY]
    );
}

#[test]
fn test_inventory_length_must_match_items() {
    let payload = Record::new()
        .with("wid", 0u8)
        .with("length", 2u16)
        .with("items", vec![Value::from(ItemStack::EMPTY)]);
    let err = codec().build("inventory", &payload, &[]).unwrap_err();
    assert!(matches!(err, ProtocolError::LengthMismatch { declared: 2, actual: 1, .. }));
}

// =========================================================================
// Metadata
// =========================================================================

fn player(metadata: Metadata) -> Record {
    Record::new()
        .with("eid", 1u32)
        .with("username", "Notch")
        .with("x", 0i32)
        .with("y", 2048i32)
        .with("z", 0i32)
        .with("yaw", 0u8)
        .with("pitch", 0u8)
        .with("item", 0i16)
        .with("metadata", metadata)
}

#[test]
fn test_empty_metadata_is_placeholder_then_terminator() {
    let bytes = round_trip(&codec(), "player", &player(Metadata::new()));
    assert_eq!(&bytes[bytes.len() - 3..], &[0x00, 0x00, 0x7F]);
}

#[test]
fn test_mob_with_three_metadata_entries() {
    let metadata = Metadata::new()
        .with(0, MetadataValue::Byte(0x01))
        .with(8, MetadataValue::Int(0x00FF_00FF))
        .with(
            16,
            MetadataValue::Slot {
                primary: 35,
                count: 2,
                secondary: 14,
            },
        );
    let payload = Record::new()
        .with("eid", 99u32)
        .with("type", Value::symbol("Sheep"))
        .with("x", 32i32)
        .with("y", 2048i32)
        .with("z", -32i32)
        .with("yaw", 0i8)
        .with("pitch", -10i8)
        .with("head_yaw", 0i8)
        .with("vx", 0i16)
        .with("vy", -1i16)
        .with("vz", 0i16)
        .with("metadata", metadata);
    let bytes = round_trip(&codec(), "mob", &payload);
    assert_eq!(
        &bytes[bytes.len() - 14..],
        &[
            0x00, 0x01, // byte, slot 0
            0x48, 0x00, 0xFF, 0x00, 0xFF, // int, slot 8
            0xB0, 0x00, 35, 2, 0x00, 14, // slot, slot 16
            0x7F,
        ]
    );
}

#[test]
fn test_metadata_slot_must_fit_five_bits() {
    let err = codec()
        .build(
            "metadata",
            &Record::new()
                .with("eid", 1u32)
                .with("metadata", Metadata::new().with(32, MetadataValue::Byte(0))),
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, ProtocolError::MetadataSlotOutOfRange(32)));
}

// =========================================================================
// Byte arrays
// =========================================================================

#[test]
fn test_chunk_data_is_compressed_on_the_wire() {
    let column: Vec<u8> = (0..16 * 16 * 128).map(|i| (i % 3) as u8).collect();
    let payload = Record::new()
        .with("x", 3i32)
        .with("z", -4i32)
        .with("continuous", true)
        .with("primary", 0xFFFFu16)
        .with("add", 0u16)
        .with("data", column.clone());
    let bytes = round_trip(&codec(), "chunk", &payload);
    assert!(bytes.len() < column.len());

    let raw = PacketCodec::new(CodecConfig {
        chunk_compression: ChunkCompression::Passthrough,
        ..CodecConfig::default()
    })
    .unwrap();
    let plain = raw.build("chunk", &payload, &[]).unwrap();
    // x z continuous primary add, then the u32 length prefix
    assert_eq!(&plain[14..18], &(column.len() as u32).to_be_bytes());
    assert_eq!(&plain[18..], column.as_slice());
}

#[cfg(feature = "zlib")]
#[test]
fn test_oversized_chunk_is_rejected() {
    let payload = Record::new()
        .with("x", 0i32)
        .with("z", 0i32)
        .with("continuous", true)
        .with("primary", 0xFFFFu16)
        .with("add", 0u16)
        .with("data", vec![0u8; 64 * 1024]);
    let bytes = codec().build("chunk", &payload, &[]).unwrap();

    let strict = PacketCodec::new(CodecConfig {
        max_chunk_size: 16 * 1024,
        ..CodecConfig::default()
    })
    .unwrap();
    let err = strict.parse(&bytes).unwrap_err();
    assert!(matches!(
        err.source,
        ProtocolError::Encoding(EncodingError::ChunkTooLarge { limit: 16384 })
    ));
    assert_eq!(err.offset, 0);
}

#[test]
fn test_explosion_blocks_are_three_bytes_each() {
    let payload = Record::new()
        .with("x", 0.0f64)
        .with("y", 64.0f64)
        .with("z", 0.0f64)
        .with("radius", 3.0f32)
        .with("count", 2u32)
        .with("blocks", vec![0u8, 1, 0, 0xFF, 0, 0])
        .with("motionx", 0.0f32)
        .with("motiony", 0.0f32)
        .with("motionz", 0.0f32);
    let bytes = round_trip(&codec(), "explosion", &payload);
    assert_eq!(bytes.len(), 1 + 3 * 8 + 4 + 4 + 6 + 3 * 4);
}

#[test]
fn test_key_exchange_trailing_arrays() {
    let codec = codec();
    let response = Record::new()
        .with("shared-len", 2u16)
        .with("shared-secret", vec![0xAAu8, 0xBB])
        .with("token-len", 1u16)
        .with("token", vec![0xCCu8]);
    let bytes = round_trip(&codec, "key-response", &response);
    assert_eq!(bytes, [252, 0, 2, 0xAA, 0xBB, 0, 1, 0xCC]);

    let request = Record::new()
        .with("server", "-")
        .with("key-len", 0u16)
        .with("key", Vec::<u8>::new())
        .with("token-len", 4u16)
        .with("token", vec![1u8, 2, 3, 4]);
    round_trip(&codec, "key-request", &request);
}

#[test]
fn test_plugin_message_and_map() {
    let codec = codec();
    let message = Record::new()
        .with("channel", "MC|Brand")
        .with("length", 7u16)
        .with("data", b"vanilla".to_vec());
    round_trip(&codec, "plugin-message", &message);

    let map = Record::new()
        .with("type", 358u16)
        .with("itemid", 0u16)
        .with("data", vec![2u8, 0, 0]);
    let bytes = round_trip(&codec, "map", &map);
    assert_eq!(&bytes[5..], &[3, 2, 0, 0]);
}

#[test]
fn test_sign_with_empty_and_unicode_lines() {
    let payload = Record::new()
        .with("x", 1i32)
        .with("y", 70u16)
        .with("z", 1i32)
        .with("line1", "")
        .with("line2", "caf\u{00E9}")
        .with("line3", "\u{2603}")
        .with("line4", "");
    round_trip(&codec(), "sign", &payload);
}

#[test]
fn test_packet_serializes_to_json() {
    let health = Record::new()
        .with("hp", 20u16)
        .with("fp", 18u16)
        .with("saturation", 5.0f32);
    let bytes = codec().build("health", &health, &[]).unwrap();
    let (packets, _) = codec().parse(&bytes).unwrap();
    let json = serde_json::to_value(&packets[0]).unwrap();
    assert_eq!(json["opcode"], 8);
    assert_eq!(json["payload"]["hp"]["type"], "uint");
    assert_eq!(json["payload"]["hp"]["value"], 20);

    let back: blockwire_protocol::Packet = serde_json::from_value(json).unwrap();
    assert_eq!(back, packets[0]);
}
