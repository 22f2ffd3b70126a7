//! Stream drivers: turning byte buffers into packets and back.
//!
//! A [`PacketCodec`] binds the process-wide [`Registry`] to a text codec
//! and a chunk transform. It offers two decode modes:
//!
//! - **Bulk** ([`PacketCodec::parse`]) — decode as many whole packets as
//!   the buffer holds and hand back the unconsumed tail. Calling it again
//!   with `leftovers + more bytes` continues exactly where it stopped.
//! - **Incremental** ([`PacketCodec::parse_stream`]) — a lazy iterator
//!   that yields one packet at a time and exposes the undecoded remainder.
//!
//! and one encode direction ([`PacketCodec::build`]), which looks a packet
//! up by name and prepends its opcode byte.
//!
//! ```text
//! ┌────────┬──────────────────────────────┐
//! │ opcode │ payload (schema for opcode)  │  ← one packet, no length prefix
//! └────────┴──────────────────────────────┘
//! ```
//!
//! Packets carry no length prefix, so a truncated buffer can only be
//! detected while decoding. That is why "need more bytes" is a distinct,
//! recoverable error ([`ProtocolError::InsufficientData`]).

use std::iter::FusedIterator;
use std::sync::LazyLock;

use blockwire_encoding::{ChunkCodec, Passthrough, TextCodec, Ucs2, text_codec};
use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::config::{ChunkCompression, CodecConfig};
use crate::field::Encodings;
use crate::primitive::Reader;
use crate::registry::{Registry, registry};
use crate::{BulkError, ProtocolError, Record};

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// One decoded packet: its opcode and named field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub opcode: u8,
    pub payload: Record,
}

impl Packet {
    pub fn new(opcode: u8, payload: Record) -> Self {
        Self { opcode, payload }
    }

    /// The registered name for this packet's opcode.
    pub fn name(&self) -> Option<&'static str> {
        registry().name(self.opcode)
    }
}

// ---------------------------------------------------------------------------
// PacketCodec
// ---------------------------------------------------------------------------

/// Decodes and encodes packets with a fixed set of collaborators.
///
/// A codec holds no per-stream state; one instance can serve any number
/// of connections from any number of threads.
pub struct PacketCodec {
    registry: &'static Registry,
    text: &'static dyn TextCodec,
    chunk: Box<dyn ChunkCodec>,
    dump_packets: bool,
}

impl PacketCodec {
    /// Creates a codec from configuration.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownTextEncoding`] if `config.text_encoding`
    /// names no registered text codec.
    pub fn new(config: CodecConfig) -> Result<Self, ProtocolError> {
        let text = text_codec(&config.text_encoding)
            .ok_or_else(|| ProtocolError::UnknownTextEncoding(config.text_encoding.clone()))?;
        let chunk = chunk_codec(&config);

        tracing::debug!(
            text = text.name(),
            chunk = ?config.chunk_compression,
            dump_packets = config.dump_packets,
            "packet codec created"
        );

        Ok(Self {
            registry: registry(),
            text,
            chunk,
            dump_packets: config.dump_packets,
        })
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    fn encodings(&self) -> Encodings<'_> {
        Encodings {
            text: self.text,
            chunk: self.chunk.as_ref(),
        }
    }

    // -- Decoding -----------------------------------------------------------

    /// Decodes exactly one packet from the front of `buf`.
    ///
    /// Returns the packet and the number of bytes it occupied.
    ///
    /// # Errors
    /// - [`ProtocolError::InsufficientData`] if `buf` holds only a prefix
    ///   of a packet (including an empty buffer).
    /// - [`ProtocolError::UnknownOpcode`] if the first byte is unregistered.
    /// - Any structural error raised by the packet's fields.
    pub fn decode(&self, buf: &[u8]) -> Result<(Packet, usize), ProtocolError> {
        let mut r = Reader::new(buf);
        let opcode = r.read_u8()?;
        let schema = self
            .registry
            .schema(opcode)
            .ok_or(ProtocolError::UnknownOpcode(opcode))?;
        let payload = schema.decode(&mut r, self.encodings())?;

        if self.dump_packets {
            tracing::debug!(opcode, name = schema.name, ?payload, "parsed packet");
        }

        Ok((Packet::new(opcode, payload), r.offset()))
    }

    /// Decodes every complete packet in `buf`.
    ///
    /// Returns the packets in arrival order together with the bytes that
    /// did not form a complete packet. Leftovers are always a suffix of
    /// `buf`; prepend them to the next read and parse again.
    ///
    /// # Errors
    /// A structural error (unknown opcode, bad enum value, bad sentinel and
    /// so on) stops the parse. The [`BulkError`] still carries the packets
    /// decoded before it. Running out of bytes is never an error.
    pub fn parse(&self, buf: &[u8]) -> Result<(Vec<Packet>, Vec<u8>), BulkError> {
        let mut stream = self.parse_stream(buf);
        let mut packets = Vec::new();
        while let Some(result) = stream.next() {
            match result {
                Ok(packet) => packets.push(packet),
                Err(source) => {
                    let offset = buf.len() - stream.remaining().len();
                    tracing::debug!(offset, decoded = packets.len(), %source, "bulk parse failed");
                    return Err(BulkError {
                        packets,
                        offset,
                        remaining: stream.remaining().to_vec(),
                        source,
                    });
                }
            }
        }
        let leftovers = stream.remaining().to_vec();

        tracing::trace!(
            packets = packets.len(),
            leftovers = leftovers.len(),
            "bulk parse finished"
        );

        Ok((packets, leftovers))
    }

    /// Returns a lazy iterator over the packets in `buf`.
    ///
    /// The iterator ends cleanly when the remaining bytes cannot form a
    /// whole packet, and ends after yielding one `Err` on a structural
    /// error. Either way [`PacketStream::remaining`] gives the undecoded
    /// tail.
    pub fn parse_stream<'a>(&'a self, buf: &'a [u8]) -> PacketStream<'a> {
        PacketStream {
            codec: self,
            buf,
            pos: 0,
            done: false,
        }
    }

    // -- Encoding -----------------------------------------------------------

    /// Builds the wire bytes for the packet called `name`.
    ///
    /// Fields missing from `payload` are taken from `extras`, in order; a
    /// field already present is never overridden by a later source.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownPacketName`] for an unregistered name, or
    /// any error raised while encoding the payload's fields.
    pub fn build(
        &self,
        name: &str,
        payload: &Record,
        extras: &[&Record],
    ) -> Result<Vec<u8>, ProtocolError> {
        let Some(schema) = self.registry.by_name(name) else {
            tracing::warn!(name, "no packet registered under this name");
            return Err(ProtocolError::UnknownPacketName(name.to_owned()));
        };

        let mut merged = payload.clone();
        for extra in extras {
            merged.merge_missing(extra);
        }

        if self.dump_packets {
            tracing::debug!(opcode = schema.opcode, name, payload = ?merged, "building packet");
        }

        let mut buf = Vec::with_capacity(64);
        buf.put_u8(schema.opcode);
        schema.encode(&merged, &mut buf, self.encodings())?;
        Ok(buf)
    }

    /// Builds an `error` (kick) packet carrying `message`.
    pub fn build_error(&self, message: &str) -> Result<Vec<u8>, ProtocolError> {
        self.build("error", &Record::new().with("message", message), &[])
    }
}

impl Default for PacketCodec {
    /// UCS-2 text, default chunk compression, no packet dumps.
    fn default() -> Self {
        let config = CodecConfig::default();
        Self {
            registry: registry(),
            text: &Ucs2,
            chunk: chunk_codec(&config),
            dump_packets: config.dump_packets,
        }
    }
}

impl std::fmt::Debug for PacketCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketCodec")
            .field("packets", &self.registry.len())
            .field("text", &self.text.name())
            .field("dump_packets", &self.dump_packets)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "zlib")]
fn chunk_codec(config: &CodecConfig) -> Box<dyn ChunkCodec> {
    match config.chunk_compression {
        ChunkCompression::Zlib => Box::new(
            blockwire_encoding::Zlib::new(config.compression_level)
                .with_limit(config.max_chunk_size),
        ),
        ChunkCompression::Passthrough => Box::new(Passthrough),
    }
}

#[cfg(not(feature = "zlib"))]
fn chunk_codec(config: &CodecConfig) -> Box<dyn ChunkCodec> {
    if config.chunk_compression == ChunkCompression::Zlib {
        tracing::warn!("built without the `zlib` feature; chunk data is passed through");
    }
    Box::new(Passthrough)
}

// ---------------------------------------------------------------------------
// PacketStream
// ---------------------------------------------------------------------------

/// Incremental decoder returned by [`PacketCodec::parse_stream`].
#[derive(Debug)]
pub struct PacketStream<'a> {
    codec: &'a PacketCodec,
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> PacketStream<'a> {
    /// The bytes not yet decoded.
    ///
    /// After a structural error this starts at the offending packet's
    /// opcode byte.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

impl Iterator for PacketStream<'_> {
    type Item = Result<Packet, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.buf.len() {
            return None;
        }

        match self.codec.decode(self.remaining()) {
            Ok((packet, used)) => {
                self.pos += used;
                Some(Ok(packet))
            }
            Err(e) if e.is_insufficient_data() => {
                tracing::trace!(pending = self.buf.len() - self.pos, %e, "waiting for more bytes");
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for PacketStream<'_> {}

// ---------------------------------------------------------------------------
// Default codec
// ---------------------------------------------------------------------------

static DEFAULT_CODEC: LazyLock<PacketCodec> = LazyLock::new(PacketCodec::default);

/// The shared codec behind the free functions below.
pub fn default_codec() -> &'static PacketCodec {
    &DEFAULT_CODEC
}

/// Bulk-parses `buf` with the default codec. See [`PacketCodec::parse`].
pub fn parse_packets(buf: &[u8]) -> Result<(Vec<Packet>, Vec<u8>), BulkError> {
    default_codec().parse(buf)
}

/// Incrementally parses `buf` with the default codec. See
/// [`PacketCodec::parse_stream`].
pub fn parse_packets_incrementally(buf: &[u8]) -> PacketStream<'_> {
    default_codec().parse_stream(buf)
}

/// Builds a packet with the default codec. See [`PacketCodec::build`].
pub fn make_packet(
    name: &str,
    payload: &Record,
    extras: &[&Record],
) -> Result<Vec<u8>, ProtocolError> {
    default_codec().build(name, payload, extras)
}

/// Builds an `error` packet with the default codec.
pub fn make_error_packet(message: &str) -> Result<Vec<u8>, ProtocolError> {
    default_codec().build_error(message)
}
