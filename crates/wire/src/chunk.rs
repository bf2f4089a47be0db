//! # Overview
//!
//! Once both peers negotiated chunked framing for a direction, every
//! logical packet travels as one or more length-prefixed chunks closed by a
//! zero-length terminator:
//!
//! ```text
//! (packet)     = (chunk)+ (terminator)
//! (chunk)      = length:u32_le  payload[length]
//! (terminator) = length:u32_le == 0
//! ```
//!
//! The framer identifies each packet by decoding the packet-type VarUInt
//! from the first payload bytes and discards everything else; it never
//! buffers payload beyond what the packet type needs, so memory use is
//! constant no matter how large the chunks are.

use crate::cursor::Cursor;
use crate::error::WireError;
use crate::reader::{PodReader, Reader};
use crate::varuint::VarUIntReader;

/// Resumable framer for one direction's chunked byte stream.
#[derive(Debug)]
pub struct ChunkFramer {
    length: PodReader<u32>,
    chunk_remaining: u32,
    end_of_chunk: bool,
    packet_type: VarUIntReader,
}

impl ChunkFramer {
    /// Creates a framer positioned before the first chunk length.
    #[must_use]
    pub fn new() -> Self {
        Self {
            length: PodReader::new(),
            chunk_remaining: 0,
            end_of_chunk: true,
            packet_type: VarUIntReader::new(),
        }
    }

    /// The current packet's type, once enough payload bytes arrived.
    #[must_use]
    pub fn packet_type(&self) -> Option<u64> {
        self.packet_type
            .is_complete()
            .then(|| self.packet_type.value())
    }

    /// Reports whether the framer sits between packets: the last chunk was
    /// a terminator and no length prefix has been started.
    #[must_use]
    pub fn at_packet_boundary(&self) -> bool {
        self.end_of_chunk && self.chunk_remaining == 0 && !self.length.is_complete()
    }

    /// Consumes one delivery, invoking `on_packet_type` once per packet as
    /// soon as its type value is known.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MalformedVarUInt`] when a packet-type encoding
    /// carries continuation bits through all ten bytes.
    pub fn feed(
        &mut self,
        data: &mut Cursor<'_>,
        mut on_packet_type: impl FnMut(u64),
    ) -> Result<(), WireError> {
        while data.has_remaining() {
            if self.chunk_remaining == 0 {
                if !self.length.feed(data)? {
                    return Ok(());
                }
                self.chunk_remaining = self.length.value();
                self.length.reset();
                if self.chunk_remaining == 0 {
                    // Terminator: the next non-empty chunk starts a packet.
                    self.end_of_chunk = true;
                    self.packet_type.reset();
                }
                continue;
            }

            self.end_of_chunk = false;
            let take = data
                .remaining()
                .min(usize::try_from(self.chunk_remaining).unwrap_or(usize::MAX));
            if !self.packet_type.is_complete() {
                let mut view = data.limited(take);
                if self.packet_type.feed(&mut view)? {
                    on_packet_type(self.packet_type.value());
                }
            }
            data.advance(take);
            self.chunk_remaining -= take as u32;
        }

        Ok(())
    }

    /// Returns the framer to its pre-first-chunk state.
    pub fn reset(&mut self) {
        self.length.reset();
        self.chunk_remaining = 0;
        self.end_of_chunk = true;
        self.packet_type.reset();
    }
}

impl Default for ChunkFramer {
    fn default() -> Self {
        Self::new()
    }
}
