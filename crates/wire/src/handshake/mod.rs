//! # Overview
//!
//! Field-sequence readers for the handshake packets of both directions,
//! plus the two state machines that sequence them. The client side runs
//! Hello, optionally the SSH challenge pair, optionally the addendum; the
//! server side runs an optional SSH challenge followed by its Hello.
//!
//! Both machines are resumable: a feed that exhausts the delivered bytes
//! before reaching `Done` saves partial reader state and reports "not
//! ready"; the next delivery continues where the previous one stopped.
//! Version gates are read from the shared [`ProtocolState`](crate::state::ProtocolState)
//! written by the client Hello, never through back references between
//! readers.

mod client;
mod server;

pub use client::{ClientAddendumReader, ClientHandshake, ClientHelloReader, ClientPhase};
pub use server::{ServerHandshake, ServerHelloReader, ServerPhase};

use crate::cursor::Cursor;
use crate::error::WireError;
use crate::packet::Direction;
use crate::reader::Reader;
use crate::varuint::VarUIntReader;

/// Marker for the inter-server secret, passed in place of the user name.
/// A real user name cannot start with a space.
pub const USER_INTERSERVER_MARKER: &str = " INTERSERVER SECRET ";
/// Marker for SSH-key based authentication, passed in place of the user name.
pub const SSH_KEY_AUTHENTICATION_MARKER: &str = " SSH KEY AUTHENTICATION ";
/// Marker for JSON Web Token authentication, passed in place of the user name.
pub const JWT_AUTHENTICATION_MARKER: &str = " JWT AUTHENTICATION ";

/// Packet-type reader that enforces the value the current phase expects.
#[derive(Clone, Debug)]
pub(crate) struct ExpectedPacket {
    reader: VarUIntReader,
    direction: Direction,
    expected: u64,
}

impl ExpectedPacket {
    pub(crate) const fn new(direction: Direction, expected: u64) -> Self {
        Self {
            reader: VarUIntReader::new(),
            direction,
            expected,
        }
    }

    /// Drives the embedded VarUInt and validates it upon completion.
    pub(crate) fn feed(&mut self, data: &mut Cursor<'_>) -> Result<bool, WireError> {
        if self.reader.is_complete() {
            return Ok(true);
        }
        if !self.reader.feed(data)? {
            return Ok(false);
        }
        if self.reader.value() != self.expected {
            return Err(WireError::UnexpectedPacket {
                direction: self.direction,
                expected: self.expected,
                actual: self.reader.value(),
            });
        }
        Ok(true)
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.reader.is_complete()
    }

    pub(crate) fn reset(&mut self) {
        self.reader.reset();
    }
}
