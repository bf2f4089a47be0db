//! Wire-level protocol errors.
//!
//! Decoding failures never escape the filter boundary; they only decide when
//! a direction stops being inspected. The variants therefore carry exactly
//! the context the hand-off diagnostics need.

use core::fmt;

use crate::packet::Direction;

/// Failures raised while decoding the ClickHouse native protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WireError {
    /// A packet-type value did not match what the current handshake phase
    /// expects.
    UnexpectedPacket {
        /// Direction the offending packet arrived on.
        direction: Direction,
        /// Packet-type value the phase required.
        expected: u64,
        /// Packet-type value actually decoded.
        actual: u64,
    },
    /// A variable-length integer carried continuation bits through all ten
    /// bytes.
    MalformedVarUInt,
    /// Bytes were fed to a direction whose handshake already finished.
    HandshakeAlreadyComplete(Direction),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedPacket {
                direction,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{direction} sent packet type {actual} ({}) where {expected} ({}) was expected",
                    direction.packet_name(*actual),
                    direction.packet_name(*expected),
                )
            }
            Self::MalformedVarUInt => {
                f.write_str("variable-length integer still had continuation bits after 10 bytes")
            }
            Self::HandshakeAlreadyComplete(direction) => {
                write!(f, "unexpected bytes after the {direction} handshake completed")
            }
        }
    }
}

impl std::error::Error for WireError {}
