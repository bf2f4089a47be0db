#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `clickhouse_wire` implements streaming decoders for the opening exchange
//! of the ClickHouse native TCP protocol: the client Hello with its optional
//! SSH challenge pair and addendum, the version-gated server Hello, and the
//! chunked packet framing both peers may negotiate. The crate is sans-I/O:
//! a proxy host feeds it whatever byte fragments arrived and the decoders
//! save partial state between feeds, so every value decodes identically no
//! matter how the stream was split.
//!
//! # Design
//!
//! The modules mirror the protocol's layers:
//!
//! - [`Cursor`] walks the non-contiguous byte slices of one delivery.
//! - [`VarUIntReader`], [`StringReader`], [`PodReader`], and [`RulesReader`]
//!   are the resumable primitive decoders, all implementing [`Reader`].
//! - [`ClientPacket`] and [`ServerPacket`] name the per-direction
//!   packet-type values.
//! - [`Revision`] carries the protocol revision gates and feature queries.
//! - [`ClientHandshake`] and [`ServerHandshake`] sequence the primitives
//!   into the two direction machines.
//! - [`ChunkFramer`] frames post-handshake traffic once chunked framing is
//!   on.
//! - [`ProtocolState`] is the synchronized record the two directions share.
//!
//! # Invariants
//!
//! - A reader's completion is monotonic within one use; feeding a complete
//!   reader consumes nothing.
//! - The revision used for gating is always the one the client Hello
//!   announced, read from the shared [`ProtocolState`].
//! - The server machine consumes no bytes until that revision is known.
//! - Decoders observe bytes, they never copy more than the decoded values
//!   themselves.
//!
//! # Examples
//!
//! Decode a client Hello delivered in one piece:
//!
//! ```
//! use clickhouse_wire::{ClientHandshake, Cursor, ProtocolState, encode_varuint_to_vec};
//!
//! fn put_str(out: &mut Vec<u8>, value: &str) {
//!     encode_varuint_to_vec(value.len() as u64, out);
//!     out.extend_from_slice(value.as_bytes());
//! }
//!
//! let mut hello = Vec::new();
//! encode_varuint_to_vec(0, &mut hello); // packet type: Hello
//! put_str(&mut hello, "clickhouse-client");
//! encode_varuint_to_vec(24, &mut hello);
//! encode_varuint_to_vec(8, &mut hello);
//! encode_varuint_to_vec(54000, &mut hello); // TCP protocol revision
//! put_str(&mut hello, "default");
//! put_str(&mut hello, "admin");
//! put_str(&mut hello, "");
//!
//! let state = ProtocolState::new();
//! let mut handshake = ClientHandshake::new();
//! let slices = [hello.as_slice()];
//! let mut data = Cursor::new(&slices);
//!
//! assert!(handshake.feed(&mut data, &state).unwrap());
//! assert_eq!(handshake.hello().user(), "admin");
//! assert_eq!(state.tcp_protocol_version().value(), 54000);
//! ```

mod chunk;
mod cursor;
mod error;
mod handshake;
mod packet;
mod reader;
mod revision;
mod state;
mod varuint;

pub use chunk::ChunkFramer;
pub use cursor::Cursor;
pub use error::WireError;
pub use handshake::{
    ClientAddendumReader, ClientHandshake, ClientHelloReader, ClientPhase, ServerHandshake,
    ServerHelloReader, ServerPhase, JWT_AUTHENTICATION_MARKER, SSH_KEY_AUTHENTICATION_MARKER,
    USER_INTERSERVER_MARKER,
};
pub use packet::{ClientPacket, Direction, ServerPacket, UnknownPacket};
pub use reader::{ComplexityRule, FromLeBytes, PodReader, Reader, RulesReader, StringReader};
pub use revision::{
    Revision, WITH_ADDENDUM, WITH_CHUNKED_PACKETS, WITH_INTERSERVER_SECRET_V2,
    WITH_PASSWORD_COMPLEXITY_RULES, WITH_QUOTA_KEY, WITH_SERVER_DISPLAY_NAME,
    WITH_SERVER_TIMEZONE, WITH_VERSION_PATCH,
};
pub use state::{HandshakeView, ProtocolState};
pub use varuint::{encode_varuint_to_vec, VarUIntReader, MAX_VARUINT_LEN};
