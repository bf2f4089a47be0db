//! Server-direction handshake readers and state machine.

use std::borrow::Cow;

use super::ExpectedPacket;
use crate::cursor::Cursor;
use crate::error::WireError;
use crate::packet::{Direction, ServerPacket};
use crate::reader::{ComplexityRule, PodReader, Reader, RulesReader, StringReader};
use crate::revision::{
    Revision, WITH_CHUNKED_PACKETS, WITH_INTERSERVER_SECRET_V2, WITH_PASSWORD_COMPLEXITY_RULES,
    WITH_SERVER_DISPLAY_NAME, WITH_SERVER_TIMEZONE, WITH_VERSION_PATCH,
};
use crate::state::ProtocolState;
use crate::varuint::VarUIntReader;

const SERVER_HELLO_FIELDS: usize = 11;

/// Minimum revision required before each server Hello field appears on the
/// wire, in field order. The revision used for gating is the one the client
/// announced, read from the shared state.
const FIELD_GATES: [u64; SERVER_HELLO_FIELDS] = [
    0, // version_name
    0, // version_major
    0, // version_minor
    0, // dbms_tcp_protocol_version
    WITH_SERVER_TIMEZONE,
    WITH_SERVER_DISPLAY_NAME,
    WITH_VERSION_PATCH,
    WITH_CHUNKED_PACKETS, // proto_send_chunked_srv
    WITH_CHUNKED_PACKETS, // proto_recv_chunked_srv
    WITH_PASSWORD_COMPLEXITY_RULES,
    WITH_INTERSERVER_SECRET_V2, // nonce
];

/// Resumable reader for the server Hello packet.
///
/// The field list is static; each feed walks it in order, skipping entries
/// the negotiated revision gates out without consuming any bytes for them.
#[derive(Debug)]
pub struct ServerHelloReader {
    packet_type: ExpectedPacket,
    version_name: StringReader,
    version_major: VarUIntReader,
    version_minor: VarUIntReader,
    dbms_tcp_protocol_version: VarUIntReader,
    time_zone: StringReader,
    server_display_name: StringReader,
    version_patch: VarUIntReader,
    proto_send_chunked: StringReader,
    proto_recv_chunked: StringReader,
    password_complexity_rules: RulesReader,
    nonce: PodReader<u64>,
    field: usize,
}

impl ServerHelloReader {
    /// Creates a reader that has not absorbed any bytes yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            packet_type: ExpectedPacket::new(Direction::Server, ServerPacket::Hello as u64),
            version_name: StringReader::new(),
            version_major: VarUIntReader::new(),
            version_minor: VarUIntReader::new(),
            dbms_tcp_protocol_version: VarUIntReader::new(),
            time_zone: StringReader::new(),
            server_display_name: StringReader::new(),
            version_patch: VarUIntReader::new(),
            proto_send_chunked: StringReader::new(),
            proto_recv_chunked: StringReader::new(),
            password_complexity_rules: RulesReader::new(),
            nonce: PodReader::new(),
            field: 0,
        }
    }

    /// Server software name.
    #[must_use]
    pub fn version_name(&self) -> Cow<'_, str> {
        self.version_name.text()
    }

    /// Server major version.
    #[must_use]
    pub fn version_major(&self) -> u64 {
        self.version_major.value()
    }

    /// Server minor version.
    #[must_use]
    pub fn version_minor(&self) -> u64 {
        self.version_minor.value()
    }

    /// TCP protocol revision the server itself speaks.
    #[must_use]
    pub fn dbms_tcp_protocol_version(&self) -> u64 {
        self.dbms_tcp_protocol_version.value()
    }

    /// Server time zone, empty below `WITH_SERVER_TIMEZONE`.
    #[must_use]
    pub fn time_zone(&self) -> Cow<'_, str> {
        self.time_zone.text()
    }

    /// Server display name, empty below `WITH_SERVER_DISPLAY_NAME`.
    #[must_use]
    pub fn server_display_name(&self) -> Cow<'_, str> {
        self.server_display_name.text()
    }

    /// Server patch version, zero below `WITH_VERSION_PATCH`.
    #[must_use]
    pub fn version_patch(&self) -> u64 {
        self.version_patch.value()
    }

    /// The server's chunked-framing announcement for its own direction.
    #[must_use]
    pub fn proto_send_chunked(&self) -> Cow<'_, str> {
        self.proto_send_chunked.text()
    }

    /// The server's chunked-framing announcement for the client direction.
    #[must_use]
    pub fn proto_recv_chunked(&self) -> Cow<'_, str> {
        self.proto_recv_chunked.text()
    }

    /// Password complexity rules announced by the server.
    #[must_use]
    pub fn password_complexity_rules(&self) -> &[ComplexityRule] {
        self.password_complexity_rules.rules()
    }

    /// Inter-server secret nonce, zero below `WITH_INTERSERVER_SECRET_V2`.
    #[must_use]
    pub fn nonce(&self) -> u64 {
        self.nonce.value()
    }

    /// Reports whether every present field finished decoding.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.field == SERVER_HELLO_FIELDS
    }

    /// Consumes bytes from `data`, skipping fields `revision` gates out.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedPacket`] when the leading packet type
    /// is not `Hello`, or [`WireError::MalformedVarUInt`] from an embedded
    /// integer.
    pub fn feed(&mut self, data: &mut Cursor<'_>, revision: Revision) -> Result<bool, WireError> {
        if !self.packet_type.feed(data)? {
            return Ok(false);
        }

        while self.field < SERVER_HELLO_FIELDS {
            if !revision.supports(FIELD_GATES[self.field]) {
                self.field += 1;
                continue;
            }
            if !data.has_remaining() {
                break;
            }
            let reader: &mut dyn Reader = match self.field {
                0 => &mut self.version_name,
                1 => &mut self.version_major,
                2 => &mut self.version_minor,
                3 => &mut self.dbms_tcp_protocol_version,
                4 => &mut self.time_zone,
                5 => &mut self.server_display_name,
                6 => &mut self.version_patch,
                7 => &mut self.proto_send_chunked,
                8 => &mut self.proto_recv_chunked,
                9 => &mut self.password_complexity_rules,
                _ => &mut self.nonce,
            };
            if reader.feed(data)? {
                self.field += 1;
            }
        }

        Ok(self.is_complete())
    }

    /// Clears the accumulated fields so the reader can be reused.
    pub fn reset(&mut self) {
        self.packet_type.reset();
        self.version_name.reset();
        self.version_major.reset();
        self.version_minor.reset();
        self.dbms_tcp_protocol_version.reset();
        self.time_zone.reset();
        self.server_display_name.reset();
        self.version_patch.reset();
        self.proto_send_chunked.reset();
        self.proto_recv_chunked.reset();
        self.password_complexity_rules.reset();
        self.nonce.reset();
        self.field = 0;
    }
}

impl Default for ServerHelloReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Phases of the server-direction handshake.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ServerPhase {
    /// Awaiting the SSH challenge packet; skipped for ordinary auth.
    SshChallenge,
    /// Awaiting or decoding the server Hello.
    Hello,
    /// The handshake finished; later server bytes are not its concern.
    Done,
}

/// Sequences the server-direction handshake packets.
///
/// The machine depends on cells written by the client handshake. Until the
/// shared revision is set it consumes nothing, tolerating a server-direction
/// delivery that races ahead of the client Hello.
#[derive(Debug)]
pub struct ServerHandshake {
    phase: ServerPhase,
    ssh_challenge: ExpectedPacket,
    hello: ServerHelloReader,
}

impl ServerHandshake {
    /// Creates a machine in the [`ServerPhase::SshChallenge`] phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: ServerPhase::SshChallenge,
            ssh_challenge: ExpectedPacket::new(
                Direction::Server,
                ServerPacket::SshChallenge as u64,
            ),
            hello: ServerHelloReader::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ServerPhase {
        self.phase
    }

    /// Reports whether the handshake reached [`ServerPhase::Done`].
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == ServerPhase::Done
    }

    /// The decoded Hello packet.
    #[must_use]
    pub fn hello(&self) -> &ServerHelloReader {
        &self.hello
    }

    /// Consumes bytes from `data` and advances through the phases. Returns
    /// whether the handshake is now complete.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedPacket`] or
    /// [`WireError::MalformedVarUInt`] when the stream violates the
    /// protocol, and [`WireError::HandshakeAlreadyComplete`] when bytes
    /// arrive after `Done`.
    pub fn feed(&mut self, data: &mut Cursor<'_>, state: &ProtocolState) -> Result<bool, WireError> {
        if self.phase == ServerPhase::Done {
            if data.has_remaining() {
                return Err(WireError::HandshakeAlreadyComplete(Direction::Server));
            }
            return Ok(true);
        }

        let view = state.handshake();
        if view.revision.is_unset() {
            return Ok(false);
        }

        if self.phase == ServerPhase::SshChallenge && !view.is_ssh_based_auth {
            self.phase = ServerPhase::Hello;
        }

        loop {
            match self.phase {
                ServerPhase::SshChallenge => {
                    if !self.ssh_challenge.feed(data)? {
                        break;
                    }
                    self.phase = ServerPhase::Hello;
                }
                ServerPhase::Hello => {
                    if !self.hello.feed(data, view.revision)? {
                        break;
                    }
                    self.phase = ServerPhase::Done;
                }
                ServerPhase::Done => break,
            }

            if self.phase == ServerPhase::Done || !data.has_remaining() {
                break;
            }
        }

        Ok(self.phase == ServerPhase::Done)
    }

    /// Returns the machine to its connection-start state.
    pub fn reset(&mut self) {
        self.phase = ServerPhase::SshChallenge;
        self.ssh_challenge.reset();
        self.hello.reset();
    }
}

impl Default for ServerHandshake {
    fn default() -> Self {
        Self::new()
    }
}
