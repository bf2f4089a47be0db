//! Client-direction handshake readers and state machine.

use std::borrow::Cow;

use super::{ExpectedPacket, SSH_KEY_AUTHENTICATION_MARKER};
use crate::cursor::Cursor;
use crate::error::WireError;
use crate::packet::{ClientPacket, Direction};
use crate::reader::{Reader, StringReader};
use crate::revision::Revision;
use crate::state::ProtocolState;
use crate::varuint::VarUIntReader;

const HELLO_FIELDS: usize = 7;

/// Resumable reader for the client Hello packet.
///
/// The leading packet type must be `Hello`; anything else aborts the
/// handshake with [`WireError::UnexpectedPacket`]. The seven body fields
/// follow in declaration order.
#[derive(Debug)]
pub struct ClientHelloReader {
    packet_type: ExpectedPacket,
    client_name: StringReader,
    client_version_major: VarUIntReader,
    client_version_minor: VarUIntReader,
    client_tcp_protocol_version: VarUIntReader,
    default_db: StringReader,
    user: StringReader,
    password: StringReader,
    field: usize,
}

impl ClientHelloReader {
    /// Creates a reader that has not absorbed any bytes yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            packet_type: ExpectedPacket::new(Direction::Client, ClientPacket::Hello as u64),
            client_name: StringReader::new(),
            client_version_major: VarUIntReader::new(),
            client_version_minor: VarUIntReader::new(),
            client_tcp_protocol_version: VarUIntReader::new(),
            default_db: StringReader::new(),
            user: StringReader::new(),
            password: StringReader::new(),
            field: 0,
        }
    }

    /// Client software name, lossily decoded for display.
    #[must_use]
    pub fn client_name(&self) -> Cow<'_, str> {
        self.client_name.text()
    }

    /// Client major version.
    #[must_use]
    pub fn client_version_major(&self) -> u64 {
        self.client_version_major.value()
    }

    /// Client minor version.
    #[must_use]
    pub fn client_version_minor(&self) -> u64 {
        self.client_version_minor.value()
    }

    /// TCP protocol revision the client announced.
    #[must_use]
    pub fn revision(&self) -> Revision {
        Revision::new(self.client_tcp_protocol_version.value())
    }

    /// Default database requested by the client.
    #[must_use]
    pub fn default_db(&self) -> Cow<'_, str> {
        self.default_db.text()
    }

    /// User name, lossily decoded for display.
    #[must_use]
    pub fn user(&self) -> Cow<'_, str> {
        self.user.text()
    }

    /// Raw user-name bytes, as marker comparisons are byte-exact.
    #[must_use]
    pub fn user_bytes(&self) -> &[u8] {
        self.user.bytes()
    }

    /// Whether the client supplied a non-empty password.
    #[must_use]
    pub fn has_password(&self) -> bool {
        !self.password.bytes().is_empty()
    }

    /// Whether the Hello announces SSH-key based authentication: the user
    /// name starts with the SSH marker and the password is empty.
    #[must_use]
    pub fn requests_ssh_auth(&self) -> bool {
        self.user
            .bytes()
            .starts_with(SSH_KEY_AUTHENTICATION_MARKER.as_bytes())
            && self.password.bytes().is_empty()
    }
}

impl Default for ClientHelloReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for ClientHelloReader {
    fn feed(&mut self, data: &mut Cursor<'_>) -> Result<bool, WireError> {
        if !self.packet_type.feed(data)? {
            return Ok(false);
        }

        while self.field < HELLO_FIELDS && data.has_remaining() {
            let reader: &mut dyn Reader = match self.field {
                0 => &mut self.client_name,
                1 => &mut self.client_version_major,
                2 => &mut self.client_version_minor,
                3 => &mut self.client_tcp_protocol_version,
                4 => &mut self.default_db,
                5 => &mut self.user,
                _ => &mut self.password,
            };
            if reader.feed(data)? {
                self.field += 1;
            }
        }

        Ok(self.is_complete())
    }

    fn is_complete(&self) -> bool {
        self.field == HELLO_FIELDS
    }

    fn reset(&mut self) {
        self.packet_type.reset();
        self.client_name.reset();
        self.client_version_major.reset();
        self.client_version_minor.reset();
        self.client_tcp_protocol_version.reset();
        self.default_db.reset();
        self.user.reset();
        self.password.reset();
        self.field = 0;
    }
}

/// Resumable reader for the optional client addendum.
///
/// Field presence is gated by the revision the Hello announced: the quota
/// key from `WITH_QUOTA_KEY`, the two chunked-framing strings from
/// `WITH_ADDENDUM`. Invoked with a revision below every gate it completes
/// without consuming bytes.
#[derive(Debug, Default)]
pub struct ClientAddendumReader {
    quota_key: StringReader,
    proto_send_chunked: StringReader,
    proto_recv_chunked: StringReader,
    complete: bool,
}

impl ClientAddendumReader {
    /// Creates a reader that has not absorbed any bytes yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quota key announced by the client.
    #[must_use]
    pub fn quota_key(&self) -> Cow<'_, str> {
        self.quota_key.text()
    }

    /// Whether the client announced chunked framing for its own direction.
    #[must_use]
    pub fn send_chunked(&self) -> bool {
        self.proto_send_chunked.bytes() == b"chunked"
    }

    /// Whether the client requested chunked framing for the server
    /// direction.
    #[must_use]
    pub fn recv_chunked(&self) -> bool {
        self.proto_recv_chunked.bytes() == b"chunked"
    }

    /// Reports whether the addendum finished decoding.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Consumes bytes from `data`, skipping fields `revision` gates out.
    ///
    /// # Errors
    ///
    /// Propagates [`WireError::MalformedVarUInt`] from the embedded string
    /// length prefixes.
    pub fn feed(&mut self, data: &mut Cursor<'_>, revision: Revision) -> Result<bool, WireError> {
        if self.complete {
            return Ok(true);
        }

        if revision.has_quota_key()
            && !self.quota_key.is_complete()
            && !self.quota_key.feed(data)?
        {
            return Ok(false);
        }

        if revision.has_addendum() {
            if !self.proto_send_chunked.is_complete() && !self.proto_send_chunked.feed(data)? {
                return Ok(false);
            }
            if !self.proto_recv_chunked.is_complete() && !self.proto_recv_chunked.feed(data)? {
                return Ok(false);
            }
        }

        self.complete = true;
        Ok(true)
    }

    /// Clears the accumulated fields so the reader can be reused.
    pub fn reset(&mut self) {
        self.quota_key.reset();
        self.proto_send_chunked.reset();
        self.proto_recv_chunked.reset();
        self.complete = false;
    }
}

/// Resumable reader for the SSH challenge response packet.
#[derive(Debug)]
struct SshChallengeResponseReader {
    packet_type: ExpectedPacket,
    signature: StringReader,
}

impl SshChallengeResponseReader {
    fn new() -> Self {
        Self {
            packet_type: ExpectedPacket::new(
                Direction::Client,
                ClientPacket::SshChallengeResponse as u64,
            ),
            signature: StringReader::new(),
        }
    }
}

impl Reader for SshChallengeResponseReader {
    fn feed(&mut self, data: &mut Cursor<'_>) -> Result<bool, WireError> {
        if !self.packet_type.feed(data)? {
            return Ok(false);
        }
        if !self.signature.is_complete() && !self.signature.feed(data)? {
            return Ok(false);
        }
        Ok(true)
    }

    fn is_complete(&self) -> bool {
        self.packet_type.is_complete() && self.signature.is_complete()
    }

    fn reset(&mut self) {
        self.packet_type.reset();
        self.signature.reset();
    }
}

/// Phases of the client-direction handshake.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientPhase {
    /// Awaiting or decoding the client Hello.
    Hello,
    /// Awaiting the SSH challenge request packet.
    SshChallengeRequest,
    /// Awaiting the SSH challenge response packet.
    SshChallengeResponse,
    /// Awaiting or decoding the addendum.
    Addendum,
    /// The handshake finished; later client bytes are not its concern.
    Done,
}

/// Sequences the client-direction handshake packets and publishes the
/// negotiated values into the shared [`ProtocolState`].
#[derive(Debug)]
pub struct ClientHandshake {
    phase: ClientPhase,
    hello: ClientHelloReader,
    ssh_request: ExpectedPacket,
    ssh_response: SshChallengeResponseReader,
    addendum: ClientAddendumReader,
}

impl ClientHandshake {
    /// Creates a machine in the [`ClientPhase::Hello`] phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: ClientPhase::Hello,
            hello: ClientHelloReader::new(),
            ssh_request: ExpectedPacket::new(
                Direction::Client,
                ClientPacket::SshChallengeRequest as u64,
            ),
            ssh_response: SshChallengeResponseReader::new(),
            addendum: ClientAddendumReader::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    /// Reports whether the handshake reached [`ClientPhase::Done`].
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == ClientPhase::Done
    }

    /// The decoded Hello packet.
    #[must_use]
    pub fn hello(&self) -> &ClientHelloReader {
        &self.hello
    }

    /// The decoded addendum.
    #[must_use]
    pub fn addendum(&self) -> &ClientAddendumReader {
        &self.addendum
    }

    /// Consumes bytes from `data` and advances through the phases,
    /// publishing negotiated values into `state` as they become known.
    /// Returns whether the handshake is now complete.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedPacket`] or
    /// [`WireError::MalformedVarUInt`] when the stream violates the
    /// protocol, and [`WireError::HandshakeAlreadyComplete`] when bytes
    /// arrive after `Done`.
    pub fn feed(&mut self, data: &mut Cursor<'_>, state: &ProtocolState) -> Result<bool, WireError> {
        if self.phase == ClientPhase::Done {
            if data.has_remaining() {
                return Err(WireError::HandshakeAlreadyComplete(Direction::Client));
            }
            return Ok(true);
        }

        loop {
            match self.phase {
                ClientPhase::Hello => {
                    if !self.hello.feed(data)? {
                        break;
                    }
                    let revision = self.hello.revision();
                    let ssh = self.hello.requests_ssh_auth();
                    state.set_tcp_protocol_version(revision);
                    state.set_ssh_based_auth(ssh);
                    self.phase = if ssh {
                        ClientPhase::SshChallengeRequest
                    } else if revision.has_addendum() {
                        ClientPhase::Addendum
                    } else {
                        ClientPhase::Done
                    };
                }
                ClientPhase::SshChallengeRequest => {
                    if !self.ssh_request.feed(data)? {
                        break;
                    }
                    self.phase = ClientPhase::SshChallengeResponse;
                }
                ClientPhase::SshChallengeResponse => {
                    if !self.ssh_response.feed(data)? {
                        break;
                    }
                    self.phase = if self.hello.revision().has_addendum() {
                        ClientPhase::Addendum
                    } else {
                        ClientPhase::Done
                    };
                }
                ClientPhase::Addendum => {
                    if !self.addendum.feed(data, self.hello.revision())? {
                        break;
                    }
                    state.set_chunked_client(self.addendum.send_chunked());
                    state.set_chunked_server(self.addendum.recv_chunked());
                    self.phase = ClientPhase::Done;
                }
                ClientPhase::Done => break,
            }

            if self.phase == ClientPhase::Done || !data.has_remaining() {
                break;
            }
        }

        Ok(self.phase == ClientPhase::Done)
    }

    /// Returns the machine to its connection-start state.
    pub fn reset(&mut self) {
        self.phase = ClientPhase::Hello;
        self.hello.reset();
        self.ssh_request.reset();
        self.ssh_response.reset();
        self.addendum.reset();
    }
}

impl Default for ClientHandshake {
    fn default() -> Self {
        Self::new()
    }
}
