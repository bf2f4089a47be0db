//! # Overview
//!
//! [`ClickHouseFilter`] is the per-connection object a proxy host drives.
//! It owns the two handshake machines, the shared protocol state, and one
//! chunk framer per direction, and it dispatches every delivery to
//! whichever subsystem currently cares about that direction. The filter
//! only observes: it never consumes, rewrites, or reorders the bytes the
//! proxy copies through.
//!
//! # Hand-off
//!
//! A direction is inspected until either its handshake finished and no
//! chunked framing was negotiated for it, or decoding failed. From then on
//! the hand-off flag short-circuits every later delivery; there is no
//! reverse transition.

use clickhouse_wire::{
    ChunkFramer, ClientHandshake, Cursor, Direction, ProtocolState, ServerHandshake, WireError,
};

/// Verdict returned to the host after each callback.
///
/// This filter never buffers, so it always answers [`FilterStatus::Continue`];
/// the variant carrying a stop is part of the host contract nonetheless.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FilterStatus {
    /// Keep iterating through the remaining filters in the chain.
    #[default]
    Continue,
    /// Hold the delivery until the filter resumes the chain.
    StopIteration,
}

/// Byte-stream callbacks a network filter receives from the proxy host.
///
/// `data` is the ordered list of contiguous slices making up one delivery;
/// implementations observe the bytes but must not assume they can keep
/// references past the callback.
pub trait NetworkFilter {
    /// Called once when the connection is accepted.
    fn on_new_connection(&mut self) -> FilterStatus {
        FilterStatus::Continue
    }

    /// Observes bytes flowing from the database client to the server.
    fn on_client_bytes(&mut self, data: &[&[u8]], end_of_stream: bool) -> FilterStatus;

    /// Observes bytes flowing from the database server to the client.
    fn on_server_bytes(&mut self, data: &[&[u8]], end_of_stream: bool) -> FilterStatus;
}

/// Connection identity attached to log events.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnectionContext {
    /// Host-assigned connection id.
    pub id: u64,
}

/// Transparent observer for the ClickHouse native protocol.
#[derive(Debug, Default)]
pub struct ClickHouseFilter {
    state: ProtocolState,
    client_handshake: ClientHandshake,
    server_handshake: ServerHandshake,
    client_framer: ChunkFramer,
    server_framer: ChunkFramer,
    client_framing: bool,
    server_framing: bool,
    client_hands_off: bool,
    server_hands_off: bool,
    read_context: ConnectionContext,
    write_context: ConnectionContext,
}

impl ClickHouseFilter {
    /// Creates a filter for a fresh connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the read-side connection context; used only for logging.
    pub fn initialize_read_context(&mut self, context: ConnectionContext) {
        self.read_context = context;
    }

    /// Stores the write-side connection context; used only for logging.
    pub fn initialize_write_context(&mut self, context: ConnectionContext) {
        self.write_context = context;
    }

    /// Shared per-connection state the host may inspect.
    #[must_use]
    pub fn protocol_state(&self) -> &ProtocolState {
        &self.state
    }

    /// The client-direction handshake machine.
    #[must_use]
    pub fn client_handshake(&self) -> &ClientHandshake {
        &self.client_handshake
    }

    /// The server-direction handshake machine.
    #[must_use]
    pub fn server_handshake(&self) -> &ServerHandshake {
        &self.server_handshake
    }

    /// Whether client-direction bytes pass through uninspected.
    #[must_use]
    pub fn client_hands_off(&self) -> bool {
        self.client_hands_off
    }

    /// Whether server-direction bytes pass through uninspected.
    #[must_use]
    pub fn server_hands_off(&self) -> bool {
        self.server_hands_off
    }

    fn context_for(&self, direction: Direction) -> ConnectionContext {
        match direction {
            Direction::Client => self.read_context,
            Direction::Server => self.write_context,
        }
    }

    fn abandon(&mut self, direction: Direction, error: &WireError) {
        tracing::warn!(
            conn = self.context_for(direction).id,
            direction = %direction,
            error = %error,
            "protocol decoding abandoned, handing direction off"
        );
        match direction {
            Direction::Client => self.client_hands_off = true,
            Direction::Server => self.server_hands_off = true,
        }
    }

    fn log_client_hello(&self) {
        let hello = self.client_handshake.hello();
        tracing::info!(
            conn = self.read_context.id,
            client_name = %hello.client_name(),
            client_version_major = hello.client_version_major(),
            client_version_minor = hello.client_version_minor(),
            client_tcp_protocol_version = hello.revision().value(),
            default_db = %hello.default_db(),
            user = %hello.user(),
            password_provided = hello.has_password(),
            quota_key = %self.client_handshake.addendum().quota_key(),
            chunked_client = self.state.chunked_client(),
            chunked_server = self.state.chunked_server(),
            "client hello decoded"
        );
    }

    fn log_server_hello(&self) {
        let hello = self.server_handshake.hello();
        tracing::info!(
            conn = self.write_context.id,
            version_name = %hello.version_name(),
            version_major = hello.version_major(),
            version_minor = hello.version_minor(),
            dbms_tcp_protocol_version = hello.dbms_tcp_protocol_version(),
            time_zone = %hello.time_zone(),
            server_display_name = %hello.server_display_name(),
            version_patch = hello.version_patch(),
            proto_send_chunked_srv = %hello.proto_send_chunked(),
            proto_recv_chunked_srv = %hello.proto_recv_chunked(),
            nonce = hello.nonce(),
            "server hello decoded"
        );
    }
}

fn delivery_len(data: &[&[u8]]) -> usize {
    data.iter().map(|slice| slice.len()).sum()
}

impl NetworkFilter for ClickHouseFilter {
    fn on_new_connection(&mut self) -> FilterStatus {
        tracing::trace!(conn = self.read_context.id, "new connection");
        FilterStatus::Continue
    }

    fn on_client_bytes(&mut self, data: &[&[u8]], end_of_stream: bool) -> FilterStatus {
        tracing::debug!(
            conn = self.read_context.id,
            direction = %Direction::Client,
            len = delivery_len(data),
            end_of_stream,
            "delivery observed"
        );
        if self.client_hands_off {
            return FilterStatus::Continue;
        }

        let mut cursor = Cursor::new(data);

        if !self.client_framing {
            match self.client_handshake.feed(&mut cursor, &self.state) {
                Ok(false) => return FilterStatus::Continue,
                Ok(true) => {
                    self.log_client_hello();
                    if self.state.chunked_client() {
                        // The rest of this delivery already belongs to the
                        // chunked stream.
                        self.client_framing = true;
                    } else {
                        self.client_hands_off = true;
                        return FilterStatus::Continue;
                    }
                }
                Err(error) => {
                    self.abandon(Direction::Client, &error);
                    return FilterStatus::Continue;
                }
            }
        }

        let conn = self.read_context.id;
        if let Err(error) = self.client_framer.feed(&mut cursor, |packet| {
            tracing::debug!(
                conn,
                direction = %Direction::Client,
                packet,
                name = Direction::Client.packet_name(packet),
                "packet identified"
            );
        }) {
            self.abandon(Direction::Client, &error);
        }

        FilterStatus::Continue
    }

    fn on_server_bytes(&mut self, data: &[&[u8]], end_of_stream: bool) -> FilterStatus {
        tracing::debug!(
            conn = self.write_context.id,
            direction = %Direction::Server,
            len = delivery_len(data),
            end_of_stream,
            "delivery observed"
        );
        if self.server_hands_off {
            return FilterStatus::Continue;
        }

        let mut cursor = Cursor::new(data);

        if !self.server_framing {
            match self.server_handshake.feed(&mut cursor, &self.state) {
                Ok(false) => return FilterStatus::Continue,
                Ok(true) => {
                    self.log_server_hello();
                    if self.state.chunked_server() {
                        self.server_framing = true;
                    } else {
                        self.server_hands_off = true;
                        return FilterStatus::Continue;
                    }
                }
                Err(error) => {
                    self.abandon(Direction::Server, &error);
                    return FilterStatus::Continue;
                }
            }
        }

        let conn = self.write_context.id;
        if let Err(error) = self.server_framer.feed(&mut cursor, |packet| {
            tracing::debug!(
                conn,
                direction = %Direction::Server,
                packet,
                name = Direction::Server.packet_name(packet),
                "packet identified"
            );
        }) {
            self.abandon(Direction::Server, &error);
        }

        FilterStatus::Continue
    }
}
