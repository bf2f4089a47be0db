//! Shared per-connection protocol state.
//!
//! The client-direction machine writes these cells while decoding the
//! client Hello and addendum; the server-direction machine and the filter
//! facade read them. Each cell is written once and read many times. One
//! mutex guards the whole record: the host may drive the two directions
//! from different executors, so the cells must be race free even though a
//! single connection is handled cooperatively.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::revision::Revision;

#[derive(Clone, Copy, Debug, Default)]
struct Cells {
    tcp_protocol_version: u64,
    is_ssh_based_auth: bool,
    chunked_client: bool,
    chunked_server: bool,
}

/// Values negotiated by the client handshake and consulted by the server
/// handshake and the filter facade.
#[derive(Debug, Default)]
pub struct ProtocolState {
    cells: Mutex<Cells>,
}

/// Snapshot of the cells the server-direction machine consults.
#[derive(Clone, Copy, Debug)]
pub struct HandshakeView {
    /// Revision announced by the client Hello; [`Revision::UNSET`] until
    /// the client Hello completed.
    pub revision: Revision,
    /// Whether the client requested SSH-key based authentication.
    pub is_ssh_based_auth: bool,
}

impl ProtocolState {
    /// Creates state with all cells at their connection-start values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cells(&self) -> MutexGuard<'_, Cells> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the revision announced by the client Hello.
    pub fn set_tcp_protocol_version(&self, revision: Revision) {
        self.cells().tcp_protocol_version = revision.value();
    }

    /// The negotiated revision; [`Revision::UNSET`] before the client Hello.
    #[must_use]
    pub fn tcp_protocol_version(&self) -> Revision {
        Revision::new(self.cells().tcp_protocol_version)
    }

    /// Records whether the client requested SSH-key based authentication.
    pub fn set_ssh_based_auth(&self, value: bool) {
        self.cells().is_ssh_based_auth = value;
    }

    /// Whether the client requested SSH-key based authentication.
    #[must_use]
    pub fn is_ssh_based_auth(&self) -> bool {
        self.cells().is_ssh_based_auth
    }

    /// Records whether client-direction traffic switches to chunked framing.
    pub fn set_chunked_client(&self, value: bool) {
        self.cells().chunked_client = value;
    }

    /// Whether client-direction traffic switches to chunked framing.
    #[must_use]
    pub fn chunked_client(&self) -> bool {
        self.cells().chunked_client
    }

    /// Records whether server-direction traffic switches to chunked framing.
    pub fn set_chunked_server(&self, value: bool) {
        self.cells().chunked_server = value;
    }

    /// Whether server-direction traffic switches to chunked framing.
    #[must_use]
    pub fn chunked_server(&self) -> bool {
        self.cells().chunked_server
    }

    /// Reads the cells the server-direction machine needs under one lock
    /// acquisition.
    #[must_use]
    pub fn handshake(&self) -> HandshakeView {
        let cells = self.cells();
        HandshakeView {
            revision: Revision::new(cells.tcp_protocol_version),
            is_ssh_based_auth: cells.is_ssh_based_auth,
        }
    }
}
