//! Packet-type enumerations for both directions of the native protocol.
//!
//! The numeric values mirror the ClickHouse server's own packet tables so
//! logs can name packets the way the database does. Each direction has its
//! own namespace; a value is only meaningful together with the
//! [`Direction`] it was observed on.

use core::fmt;

use thiserror::Error;

/// Direction of travel for bytes observed by the filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    /// Bytes flowing from the database client towards the server.
    Client,
    /// Bytes flowing from the database server towards the client.
    Server,
}

impl Direction {
    /// Lower-case label used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }

    /// Resolves `value` against this direction's packet namespace.
    ///
    /// Unknown values render as `"Unknown packet"` so diagnostics never
    /// panic on a hostile byte stream.
    #[must_use]
    pub const fn packet_name(self, value: u64) -> &'static str {
        match self {
            Self::Client => ClientPacket::name_of(value),
            Self::Server => ServerPacket::name_of(value),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced when a packet-type value falls outside a direction's
/// namespace.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("unknown {direction} packet type {value}")]
pub struct UnknownPacket {
    /// Direction whose namespace was consulted.
    pub direction: Direction,
    /// The out-of-range packet-type value.
    pub value: u64,
}

/// Packets a ClickHouse client may send.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ClientPacket {
    /// Name, version, revision, default database, credentials.
    Hello = 0,
    /// Query id, settings, execution stage, compression flag, query text.
    Query = 1,
    /// A block of data, compressed or not.
    Data = 2,
    /// Cancel the running query.
    Cancel = 3,
    /// Connection liveness probe.
    Ping = 4,
    /// Check the status of tables on the server.
    TablesStatusRequest = 5,
    /// Keep the connection alive.
    KeepAlive = 6,
    /// A block of scalar data.
    Scalar = 7,
    /// Unique part ids to exclude from query processing.
    IgnoredPartUuids = 8,
    /// A filename to read from shared storage.
    ReadTaskResponse = 9,
    /// Coordinator decision with a modified set of mark ranges.
    MergeTreeReadTaskResponse = 10,
    /// Request an SSH signature challenge.
    SshChallengeRequest = 11,
    /// Reply to an SSH signature challenge.
    SshChallengeResponse = 12,
}

impl ClientPacket {
    /// Converts a decoded packet-type value into the enumeration.
    #[must_use]
    pub const fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Hello),
            1 => Some(Self::Query),
            2 => Some(Self::Data),
            3 => Some(Self::Cancel),
            4 => Some(Self::Ping),
            5 => Some(Self::TablesStatusRequest),
            6 => Some(Self::KeepAlive),
            7 => Some(Self::Scalar),
            8 => Some(Self::IgnoredPartUuids),
            9 => Some(Self::ReadTaskResponse),
            10 => Some(Self::MergeTreeReadTaskResponse),
            11 => Some(Self::SshChallengeRequest),
            12 => Some(Self::SshChallengeResponse),
            _ => None,
        }
    }

    /// Symbolic name of the packet.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hello => "Hello",
            Self::Query => "Query",
            Self::Data => "Data",
            Self::Cancel => "Cancel",
            Self::Ping => "Ping",
            Self::TablesStatusRequest => "TablesStatusRequest",
            Self::KeepAlive => "KeepAlive",
            Self::Scalar => "Scalar",
            Self::IgnoredPartUuids => "IgnoredPartUUIDs",
            Self::ReadTaskResponse => "ReadTaskResponse",
            Self::MergeTreeReadTaskResponse => "MergeTreeReadTaskResponse",
            Self::SshChallengeRequest => "SSHChallengeRequest",
            Self::SshChallengeResponse => "SSHChallengeResponse",
        }
    }

    /// Human-readable name for `value`, with an `"Unknown packet"` fallback.
    #[must_use]
    pub const fn name_of(value: u64) -> &'static str {
        match Self::from_u64(value) {
            Some(packet) => packet.name(),
            None => "Unknown packet",
        }
    }
}

impl fmt::Display for ClientPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u64> for ClientPacket {
    type Error = UnknownPacket;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_u64(value).ok_or(UnknownPacket {
            direction: Direction::Client,
            value,
        })
    }
}

/// Packets a ClickHouse server may send.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ServerPacket {
    /// Name, version, revision and the gated capability tail.
    Hello = 0,
    /// A block of data, compressed or not.
    Data = 1,
    /// The exception raised during query execution.
    Exception = 2,
    /// Query execution progress: rows read, bytes read.
    Progress = 3,
    /// Ping response.
    Pong = 4,
    /// All packets were transmitted.
    EndOfStream = 5,
    /// Packet with profiling info.
    ProfileInfo = 6,
    /// A block with totals.
    Totals = 7,
    /// A block with minimums and maximums.
    Extremes = 8,
    /// Response to a TablesStatus request.
    TablesStatusResponse = 9,
    /// System logs of the query execution.
    Log = 10,
    /// Columns' description for default values calculation.
    TableColumns = 11,
    /// List of unique part ids.
    PartUuids = 12,
    /// Request for the next task, sent server to client.
    ReadTaskRequest = 13,
    /// Packet with profile events from the server.
    ProfileEvents = 14,
    /// Announcement of all ranges in a MergeTree read task.
    MergeTreeAllRangesAnnouncement = 15,
    /// Request from a MergeTree replica to a coordinator.
    MergeTreeReadTaskRequest = 16,
    /// The server's session-wide default timezone changed.
    TimezoneUpdate = 17,
    /// Challenge for SSH signature signing.
    SshChallenge = 18,
}

impl ServerPacket {
    /// Converts a decoded packet-type value into the enumeration.
    #[must_use]
    pub const fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Hello),
            1 => Some(Self::Data),
            2 => Some(Self::Exception),
            3 => Some(Self::Progress),
            4 => Some(Self::Pong),
            5 => Some(Self::EndOfStream),
            6 => Some(Self::ProfileInfo),
            7 => Some(Self::Totals),
            8 => Some(Self::Extremes),
            9 => Some(Self::TablesStatusResponse),
            10 => Some(Self::Log),
            11 => Some(Self::TableColumns),
            12 => Some(Self::PartUuids),
            13 => Some(Self::ReadTaskRequest),
            14 => Some(Self::ProfileEvents),
            15 => Some(Self::MergeTreeAllRangesAnnouncement),
            16 => Some(Self::MergeTreeReadTaskRequest),
            17 => Some(Self::TimezoneUpdate),
            18 => Some(Self::SshChallenge),
            _ => None,
        }
    }

    /// Symbolic name of the packet.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hello => "Hello",
            Self::Data => "Data",
            Self::Exception => "Exception",
            Self::Progress => "Progress",
            Self::Pong => "Pong",
            Self::EndOfStream => "EndOfStream",
            Self::ProfileInfo => "ProfileInfo",
            Self::Totals => "Totals",
            Self::Extremes => "Extremes",
            Self::TablesStatusResponse => "TablesStatusResponse",
            Self::Log => "Log",
            Self::TableColumns => "TableColumns",
            Self::PartUuids => "PartUUIDs",
            Self::ReadTaskRequest => "ReadTaskRequest",
            Self::ProfileEvents => "ProfileEvents",
            Self::MergeTreeAllRangesAnnouncement => "MergeTreeAllRangesAnnouncement",
            Self::MergeTreeReadTaskRequest => "MergeTreeReadTaskRequest",
            Self::TimezoneUpdate => "TimezoneUpdate",
            Self::SshChallenge => "SSHChallenge",
        }
    }

    /// Human-readable name for `value`, with an `"Unknown packet"` fallback.
    #[must_use]
    pub const fn name_of(value: u64) -> &'static str {
        match Self::from_u64(value) {
            Some(packet) => packet.name(),
            None => "Unknown packet",
        }
    }
}

impl fmt::Display for ServerPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u64> for ServerPacket {
    type Error = UnknownPacket;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_u64(value).ok_or(UnknownPacket {
            direction: Direction::Server,
            value,
        })
    }
}
