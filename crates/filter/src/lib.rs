#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `clickhouse_filter` exposes the ClickHouse handshake decoders of
//! [`clickhouse_wire`] as a transparent network filter a reverse proxy can
//! install in its data path. The filter reconstructs both Hello packets,
//! follows the SSH challenge sub-exchange and the addendum, and keeps
//! identifying packet types for any direction that negotiated chunked
//! framing. Directions that need no further parsing are handed off and
//! flow through untouched.
//!
//! # Design
//!
//! The crate is a facade over the sans-I/O protocol core:
//!
//! - [`ClickHouseFilter`] implements the host-facing [`NetworkFilter`]
//!   callbacks and dispatches each delivery to a handshake machine or a
//!   chunk framer.
//! - [`ClickHouseFilterFactory`] builds per-connection filter values from a
//!   [`FilterConfig`] and registers into a host-owned [`FilterRegistry`]
//!   under [`FILTER_NAME`].
//!
//! All diagnostics go through `tracing`; decoded Hello fields are logged at
//! info, per-packet identifications at debug, and protocol errors at warn
//! right before the direction is handed off.
//!
//! # Invariants
//!
//! - The filter never consumes, rewrites, or reorders bytes; every
//!   callback answers `Continue`.
//! - Once a direction's hand-off flag is set it never clears, and no later
//!   delivery for that direction touches the decoders or the shared state.
//! - No decoding error escapes a callback.
//!
//! # Examples
//!
//! Register the factory the way a host does at startup and drive one
//! connection:
//!
//! ```
//! use clickhouse_filter::{
//!     register_clickhouse_filter, FilterConfig, FilterRegistry, FilterStatus, NetworkFilter,
//!     FILTER_NAME,
//! };
//!
//! let mut registry = FilterRegistry::new();
//! register_clickhouse_filter(&mut registry, FilterConfig::default());
//!
//! let factory = registry.lookup(FILTER_NAME).expect("factory is registered");
//! let mut filter = factory.create();
//! assert_eq!(filter.on_new_connection(), FilterStatus::Continue);
//!
//! // A first byte that is not a Hello: the filter logs, hands the
//! // direction off, and keeps the bytes flowing.
//! let delivery: [&[u8]; 1] = [&[0x05]];
//! assert_eq!(filter.on_client_bytes(&delivery, false), FilterStatus::Continue);
//! ```

mod config;
mod filter;

pub use config::{
    register_clickhouse_filter, ClickHouseFilterFactory, FilterConfig, FilterFactory,
    FilterRegistry, FILTER_ALIAS, FILTER_NAME,
};
pub use filter::{ClickHouseFilter, ConnectionContext, FilterStatus, NetworkFilter};
