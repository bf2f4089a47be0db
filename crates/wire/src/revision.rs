//! Protocol revision gates for version-dependent handshake fields.
//!
//! ClickHouse grows its handshake by appending fields guarded by minimum
//! revision numbers. The constants below are the gates the native protocol
//! has accumulated for the fields this filter decodes; the values are
//! bit-exact and must never drift.

use core::fmt;

/// First revision that reports the server time zone in the server Hello.
pub const WITH_SERVER_TIMEZONE: u64 = 54058;
/// First revision that reports the server display name.
pub const WITH_SERVER_DISPLAY_NAME: u64 = 54372;
/// First revision that reports the server patch version.
pub const WITH_VERSION_PATCH: u64 = 54401;
/// First revision whose client Hello is followed by an addendum.
pub const WITH_ADDENDUM: u64 = 54458;
/// First revision whose addendum carries a quota key.
pub const WITH_QUOTA_KEY: u64 = 54458;
/// First revision that announces password complexity rules.
pub const WITH_PASSWORD_COMPLEXITY_RULES: u64 = 54461;
/// First revision that exchanges a nonce for the inter-server secret.
pub const WITH_INTERSERVER_SECRET_V2: u64 = 54462;
/// First revision that can negotiate chunked packet framing.
pub const WITH_CHUNKED_PACKETS: u64 = 54470;

/// A ClickHouse TCP protocol revision, as announced in a Hello packet.
///
/// Readers consult the feature queries instead of comparing raw integers so
/// gate decisions stay in one place.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Revision(u64);

impl Revision {
    /// Revision value in force before the client Hello announced one.
    pub const UNSET: Revision = Revision(0);

    /// Wraps a raw revision number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw revision number.
    #[must_use]
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Reports whether no client Hello has announced a revision yet.
    #[must_use]
    #[inline]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// Reports whether this revision reaches the given gate constant.
    #[must_use]
    #[inline]
    pub const fn supports(self, gate: u64) -> bool {
        self.0 >= gate
    }

    /// Server Hello carries the server time zone.
    #[must_use]
    pub const fn has_server_timezone(self) -> bool {
        self.supports(WITH_SERVER_TIMEZONE)
    }

    /// Server Hello carries the display name.
    #[must_use]
    pub const fn has_server_display_name(self) -> bool {
        self.supports(WITH_SERVER_DISPLAY_NAME)
    }

    /// Server Hello carries the patch version.
    #[must_use]
    pub const fn has_version_patch(self) -> bool {
        self.supports(WITH_VERSION_PATCH)
    }

    /// Client Hello is followed by an addendum block.
    #[must_use]
    pub const fn has_addendum(self) -> bool {
        self.supports(WITH_ADDENDUM)
    }

    /// The addendum carries a quota key.
    #[must_use]
    pub const fn has_quota_key(self) -> bool {
        self.supports(WITH_QUOTA_KEY)
    }

    /// Server Hello carries the password complexity rule list.
    #[must_use]
    pub const fn has_password_complexity_rules(self) -> bool {
        self.supports(WITH_PASSWORD_COMPLEXITY_RULES)
    }

    /// Server Hello carries the inter-server secret nonce.
    #[must_use]
    pub const fn has_interserver_secret_v2(self) -> bool {
        self.supports(WITH_INTERSERVER_SECRET_V2)
    }

    /// Both peers may negotiate chunked packet framing.
    #[must_use]
    pub const fn has_chunked_packets(self) -> bool {
        self.supports(WITH_CHUNKED_PACKETS)
    }
}

impl From<u64> for Revision {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
