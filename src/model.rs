//! # Data Model
//!
//! Core data structures for customer reconciliation: identity keys, source
//! tags, the canonical customer aggregate, and the partial patches that
//! normalizers emit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder key shared by every record that carries no usable contact data.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Derived string naming one customer for the duration of a single run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wrap an already-derived key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The placeholder key for unidentified traffic.
    pub fn unknown() -> Self {
        Self(UNKNOWN_IDENTITY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_IDENTITY
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Marker recording which input collection type contributed to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    Profile,
    Behavior,
    DeliveryOrder,
    RideBooking,
    Booking,
    Telemetry,
}

impl SourceTag {
    /// Order in which sources are folded into the aggregate map.
    ///
    /// Scalar merge is overwrite-based, so this order decides which source
    /// wins a field and must never be changed or parallelized across sources.
    pub const PROCESSING_ORDER: [SourceTag; 6] = [
        SourceTag::Profile,
        SourceTag::Behavior,
        SourceTag::DeliveryOrder,
        SourceTag::RideBooking,
        SourceTag::Booking,
        SourceTag::Telemetry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::Profile => "profile",
            SourceTag::Behavior => "behavior",
            SourceTag::DeliveryOrder => "delivery-order",
            SourceTag::RideBooking => "ride-booking",
            SourceTag::Booking => "booking",
            SourceTag::Telemetry => "telemetry",
        }
    }

    /// Snapshot collection names read for this source, in concatenation order.
    pub fn collection_names(self) -> &'static [&'static str] {
        match self {
            SourceTag::Profile => &["profiles"],
            SourceTag::Behavior => &["behavior_signals", "behaviorSignals"],
            SourceTag::DeliveryOrder => &["delivery_orders", "deliveryOrders"],
            SourceTag::RideBooking => &["ride_bookings", "rideBookings"],
            SourceTag::Booking => &["bookings"],
            SourceTag::Telemetry => &["telemetry_events", "telemetryEvents"],
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical, merged record for one identity key.
///
/// Empty strings mean "no known value"; timestamps are kept verbatim as they
/// appeared in the contributing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAggregate {
    pub identity_key: IdentityKey,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub ip_address: String,
    pub browser: String,
    pub created_at: String,
    pub updated_at: String,
    pub last_order_at: String,
    pub last_seen_at: String,
    pub last_page: String,
    /// `Some(true)` after a login, `Some(false)` after a logout, `None` when unknown.
    pub logged_in: Option<bool>,
    /// Ordered, de-duplicated address strings.
    pub addresses: Vec<String>,
    /// Ordered, de-duplicated contributing sources.
    pub sources: Vec<SourceTag>,
}

impl CustomerAggregate {
    /// Create an empty aggregate for a key seen for the first time in a run.
    pub fn new(identity_key: IdentityKey) -> Self {
        Self {
            identity_key,
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            ip_address: String::new(),
            browser: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
            last_order_at: String::new(),
            last_seen_at: String::new(),
            last_page: String::new(),
            logged_in: None,
            addresses: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// No phone, no email, and nothing but telemetry behind it.
    pub fn is_anonymous(&self) -> bool {
        self.phone.trim().is_empty()
            && self.email.trim().is_empty()
            && self
                .sources
                .iter()
                .all(|source| *source == SourceTag::Telemetry)
    }
}

/// Partial aggregate emitted by one normalizer for one identity.
///
/// `None` means the source does not carry the field; `Some("")` means it does
/// and the value is empty. Only carried fields take part in the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatePatch {
    pub source: SourceTag,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub browser: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_order_at: Option<String>,
    pub last_seen_at: Option<String>,
    pub last_page: Option<String>,
    pub logged_in: Option<Option<bool>>,
    pub addresses: Vec<String>,
}

impl AggregatePatch {
    /// A patch that only records the contributing source.
    pub fn new(source: SourceTag) -> Self {
        Self {
            source,
            name: None,
            phone: None,
            email: None,
            ip_address: None,
            browser: None,
            created_at: None,
            updated_at: None,
            last_order_at: None,
            last_seen_at: None,
            last_page: None,
            logged_in: None,
            addresses: Vec::new(),
        }
    }
}

/// A patch together with the identity it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePatch {
    pub key: IdentityKey,
    pub patch: AggregatePatch,
}

impl SourcePatch {
    pub fn new(key: IdentityKey, patch: AggregatePatch) -> Self {
        Self { key, patch }
    }
}
