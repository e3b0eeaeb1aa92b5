//! # Event Stream Reducer
//!
//! Folds the telemetry-event collection into current-state facts per identity:
//! the latest presence (time, IP, browser, page) and the latest login/logout.
//!
//! Both reductions share one replacement rule. The first event seen for an
//! identity is always retained, parsable or not. A later event replaces it when
//! its timestamp parses and either the retained one does not parse or the later
//! one is at or after it. An unparsable timestamp can therefore only ever win as
//! the first event, and only until a parsable one arrives.

use crate::fields::{self, text};
use crate::identity::{ContactFields, IdentityRule};
use crate::metadata::Metadata;
use crate::model::{AggregatePatch, IdentityKey, SourcePatch, SourceTag};
use crate::normalize::SourceNormalizer;
use crate::snapshot::Row;
use crate::temporal::is_at_or_after;
use std::collections::BTreeMap;
use tracing::debug;

/// Most recent location/device context for an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceFact {
    pub timestamp: String,
    pub ip: String,
    pub browser: String,
    pub page: String,
}

/// Login or logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Login,
    Logout,
}

impl AuthKind {
    /// Recognizes `login`/`logout` event types, ignoring case and padding.
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type.trim().to_ascii_lowercase().as_str() {
            "login" => Some(AuthKind::Login),
            "logout" => Some(AuthKind::Logout),
            _ => None,
        }
    }

    pub fn is_logged_in(self) -> bool {
        self == AuthKind::Login
    }
}

/// Most recent login/logout event for an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFact {
    pub kind: AuthKind,
    pub timestamp: String,
}

/// Reduced state for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityActivity {
    pub presence: PresenceFact,
    pub auth: Option<AuthFact>,
}

impl IdentityActivity {
    /// The telemetry patch: last-seen facts plus tri-state login status.
    pub fn into_patch(self) -> AggregatePatch {
        let IdentityActivity { presence, auth } = self;
        AggregatePatch {
            last_seen_at: Some(presence.timestamp),
            ip_address: Some(presence.ip),
            browser: Some(presence.browser),
            last_page: Some(presence.page),
            logged_in: Some(auth.map(|fact| fact.kind.is_logged_in())),
            ..AggregatePatch::new(SourceTag::Telemetry)
        }
    }
}

/// One event after field extraction and metadata normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedEvent {
    key: IdentityKey,
    event_type: String,
    timestamp: String,
    ip: String,
    browser: String,
    page: String,
}

impl ParsedEvent {
    fn from_row(row: &Row) -> Self {
        let meta = Metadata::from_value(fields::nested(row, fields::EVENT_META)).normalize();
        let ip = first_non_empty(text(&meta, fields::IP), || text(row, fields::IP));
        let browser = first_non_empty(text(&meta, fields::BROWSER), || text(row, fields::BROWSER));

        let id = text(row, fields::USER_ID);
        let phone = text(row, fields::PHONE);
        let email = text(row, fields::EMAIL);
        let key = IdentityRule::TELEMETRY.derive(&ContactFields {
            explicit_id: &id,
            phone: &phone,
            email: &email,
            ip: &ip,
        });

        Self {
            key,
            event_type: text(row, fields::EVENT_TYPE),
            timestamp: text(row, fields::EVENT_AT),
            ip,
            browser,
            page: text(&meta, fields::PAGE),
        }
    }
}

fn first_non_empty(primary: String, fallback: impl FnOnce() -> String) -> String {
    if primary.is_empty() {
        fallback()
    } else {
        primary
    }
}

/// Keep-latest slot implementing the shared replacement rule.
fn retain_latest<T>(slot: &mut Option<T>, candidate: T, timestamp_of: impl Fn(&T) -> &str) {
    let replace = match slot.as_ref() {
        None => true,
        Some(current) => is_at_or_after(timestamp_of(&candidate), timestamp_of(current)),
    };
    if replace {
        *slot = Some(candidate);
    }
}

/// Per-identity presence and auth reductions over an event stream.
#[derive(Debug, Clone, Default)]
pub struct EventReduction {
    presence: BTreeMap<IdentityKey, PresenceFact>,
    auth: BTreeMap<IdentityKey, AuthFact>,
}

impl EventReduction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce a whole collection, in row order.
    pub fn from_rows(rows: &[&Row]) -> Self {
        let mut reduction = Self::new();
        for row in rows {
            reduction.observe(row);
        }
        reduction
    }

    /// Feed one event row into both reductions.
    pub fn observe(&mut self, row: &Row) {
        let event = ParsedEvent::from_row(row);

        if let Some(kind) = AuthKind::from_event_type(&event.event_type) {
            let mut slot = self.auth.remove(&event.key);
            retain_latest(
                &mut slot,
                AuthFact {
                    kind,
                    timestamp: event.timestamp.clone(),
                },
                |fact| fact.timestamp.as_str(),
            );
            if let Some(fact) = slot {
                self.auth.insert(event.key.clone(), fact);
            }
        }

        let mut slot = self.presence.remove(&event.key);
        retain_latest(
            &mut slot,
            PresenceFact {
                timestamp: event.timestamp,
                ip: event.ip,
                browser: event.browser,
                page: event.page,
            },
            |fact| fact.timestamp.as_str(),
        );
        if let Some(fact) = slot {
            self.presence.insert(event.key, fact);
        }
    }

    pub fn presence(&self, key: &IdentityKey) -> Option<&PresenceFact> {
        self.presence.get(key)
    }

    pub fn auth(&self, key: &IdentityKey) -> Option<&AuthFact> {
        self.auth.get(key)
    }

    /// Number of identities with at least one event.
    pub fn len(&self) -> usize {
        self.presence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }

    /// Final state per identity, ordered by identity key.
    pub fn into_activities(self) -> Vec<(IdentityKey, IdentityActivity)> {
        let EventReduction {
            presence,
            mut auth,
        } = self;
        presence
            .into_iter()
            .map(|(key, presence)| {
                let auth = auth.remove(&key);
                (key, IdentityActivity { presence, auth })
            })
            .collect()
    }
}

/// Telemetry events, reduced to one patch per identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetrySource;

impl SourceNormalizer for TelemetrySource {
    fn tag(&self) -> SourceTag {
        SourceTag::Telemetry
    }

    fn normalize(&self, rows: &[&Row]) -> Vec<SourcePatch> {
        let reduction = EventReduction::from_rows(rows);
        debug!(
            events = rows.len(),
            identities = reduction.len(),
            "reduced telemetry events"
        );
        reduction
            .into_activities()
            .into_iter()
            .map(|(key, activity)| SourcePatch::new(key, activity.into_patch()))
            .collect()
    }
}
