//! # Aggregate Merge Engine
//!
//! Folds every source's patches, in the fixed processing order, into a map from
//! identity key to customer aggregate.
//!
//! Merge policy:
//! * scalar fields carried by a patch overwrite unconditionally, blank or not
//! * address and source lists are an additive, first-occurrence-ordered union
//!
//! Sources are normalized one at a time and applied sequentially; the fold
//! starts from an empty map on every run and hands the map back to the caller.

use crate::model::{AggregatePatch, CustomerAggregate, IdentityKey, SourcePatch, SourceTag};
use crate::normalize::{
    BehaviorSource, BookingSource, DeliveryOrderSource, ProfileSource, RideBookingSource,
    SourceNormalizer,
};
use crate::snapshot::Snapshot;
use crate::telemetry::TelemetrySource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Identity key to aggregate. Ordered so iteration is deterministic.
pub type AggregateMap = BTreeMap<IdentityKey, CustomerAggregate>;

/// Counters collected while folding a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    /// Rows read per source.
    pub rows_read: BTreeMap<SourceTag, usize>,
    /// Patches applied per source.
    pub patches_applied: BTreeMap<SourceTag, usize>,
    /// Distinct identities after the merge.
    pub identities: usize,
    /// Anonymous aggregates removed by the filter.
    pub anonymous_dropped: usize,
    /// Aggregates in the final output.
    pub emitted: usize,
}

/// The normalizers, in processing order.
pub fn pipeline() -> [&'static dyn SourceNormalizer; 6] {
    [
        &ProfileSource,
        &BehaviorSource,
        &DeliveryOrderSource,
        &RideBookingSource,
        &BookingSource,
        &TelemetrySource,
    ]
}

/// Normalize and merge every source of a snapshot.
pub fn merge_snapshot(snapshot: &Snapshot) -> (AggregateMap, ReconcileStats) {
    pipeline().into_iter().fold(
        (AggregateMap::new(), ReconcileStats::default()),
        |(mut aggregates, mut stats), source| {
            let tag = source.tag();
            let rows = snapshot.rows_for(tag);
            let patches = source.normalize(&rows);
            debug!(
                source = %tag,
                rows = rows.len(),
                patches = patches.len(),
                "merging source"
            );

            stats.rows_read.insert(tag, rows.len());
            stats.patches_applied.insert(tag, patches.len());
            apply_patches(&mut aggregates, patches);
            stats.identities = aggregates.len();
            (aggregates, stats)
        },
    )
}

/// Apply patches in order, creating aggregates on first contribution.
pub fn apply_patches(aggregates: &mut AggregateMap, patches: impl IntoIterator<Item = SourcePatch>) {
    for SourcePatch { key, patch } in patches {
        aggregates
            .entry(key)
            .or_insert_with_key(|key| CustomerAggregate::new(key.clone()))
            .apply(patch);
    }
}

impl CustomerAggregate {
    /// Merge one patch into this aggregate.
    pub fn apply(&mut self, patch: AggregatePatch) {
        let AggregatePatch {
            source,
            name,
            phone,
            email,
            ip_address,
            browser,
            created_at,
            updated_at,
            last_order_at,
            last_seen_at,
            last_page,
            logged_in,
            addresses,
        } = patch;

        overwrite(&mut self.name, name);
        overwrite(&mut self.phone, phone);
        overwrite(&mut self.email, email);
        overwrite(&mut self.ip_address, ip_address);
        overwrite(&mut self.browser, browser);
        overwrite(&mut self.created_at, created_at);
        overwrite(&mut self.updated_at, updated_at);
        overwrite(&mut self.last_order_at, last_order_at);
        overwrite(&mut self.last_seen_at, last_seen_at);
        overwrite(&mut self.last_page, last_page);
        overwrite(&mut self.logged_in, logged_in);

        union_addresses(&mut self.addresses, addresses);
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }
}

fn overwrite<T>(field: &mut T, incoming: Option<T>) {
    if let Some(value) = incoming {
        *field = value;
    }
}

/// Append incoming addresses, de-duplicated by trimmed equality.
///
/// Blank entries are dropped and stored values are trimmed. The list never
/// shrinks and keeps first-occurrence order.
pub fn union_addresses(existing: &mut Vec<String>, incoming: impl IntoIterator<Item = String>) {
    for address in incoming {
        let trimmed = address.trim();
        if trimmed.is_empty() || existing.iter().any(|known| known.trim() == trimmed) {
            continue;
        }
        existing.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(key: &str, patch: AggregatePatch) -> SourcePatch {
        SourcePatch::new(IdentityKey::new(key), patch)
    }

    #[test]
    fn test_scalar_overwrite_includes_blank_values() {
        let mut aggregates = AggregateMap::new();
        apply_patches(
            &mut aggregates,
            vec![
                patch(
                    "u1",
                    AggregatePatch {
                        name: Some("Asha".to_string()),
                        ..AggregatePatch::new(SourceTag::Profile)
                    },
                ),
                patch(
                    "u1",
                    AggregatePatch {
                        name: Some(String::new()),
                        ..AggregatePatch::new(SourceTag::DeliveryOrder)
                    },
                ),
            ],
        );

        let aggregate = &aggregates[&IdentityKey::new("u1")];
        assert_eq!(aggregate.name, "");
        assert_eq!(
            aggregate.sources,
            vec![SourceTag::Profile, SourceTag::DeliveryOrder]
        );
    }

    #[test]
    fn test_fields_not_carried_are_left_alone() {
        let mut aggregate = CustomerAggregate::new(IdentityKey::new("u1"));
        aggregate.apply(AggregatePatch {
            ip_address: Some("1.1.1.1".to_string()),
            logged_in: Some(Some(true)),
            ..AggregatePatch::new(SourceTag::Telemetry)
        });
        aggregate.apply(AggregatePatch::new(SourceTag::Booking));

        assert_eq!(aggregate.ip_address, "1.1.1.1");
        assert_eq!(aggregate.logged_in, Some(true));
    }

    #[test]
    fn test_logged_in_can_be_overwritten_to_unknown() {
        let mut aggregate = CustomerAggregate::new(IdentityKey::new("u1"));
        aggregate.logged_in = Some(false);
        aggregate.apply(AggregatePatch {
            logged_in: Some(None),
            ..AggregatePatch::new(SourceTag::Telemetry)
        });
        assert_eq!(aggregate.logged_in, None);
    }

    #[test]
    fn test_address_union_trims_and_preserves_first_occurrence() {
        let mut addresses = vec!["12 Hill Rd".to_string()];
        union_addresses(
            &mut addresses,
            vec![
                " 12 Hill Rd ".to_string(),
                "Airport".to_string(),
                "   ".to_string(),
                "airport".to_string(),
                "Airport".to_string(),
            ],
        );
        assert_eq!(addresses, vec!["12 Hill Rd", "Airport", "airport"]);
    }

    #[test]
    fn test_sources_recorded_once() {
        let mut aggregates = AggregateMap::new();
        apply_patches(
            &mut aggregates,
            (0..3).map(|_| patch("u1", AggregatePatch::new(SourceTag::Booking))),
        );
        assert_eq!(
            aggregates[&IdentityKey::new("u1")].sources,
            vec![SourceTag::Booking]
        );
    }

    #[test]
    fn test_merge_snapshot_follows_processing_order() {
        // Bookings come after delivery orders, so the booking name wins even
        // though the booking rows are listed first in the document.
        let snapshot = Snapshot::from_value(json!({
            "bookings": [{"user_id": "u1", "name": "From Booking"}],
            "delivery_orders": [{"user_id": "u1", "name": "From Delivery"}],
            "profiles": [{"id": "u1", "name": "From Profile"}],
        }))
        .unwrap();

        let (aggregates, stats) = merge_snapshot(&snapshot);
        let aggregate = &aggregates[&IdentityKey::new("u1")];
        assert_eq!(aggregate.name, "From Booking");
        assert_eq!(
            aggregate.sources,
            vec![SourceTag::Profile, SourceTag::DeliveryOrder, SourceTag::Booking]
        );
        assert_eq!(stats.identities, 1);
        assert_eq!(stats.rows_read[&SourceTag::Booking], 1);
        assert_eq!(stats.patches_applied[&SourceTag::Telemetry], 0);
    }

    #[test]
    fn test_pipeline_matches_processing_order() {
        let tags: Vec<SourceTag> = pipeline().iter().map(|source| source.tag()).collect();
        assert_eq!(tags, SourceTag::PROCESSING_ORDER.to_vec());
    }
}
