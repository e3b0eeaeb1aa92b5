//! # Source Normalizers
//!
//! One normalizer per collection type. Each projects its rows into partial
//! aggregate patches keyed by a derived identity.

use crate::fields::{self, nested, non_empty, present, text};
use crate::identity::{ContactFields, IdentityRule};
use crate::model::{AggregatePatch, SourcePatch, SourceTag};
use crate::snapshot::Row;
use serde_json::Value;

/// Turns one source's rows into patches.
pub trait SourceNormalizer {
    fn tag(&self) -> SourceTag;

    /// Patches in row order. May emit fewer patches than rows (reductions).
    fn normalize(&self, rows: &[&Row]) -> Vec<SourcePatch>;
}

/// A source where every row maps to exactly one patch.
pub trait RowNormalizer {
    const TAG: SourceTag;

    fn normalize_row(&self, row: &Row) -> SourcePatch;
}

impl<T: RowNormalizer> SourceNormalizer for T {
    fn tag(&self) -> SourceTag {
        T::TAG
    }

    fn normalize(&self, rows: &[&Row]) -> Vec<SourcePatch> {
        rows.iter().map(|row| self.normalize_row(row)).collect()
    }
}

/// Customer profile records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSource;

impl RowNormalizer for ProfileSource {
    const TAG: SourceTag = SourceTag::Profile;

    fn normalize_row(&self, row: &Row) -> SourcePatch {
        let id = text(row, fields::PROFILE_ID);
        let phone = text(row, fields::PHONE);
        let key = IdentityRule::PROFILE.derive(&ContactFields {
            explicit_id: &id,
            phone: &phone,
            ..Default::default()
        });

        let patch = AggregatePatch {
            name: present(row, fields::NAME),
            phone: present(row, fields::PHONE),
            email: present(row, fields::EMAIL),
            ip_address: present(row, fields::IP),
            browser: present(row, fields::BROWSER),
            created_at: present(row, fields::CREATED_AT),
            updated_at: present(row, fields::UPDATED_AT),
            ..AggregatePatch::new(Self::TAG)
        };
        SourcePatch::new(key, patch)
    }
}

/// Behavioral signal records with saved addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorSource;

impl RowNormalizer for BehaviorSource {
    const TAG: SourceTag = SourceTag::Behavior;

    fn normalize_row(&self, row: &Row) -> SourcePatch {
        let id = text(row, fields::USER_ID);
        let key = IdentityRule::BEHAVIOR.derive(&ContactFields {
            explicit_id: &id,
            ..Default::default()
        });

        let patch = AggregatePatch {
            name: non_empty(row, fields::NAME),
            phone: non_empty(row, fields::PHONE),
            email: non_empty(row, fields::EMAIL),
            addresses: saved_addresses(row),
            ..AggregatePatch::new(Self::TAG)
        };
        SourcePatch::new(key, patch)
    }
}

/// Addresses listed under the nested location-mobility structure.
fn saved_addresses(row: &Row) -> Vec<String> {
    let Some(Value::Object(mobility)) = nested(row, fields::LOCATION_MOBILITY) else {
        return Vec::new();
    };
    let Some(Value::Array(saved)) = nested(mobility, fields::SAVED_ADDRESSES) else {
        return Vec::new();
    };

    saved
        .iter()
        .map(|entry| match entry {
            Value::Object(place) => text(place, fields::ADDRESS_TEXT),
            other => fields::scalar_text(Some(other)),
        })
        .filter(|address| !address.is_empty())
        .collect()
}

/// Delivery orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryOrderSource;

impl RowNormalizer for DeliveryOrderSource {
    const TAG: SourceTag = SourceTag::DeliveryOrder;

    fn normalize_row(&self, row: &Row) -> SourcePatch {
        let id = text(row, fields::USER_ID);
        let phone = text(row, fields::PHONE);
        let email = text(row, fields::EMAIL);
        let key = IdentityRule::DELIVERY_ORDER.derive(&ContactFields {
            explicit_id: &id,
            phone: &phone,
            email: &email,
            ..Default::default()
        });

        let patch = AggregatePatch {
            name: present(row, fields::NAME),
            phone: present(row, fields::PHONE),
            email: present(row, fields::EMAIL),
            last_order_at: present(row, fields::ORDER_TIME),
            addresses: non_empty(row, fields::DELIVERY_ADDRESS).into_iter().collect(),
            ..AggregatePatch::new(Self::TAG)
        };
        SourcePatch::new(key, patch)
    }
}

/// Ride bookings with pickup and drop locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RideBookingSource;

impl RowNormalizer for RideBookingSource {
    const TAG: SourceTag = SourceTag::RideBooking;

    fn normalize_row(&self, row: &Row) -> SourcePatch {
        let id = text(row, fields::USER_ID);
        let phone = text(row, fields::PHONE);
        let key = IdentityRule::RIDE_BOOKING.derive(&ContactFields {
            explicit_id: &id,
            phone: &phone,
            ..Default::default()
        });

        let mut addresses: Vec<String> = Vec::with_capacity(2);
        for location in [non_empty(row, fields::PICKUP), non_empty(row, fields::DROP)]
            .into_iter()
            .flatten()
        {
            if !addresses.contains(&location) {
                addresses.push(location);
            }
        }

        let patch = AggregatePatch {
            name: present(row, fields::NAME),
            phone: present(row, fields::PHONE),
            last_order_at: present(row, fields::CREATED_AT),
            addresses,
            ..AggregatePatch::new(Self::TAG)
        };
        SourcePatch::new(key, patch)
    }
}

/// Generic bookings. No address contribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingSource;

impl RowNormalizer for BookingSource {
    const TAG: SourceTag = SourceTag::Booking;

    fn normalize_row(&self, row: &Row) -> SourcePatch {
        let id = text(row, fields::USER_ID);
        let phone = text(row, fields::PHONE);
        let email = text(row, fields::EMAIL);
        let key = IdentityRule::BOOKING.derive(&ContactFields {
            explicit_id: &id,
            phone: &phone,
            email: &email,
            ..Default::default()
        });

        let patch = AggregatePatch {
            name: present(row, fields::NAME),
            phone: present(row, fields::PHONE),
            email: present(row, fields::EMAIL),
            ..AggregatePatch::new(Self::TAG)
        };
        SourcePatch::new(key, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IdentityKey;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("fixture must be an object"),
        }
    }

    #[test]
    fn test_profile_patch_carries_contact_and_device() {
        let record = row(json!({
            "id": "u1",
            "name": "Asha",
            "phone": "9990001111",
            "email": "asha@example.com",
            "ipAddress": "10.0.0.1",
            "user_agent": "Firefox",
            "createdAt": "2023-05-01T00:00:00Z",
            "updated_at": "2023-06-01T00:00:00Z",
        }));

        let SourcePatch { key, patch } = ProfileSource.normalize_row(&record);
        assert_eq!(key, IdentityKey::new("u1"));
        assert_eq!(patch.source, SourceTag::Profile);
        assert_eq!(patch.name.as_deref(), Some("Asha"));
        assert_eq!(patch.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(patch.browser.as_deref(), Some("Firefox"));
        assert_eq!(patch.created_at.as_deref(), Some("2023-05-01T00:00:00Z"));
        assert_eq!(patch.updated_at.as_deref(), Some("2023-06-01T00:00:00Z"));
        assert!(patch.last_order_at.is_none());
    }

    #[test]
    fn test_profile_without_id_keys_on_phone() {
        let record = row(json!({"name": "Asha", "phone": "999-000-1111"}));
        let patch = ProfileSource.normalize_row(&record);
        assert_eq!(patch.key, IdentityKey::new("phone:9990001111"));
    }

    #[test]
    fn test_behavior_reads_saved_addresses() {
        let record = row(json!({
            "userId": "u1",
            "locationMobility": {
                "savedAddresses": [
                    "12 Hill Rd",
                    {"formatted_address": "4 Lake View"},
                    {"label": ""},
                    42,
                ]
            }
        }));

        let SourcePatch { key, patch } = BehaviorSource.normalize_row(&record);
        assert_eq!(key, IdentityKey::new("u1"));
        assert_eq!(patch.addresses, vec!["12 Hill Rd", "4 Lake View", "42"]);
        assert!(patch.name.is_none());
        assert!(patch.phone.is_none());
    }

    #[test]
    fn test_behavior_without_user_id_is_unknown() {
        let record = row(json!({"phone": "9990001111", "name": "Asha"}));
        let SourcePatch { key, patch } = BehaviorSource.normalize_row(&record);
        assert!(key.is_unknown());
        assert_eq!(patch.phone.as_deref(), Some("9990001111"));
    }

    #[test]
    fn test_behavior_with_malformed_mobility_has_no_addresses() {
        let record = row(json!({"user_id": "u1", "location_mobility": "n/a"}));
        assert!(BehaviorSource.normalize_row(&record).patch.addresses.is_empty());
    }

    #[test]
    fn test_delivery_order_single_address_and_order_time() {
        let record = row(json!({
            "customer_email": "Asha@Example.com",
            "delivery_address": " 12 Hill Rd ",
            "order_time": "2024-01-01T10:00:00Z",
        }));

        let SourcePatch { key, patch } = DeliveryOrderSource.normalize_row(&record);
        assert_eq!(key, IdentityKey::new("email:asha@example.com"));
        assert_eq!(patch.addresses, vec!["12 Hill Rd"]);
        assert_eq!(patch.last_order_at.as_deref(), Some("2024-01-01T10:00:00Z"));
        assert!(patch.name.is_none());
        assert!(patch.phone.is_none());
    }

    #[test]
    fn test_delivery_order_carries_explicitly_empty_name() {
        let record = row(json!({"user_id": "u1", "customer_name": "", "customer_phone": null}));
        let patch = DeliveryOrderSource.normalize_row(&record).patch;
        assert_eq!(patch.name.as_deref(), Some(""));
        assert!(patch.phone.is_none());
        assert!(patch.last_order_at.is_none());
    }

    #[test]
    fn test_delivery_order_without_address_contributes_none() {
        let record = row(json!({"user_id": "u1"}));
        assert!(DeliveryOrderSource.normalize_row(&record).patch.addresses.is_empty());
    }

    #[test]
    fn test_ride_booking_dedupes_pickup_and_drop() {
        let record = row(json!({
            "phone": "9990001111",
            "pickup_location": "Airport",
            "dropLocation": "Airport",
            "created_at": "2024-02-01T08:00:00Z",
        }));

        let SourcePatch { key, patch } = RideBookingSource.normalize_row(&record);
        assert_eq!(key, IdentityKey::new("phone:9990001111"));
        assert_eq!(patch.addresses, vec!["Airport"]);
        assert_eq!(patch.last_order_at.as_deref(), Some("2024-02-01T08:00:00Z"));
        assert!(patch.email.is_none());
    }

    #[test]
    fn test_booking_has_no_addresses() {
        let record = row(json!({"user_id": "u9", "name": "Ravi", "address": "somewhere"}));
        let SourcePatch { key, patch } = BookingSource.normalize_row(&record);
        assert_eq!(key, IdentityKey::new("u9"));
        assert!(patch.addresses.is_empty());
        assert_eq!(patch.name.as_deref(), Some("Ravi"));
        assert!(patch.email.is_none());
    }

    #[test]
    fn test_source_normalizer_preserves_row_order() {
        let first = row(json!({"user_id": "a"}));
        let second = row(json!({"user_id": "b"}));
        let patches = BookingSource.normalize(&[&first, &second]);
        assert_eq!(BookingSource.tag(), SourceTag::Booking);
        assert_eq!(patches[0].key, IdentityKey::new("a"));
        assert_eq!(patches[1].key, IdentityKey::new("b"));
    }
}
