//! # Identity Module
//!
//! Derives a stable identity key from whatever contact fields a record carries.
//!
//! Each collection declares an [`IdentityRule`]: the contact fields it trusts,
//! in priority order. The first non-empty field wins and is normalized into the
//! key. Different contact values for the same person are never unified; only
//! an explicit identifier ties records together across contact channels.

use crate::model::IdentityKey;

pub const PHONE_PREFIX: &str = "phone:";
pub const EMAIL_PREFIX: &str = "email:";
pub const IP_PREFIX: &str = "ip:";

/// A contact channel that can name a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    /// Explicit customer/user identifier; used verbatim.
    ExplicitId,
    Phone,
    Email,
    Ip,
}

/// Contact values extracted from one record. Empty strings mean absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactFields<'a> {
    pub explicit_id: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub ip: &'a str,
}

impl<'a> ContactFields<'a> {
    fn get(&self, field: IdentityField) -> &'a str {
        match field {
            IdentityField::ExplicitId => self.explicit_id,
            IdentityField::Phone => self.phone,
            IdentityField::Email => self.email,
            IdentityField::Ip => self.ip,
        }
    }
}

/// Prioritized set of candidate fields for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRule {
    pub name: &'static str,
    pub fields: &'static [IdentityField],
}

impl IdentityRule {
    pub const PROFILE: IdentityRule = IdentityRule {
        name: "profile",
        fields: &[IdentityField::ExplicitId, IdentityField::Phone],
    };
    pub const BEHAVIOR: IdentityRule = IdentityRule {
        name: "behavior",
        fields: &[IdentityField::ExplicitId],
    };
    pub const DELIVERY_ORDER: IdentityRule = IdentityRule {
        name: "delivery-order",
        fields: &[
            IdentityField::ExplicitId,
            IdentityField::Phone,
            IdentityField::Email,
        ],
    };
    pub const RIDE_BOOKING: IdentityRule = IdentityRule {
        name: "ride-booking",
        fields: &[IdentityField::ExplicitId, IdentityField::Phone],
    };
    pub const BOOKING: IdentityRule = IdentityRule {
        name: "booking",
        fields: &[
            IdentityField::ExplicitId,
            IdentityField::Phone,
            IdentityField::Email,
        ],
    };
    pub const TELEMETRY: IdentityRule = IdentityRule {
        name: "telemetry",
        fields: &[
            IdentityField::ExplicitId,
            IdentityField::Phone,
            IdentityField::Email,
            IdentityField::Ip,
        ],
    };

    /// Derive the key for a record. Never fails; falls back to the placeholder.
    pub fn derive(&self, contacts: &ContactFields<'_>) -> IdentityKey {
        derive_identity_key(contacts, self.fields)
    }
}

/// Derive an identity key from the first non-empty field in `priority`.
pub fn derive_identity_key(contacts: &ContactFields<'_>, priority: &[IdentityField]) -> IdentityKey {
    priority
        .iter()
        .find_map(|field| {
            let raw = contacts.get(*field).trim();
            (!raw.is_empty()).then(|| key_for(*field, raw))
        })
        .unwrap_or_else(IdentityKey::unknown)
}

fn key_for(field: IdentityField, raw: &str) -> IdentityKey {
    match field {
        IdentityField::ExplicitId => IdentityKey::new(raw),
        IdentityField::Phone => IdentityKey::new(format!("{PHONE_PREFIX}{}", normalize_phone(raw))),
        IdentityField::Email => IdentityKey::new(format!("{EMAIL_PREFIX}{}", raw.to_lowercase())),
        IdentityField::Ip => IdentityKey::new(format!("{IP_PREFIX}{}", raw.to_lowercase())),
    }
}

/// Digits only; the lowercased raw value when there are no digits at all.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        raw.to_lowercase()
    } else {
        digits
    }
}
