//! Field readers for loosely-named rows.
//!
//! Collections mix snake_case and camelCase spellings of the same concept, so
//! every lookup goes through an alias list and takes the first usable value.

use serde_json::{Map, Value};

pub const USER_ID: &[&str] = &["user_id", "userId", "uid"];
pub const PROFILE_ID: &[&str] = &["id", "user_id", "userId", "uid"];
pub const NAME: &[&str] = &["name", "full_name", "fullName", "customer_name", "customerName"];
pub const PHONE: &[&str] = &[
    "phone",
    "phone_number",
    "phoneNumber",
    "mobile",
    "customer_phone",
    "customerPhone",
];
pub const EMAIL: &[&str] = &["email", "customer_email", "customerEmail"];
pub const IP: &[&str] = &["ip", "ip_address", "ipAddress"];
pub const BROWSER: &[&str] = &["browser", "user_agent", "userAgent"];
pub const CREATED_AT: &[&str] = &["created_at", "createdAt"];
pub const UPDATED_AT: &[&str] = &["updated_at", "updatedAt"];

pub const DELIVERY_ADDRESS: &[&str] = &["delivery_address", "deliveryAddress"];
pub const ORDER_TIME: &[&str] = &["order_time", "orderTime", "created_at", "createdAt"];
pub const PICKUP: &[&str] = &["pickup_location", "pickupLocation", "pickup"];
pub const DROP: &[&str] = &["drop_location", "dropLocation", "drop"];

pub const LOCATION_MOBILITY: &[&str] = &["location_mobility", "locationMobility"];
pub const SAVED_ADDRESSES: &[&str] = &["saved_addresses", "savedAddresses"];
pub const ADDRESS_TEXT: &[&str] = &["address", "formatted_address", "formattedAddress", "label"];

pub const EVENT_TYPE: &[&str] = &["type", "event_type", "eventType"];
pub const EVENT_AT: &[&str] = &["at", "timestamp", "created_at", "createdAt"];
pub const EVENT_META: &[&str] = &["meta", "metadata"];
pub const PAGE: &[&str] = &["page", "path", "pathname"];

/// Render a scalar as trimmed text. Null and containers read as empty.
pub fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => {
            String::new()
        }
    }
}

/// First non-empty alias value, or an empty string.
pub fn text(row: &Map<String, Value>, aliases: &[&str]) -> String {
    aliases
        .iter()
        .map(|alias| scalar_text(row.get(*alias)))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// First alias whose value is present and not null.
pub fn nested<'a>(row: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|value| !value.is_null())
}

/// `Some(text)` when any alias key is present with a non-null value, even an
/// empty one. `None` when the row does not mention the field at all.
pub fn present(row: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    nested(row, aliases).map(|_| text(row, aliases))
}

/// `Some(text)` only when the alias lookup yields a non-empty value.
pub fn non_empty(row: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    Some(text(row, aliases)).filter(|value| !value.is_empty())
}
