use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use clientele_rs::SourceTag;

/// The three-row scenario: a profile, a delivery order and a login event for `u1`.
#[allow(dead_code)]
pub fn asha_document() -> Value {
    json!({
        "profiles": [
            {"id": "u1", "name": "Asha", "phone": "9990001111"}
        ],
        "delivery_orders": [
            {"user_id": "u1", "delivery_address": "12 Hill Rd", "order_time": "2024-01-01T10:00:00Z"}
        ],
        "telemetry_events": [
            {"user_id": "u1", "type": "login", "at": "2024-01-02T09:00:00Z", "meta": {"ip": "1.2.3.4"}}
        ]
    })
}

/// Generate a document with overlapping customers across every collection.
///
/// Customers are drawn from a pool of `customers` ids so the same person shows
/// up in several collections and several times within one collection.
#[allow(dead_code)]
pub fn generate_document(rows_per_collection: usize, customers: u32, seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    let pages = ["/", "/cart", "/checkout", "/orders", "/profile"];
    let places = ["12 Hill Rd", "4 Lake View", "Airport", "Central Station", "9 Mill Lane"];
    let event_types = ["view", "click", "login", "logout"];

    let mut profiles = Vec::new();
    let mut behavior = Vec::new();
    let mut deliveries = Vec::new();
    let mut rides = Vec::new();
    let mut bookings = Vec::new();
    let mut events = Vec::new();

    for _ in 0..rows_per_collection {
        let n = rng.random_range(0..customers);
        let id = format!("u{n}");
        let phone = format!("99900{n:05}");
        let email = format!("customer{n}@example.com");
        let day = rng.random_range(1..28);
        let hour = rng.random_range(0..24);
        let stamp = format!("2024-02-{day:02}T{hour:02}:00:00Z");
        let place = places[rng.random_range(0..places.len())];
        let other_place = places[rng.random_range(0..places.len())];

        profiles.push(json!({"id": id, "name": format!("Customer {n}"), "phone": phone, "updated_at": stamp}));
        behavior.push(json!({
            "userId": id,
            "locationMobility": {"savedAddresses": [place, {"address": other_place}]}
        }));
        deliveries.push(json!({
            "user_id": id,
            "customer_name": format!("Customer {n}"),
            "customer_phone": phone,
            "customer_email": email,
            "delivery_address": place,
            "order_time": stamp
        }));
        rides.push(json!({
            "phone": phone,
            "name": format!("Customer {n}"),
            "pickup_location": place,
            "drop_location": other_place,
            "created_at": stamp
        }));
        bookings.push(json!({"email": email, "name": format!("Customer {n}")}));

        let event_type = event_types[rng.random_range(0..event_types.len())];
        let at = if rng.random_bool(0.1) {
            "not-a-time".to_string()
        } else {
            stamp.clone()
        };
        let event = if rng.random_bool(0.2) {
            json!({
                "type": event_type,
                "at": stamp,
                "meta": format!("{{\"ip\":\"10.0.0.{}\",\"page\":\"{}\"}}", n % 4, pages[n as usize % pages.len()])
            })
        } else {
            json!({
                "user_id": id,
                "type": event_type,
                "at": at,
                "meta": {"browser": "Firefox", "page": pages[rng.random_range(0..pages.len())]}
            })
        };
        events.push(event);
    }

    json!({
        "profiles": profiles,
        "behavior_signals": behavior,
        "delivery_orders": deliveries,
        "ride_bookings": rides,
        "bookings": bookings,
        "telemetry_events": events,
    })
}

/// Shuffle the rows of one source's collections in place.
#[allow(dead_code)]
pub fn shuffle_collection(document: &mut Value, source: SourceTag, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for name in source.collection_names() {
        if let Some(Value::Array(rows)) = document.get_mut(*name) {
            rows.shuffle(&mut rng);
        }
    }
}
