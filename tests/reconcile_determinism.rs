//! Determinism and permutation properties over generated snapshots.
//!
//! 1. Re-running on the same snapshot yields byte-identical output
//! 2. Shuffling rows within one collection keeps the identity set, the address
//!    sets and the exact source lists unchanged

#[path = "../src/test_support.rs"]
mod test_support;

use std::collections::{BTreeMap, BTreeSet};

use clientele_rs::{reconcile_value, CustomerAggregate, ReconcileOptions, SourceTag};
use test_support::{generate_document, shuffle_collection};

type Shape = BTreeMap<String, (BTreeSet<String>, Vec<SourceTag>)>;

fn shape(customers: &[CustomerAggregate]) -> Shape {
    customers
        .iter()
        .map(|customer| {
            (
                customer.identity_key.to_string(),
                (
                    customer.addresses.iter().cloned().collect(),
                    customer.sources.clone(),
                ),
            )
        })
        .collect()
}

#[test]
fn repeated_runs_are_byte_identical() -> anyhow::Result<()> {
    let document = generate_document(400, 60, 11);
    let options = ReconcileOptions::include_anonymous(true);

    let first = serde_json::to_string(&reconcile_value(document.clone(), &options)?)?;
    let second = serde_json::to_string(&reconcile_value(document, &options)?)?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn row_order_within_a_collection_keeps_list_fields() -> anyhow::Result<()> {
    let options = ReconcileOptions::include_anonymous(true);
    let document = generate_document(300, 40, 23);
    let baseline = shape(&reconcile_value(document.clone(), &options)?);
    assert!(!baseline.is_empty());

    for (offset, source) in SourceTag::PROCESSING_ORDER.into_iter().enumerate() {
        let mut shuffled = document.clone();
        shuffle_collection(&mut shuffled, source, 1_000 + offset as u64);
        let permuted = shape(&reconcile_value(shuffled, &options)?);
        assert_eq!(baseline, permuted, "shuffling {source} changed list fields");
    }
    Ok(())
}

#[test]
fn anonymous_filter_only_removes_telemetry_only_identities() -> anyhow::Result<()> {
    let document = generate_document(300, 40, 5);
    let everyone = reconcile_value(document.clone(), &ReconcileOptions::include_anonymous(true))?;
    let named = reconcile_value(document, &ReconcileOptions::default())?;

    let dropped: Vec<&CustomerAggregate> = everyone
        .iter()
        .filter(|customer| {
            !named
                .iter()
                .any(|kept| kept.identity_key == customer.identity_key)
        })
        .collect();

    assert!(!dropped.is_empty());
    for customer in dropped {
        assert!(customer.is_anonymous());
        assert_eq!(customer.sources, vec![SourceTag::Telemetry]);
    }
    assert!(named.iter().all(|customer| !customer.is_anonymous()));
    Ok(())
}
