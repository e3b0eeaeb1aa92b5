//! # Clientele
//!
//! Deterministic reconciliation of loosely-structured customer records.
//!
//! Profile, behavior, order/booking and telemetry collections describing the
//! same people, with no shared primary key, are folded into one canonical
//! aggregate per derived identity. A run is a pure function of its snapshot:
//! no I/O, no state carried between runs, and identical output for identical
//! input.
//!
//! ```
//! use clientele_rs::{reconcile_value, ReconcileOptions};
//! use serde_json::json;
//!
//! let snapshot = json!({
//!     "profiles": [{"id": "u1", "name": "Asha", "phone": "9990001111"}],
//!     "telemetry_events": [{"user_id": "u1", "type": "login", "at": "2024-01-02T09:00:00Z"}],
//! });
//! let customers = reconcile_value(snapshot, &ReconcileOptions::default()).unwrap();
//! assert_eq!(customers[0].name, "Asha");
//! assert_eq!(customers[0].logged_in, Some(true));
//! ```

pub mod config;
pub mod fields;
pub mod identity;
pub mod merge;
pub mod metadata;
pub mod model;
pub mod normalize;
pub mod rank;
pub mod snapshot;
pub mod telemetry;
pub mod temporal;

// Re-export main types for convenience
pub use config::{AppConfig, ReconcileOptions};
pub use merge::{AggregateMap, ReconcileStats};
pub use model::{CustomerAggregate, IdentityKey, SourceTag};
pub use snapshot::{Row, Snapshot, SnapshotError};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Ordered aggregates plus the counters gathered while producing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub customers: Vec<CustomerAggregate>,
    pub stats: ReconcileStats,
}

/// Main API for customer reconciliation
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    /// Create a reconciler with the given options
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Run normalization, merge, filtering and ranking over one snapshot.
    #[instrument(skip_all, level = "debug", fields(rows = snapshot.len()))]
    pub fn run(&self, snapshot: &Snapshot) -> ReconcileReport {
        let (aggregates, mut stats) = merge::merge_snapshot(snapshot);
        let (customers, dropped) = rank::filter_and_rank(aggregates, self.options.include_anonymous);

        stats.anonymous_dropped = dropped;
        stats.emitted = customers.len();
        debug!(
            identities = stats.identities,
            anonymous_dropped = dropped,
            emitted = stats.emitted,
            "reconciled snapshot"
        );

        ReconcileReport { customers, stats }
    }

    /// Validate a raw JSON document as a snapshot, then run.
    pub fn run_value(&self, document: serde_json::Value) -> Result<ReconcileReport, SnapshotError> {
        let snapshot = Snapshot::from_value(document)?;
        Ok(self.run(&snapshot))
    }
}

/// Reconcile a snapshot into ranked customer aggregates.
pub fn reconcile(snapshot: &Snapshot, options: &ReconcileOptions) -> Vec<CustomerAggregate> {
    Reconciler::new(*options).run(snapshot).customers
}

/// Reconcile a snapshot and keep the run statistics.
pub fn reconcile_with_report(snapshot: &Snapshot, options: &ReconcileOptions) -> ReconcileReport {
    Reconciler::new(*options).run(snapshot)
}

/// Reconcile a raw JSON document, failing fast on shape violations.
pub fn reconcile_value(
    document: serde_json::Value,
    options: &ReconcileOptions,
) -> Result<Vec<CustomerAggregate>, SnapshotError> {
    Ok(Reconciler::new(*options).run_value(document)?.customers)
}
