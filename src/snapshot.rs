//! # Snapshot Module
//!
//! The input boundary: named collections of untyped row records, already
//! fetched by an external collaborator.
//!
//! Shape is validated once, here. A collection that is not a sequence of
//! mappings means the data-fetch layer is broken, so it fails fast instead of
//! being coerced. Everything past this boundary is infallible.

use crate::model::SourceTag;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// One persisted record from one named collection.
pub type Row = Map<String, Value>;

/// Violations of the snapshot's basic shape contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot must be a mapping of collection names, found {found}")]
    NotAMapping { found: &'static str },
    #[error("collection `{collection}` must be a sequence of rows, found {found}")]
    CollectionNotSequence {
        collection: String,
        found: &'static str,
    },
    #[error("collection `{collection}` row {index} must be a mapping, found {found}")]
    RowNotMapping {
        collection: String,
        index: usize,
        found: &'static str,
    },
}

/// Finite, already-materialized set of collections for a single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    collections: BTreeMap<String, Vec<Row>>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and convert a deserialized JSON document.
    ///
    /// Only collections named by a source are checked; other keys are ignored.
    /// A `null` collection reads as missing.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let mut document = match value {
            Value::Object(document) => document,
            other => {
                return Err(SnapshotError::NotAMapping {
                    found: kind_of(&other),
                })
            }
        };

        let mut snapshot = Snapshot::new();
        for tag in SourceTag::PROCESSING_ORDER {
            for name in tag.collection_names() {
                match document.remove(*name) {
                    None | Some(Value::Null) => {}
                    Some(Value::Array(items)) => {
                        let rows = items
                            .into_iter()
                            .enumerate()
                            .map(|(index, item)| match item {
                                Value::Object(row) => Ok(row),
                                other => Err(SnapshotError::RowNotMapping {
                                    collection: (*name).to_string(),
                                    index,
                                    found: kind_of(&other),
                                }),
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        snapshot.collections.insert((*name).to_string(), rows);
                    }
                    Some(other) => {
                        return Err(SnapshotError::CollectionNotSequence {
                            collection: (*name).to_string(),
                            found: kind_of(&other),
                        })
                    }
                }
            }
        }

        Ok(snapshot)
    }

    /// Insert or replace a collection by name.
    pub fn insert(&mut self, name: impl Into<String>, rows: Vec<Row>) {
        self.collections.insert(name.into(), rows);
    }

    /// Builder form of [`Snapshot::insert`].
    pub fn with_collection(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.insert(name, rows);
        self
    }

    /// Rows of a named collection, empty when absent.
    pub fn collection(&self, name: &str) -> &[Row] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All rows feeding a source, concatenated in alias order.
    pub fn rows_for(&self, source: SourceTag) -> Vec<&Row> {
        source
            .collection_names()
            .iter()
            .flat_map(|name| self.collection(name))
            .collect()
    }

    /// Total rows across every stored collection.
    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<Value> for Snapshot {
    type Error = SnapshotError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
