//! Event metadata normalization.
//!
//! Telemetry metadata arrives either as a nested mapping or as a string that
//! has to be re-parsed. Both collapse into a single structured mapping here so
//! the reducers never deal with the ambiguity.

use serde_json::{Map, Value};
use tracing::trace;

/// Raw metadata as found on an event row.
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata<'a> {
    Structured(&'a Map<String, Value>),
    Raw(&'a str),
    Absent,
}

impl<'a> Metadata<'a> {
    /// Classify a metadata value. Non-mapping, non-string values count as absent.
    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Metadata::Structured(map),
            Some(Value::String(raw)) => Metadata::Raw(raw),
            _ => Metadata::Absent,
        }
    }

    /// Always yields a mapping; anything that does not re-parse into one is empty.
    pub fn normalize(self) -> Map<String, Value> {
        match self {
            Metadata::Structured(map) => map.clone(),
            Metadata::Raw(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    trace!("event metadata string is not a mapping");
                    Map::new()
                }
                Err(err) => {
                    trace!(error = %err, "event metadata string does not parse");
                    Map::new()
                }
            },
            Metadata::Absent => Map::new(),
        }
    }
}
