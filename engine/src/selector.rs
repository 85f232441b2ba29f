//! Addressing modes for select, update and delete.

use crate::RecordId;
use serde_json::{Map, Value};
use std::fmt;

/// Partial record used as an equality filter.
pub type Filter = Map<String, Value>;

/// Which records of a table an operation applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Every record.
    All,
    /// The record at this array position.
    ///
    /// Positions shift after deletions, so this is not necessarily the
    /// record whose `id` equals the number.
    Position(usize),
    /// The record with this identifier.
    Id(RecordId),
    /// Every record whose fields equal all of the filter's fields.
    Filter(Filter),
}

impl Selector {
    /// Build a filter selector from a JSON object.
    ///
    /// Returns `None` if `value` is not an object.
    pub fn filter(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Selector::Filter(map)),
            _ => None,
        }
    }
}

impl From<Filter> for Selector {
    fn from(filter: Filter) -> Self {
        Selector::Filter(filter)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => write!(f, "all"),
            Selector::Position(p) => write!(f, "position {}", p),
            Selector::Id(id) => write!(f, "id {}", id),
            Selector::Filter(filter) => write!(f, "filter {}", Value::Object(filter.clone())),
        }
    }
}
