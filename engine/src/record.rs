//! Record type stored in every table.

use crate::{error::Result, Error, Filter, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the identifier field.
pub const ID_FIELD: &str = "id";

/// A single row of a table.
///
/// Serialized as a flat JSON object: `{"id": 3, "name": "Team A", ...}`.
/// The `fields` map never contains an `id` key; the identifier lives in
/// [`Record::id`] only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier, unique within its table
    pub id: RecordId,
    /// Every other field of the record
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a JSON object, assigning `id`.
    ///
    /// Any `id` key present in `value` is discarded.
    pub fn from_value(id: RecordId, value: Value) -> Result<Self> {
        match value {
            Value::Object(mut fields) => {
                fields.remove(ID_FIELD);
                Ok(Self { id, fields })
            }
            other => Err(Error::InvalidRecord(format!(
                "expected a JSON object, got {}",
                kind(&other)
            ))),
        }
    }

    /// Look up a field by name, `id` included.
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == ID_FIELD {
            Some(Value::from(self.id))
        } else {
            self.fields.get(key).cloned()
        }
    }

    /// True when every filter field equals this record's value exactly.
    ///
    /// No coercion: `1` does not match `"1"`, and a missing field does not
    /// match `null`.
    pub fn matches(&self, filter: &Filter) -> bool {
        filter.iter().all(|(key, expected)| {
            if key == ID_FIELD {
                *expected == Value::from(self.id)
            } else {
                self.fields.get(key) == Some(expected)
            }
        })
    }

    /// Apply a partial update.
    ///
    /// When both the current and the patch value of a field are objects,
    /// the patch's top-level keys are assigned into the current object.
    /// Anything deeper is replaced as a whole. Other fields are overwritten.
    /// The `id` key of the patch is ignored.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key == ID_FIELD {
                continue;
            }

            match (self.fields.get_mut(key), value) {
                (Some(Value::Object(current)), Value::Object(incoming)) => {
                    for (k, v) in incoming {
                        current.insert(k.clone(), v.clone());
                    }
                }
                _ => {
                    self.fields.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Replace every field, keeping the identifier.
    pub fn replace(&mut self, value: Value) -> Result<()> {
        *self = Self::from_value(self.id, value)?;
        Ok(())
    }

    /// Convert into a flat JSON object.
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert(ID_FIELD.to_string(), Value::from(self.id));
        for (k, v) in &self.fields {
            object.insert(k.clone(), v.clone());
        }
        Value::Object(object)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(value: Value) -> Filter {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_record() {
        let record = Record::from_value(4, json!({"name": "Team A", "id": 99})).unwrap();

        assert_eq!(record.id, 4);
        assert_eq!(record.get("name"), Some(json!("Team A")));
        assert_eq!(record.get("id"), Some(json!(4)));
        assert!(!record.fields.contains_key("id"));
    }

    #[test]
    fn reject_non_object() {
        let result = Record::from_value(0, json!(["not", "a", "record"]));
        assert!(matches!(result, Err(Error::InvalidRecord(_))));

        let result = Record::from_value(0, Value::Null);
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn matches_every_filter_field() {
        let record = Record::from_value(2, json!({"stage_id": 0, "number": 1})).unwrap();

        assert!(record.matches(&filter(json!({}))));
        assert!(record.matches(&filter(json!({"stage_id": 0}))));
        assert!(record.matches(&filter(json!({"stage_id": 0, "number": 1, "id": 2}))));
        assert!(!record.matches(&filter(json!({"stage_id": 0, "number": 2}))));
        assert!(!record.matches(&filter(json!({"id": 3}))));
    }

    #[test]
    fn matches_without_coercion() {
        let record = Record::from_value(0, json!({"number": 1, "child": null})).unwrap();

        assert!(!record.matches(&filter(json!({"number": "1"}))));
        assert!(!record.matches(&filter(json!({"missing": null}))));
        assert!(record.matches(&filter(json!({"child": null}))));
    }

    #[test]
    fn merge_one_level_deep() {
        let mut record = Record::from_value(
            2,
            json!({
                "status": 2,
                "opponent1": {"id": 5, "score": 1, "meta": {"seed": 1, "tag": "x"}}
            }),
        )
        .unwrap();

        record.merge(&filter(json!({
            "status": 4,
            "opponent1": {"result": "win", "meta": {"seed": 3}}
        })));

        assert_eq!(record.get("status"), Some(json!(4)));
        assert_eq!(
            record.get("opponent1"),
            Some(json!({"id": 5, "score": 1, "result": "win", "meta": {"seed": 3}}))
        );
    }

    #[test]
    fn merge_replaces_non_objects() {
        let mut record =
            Record::from_value(0, json!({"opponent2": null, "tags": [1, 2]})).unwrap();

        record.merge(&filter(json!({
            "opponent2": {"id": 1},
            "tags": [3],
            "id": 40
        })));

        assert_eq!(record.id, 0);
        assert_eq!(record.get("opponent2"), Some(json!({"id": 1})));
        assert_eq!(record.get("tags"), Some(json!([3])));
    }

    #[test]
    fn serializes_flat() {
        let record = Record::from_value(1, json!({"name": "B"})).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({"id": 1, "name": "B"}));
        assert_eq!(record.to_value(), json);

        let parsed: Record = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }
}
