//! Store - the in-memory state container.
//!
//! The Store holds the records of all six tables and implements the CRUD
//! contract on top of them. It does no IO; callers persist it through
//! [`Store::export_state`] and restore it with [`Store::set_data`].

use crate::{error::Result, BracketData, Error, Record, RecordId, Selector, Table};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The main store holding all bracket records.
#[derive(Debug, Clone, Default)]
pub struct Store {
    /// Records of every table, in insertion order
    data: BracketData,
    /// Lowest id the next insert may use, per table
    next_ids: HashMap<Table, RecordId>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `data`.
    pub fn from_data(data: BracketData) -> Self {
        Self {
            data,
            next_ids: HashMap::new(),
        }
    }

    /// The current contents.
    pub fn data(&self) -> &BracketData {
        &self.data
    }

    /// Records of one table, in insertion order.
    pub fn records(&self, table: Table) -> &[Record] {
        self.data.table(table)
    }

    /// The id the next insert into `table` will receive.
    ///
    /// One past the highest id present, but never below an id handed out
    /// earlier, so deleted ids are not reused. Fails once the table holds
    /// `RecordId::MAX`.
    pub fn next_id(&self, table: Table) -> Result<RecordId> {
        let from_contents = match self.data.max_id(table) {
            Some(max) => max
                .checked_add(1)
                .ok_or(Error::IdSpaceExhausted { table })?,
            None => 0,
        };
        let issued = self.next_ids.get(&table).copied().unwrap_or(0);
        Ok(from_contents.max(issued))
    }

    /// Insert one record and return its id.
    pub fn insert(&mut self, table: Table, value: Value) -> Result<RecordId> {
        let id = self.next_id(table)?;
        let next = id.checked_add(1).ok_or(Error::IdSpaceExhausted { table })?;
        let record = Record::from_value(id, value)?;

        self.data.table_mut(table).push(record);
        self.next_ids.insert(table, next);

        Ok(id)
    }

    /// Insert several records with consecutive ids.
    ///
    /// Every value is checked before anything is appended, so a malformed
    /// entry or a batch that would run past the last id leaves the table
    /// untouched.
    pub fn insert_many(&mut self, table: Table, values: Vec<Value>) -> Result<Vec<RecordId>> {
        let first = self.next_id(table)?;
        let next = RecordId::try_from(values.len())
            .ok()
            .and_then(|count| first.checked_add(count))
            .ok_or(Error::IdSpaceExhausted { table })?;

        let records = values
            .into_iter()
            .zip(first..next)
            .map(|(value, id)| Record::from_value(id, value))
            .collect::<Result<Vec<_>>>()?;

        let ids: Vec<RecordId> = records.iter().map(|r| r.id).collect();
        if !ids.is_empty() {
            self.next_ids.insert(table, next);
        }
        self.data.table_mut(table).extend(records);

        Ok(ids)
    }

    /// Insert a serializable value.
    pub fn insert_as<T: Serialize>(&mut self, table: Table, value: &T) -> Result<RecordId> {
        let value =
            serde_json::to_value(value).map_err(|e| Error::InvalidRecord(e.to_string()))?;
        self.insert(table, value)
    }

    /// Copy out the records matched by `selector`.
    ///
    /// `Position` and `Id` yield at most one record.
    pub fn select(&self, table: Table, selector: &Selector) -> Vec<Record> {
        let records = self.data.table(table);
        match selector {
            Selector::All => records.clone(),
            Selector::Position(position) => records.get(*position).cloned().into_iter().collect(),
            Selector::Id(id) => records.iter().filter(|r| r.id == *id).cloned().collect(),
            Selector::Filter(filter) => records
                .iter()
                .filter(|r| r.matches(filter))
                .cloned()
                .collect(),
        }
    }

    /// Copy out the first record matched by `selector`.
    pub fn select_one(&self, table: Table, selector: &Selector) -> Option<Record> {
        self.select(table, selector).into_iter().next()
    }

    /// Select and deserialize the matching records.
    pub fn select_as<T: DeserializeOwned>(
        &self,
        table: Table,
        selector: &Selector,
    ) -> Result<Vec<T>> {
        self.select(table, selector)
            .iter()
            .map(|r| {
                serde_json::from_value(r.to_value()).map_err(|e| Error::InvalidRecord(e.to_string()))
            })
            .collect()
    }

    /// Update the records matched by `selector` and return how many changed.
    ///
    /// `Position` and `Id` replace the whole record with `value`, keeping its
    /// id. `Filter` merges `value` into every match (see [`Record::merge`]);
    /// matching nothing is not an error.
    pub fn update(&mut self, table: Table, selector: &Selector, value: Value) -> Result<usize> {
        match selector {
            Selector::All => Err(Error::InvalidSelector {
                operation: "update",
                selector: selector.to_string(),
            }),
            Selector::Position(position) => {
                let position = *position;
                let records = self.data.table_mut(table);
                let len = records.len();
                let record = records.get_mut(position).ok_or(Error::PositionOutOfRange {
                    table,
                    position,
                    len,
                })?;
                record.replace(value)?;
                Ok(1)
            }
            Selector::Id(id) => {
                let record = self
                    .data
                    .table_mut(table)
                    .iter_mut()
                    .find(|r| r.id == *id)
                    .ok_or(Error::RecordNotFound { table, id: *id })?;
                record.replace(value)?;
                Ok(1)
            }
            Selector::Filter(filter) => {
                let patch = match value {
                    Value::Object(patch) => patch,
                    _ => {
                        return Err(Error::InvalidRecord(
                            "update patch must be a JSON object".to_string(),
                        ))
                    }
                };

                let mut updated = 0;
                for record in self
                    .data
                    .table_mut(table)
                    .iter_mut()
                    .filter(|r| r.matches(filter))
                {
                    record.merge(&patch);
                    updated += 1;
                }
                Ok(updated)
            }
        }
    }

    /// Remove the records matched by `selector` and return how many went.
    pub fn delete(&mut self, table: Table, selector: &Selector) -> Result<usize> {
        let records = self.data.table_mut(table);
        let before = records.len();

        match selector {
            Selector::All => records.clear(),
            Selector::Position(position) => {
                if *position >= before {
                    return Err(Error::PositionOutOfRange {
                        table,
                        position: *position,
                        len: before,
                    });
                }
                records.remove(*position);
            }
            Selector::Id(id) => records.retain(|r| r.id != *id),
            Selector::Filter(filter) => records.retain(|r| !r.matches(filter)),
        }

        Ok(before - records.len())
    }

    /// Empty every table and forget issued ids.
    pub fn reset(&mut self) {
        self.data = BracketData::new();
        self.next_ids.clear();
    }

    /// Replace the whole state. Ids continue from the imported contents.
    pub fn set_data(&mut self, data: BracketData) {
        self.data = data;
        self.next_ids.clear();
    }

    /// Export the current state as a snapshot.
    pub fn export_state(&self) -> BracketData {
        self.data.clone()
    }

    /// Serialize the current state to the snapshot blob.
    pub fn to_json(&self) -> Result<String> {
        self.data.to_json()
    }
}
