//! Snapshot types for persisting and restoring store state.
//!
//! A snapshot is the whole store serialized as one JSON object with a key per
//! table, each holding that table's records in insertion order. This is the
//! opaque blob written to the remote document on every mutation.

use crate::{error::Result, Error, Record, RecordId, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The full contents of a bracket: every table and its records.
///
/// Missing tables deserialize as empty, so blobs written before a table
/// existed still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketData {
    pub participant: Vec<Record>,
    pub stage: Vec<Record>,
    pub group: Vec<Record>,
    pub round: Vec<Record>,
    #[serde(rename = "match")]
    pub matches: Vec<Record>,
    pub match_game: Vec<Record>,
}

impl BracketData {
    /// Create empty bracket data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of one table.
    pub fn table(&self, table: Table) -> &Vec<Record> {
        match table {
            Table::Participant => &self.participant,
            Table::Stage => &self.stage,
            Table::Group => &self.group,
            Table::Round => &self.round,
            Table::Match => &self.matches,
            Table::MatchGame => &self.match_game,
        }
    }

    /// Mutable records of one table.
    pub fn table_mut(&mut self, table: Table) -> &mut Vec<Record> {
        match table {
            Table::Participant => &mut self.participant,
            Table::Stage => &mut self.stage,
            Table::Group => &mut self.group,
            Table::Round => &mut self.round,
            Table::Match => &mut self.matches,
            Table::MatchGame => &mut self.match_game,
        }
    }

    /// Highest id in a table, if any.
    pub fn max_id(&self, table: Table) -> Option<RecordId> {
        self.table(table).iter().map(|r| r.id).max()
    }

    /// Count records across all tables.
    pub fn record_count(&self) -> usize {
        Table::ALL.iter().map(|t| self.table(*t).len()).sum()
    }

    /// True when no table holds any record.
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }
}

/// Summary of a snapshot without the record data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    /// Record count per table
    pub tables: BTreeMap<Table, usize>,
    /// Total record count
    pub record_count: usize,
}

impl From<&BracketData> for SnapshotMetadata {
    fn from(data: &BracketData) -> Self {
        Self {
            tables: Table::ALL
                .iter()
                .map(|t| (*t, data.table(*t).len()))
                .collect(),
            record_count: data.record_count(),
        }
    }
}
