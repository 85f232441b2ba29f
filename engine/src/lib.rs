//! # Brackets Engine
//!
//! An in-memory relational store for tournament brackets.
//!
//! A bracket is made of six tables (participants, stages, groups, rounds,
//! matches and match games). This crate keeps their records in memory and
//! implements the create/read/update/delete contract a bracket manager
//! expects from its backing store.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine has no knowledge of files, network, or databases
//! - **Whole-state snapshots**: the full store serializes to one JSON blob
//! - **Explicit errors**: every failing operation returns an [`Error`]
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] is a flat JSON object with an integer `id` that is unique
//! within its [`Table`]. Ids start at 0 and are never handed out twice in a
//! store's lifetime, even after deletions.
//!
//! ### Selectors
//!
//! Reads, updates and deletes address records with a [`Selector`]:
//! - [`Selector::All`] - every record of the table
//! - [`Selector::Position`] - the record at an array position
//! - [`Selector::Id`] - the record with a given id
//! - [`Selector::Filter`] - every record whose fields equal the filter's
//!
//! Filter updates merge the patch into each match, one level deep for
//! object-valued fields.
//!
//! ## Quick Start
//!
//! ```rust
//! use brackets_engine::{Selector, Store, Table};
//! use serde_json::json;
//!
//! let mut store = Store::new();
//!
//! let a = store.insert(Table::Participant, json!({"name": "A"})).unwrap();
//! let b = store.insert(Table::Participant, json!({"name": "B"})).unwrap();
//! assert_eq!((a, b), (0, 1));
//!
//! let filter = Selector::filter(json!({"id": 0})).unwrap();
//! store.delete(Table::Participant, &filter).unwrap();
//!
//! let rest = store.select(Table::Participant, &Selector::All);
//! assert_eq!(rest[0].to_value(), json!({"id": 1, "name": "B"}));
//! ```
//!
//! ## Persistence
//!
//! Use [`Store::export_state`] and [`Store::set_data`] with [`BracketData`]
//! for persistence. [`BracketData::to_json`] produces the blob stored in the
//! remote document.

pub mod error;
pub mod record;
pub mod selector;
pub mod snapshot;
pub mod store;
pub mod table;

// Re-export main types at crate root
pub use error::Error;
pub use record::{Record, ID_FIELD};
pub use selector::{Filter, Selector};
pub use snapshot::{BracketData, SnapshotMetadata};
pub use store::Store;
pub use table::Table;

/// Identifier of a record within its table.
pub type RecordId = u64;
/// Identifier of a bracket instance.
pub type InstanceId = String;
