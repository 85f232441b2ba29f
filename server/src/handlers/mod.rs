//! Request handlers for bracket tables.

mod tables;

pub use tables::*;
