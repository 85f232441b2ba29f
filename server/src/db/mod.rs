//! Remote document storage for bracket snapshots.

mod documents;
mod memory;
mod postgres;

pub use documents::*;
pub use memory::*;
pub use postgres::*;
