//! The fixed set of tables a bracket is made of.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the six record collections of a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Participant,
    Stage,
    Group,
    Round,
    Match,
    MatchGame,
}

impl Table {
    /// Every table, in snapshot order.
    pub const ALL: [Table; 6] = [
        Table::Participant,
        Table::Stage,
        Table::Group,
        Table::Round,
        Table::Match,
        Table::MatchGame,
    ];

    /// The wire name of the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Participant => "participant",
            Table::Stage => "stage",
            Table::Group => "group",
            Table::Round => "round",
            Table::Match => "match",
            Table::MatchGame => "match_game",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownTable(s.to_string()))
    }
}
