//! Relationship kinds: typed, directed edges between entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a directed edge `from -> to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    /// `from` structurally contains `to` (service contains pipeline).
    Contains,
    /// `from` owns `to` (user or team owns an entity).
    Owns,
    Has,
    Uses,
    /// `from` feeds data into `to`.
    Upstream,
    Follows,
    ParentOf,
}

impl Relationship {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Contains => "contains",
            Relationship::Owns => "owns",
            Relationship::Has => "has",
            Relationship::Uses => "uses",
            Relationship::Upstream => "upstream",
            Relationship::Follows => "follows",
            Relationship::ParentOf => "parent-of",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown relationship name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRelationshipError(pub String);

impl fmt::Display for ParseRelationshipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relationship: {}", self.0)
    }
}

impl std::error::Error for ParseRelationshipError {}

impl FromStr for Relationship {
    type Err = ParseRelationshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(Relationship::Contains),
            "owns" => Ok(Relationship::Owns),
            "has" => Ok(Relationship::Has),
            "uses" => Ok(Relationship::Uses),
            "upstream" => Ok(Relationship::Upstream),
            "follows" => Ok(Relationship::Follows),
            "parent-of" => Ok(Relationship::ParentOf),
            other => Err(ParseRelationshipError(other.to_string())),
        }
    }
}
