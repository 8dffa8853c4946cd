//! Entity version numbers.
//!
//! Versions are decimal numbers with one fractional digit: a new entity
//! starts at `0.1`, a minor change adds `0.1` and a major change adds `1.0`.
//! Arithmetic is rounded to one decimal so that repeated minor steps never
//! accumulate floating point drift (`0.1 + 0.1 + 0.1` is exactly `0.3`).

use crate::Error;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A monotonically increasing entity version.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct EntityVersion(f64);

impl EntityVersion {
    /// Version assigned to a freshly created entity.
    pub const INITIAL: Self = Self(0.1);

    /// Creates a version from a raw number, rounded to one decimal.
    ///
    /// Negative, NaN and infinite values are rejected.
    pub fn new(value: f64) -> Result<Self, Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidVersion(value));
        }
        Ok(Self(round_tenths(value)))
    }

    /// Returns the raw number.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Returns the next minor version (`+0.1`).
    #[must_use]
    pub fn next_minor(&self) -> Self {
        Self(round_tenths(self.0 + 0.1))
    }

    /// Returns the next major version (`+1.0`).
    #[must_use]
    pub fn next_major(&self) -> Self {
        Self(round_tenths(self.0 + 1.0))
    }

    /// Advances by the given step.
    #[must_use]
    pub fn advance(&self, step: VersionStep) -> Self {
        match step {
            VersionStep::Minor => self.next_minor(),
            VersionStep::Major => self.next_major(),
        }
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Default for EntityVersion {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl TryFrom<f64> for EntityVersion {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityVersion> for f64 {
    fn from(version: EntityVersion) -> Self {
        version.0
    }
}

// Construction guarantees a finite value, so total ordering is sound.
impl PartialEq for EntityVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EntityVersion {}

impl PartialOrd for EntityVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for EntityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// How far a real change moves the version forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStep {
    /// `+0.1`, used for ordinary field changes.
    #[default]
    Minor,
    /// `+1.0`, reserved for backward-incompatible changes.
    Major,
}
