//! Mitigation module - the second enrichment pass over a Statement

use std::fmt;

/// Usefulness rank of a mitigation idea
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MitigationRank {
    /// Very useful and likely to be impactful
    Useful = 1,

    /// Potentially useful, with caveats
    Caveated = 2,

    /// Dubious or not a good fit
    Dubious = 3,
}

impl MitigationRank {
    /// Numeric value stored in the rank column
    pub fn value(&self) -> i64 {
        *self as i64
    }

    /// Parse a stored or model-provided rank
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(MitigationRank::Useful),
            2 => Some(MitigationRank::Caveated),
            3 => Some(MitigationRank::Dubious),
            _ => None,
        }
    }
}

impl fmt::Display for MitigationRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Result of a mitigation call
///
/// Each field is independently nullable; a missing field is `None`, not a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mitigation {
    /// Suggested mitigation
    pub idea: Option<String>,

    /// Usefulness rank
    pub rank: Option<MitigationRank>,
}

impl Mitigation {
    /// Both fields set
    pub fn is_complete(&self) -> bool {
        self.idea.is_some() && self.rank.is_some()
    }

    /// Neither field set
    pub fn is_empty(&self) -> bool {
        self.idea.is_none() && self.rank.is_none()
    }
}
