//! Statement module - one discrete risk derived from a Document

use crate::document::DocumentId;
use crate::mitigation::MitigationRank;
use std::fmt;

/// Row identifier of a Statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatementId(i64);

impl StatementId {
    /// Wrap a raw row id
    pub fn from_value(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw row id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Statement candidate, from the classifier or the segmenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatement {
    /// Raw risk text (dedup key together with the owning Document)
    pub raw_text: String,

    /// One-sentence summary
    pub summary: Option<String>,

    /// Category label (Market, Operational, ...)
    pub category: Option<String>,
}

impl NewStatement {
    /// A bare statement with no classification, as the segmenter produces
    pub fn plain(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            summary: None,
            category: None,
        }
    }
}

/// A persisted Statement
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Row identifier
    pub id: StatementId,

    /// Owning Document
    pub document_id: DocumentId,

    /// Raw risk text
    pub raw_text: String,

    /// One-sentence summary
    pub summary: Option<String>,

    /// Category label
    pub category: Option<String>,

    /// How AI could mitigate this risk
    pub mitigation_idea: Option<String>,

    /// Usefulness of the mitigation idea
    pub mitigation_rank: Option<MitigationRank>,

    /// Number of mitigation attempts recorded so far
    pub mitigation_attempts: u32,
}

impl Statement {
    /// A Statement is mitigation-complete only when both fields are set
    pub fn is_mitigation_complete(&self) -> bool {
        self.mitigation_idea.is_some() && self.mitigation_rank.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(idea: Option<&str>, rank: Option<MitigationRank>) -> Statement {
        Statement {
            id: StatementId::from_value(1),
            document_id: DocumentId::from_value(1),
            raw_text: "Supply chain disruption could affect margins.".to_string(),
            summary: None,
            category: None,
            mitigation_idea: idea.map(str::to_string),
            mitigation_rank: rank,
            mitigation_attempts: 0,
        }
    }

    #[test]
    fn test_mitigation_completeness_requires_both_fields() {
        assert!(!statement(None, None).is_mitigation_complete());
        assert!(!statement(Some("Forecast demand"), None).is_mitigation_complete());
        assert!(!statement(None, Some(MitigationRank::Useful)).is_mitigation_complete());
        assert!(statement(Some("Forecast demand"), Some(MitigationRank::Useful)).is_mitigation_complete());
    }

    #[test]
    fn test_plain_statement() {
        let s = NewStatement::plain("text");
        assert_eq!(s.raw_text, "text");
        assert!(s.summary.is_none());
        assert!(s.category.is_none());
    }
}
