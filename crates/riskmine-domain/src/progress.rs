//! Aggregate counts observed over the whole store

/// Outstanding work in both collections, observed at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkRemaining {
    /// Documents still `pending` (leased or not)
    pub documents: u64,

    /// Statements missing a mitigation idea or rank
    pub statements: u64,
}

impl WorkRemaining {
    /// Both collections drained at the same observation
    pub fn is_converged(&self) -> bool {
        self.documents == 0 && self.statements == 0
    }
}

/// Per-status breakdown for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    /// Documents waiting for enrichment
    pub pending: u64,

    /// Documents enriched
    pub done: u64,

    /// Documents whose attempt failed
    pub error: u64,

    /// Documents with no extracted section
    pub ineligible: u64,

    /// All statements
    pub statements: u64,

    /// Statements with both mitigation fields set
    pub mitigated: u64,
}

impl StatusSummary {
    /// Total documents across every status
    pub fn documents(&self) -> u64 {
        self.pending + self.done + self.error + self.ineligible
    }

    /// Statements still waiting for a mitigation
    pub fn unmitigated(&self) -> u64 {
        self.statements.saturating_sub(self.mitigated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convergence_needs_both_zero() {
        assert!(WorkRemaining::default().is_converged());
        assert!(!WorkRemaining { documents: 1, statements: 0 }.is_converged());
        assert!(!WorkRemaining { documents: 0, statements: 3 }.is_converged());
    }

    #[test]
    fn test_summary_totals() {
        let summary = StatusSummary {
            pending: 1,
            done: 2,
            error: 3,
            ineligible: 4,
            statements: 10,
            mitigated: 7,
        };
        assert_eq!(summary.documents(), 10);
        assert_eq!(summary.unmitigated(), 3);
    }
}
