//! Decoded enrichment results

use riskmine_domain::NewStatement;

/// One risk as returned by the classification call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedStatement {
    /// Statement text, never empty
    pub risk_text: String,

    /// One-sentence summary
    pub summary: Option<String>,

    /// Category label as the model returned it
    pub category: Option<String>,
}

impl From<ClassifiedStatement> for NewStatement {
    fn from(statement: ClassifiedStatement) -> Self {
        NewStatement {
            raw_text: statement.risk_text,
            summary: statement.summary,
            category: statement.category,
        }
    }
}
