//! Additive schema migration
//!
//! Databases written by older tooling lack the later columns. Each column is
//! added with `ALTER TABLE ... ADD COLUMN`; "duplicate column name" means it is
//! already there and is not an error. Running the migration twice is a no-op.

use crate::StoreError;
use rusqlite::Connection;

/// Columns that may be missing from an older database, in the order they were introduced
const ADDITIVE_COLUMNS: &[(&str, &str)] = &[
    ("filings", "ticker TEXT"),
    ("filings", "llm_status TEXT DEFAULT 'pending'"),
    ("filings", "company_name TEXT"),
    ("filings", "lease_token TEXT"),
    ("filings", "leased_at INTEGER"),
    ("risks", "summary TEXT"),
    ("risks", "category TEXT"),
    ("risks", "mitigation_idea TEXT"),
    ("risks", "mitigation_rank INTEGER"),
    ("risks", "mitigation_attempts INTEGER NOT NULL DEFAULT 0"),
    ("risks", "lease_token TEXT"),
    ("risks", "leased_at INTEGER"),
];

/// Indexes created once every column they reference exists
const INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_filings_key ON filings(cik, form, filed, accession);
    CREATE INDEX IF NOT EXISTS idx_filings_status ON filings(llm_status);
    CREATE INDEX IF NOT EXISTS idx_risks_filing_text ON risks(filing_id, risk_text);
";

/// Outcome of one migration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// `table.column` entries that were added by this run
    pub added: Vec<String>,

    /// Documents moved out of `pending` because they have no section to enrich
    pub demoted: usize,
}

impl MigrationReport {
    /// Nothing changed
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.demoted == 0
    }
}

/// Bring the schema up to date
pub(crate) fn run(conn: &Connection) -> Result<MigrationReport, StoreError> {
    let mut report = MigrationReport::default();

    for (table, decl) in ADDITIVE_COLUMNS {
        if add_column(conn, table, decl)? {
            let column = decl.split_whitespace().next().unwrap_or(decl);
            tracing::info!(table, column, "added column");
            report.added.push(format!("{}.{}", table, column));
        }
    }

    conn.execute_batch(INDEXES)?;

    // A pending row without a section would never be leased and would block convergence
    report.demoted = conn.execute(
        "UPDATE filings SET llm_status = NULL
         WHERE llm_status = 'pending' AND (risk_factors IS NULL OR trim(risk_factors) = '')",
        [],
    )?;
    if report.demoted > 0 {
        tracing::warn!(count = report.demoted, "pending documents without a section marked ineligible");
    }

    Ok(report)
}

fn add_column(conn: &Connection, table: &str, decl: &str) -> Result<bool, StoreError> {
    match conn.execute(&format!("ALTER TABLE {} ADD COLUMN {}", table, decl), []) {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(_, Some(msg))) if msg.contains("duplicate column name") => {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
