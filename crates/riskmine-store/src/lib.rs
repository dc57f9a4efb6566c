//! Riskmine Storage Layer
//!
//! Implements `FilingStore` and `WorkQueue` over a single SQLite file.
//!
//! # Architecture
//!
//! - `filings` holds one row per Document; `llm_status` is its queue state
//! - `risks` holds Statements; a null mitigation field is their queue state
//! - Leasing stamps `lease_token`/`leased_at` inside an IMMEDIATE transaction, so
//!   two connections never lease the same row while the lease is live
//! - Older databases are upgraded in place by an additive migration
//!
//! Every handle owns one `rusqlite::Connection`. Concurrent workers each open
//! their own handle from a cloned `StoreConfig`; WAL mode and a busy timeout
//! let them share the file.
//!
//! # Examples
//!
//! ```no_run
//! use riskmine_store::{SqliteStore, StoreConfig};
//!
//! let store = SqliteStore::open(&StoreConfig::at("edgar_filings.db")).unwrap();
//! println!("{:?}", store.status_summary().unwrap());
//! ```

#![warn(missing_docs)]

mod config;
mod migrate;
mod queue;

pub use config::StoreConfig;
pub use migrate::MigrationReport;

use riskmine_domain::{
    Document, DocumentId, DocumentKey, DocumentStatus, FilingStore, InsertOutcome,
    MitigationRank, NewDocument, NewStatement, Statement, StatementId, StatusSummary,
    WorkRemaining,
};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub(crate) const DOCUMENT_COLUMNS: &str =
    "id, cik, form, filed, accession, ticker, company_name, local_path, risk_factors, llm_status";

/// Statements still waiting for a usable mitigation
pub(crate) const UNMITIGATED: &str =
    "(mitigation_idea IS NULL OR mitigation_rank IS NULL OR mitigation_rank NOT IN (1, 2, 3))";

pub(crate) const STATEMENT_COLUMNS: &str =
    "id, filing_id, risk_text, summary, category, mitigation_idea, mitigation_rank, mitigation_attempts";

/// SQLite-backed store for Documents and Statements
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each task should open its own
/// SqliteStore with `SqliteStore::connect`.
pub struct SqliteStore {
    pub(crate) conn: Connection,
    pub(crate) lease_ttl: Duration,
}

impl SqliteStore {
    /// Open the database at `path` with default settings, creating and migrating the schema
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open(&StoreConfig::at(path.as_ref()))
    }

    /// Open the database, creating the schema and running the additive migration
    ///
    /// Call once at startup; worker tasks then use `connect`.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let (store, report) = Self::open_with_report(config)?;
        if !report.is_noop() {
            tracing::info!(added = ?report.added, demoted = report.demoted, "database migrated");
        }
        Ok(store)
    }

    /// Like `open`, also returning what the migration changed
    pub fn open_with_report(config: &StoreConfig) -> Result<(Self, MigrationReport), StoreError> {
        let store = Self::connect(config)?;
        store.initialize_schema()?;
        let report = store.migrate()?;
        Ok((store, report))
    }

    /// Open a connection to an already initialized database
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = Connection::open(&config.path)?;
        conn.busy_timeout(config.busy_timeout())?;
        if !config.is_in_memory() {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::trace!(journal_mode = %mode, "connection opened");
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn,
            lease_ttl: config.lease_ttl(),
        })
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Add any missing columns and indexes; safe to repeat
    pub fn migrate(&self) -> Result<MigrationReport, StoreError> {
        migrate::run(&self.conn)
    }

    /// Per-status document counts plus statement counts
    pub fn status_summary(&self) -> Result<StatusSummary, StoreError> {
        let summary = self.conn.query_row(
            &format!(
                "SELECT
                    (SELECT COUNT(*) FROM filings WHERE llm_status = 'pending'),
                    (SELECT COUNT(*) FROM filings WHERE llm_status = 'done'),
                    (SELECT COUNT(*) FROM filings WHERE llm_status = 'error'),
                    (SELECT COUNT(*) FROM filings WHERE llm_status IS NULL),
                    (SELECT COUNT(*) FROM risks),
                    (SELECT COUNT(*) FROM risks WHERE NOT {})",
                UNMITIGATED
            ),
            [],
            |row| {
                Ok(StatusSummary {
                    pending: row.get::<_, i64>(0)? as u64,
                    done: row.get::<_, i64>(1)? as u64,
                    error: row.get::<_, i64>(2)? as u64,
                    ineligible: row.get::<_, i64>(3)? as u64,
                    statements: row.get::<_, i64>(4)? as u64,
                    mitigated: row.get::<_, i64>(5)? as u64,
                })
            },
        )?;
        Ok(summary)
    }

    /// Entity keys (CIKs) that have no company name yet
    pub fn unnamed_entities(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT cik FROM filings
             WHERE cik IS NOT NULL AND (company_name IS NULL OR company_name = '')
             ORDER BY cik",
        )?;
        let rows = stmt.query_map([], |row| Ok(text_at(row, 0)?.unwrap_or_default()))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl FilingStore for SqliteStore {
    type Error = StoreError;

    fn create_document(&mut self, document: &NewDocument) -> Result<InsertOutcome<DocumentId>, Self::Error> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(existing) = find_document_in(&tx, &document.key)? {
            return Ok(InsertOutcome::Existing(existing));
        }

        let section = document.section.trim();
        tx.execute(
            "INSERT INTO filings (cik, ticker, form, filed, accession, local_path, risk_factors, llm_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                document.key.cik,
                document.ticker,
                document.key.form,
                document.key.filed,
                document.key.accession,
                document.content_locator,
                if section.is_empty() { None } else { Some(section) },
                document.initial_status().as_db(),
            ],
        )?;
        let id = DocumentId::from_value(tx.last_insert_rowid());
        tx.commit()?;

        tracing::debug!(document = %id, cik = %document.key.cik, form = %document.key.form, "document created");
        Ok(InsertOutcome::Created(id))
    }

    fn find_document(&self, key: &DocumentKey) -> Result<Option<DocumentId>, Self::Error> {
        find_document_in(&self.conn, key)
    }

    fn get_document(&self, id: DocumentId) -> Result<Option<Document>, Self::Error> {
        let document = self
            .conn
            .query_row(
                &format!("SELECT {} FROM filings WHERE id = ?1", DOCUMENT_COLUMNS),
                params![id.value()],
                row_to_document,
            )
            .optional()?;
        Ok(document)
    }

    fn delete_document(&mut self, id: DocumentId) -> Result<bool, Self::Error> {
        let tx = self.conn.transaction()?;
        // Explicit so databases created without ON DELETE CASCADE behave the same
        tx.execute("DELETE FROM risks WHERE filing_id = ?1", params![id.value()])?;
        let deleted = tx.execute("DELETE FROM filings WHERE id = ?1", params![id.value()])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn insert_statements(&mut self, document: DocumentId, statements: &[NewStatement]) -> Result<usize, Self::Error> {
        let tx = self.conn.transaction()?;
        let inserted = insert_statements_in(&tx, document, statements)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn statements_for(&self, document: DocumentId) -> Result<Vec<Statement>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM risks WHERE filing_id = ?1 ORDER BY id",
            STATEMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![document.value()], row_to_statement)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_statement(&self, id: StatementId) -> Result<Option<Statement>, Self::Error> {
        let statement = self
            .conn
            .query_row(
                &format!("SELECT {} FROM risks WHERE id = ?1", STATEMENT_COLUMNS),
                params![id.value()],
                row_to_statement,
            )
            .optional()?;
        Ok(statement)
    }

    fn assign_entity_names(&mut self, names: &HashMap<String, String>) -> Result<usize, Self::Error> {
        let tx = self.conn.transaction()?;
        let mut changed = 0;
        {
            // CIKs are compared without leading zeros: "0000320193" and "320193" are one entity
            let mut update = tx.prepare(
                "UPDATE filings SET company_name = ?1
                 WHERE ltrim(CAST(cik AS TEXT), '0') = ltrim(?2, '0')
                   AND (company_name IS NULL OR company_name != ?1)",
            )?;
            for (cik, name) in names {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                changed += update.execute(params![name, cik.trim()])?;
            }
        }
        tx.commit()?;
        Ok(changed)
    }

    fn remaining(&self) -> Result<WorkRemaining, Self::Error> {
        // One statement, one snapshot: both counts describe the same instant
        let remaining = self.conn.query_row(
            &format!(
                "SELECT
                    (SELECT COUNT(*) FROM filings WHERE llm_status = 'pending'),
                    (SELECT COUNT(*) FROM risks WHERE {})",
                UNMITIGATED
            ),
            [],
            |row| {
                Ok(WorkRemaining {
                    documents: row.get::<_, i64>(0)? as u64,
                    statements: row.get::<_, i64>(1)? as u64,
                })
            },
        )?;
        Ok(remaining)
    }
}

fn find_document_in(conn: &Connection, key: &DocumentKey) -> Result<Option<DocumentId>, StoreError> {
    let id = conn
        .query_row(
            "SELECT id FROM filings
             WHERE cik = ?1 AND form = ?2 AND filed = ?3 AND accession = ?4
             ORDER BY id LIMIT 1",
            params![key.cik, key.form, key.filed, key.accession],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(DocumentId::from_value))
}

/// Insert statements skipping blanks and texts the document already owns
pub(crate) fn insert_statements_in(
    conn: &Connection,
    document: DocumentId,
    statements: &[NewStatement],
) -> Result<usize, StoreError> {
    let exists = conn
        .query_row("SELECT 1 FROM filings WHERE id = ?1", params![document.value()], |_| Ok(()))
        .optional()?;
    if exists.is_none() {
        return Err(StoreError::NotFound(format!("document {}", document)));
    }

    let mut insert = conn.prepare(
        "INSERT INTO risks (filing_id, risk_text, summary, category)
         SELECT ?1, ?2, ?3, ?4
         WHERE NOT EXISTS (SELECT 1 FROM risks WHERE filing_id = ?1 AND risk_text = ?2)",
    )?;

    let mut inserted = 0;
    for statement in statements {
        let text = statement.raw_text.trim();
        if text.is_empty() {
            continue;
        }
        inserted += insert.execute(params![
            document.value(),
            text,
            non_blank(statement.summary.as_deref()),
            non_blank(statement.category.as_deref()),
        ])?;
    }
    Ok(inserted)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Seconds since the Unix epoch
pub(crate) fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Read a column as text, accepting integers written by older tooling
fn text_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => Ok(Some(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Integer(i) => Ok(Some(i.to_string())),
        ValueRef::Real(f) => Ok(Some(f.to_string())),
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(idx, "text".to_string(), Type::Blob)),
    }
}

/// Ranks outside 1..=3 read back as absent so the statement stays in the queue
fn rank_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<MitigationRank>> {
    let value = match row.get_ref(idx)? {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) if f.fract() == 0.0 => Some(f as i64),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(value.and_then(MitigationRank::from_value))
}

pub(crate) fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    let raw_status = text_at(row, 9)?;
    let status = DocumentStatus::from_db(raw_status.as_deref()).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            Type::Text,
            Box::new(StoreError::InvalidData(format!(
                "unknown document status {:?}",
                raw_status
            ))),
        )
    })?;

    Ok(Document {
        id: DocumentId::from_value(row.get(0)?),
        key: DocumentKey {
            cik: text_at(row, 1)?.unwrap_or_default(),
            form: text_at(row, 2)?.unwrap_or_default(),
            filed: text_at(row, 3)?.unwrap_or_default(),
            accession: text_at(row, 4)?.unwrap_or_default(),
        },
        ticker: text_at(row, 5)?,
        company_name: text_at(row, 6)?,
        content_locator: text_at(row, 7)?.unwrap_or_default(),
        section: text_at(row, 8)?,
        status,
    })
}

pub(crate) fn row_to_statement(row: &Row<'_>) -> rusqlite::Result<Statement> {
    let attempts: Option<i64> = row.get(7)?;
    Ok(Statement {
        id: StatementId::from_value(row.get(0)?),
        document_id: DocumentId::from_value(row.get(1)?),
        raw_text: text_at(row, 2)?.unwrap_or_default(),
        summary: text_at(row, 3)?,
        category: text_at(row, 4)?,
        mitigation_idea: text_at(row, 5)?,
        mitigation_rank: rank_at(row, 6)?,
        mitigation_attempts: u32::try_from(attempts.unwrap_or(0)).unwrap_or(u32::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_document(accession: &str, section: &str) -> NewDocument {
        NewDocument {
            key: DocumentKey {
                cik: "320193".to_string(),
                form: "10-K".to_string(),
                filed: "2023-11-03".to_string(),
                accession: accession.to_string(),
            },
            ticker: Some("AAPL".to_string()),
            content_locator: format!("filings/{}.htm", accession),
            section: section.to_string(),
        }
    }

    #[test]
    fn test_create_schema() {
        let store = SqliteStore::new(":memory:");
        assert!(store.is_ok(), "Should create store with schema");
    }

    #[test]
    fn test_blank_section_is_ineligible() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let id = store.create_document(&new_document("a-1", "   ")).unwrap().id();
        let doc = store.get_document(id).unwrap().unwrap();
        assert_eq!(doc.status, DocumentStatus::Ineligible);
        assert!(doc.section.is_none());
        assert_eq!(store.remaining().unwrap().documents, 0);
    }

    #[test]
    fn test_unknown_status_is_invalid_data() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let id = store.create_document(&new_document("a-1", "Risk text")).unwrap().id();
        store
            .conn
            .execute("UPDATE filings SET llm_status = 'weird' WHERE id = ?1", params![id.value()])
            .unwrap();
        assert!(store.get_document(id).is_err());
    }

    #[test]
    fn test_rank_outside_range_reads_as_missing() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let id = store.create_document(&new_document("a-1", "Risk text")).unwrap().id();
        store.insert_statements(id, &[NewStatement::plain("one")]).unwrap();
        store
            .conn
            .execute("UPDATE risks SET mitigation_idea = 'x', mitigation_rank = '2'", [])
            .unwrap();
        let statement = &store.statements_for(id).unwrap()[0];
        assert_eq!(statement.mitigation_rank, Some(MitigationRank::Caveated));

        store.conn.execute("UPDATE risks SET mitigation_rank = 9", []).unwrap();
        let statement = &store.statements_for(id).unwrap()[0];
        assert_eq!(statement.mitigation_rank, None);
        assert!(!statement.is_mitigation_complete());
        assert_eq!(store.remaining().unwrap().statements, 1);
    }
}
