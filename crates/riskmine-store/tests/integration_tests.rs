//! Integration tests for riskmine-store
//!
//! These exercise the store against real database files, including several
//! connections sharing one file the way concurrent workers do.

use riskmine_domain::{
    Document, DocumentKey, DocumentOutcome, DocumentStatus, FilingStore, Lease, Mitigation,
    MitigationRank, NewDocument, NewStatement, Statement, WorkQueue,
};
use riskmine_store::{SqliteStore, StoreConfig};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use tempfile::TempDir;

fn temp_config() -> (TempDir, StoreConfig) {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::at(dir.path().join("filings.db"));
    (dir, config)
}

fn new_document(cik: &str, accession: &str, section: &str) -> NewDocument {
    NewDocument {
        key: DocumentKey {
            cik: cik.to_string(),
            form: "10-K".to_string(),
            filed: "2024-02-01".to_string(),
            accession: accession.to_string(),
        },
        ticker: None,
        content_locator: format!("filings/{}/{}.htm", cik, accession),
        section: section.to_string(),
    }
}

fn lease_documents(store: &mut SqliteStore, batch: usize) -> Lease<Document> {
    <SqliteStore as WorkQueue<Document>>::lease(store, batch).unwrap()
}

fn lease_statements(store: &mut SqliteStore, batch: usize) -> Lease<Statement> {
    <SqliteStore as WorkQueue<Statement>>::lease(store, batch).unwrap()
}

#[test]
fn test_create_document_is_idempotent() {
    let (_dir, config) = temp_config();
    let mut store = SqliteStore::open(&config).unwrap();

    let doc = new_document("320193", "0000320193-24-000006", "Supply chain risk.");
    let first = store.create_document(&doc).unwrap();
    let second = store.create_document(&doc).unwrap();

    assert!(first.is_created());
    assert!(!second.is_created(), "Second insert with the same key must not create a row");
    assert_eq!(first.id(), second.id());
    assert_eq!(store.status_summary().unwrap().documents(), 1);
    assert_eq!(store.find_document(&doc.key).unwrap(), Some(first.id()));
}

#[test]
fn test_insert_statements_deduplicates_text() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.create_document(&new_document("1", "a", "Section")).unwrap().id();

    let batch = vec![
        NewStatement::plain("Competition may reduce margins."),
        NewStatement::plain("  Competition may reduce margins.  "),
        NewStatement::plain(""),
        NewStatement::plain("Key personnel may leave."),
    ];
    assert_eq!(store.insert_statements(id, &batch).unwrap(), 2);
    assert_eq!(store.insert_statements(id, &batch).unwrap(), 0, "Repeat insert adds nothing");

    let texts: Vec<String> = store
        .statements_for(id)
        .unwrap()
        .into_iter()
        .map(|s| s.raw_text)
        .collect();
    assert_eq!(texts, vec!["Competition may reduce margins.", "Key personnel may leave."]);
}

#[test]
fn test_same_text_allowed_under_different_documents() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let a = store.create_document(&new_document("1", "a", "Section")).unwrap().id();
    let b = store.create_document(&new_document("2", "b", "Section")).unwrap().id();

    let statement = [NewStatement::plain("Interest rates may rise.")];
    assert_eq!(store.insert_statements(a, &statement).unwrap(), 1);
    assert_eq!(store.insert_statements(b, &statement).unwrap(), 1);
}

#[test]
fn test_insert_statements_requires_document() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let missing = riskmine_domain::DocumentId::from_value(42);
    let result = store.insert_statements(missing, &[NewStatement::plain("orphan")]);
    assert!(result.is_err(), "Statements must reference an existing document");
}

#[test]
fn test_delete_document_removes_statements() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.create_document(&new_document("1", "a", "Section")).unwrap().id();
    store
        .insert_statements(id, &[NewStatement::plain("one"), NewStatement::plain("two")])
        .unwrap();

    assert!(store.delete_document(id).unwrap());
    assert!(store.get_document(id).unwrap().is_none());
    assert!(store.statements_for(id).unwrap().is_empty());
    assert_eq!(store.status_summary().unwrap().statements, 0);
    assert!(!store.delete_document(id).unwrap(), "Second delete finds nothing");
}

#[test]
fn test_document_lease_hides_units() {
    let (_dir, config) = temp_config();
    let mut store = SqliteStore::open(&config).unwrap();
    for i in 0..5 {
        store
            .create_document(&new_document("1", &format!("acc-{}", i), "Section"))
            .unwrap();
    }
    store.create_document(&new_document("1", "blank", "")).unwrap();

    let first = lease_documents(&mut store, 3);
    let second = lease_documents(&mut store, 3);
    let third = lease_documents(&mut store, 3);

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 2, "Ineligible documents are never leased");
    assert!(third.is_empty());
    assert_ne!(first.token, second.token);

    let ids: HashSet<_> = first.units.iter().chain(&second.units).map(|d| d.id).collect();
    assert_eq!(ids.len(), 5, "No document is leased twice");

    // Leased documents are still pending
    assert_eq!(store.remaining().unwrap().documents, 5);
}

#[test]
fn test_document_lease_is_oldest_first() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let a = store.create_document(&new_document("1", "a", "Section")).unwrap().id();
    let b = store.create_document(&new_document("1", "b", "Section")).unwrap().id();

    let lease = lease_documents(&mut store, 10);
    let ids: Vec<_> = lease.units.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn test_concurrent_connections_never_share_units() {
    let (_dir, config) = temp_config();
    {
        let mut store = SqliteStore::open(&config).unwrap();
        for i in 0..40 {
            store
                .create_document(&new_document("1", &format!("acc-{}", i), "Section"))
                .unwrap();
        }
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let config = config.clone();
            std::thread::spawn(move || {
                let mut store = SqliteStore::connect(&config).unwrap();
                let mut seen = Vec::new();
                loop {
                    let lease = lease_documents(&mut store, 3);
                    if lease.is_empty() {
                        break;
                    }
                    seen.extend(lease.units.into_iter().map(|d| d.id));
                }
                seen
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }
    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(all.len(), 40);
    assert_eq!(unique.len(), 40, "Each document leased exactly once");
}

#[test]
fn test_complete_document_writes_statements_and_status() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.create_document(&new_document("1", "a", "Section")).unwrap().id();

    let lease = lease_documents(&mut store, 1);
    let outcome = DocumentOutcome::Done(vec![
        NewStatement {
            raw_text: "Demand may fall.".to_string(),
            summary: Some("Demand risk".to_string()),
            category: Some("Market".to_string()),
        },
        NewStatement::plain("Demand may fall."),
    ]);
    store.complete(&lease.units[0], outcome).unwrap();

    let doc = store.get_document(id).unwrap().unwrap();
    assert_eq!(doc.status, DocumentStatus::Done);
    let statements = store.statements_for(id).unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].category.as_deref(), Some("Market"));
    assert_eq!(store.remaining().unwrap().documents, 0);
    assert!(lease_documents(&mut store, 1).is_empty(), "Done documents never return");
}

#[test]
fn test_complete_document_with_error() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.create_document(&new_document("1", "a", "Section")).unwrap().id();

    let lease = lease_documents(&mut store, 1);
    store
        .complete(&lease.units[0], DocumentOutcome::Error("panicked".to_string()))
        .unwrap();

    let doc = store.get_document(id).unwrap().unwrap();
    assert_eq!(doc.status, DocumentStatus::Error);
    assert!(store.statements_for(id).unwrap().is_empty());
}

#[test]
fn test_requeue_document_makes_it_leasable() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.create_document(&new_document("1", "a", "Section")).unwrap();

    let lease = lease_documents(&mut store, 1);
    assert!(lease_documents(&mut store, 1).is_empty());

    store.requeue(&lease.units[0]).unwrap();
    assert_eq!(lease_documents(&mut store, 1).len(), 1);
}

#[test]
fn test_expired_lease_is_reclaimed() {
    let (_dir, config) = temp_config();
    let mut store = SqliteStore::open(&config).unwrap();
    let id = store.create_document(&new_document("1", "a", "Section")).unwrap().id();
    assert_eq!(lease_documents(&mut store, 1).len(), 1);

    // Age the lease past the TTL
    let conn = Connection::open(&config.path).unwrap();
    conn.execute(
        "UPDATE filings SET leased_at = leased_at - 601 WHERE id = ?1",
        [id.value()],
    )
    .unwrap();

    assert_eq!(lease_documents(&mut store, 1).len(), 1);
}

#[test]
fn test_statement_mitigation_fields_fill_once() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.create_document(&new_document("1", "a", "Section")).unwrap().id();
    store.insert_statements(id, &[NewStatement::plain("Rates may rise.")]).unwrap();

    // Only the idea arrives: statement stays queued
    let lease = lease_statements(&mut store, 10);
    assert_eq!(lease.len(), 1);
    store
        .complete(
            &lease.units[0],
            Mitigation {
                idea: Some("Hedge exposure".to_string()),
                rank: None,
            },
        )
        .unwrap();
    assert_eq!(store.remaining().unwrap().statements, 1);

    // Second pass supplies both; the first idea wins
    let lease = lease_statements(&mut store, 10);
    assert_eq!(lease.len(), 1);
    store
        .complete(
            &lease.units[0],
            Mitigation {
                idea: Some("Something else".to_string()),
                rank: Some(MitigationRank::Caveated),
            },
        )
        .unwrap();

    let statement = &store.statements_for(id).unwrap()[0];
    assert_eq!(statement.mitigation_idea.as_deref(), Some("Hedge exposure"));
    assert_eq!(statement.mitigation_rank, Some(MitigationRank::Caveated));
    assert_eq!(statement.mitigation_attempts, 2);
    assert!(statement.is_mitigation_complete());
    assert_eq!(store.remaining().unwrap().statements, 0);
    assert!(lease_statements(&mut store, 10).is_empty());
}

#[test]
fn test_empty_mitigation_counts_attempt_only() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.create_document(&new_document("1", "a", "Section")).unwrap().id();
    store.insert_statements(id, &[NewStatement::plain("Rates may rise.")]).unwrap();

    let lease = lease_statements(&mut store, 10);
    store.complete(&lease.units[0], Mitigation::default()).unwrap();

    let statement = &store.statements_for(id).unwrap()[0];
    assert_eq!(statement.mitigation_idea, None);
    assert_eq!(statement.mitigation_rank, None);
    assert_eq!(statement.mitigation_attempts, 1);
    assert_eq!(lease_statements(&mut store, 10).len(), 1, "Statement is leased again");
}

#[test]
fn test_pending_counts_per_queue() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.create_document(&new_document("1", "a", "Section")).unwrap().id();
    store.create_document(&new_document("1", "b", "Section")).unwrap();
    store
        .insert_statements(id, &[NewStatement::plain("one"), NewStatement::plain("two")])
        .unwrap();

    assert_eq!(<SqliteStore as WorkQueue<Document>>::pending_count(&store).unwrap(), 2);
    assert_eq!(<SqliteStore as WorkQueue<Statement>>::pending_count(&store).unwrap(), 2);
}

#[test]
fn test_assign_entity_names_ignores_leading_zeros() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let a = store.create_document(&new_document("0000320193", "a", "Section")).unwrap().id();
    store.create_document(&new_document("789019", "b", "Section")).unwrap();

    assert_eq!(store.unnamed_entities().unwrap().len(), 2);

    let mut names = HashMap::new();
    names.insert("320193".to_string(), "Apple Inc.".to_string());
    assert_eq!(store.assign_entity_names(&names).unwrap(), 1);
    assert_eq!(store.assign_entity_names(&names).unwrap(), 0, "Unchanged names are not rewritten");

    let doc = store.get_document(a).unwrap().unwrap();
    assert_eq!(doc.company_name.as_deref(), Some("Apple Inc."));
    assert_eq!(store.unnamed_entities().unwrap(), vec!["789019".to_string()]);
}

#[test]
fn test_migrates_legacy_database() {
    let (_dir, config) = temp_config();
    {
        let conn = Connection::open(&config.path).unwrap();
        conn.execute_batch(
            "CREATE TABLE filings (
                id INTEGER PRIMARY KEY, cik TEXT, ticker TEXT, form TEXT, filed DATE,
                accession TEXT, local_path TEXT, risk_factors TEXT
            );
            CREATE TABLE risks (
                id INTEGER PRIMARY KEY, filing_id INTEGER, risk_text TEXT, category TEXT,
                FOREIGN KEY(filing_id) REFERENCES filings(id)
            );
            INSERT INTO filings (cik, form, filed, accession, local_path, risk_factors)
                VALUES ('1', '10-K', '2020-01-01', 'x', 'x.htm', 'Old section');
            INSERT INTO filings (cik, form, filed, accession, local_path, risk_factors)
                VALUES ('1', '10-K', '2021-01-01', 'y', 'y.htm', NULL);
            INSERT INTO risks (filing_id, risk_text, category) VALUES (1, 'Legacy risk', 'Other');",
        )
        .unwrap();
    }

    let store = SqliteStore::open(&config).unwrap();
    let report = store.migrate().unwrap();
    assert!(report.is_noop(), "Second migration changes nothing");

    let summary = store.status_summary().unwrap();
    assert_eq!(summary.pending, 1, "Legacy row with a section picks up the pending default");
    assert_eq!(summary.ineligible, 1, "Legacy row without a section leaves the queue");

    let statements = store
        .statements_for(riskmine_domain::DocumentId::from_value(1))
        .unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].mitigation_attempts, 0);
    assert!(!statements[0].is_mitigation_complete());
}

#[test]
fn test_reopen_preserves_data() {
    let (_dir, config) = temp_config();
    let id = {
        let mut store = SqliteStore::open(&config).unwrap();
        store.create_document(&new_document("1", "a", "Section")).unwrap().id()
    };

    let store = SqliteStore::open(&config).unwrap();
    assert!(store.get_document(id).unwrap().is_some());
}
