//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{
    Document, DocumentId, DocumentKey, DocumentOutcome, Lease, Mitigation, NewDocument,
    NewStatement, Statement, StatementId, WorkRemaining,
};
use std::collections::HashMap;

/// Result of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome<I> {
    /// A new row was created
    Created(I),

    /// The dedup key already existed; the existing id is returned
    Existing(I),
}

impl<I: Copy> InsertOutcome<I> {
    /// The id regardless of whether the row was created
    pub fn id(&self) -> I {
        match self {
            InsertOutcome::Created(id) | InsertOutcome::Existing(id) => *id,
        }
    }

    /// Returns true if this call created the row
    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}

/// Trait for storing and retrieving Documents and Statements
///
/// Implemented by the infrastructure layer (riskmine-store)
pub trait FilingStore {
    /// Error type for store operations
    type Error;

    /// Create a Document, or return the existing one with the same dedup key
    fn create_document(&mut self, document: &NewDocument) -> Result<InsertOutcome<DocumentId>, Self::Error>;

    /// Look up a Document id by dedup key
    fn find_document(&self, key: &DocumentKey) -> Result<Option<DocumentId>, Self::Error>;

    /// Get a Document by id
    fn get_document(&self, id: DocumentId) -> Result<Option<Document>, Self::Error>;

    /// Delete a Document and every Statement it owns
    fn delete_document(&mut self, id: DocumentId) -> Result<bool, Self::Error>;

    /// Insert Statements, skipping texts the Document already has; returns how many were inserted
    fn insert_statements(&mut self, document: DocumentId, statements: &[NewStatement]) -> Result<usize, Self::Error>;

    /// Statements owned by a Document, oldest first
    fn statements_for(&self, document: DocumentId) -> Result<Vec<Statement>, Self::Error>;

    /// Get a Statement by id
    fn get_statement(&self, id: StatementId) -> Result<Option<Statement>, Self::Error>;

    /// Fill in company names for the given entity keys; returns how many Documents changed
    fn assign_entity_names(&mut self, names: &HashMap<String, String>) -> Result<usize, Self::Error>;

    /// Outstanding work in both collections, observed at one instant
    fn remaining(&self) -> Result<WorkRemaining, Self::Error>;
}

/// A unit that can travel through a `WorkQueue`
pub trait QueueUnit {
    /// What a worker hands back when it finishes the unit
    type Outcome;

    /// Short name used in logs
    const KIND: &'static str;

    /// Raw row id of the unit
    fn unit_id(&self) -> i64;
}

impl QueueUnit for Document {
    type Outcome = DocumentOutcome;
    const KIND: &'static str = "document";

    fn unit_id(&self) -> i64 {
        self.id.value()
    }
}

impl QueueUnit for Statement {
    type Outcome = Mitigation;
    const KIND: &'static str = "statement";

    fn unit_id(&self) -> i64 {
        self.id.value()
    }
}

/// Work queue backed by the store's status columns
///
/// `lease` hides the returned units from other leases until they are completed,
/// requeued, or the lease expires. Leasing does not change status values, so
/// leased units still count as pending.
pub trait WorkQueue<U: QueueUnit> {
    /// Error type for queue operations
    type Error;

    /// Take up to `batch` eligible units, oldest first
    fn lease(&mut self, batch: usize) -> Result<Lease<U>, Self::Error>;

    /// Record the unit's outcome and release its lease
    fn complete(&mut self, unit: &U, outcome: U::Outcome) -> Result<(), Self::Error>;

    /// Release the unit so a later lease picks it up again
    fn requeue(&mut self, unit: &U) -> Result<(), Self::Error>;

    /// Units not yet in a terminal state (leased or not)
    fn pending_count(&self) -> Result<u64, Self::Error>;
}
