//! Riskmine Domain Layer
//!
//! Core model for the filing enrichment pipeline. This crate has no infrastructure
//! dependencies: it defines the value types the pipeline moves around and the
//! trait interfaces the storage layer implements.
//!
//! ## Key Concepts
//!
//! - **Document**: one ingested filing, its extracted risk section and its enrichment status
//! - **Statement**: one discrete risk derived from a Document's section
//! - **Mitigation**: the second enrichment pass over a Statement (idea + rank)
//! - **Work queue**: status columns double as a queue; `WorkQueue` makes leasing explicit
//!
//! ## Lifecycle
//!
//! ```text
//! Document:  pending ──lease──▶ (in flight) ──complete──▶ done | error
//!            ineligible (no section) is terminal from the start
//!
//! Statement: idea/rank null ──lease──▶ (in flight) ──complete──▶ both set
//!                                   └──requeue──▶ retried next cycle
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod lease;
pub mod mitigation;
pub mod progress;
pub mod statement;
pub mod traits;

// Re-exports for convenience
pub use document::{Document, DocumentId, DocumentKey, DocumentOutcome, DocumentStatus, NewDocument};
pub use lease::{Lease, LeaseToken};
pub use mitigation::{Mitigation, MitigationRank};
pub use progress::{StatusSummary, WorkRemaining};
pub use statement::{NewStatement, Statement, StatementId};
pub use traits::{FilingStore, InsertOutcome, QueueUnit, WorkQueue};
