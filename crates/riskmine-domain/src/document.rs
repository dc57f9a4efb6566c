//! Document module - one ingested filing and its enrichment status

use crate::statement::NewStatement;
use std::fmt;

/// Row identifier of a Document
///
/// Identifiers are assigned by the store in insertion order, so ordering by
/// `DocumentId` is oldest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(i64);

impl DocumentId {
    /// Wrap a raw row id
    pub fn from_value(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw row id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Enrichment status of a Document
///
/// `Ineligible` is stored as SQL NULL: nothing was extracted, so the Document is
/// never enqueued. It must never be confused with `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    /// Waiting for enrichment
    Pending,

    /// Submitted to enrichment and persisted (possibly via the segmenter fallback)
    Done,

    /// The attempt was made and failed unexpectedly
    Error,

    /// No section was extracted; terminal
    Ineligible,
}

impl DocumentStatus {
    /// Literal value stored in the status column (`None` means NULL)
    pub fn as_db(&self) -> Option<&'static str> {
        match self {
            DocumentStatus::Pending => Some("pending"),
            DocumentStatus::Done => Some("done"),
            DocumentStatus::Error => Some("error"),
            DocumentStatus::Ineligible => None,
        }
    }

    /// Parse the status column value
    pub fn from_db(value: Option<&str>) -> Option<Self> {
        match value {
            None => Some(DocumentStatus::Ineligible),
            Some("pending") => Some(DocumentStatus::Pending),
            Some("done") => Some(DocumentStatus::Done),
            Some("error") => Some(DocumentStatus::Error),
            Some(_) => None,
        }
    }

    /// Whether the Document will never be leased again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DocumentStatus::Pending)
    }

    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        self.as_db().unwrap_or("ineligible")
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dedup key of a Document: (entity key, form, filing date, accession)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    /// Source entity key (CIK)
    pub cik: String,

    /// Form/category tag, e.g. `10-K`
    pub form: String,

    /// Filing date, `YYYY-MM-DD`
    pub filed: String,

    /// Accession number without dashes
    pub accession: String,
}

/// A Document as produced by the ingestion collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    /// Dedup key
    pub key: DocumentKey,

    /// Ticker symbol, when known
    pub ticker: Option<String>,

    /// Where the raw body was read from
    pub content_locator: String,

    /// Extracted risk section (empty when extraction found nothing)
    pub section: String,
}

impl NewDocument {
    /// Status a freshly created Document starts with
    pub fn initial_status(&self) -> DocumentStatus {
        if self.section.trim().is_empty() {
            DocumentStatus::Ineligible
        } else {
            DocumentStatus::Pending
        }
    }
}

/// A persisted Document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Row identifier
    pub id: DocumentId,

    /// Dedup key
    pub key: DocumentKey,

    /// Ticker symbol, when known
    pub ticker: Option<String>,

    /// Company name, filled in after ingestion by an external lookup
    pub company_name: Option<String>,

    /// Where the raw body was read from
    pub content_locator: String,

    /// Extracted risk section, if any
    pub section: Option<String>,

    /// Enrichment status
    pub status: DocumentStatus,
}

/// Terminal result of processing one leased Document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// Statements to persist; the Document becomes `done`.
    ///
    /// An empty list is still `done`: the segmenter ran and found nothing.
    Done(Vec<NewStatement>),

    /// Unexpected failure; the Document becomes `error`
    Error(String),
}

impl DocumentOutcome {
    /// Status written by this outcome
    pub fn status(&self) -> DocumentStatus {
        match self {
            DocumentOutcome::Done(_) => DocumentStatus::Done,
            DocumentOutcome::Error(_) => DocumentStatus::Error,
        }
    }
}
