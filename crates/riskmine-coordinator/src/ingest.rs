//! Ingestion: turning listed filings into Documents
//!
//! The listing itself (fetching indexes, downloading bodies) happens outside
//! this crate. `ManifestIngestor` works from a TOML manifest of filings that
//! are already on disk:
//!
//! ```toml
//! [[filing]]
//! cik = "320193"
//! ticker = "AAPL"
//! form = "10-K"
//! filed = "2024-11-01"
//! accession = "0000320193-24-000123"
//! path = "320193/000032019324000123/aapl-20240928.htm"
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use crate::{CoordinatorError, IngestConfig};
use async_trait::async_trait;
use chrono::NaiveDate;
use riskmine_domain::{DocumentKey, DocumentStatus, FilingStore, NewDocument};
use riskmine_extractor::extract_section_from_file;
use riskmine_store::{SqliteStore, StoreConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counts from one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Entries in the listing
    pub listed: usize,

    /// Entries left after the selection rules
    pub selected: usize,

    /// Documents created with a risk section (pending)
    pub created: usize,

    /// Documents created without a risk section (ineligible)
    pub ineligible: usize,

    /// Entries whose key was already stored
    pub existing: usize,

    /// Entries whose file could not be read
    pub unreadable: usize,
}

/// Produces Documents for the Coordinator
#[async_trait]
pub trait Ingestor: Send + Sync {
    /// Create every new Document, skipping keys already stored
    async fn ingest(&self, store: &StoreConfig) -> Result<IngestReport, CoordinatorError>;
}

/// One filing listed in a manifest
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestEntry {
    /// Entity key
    pub cik: String,

    /// Ticker symbol
    #[serde(default)]
    pub ticker: Option<String>,

    /// Form type
    pub form: String,

    /// Filing date
    pub filed: NaiveDate,

    /// Accession number, dashes allowed
    pub accession: String,

    /// Local copy of the filing body
    pub path: PathBuf,
}

impl ManifestEntry {
    /// Accession number without dashes
    pub fn accession_digits(&self) -> String {
        self.accession.replace('-', "")
    }

    /// Dedup key of the Document this entry becomes
    pub fn key(&self) -> DocumentKey {
        DocumentKey {
            cik: self.cik.trim().to_string(),
            form: self.form.clone(),
            filed: self.filed.format("%Y-%m-%d").to_string(),
            accession: self.accession_digits(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "filing")]
    filings: Vec<ManifestEntry>,
}

/// Apply the selection rules to a listing
///
/// Keeps allowed, non-amended forms filed on or after `since`, and only the
/// highest accession for each (entity, form, filing date). Listing order is
/// otherwise preserved.
pub fn select_filings(entries: Vec<ManifestEntry>, config: &IngestConfig) -> Vec<ManifestEntry> {
    let mut selected: Vec<ManifestEntry> = Vec::new();
    let mut slots: HashMap<(String, String, NaiveDate), usize> = HashMap::new();

    for entry in entries {
        if !config.accepts_form(&entry.form) {
            continue;
        }
        if config.since.is_some_and(|since| entry.filed < since) {
            continue;
        }

        let slot = (entry.cik.trim().to_string(), entry.form.clone(), entry.filed);
        match slots.get(&slot) {
            Some(&idx) => {
                if entry.accession_digits() > selected[idx].accession_digits() {
                    selected[idx] = entry;
                }
            }
            None => {
                slots.insert(slot, selected.len());
                selected.push(entry);
            }
        }
    }

    selected
}

/// Ingests filings listed in a TOML manifest
pub struct ManifestIngestor {
    manifest: PathBuf,
    config: IngestConfig,
}

impl ManifestIngestor {
    /// Ingest from `manifest` using `config`'s selection rules
    pub fn new(manifest: impl Into<PathBuf>, config: IngestConfig) -> Self {
        Self {
            manifest: manifest.into(),
            config,
        }
    }

    /// Read the manifest, resolving relative paths
    pub async fn load(&self) -> Result<Vec<ManifestEntry>, CoordinatorError> {
        let text = tokio::fs::read_to_string(&self.manifest)
            .await
            .map_err(|source| CoordinatorError::Io {
                path: self.manifest.clone(),
                source,
            })?;
        let manifest: Manifest =
            toml::from_str(&text).map_err(|e| CoordinatorError::Manifest(e.to_string()))?;

        let base = self.manifest.parent().unwrap_or_else(|| Path::new("."));
        Ok(manifest
            .filings
            .into_iter()
            .map(|mut entry| {
                if entry.path.is_relative() {
                    entry.path = base.join(&entry.path);
                }
                entry
            })
            .collect())
    }
}

#[async_trait]
impl Ingestor for ManifestIngestor {
    async fn ingest(&self, store: &StoreConfig) -> Result<IngestReport, CoordinatorError> {
        let entries = self.load().await?;
        let listed = entries.len();
        let selected = select_filings(entries, &self.config);
        info!(listed, selected = selected.len(), manifest = %self.manifest.display(), "ingesting filings");

        let store = store.clone();
        let mut report = tokio::task::spawn_blocking(move || store_filings(&store, selected)).await??;
        report.listed = listed;

        info!(
            created = report.created,
            ineligible = report.ineligible,
            existing = report.existing,
            unreadable = report.unreadable,
            "ingestion finished"
        );
        Ok(report)
    }
}

fn store_filings(
    config: &StoreConfig,
    entries: Vec<ManifestEntry>,
) -> Result<IngestReport, CoordinatorError> {
    let mut store = SqliteStore::connect(config)?;
    let mut report = IngestReport {
        selected: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        let key = entry.key();
        if store.find_document(&key)?.is_some() {
            debug!(cik = %key.cik, form = %key.form, filed = %key.filed, "already stored");
            report.existing += 1;
            continue;
        }

        let section = match extract_section_from_file(&entry.path) {
            Ok(section) => section,
            Err(e) => {
                warn!(error = %e, "skipping unreadable filing");
                report.unreadable += 1;
                continue;
            }
        };

        let document = NewDocument {
            key,
            ticker: entry.ticker.clone(),
            content_locator: entry.path.display().to_string(),
            section,
        };
        let outcome = store.create_document(&document)?;

        if !outcome.is_created() {
            report.existing += 1;
        } else if document.initial_status() == DocumentStatus::Ineligible {
            debug!(document_id = %outcome.id(), "no risk section found");
            report.ineligible += 1;
        } else {
            debug!(document_id = %outcome.id(), chars = document.section.len(), "risk section stored");
            report.created += 1;
        }
    }

    Ok(report)
}
