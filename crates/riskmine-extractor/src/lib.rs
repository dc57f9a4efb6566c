//! Riskmine Extraction Layer
//!
//! Pure text processing over raw filing bodies. Nothing here touches the
//! network or the database, and nothing here fails on bad input: the worst
//! case is an empty result.
//!
//! # Architecture
//!
//! - `section`: finds the risk section in a filing body (markup or plain text)
//! - `segmenter`: splits a section into candidate statements when enrichment
//!   produces nothing
//!
//! # Examples
//!
//! ```
//! use riskmine_extractor::{extract_section, StatementSegmenter};
//!
//! let body = "Item 1A. Risk Factors\n\nOur suppliers are concentrated in a single region and may fail.\n\nItem 1B. Unresolved Staff Comments";
//! let section = extract_section(body);
//! assert!(section.starts_with("Item 1A"));
//!
//! let statements = StatementSegmenter::default().segment(&section);
//! assert_eq!(statements.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod section;
pub mod segmenter;

pub use section::{extract_section, extract_section_from_file, is_markup, strip_markup};
pub use segmenter::{StatementSegmenter, MIN_STATEMENT_CHARS};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading filings off disk
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The filing could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
