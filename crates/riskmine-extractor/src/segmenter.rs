//! Heuristic statement segmentation

use regex::Regex;
use std::sync::LazyLock;

/// Candidates shorter than this many characters are noise
pub const MIN_STATEMENT_CHARS: usize = 40;

// Blank-line runs, bulleted lines, or a newline-delimited upper-case heading line
static BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n|\n\s*[•\-]\s+|\n[A-Z][A-Z\s,\-]{10,}\n").expect("boundary pattern")
});

/// Splits a risk section into candidate statements
///
/// Deterministic and order-preserving. Used when enrichment returns nothing
/// for a section that was extracted.
#[derive(Debug, Clone, Copy)]
pub struct StatementSegmenter {
    min_chars: usize,
}

impl StatementSegmenter {
    /// Segmenter that keeps candidates of at least `min_chars` characters
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    /// Minimum kept candidate length
    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Split `section` into trimmed candidates, dropping short ones
    pub fn segment(&self, section: &str) -> Vec<String> {
        BOUNDARY
            .split(section)
            .map(str::trim)
            .filter(|candidate| candidate.chars().count() >= self.min_chars)
            .map(str::to_string)
            .collect()
    }
}

impl Default for StatementSegmenter {
    fn default() -> Self {
        Self::new(MIN_STATEMENT_CHARS)
    }
}
