//! Risk section extraction
//!
//! Filings list "Item 1A. Risk Factors" both in the table of contents and as the
//! real section heading. Every start marker up to its next-section marker is a
//! candidate, and the longest candidate wins: the TOC entry is a handful of
//! characters, the section body is thousands.

use crate::ExtractError;
use regex::Regex;
use scraper::{Html, Node};
use std::path::Path;
use std::sync::LazyLock;

static SECTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Item\s*1A[\s.:\-–—]*Risk\s+Factors").expect("section start pattern")
});

// Item 1B/2/7, or any later item heading, in any case
static SECTION_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Item\s*(?:1B|2|7)[\s.:\-–—]+|Item\s+[0-9A-Z][A-Z\s.:\-–—]+")
        .expect("section end pattern")
});

const MARKUP_ROOT_TAGS: &[&str] = &["<html", "<xbrl", "<document"];

const NOISE_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Cheap check for an HTML/XBRL/SGML filing body
pub fn is_markup(body: &str) -> bool {
    let lower = body.to_lowercase();
    MARKUP_ROOT_TAGS.iter().any(|tag| lower.contains(tag))
}

/// Visible text of a markup body, one text node per line
///
/// Text inside script, style and noscript elements is dropped.
pub fn strip_markup(body: &str) -> String {
    let document = Html::parse_document(body);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let in_noise = node.ancestors().any(|ancestor| {
            matches!(ancestor.value(), Node::Element(el) if NOISE_ELEMENTS.contains(&el.name()))
        });
        if !in_noise {
            parts.push(&**text);
        }
    }

    parts.join("\n")
}

/// Extract the risk section from a filing body
///
/// Markup bodies are reduced to their visible text first. Returns the trimmed
/// longest candidate, or an empty string when no start marker is followed by
/// an end marker.
pub fn extract_section(body: &str) -> String {
    if is_markup(body) {
        longest_section(&strip_markup(body))
    } else {
        longest_section(body)
    }
}

/// Read a filing from disk and extract its risk section
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn extract_section_from_file(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let body = String::from_utf8_lossy(&bytes);
    let section = extract_section(&body);
    tracing::debug!(path = %path.display(), chars = section.chars().count(), "section extracted");
    Ok(section)
}

fn longest_section(text: &str) -> String {
    let mut best: Option<&str> = None;
    let mut best_chars = 0;
    let mut cursor = 0;

    while let Some(start) = SECTION_START.find_at(text, cursor) {
        let Some(end) = SECTION_END.find_at(text, start.end()) else {
            break;
        };
        let candidate = &text[start.start()..end.start()];
        let chars = candidate.chars().count();
        if best.is_none() || chars > best_chars {
            best = Some(candidate);
            best_chars = chars;
        }
        cursor = end.start();
    }

    best.map(|s| s.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(len: usize) -> String {
        "Our business faces many risks. ".chars().cycle().take(len).collect()
    }

    #[test]
    fn test_no_start_marker_yields_empty() {
        assert_eq!(extract_section("Annual report with no risk heading."), "");
    }

    #[test]
    fn test_start_without_end_yields_empty() {
        assert_eq!(extract_section("Item 1A. Risk Factors\nOnly text, never closed."), "");
    }

    #[test]
    fn test_longest_match_beats_table_of_contents() {
        let toc = "Item 1A. Risk Factors ....... 12\n";
        let body = format!("Item 1A. Risk Factors\n{}\n", filler(5_000));
        let text = format!(
            "{}Item 1B. Unresolved Staff Comments 20\n{}Item 1B. Unresolved Staff Comments\nNone.",
            toc, body
        );

        let section = extract_section(&text);
        assert!(section.chars().count() > 5_000);
        assert!(section.starts_with("Item 1A. Risk Factors\nOur business"));
        assert!(!section.contains("Unresolved"));
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let text = "Item 1A Risk Factors AAAA Item 2. Properties Item 1A Risk Factors BBBB Item 2. Properties";
        assert_eq!(extract_section(text), "Item 1A Risk Factors AAAA");
    }

    #[test]
    fn test_case_insensitive_markers() {
        let text = "ITEM 1A. RISK FACTORS\nDemand may fall sharply.\nitem 7. management's discussion";
        assert_eq!(extract_section(text), "ITEM 1A. RISK FACTORS\nDemand may fall sharply.");
    }

    #[test]
    fn test_uppercase_item_heading_ends_section() {
        let text = "Item 1A — Risk Factors\nSupply may tighten.\nITEM 3. LEGAL PROCEEDINGS\nNone.";
        assert_eq!(extract_section(text), "Item 1A — Risk Factors\nSupply may tighten.");
    }

    #[test]
    fn test_title_case_item_heading_ends_section() {
        let text = "Item 1A. Risk Factors\nDemand may fall.\nItem 3. Legal Proceedings\nNone pending.\nITEM 4. MINE SAFETY";
        assert_eq!(extract_section(text), "Item 1A. Risk Factors\nDemand may fall.");
    }

    #[test]
    fn test_markup_detection() {
        assert!(is_markup("<HTML><body>x</body></HTML>"));
        assert!(is_markup("<DOCUMENT>\n<TYPE>10-K"));
        assert!(is_markup("<xbrl>"));
        assert!(!is_markup("plain text filing"));
    }

    #[test]
    fn test_strip_markup_drops_scripts_and_styles() {
        let html = "<html><head><style>p { color: red }</style><script>var x = 1;</script></head>\
                    <body><p>Visible</p><noscript>Hidden</noscript><p>Also visible</p></body></html>";
        let text = strip_markup(html);
        assert!(text.contains("Visible"));
        assert!(text.contains("Also visible"));
        assert!(!text.contains("color"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("Hidden"));
    }

    #[test]
    fn test_extract_from_markup() {
        let html = "<html><body><p>Item 1A. Risk Factors</p><p>Rates may rise.</p>\
                    <script>Item 1B. fake</script><p>Item 1B. Unresolved Staff Comments</p></body></html>";
        assert_eq!(extract_section(html), "Item 1A. Risk Factors\nRates may rise.");
    }
}
