//! Prompt construction for classification and mitigation calls

use regex::Regex;
use std::sync::LazyLock;

/// Categories the classifier may assign
pub const RISK_CATEGORIES: &[&str] = &[
    "Market",
    "Operational",
    "Regulatory",
    "Financial",
    "Legal",
    "Environmental",
    "Other",
];

static SUMMARY_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Risk Factors Summary").expect("summary phrase pattern"));

// A short line that reads like a heading
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[A-Za-z][^\n]{0,80}\n").expect("heading line pattern"));

const CLASSIFICATION_INSTRUCTIONS: &str = "\
You are an expert in SEC filings. Given the following text from an SEC 10-K or 10-Q 'Risk Factors' \
section, extract each individual risk factor, provide a one-sentence summary, and classify it as one \
of: Market, Operational, Regulatory, Financial, Legal, Environmental, or Other.

Return ONLY a JSON array (no explanation, no preamble, no markdown) with fields: 'risk_text', \
'summary', 'category'.

Risk Factors Section:
";

const MITIGATION_INSTRUCTIONS: &str = "\
You are an expert in risk management and artificial intelligence. For the following business risk, \
suggest a specific way that AI could help mitigate this risk. Then, rank the usefulness of this \
mitigation idea as 1 (very useful and likely to be impactful), 2 (potentially useful but with \
caveats), or 3 (dubious, unlikely to help, or not a good fit for AI). Be critical and do not default \
to 1 unless it is truly highly impactful. Return your answer as a JSON object with fields: \
mitigation_idea (string), mitigation_rank (integer: 1, 2, or 3).

Risk:
";

const RESPONSE_CUE: &str = "\n\nJSON:";

/// The first `max_chars` characters of `text`, cut on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Drop a "Risk Factors Summary" block and everything before it
///
/// Text resumes at the first short heading-like line after the phrase. When
/// there is no phrase, or no such line follows it, the text is returned as is.
pub fn skip_summary_block(text: &str) -> &str {
    let Some(phrase) = SUMMARY_PHRASE.find(text) else {
        return text;
    };
    match HEADING_LINE.find_at(text, phrase.end()) {
        Some(heading) => &text[heading.start()..],
        None => text,
    }
}

/// Prompt asking for a JSON array of classified statements
pub fn classification_prompt(section: &str, max_input_chars: usize) -> String {
    let body = truncate_chars(skip_summary_block(section), max_input_chars);
    let mut prompt =
        String::with_capacity(CLASSIFICATION_INSTRUCTIONS.len() + body.len() + RESPONSE_CUE.len());
    prompt.push_str(CLASSIFICATION_INSTRUCTIONS);
    prompt.push_str(body);
    prompt.push_str(RESPONSE_CUE);
    prompt
}

/// Prompt asking for a single mitigation object
pub fn mitigation_prompt(statement: &str, max_input_chars: usize) -> String {
    let body = truncate_chars(statement, max_input_chars);
    format!("{}{}{}", MITIGATION_INSTRUCTIONS, body, RESPONSE_CUE)
}
