//! Structured output extraction.
//!
//! Model output is unreliable at the JSON boundary: objects arrive wrapped
//! in prose, fenced in markdown, decorated with comments, or not at all.
//! This module turns raw generated text into a parsed object through layered
//! strategies tried in order, each a pure function returning an `Option`.
//! When no strategy yields an object, the text is classified as either a
//! clarification request or a plain failure.
//!
//! Tie-break policy: a text that both parses as an object and reads like a
//! question is treated as an object. Structural success wins over lexical
//! heuristics.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```").expect("fenced object regex must compile")
});

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*[\s\S]*?\*/").expect("block comment regex must compile"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//.*$").expect("line comment regex must compile"));
static FUNCTION_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"function\s*\([^)]*\)\s*\{[^}]*\}").expect("function literal regex must compile")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma regex must compile"));
static PADDED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*""#).expect("padded key regex must compile")
});
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));

/// Result of running the full extraction over raw model output.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A well-formed object was recovered.
    Object(Value),
    /// No object, but the text reads as a question back to the user.
    Clarification(String),
    /// Neither an object nor a clarification; raw text kept for diagnostics.
    Failure { raw: String },
}

/// Run all strategies over `raw`, first success wins.
pub fn extract(raw: &str) -> Extraction {
    if let Some(object) = extract_json_object(raw) {
        return Extraction::Object(object);
    }
    if looks_like_clarification(raw) {
        return Extraction::Clarification(raw.trim().to_string());
    }
    Extraction::Failure {
        raw: raw.to_string(),
    }
}

/// Object-extraction strategies only, no clarification heuristics. This is
/// the entry point the chart pipeline uses.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    from_fenced_block(raw)
        .or_else(|| from_balanced_braces(raw))
        .or_else(|| from_stripped_text(raw))
}

/// Strategy 1: a fenced code block whose content is a single object.
fn from_fenced_block(raw: &str) -> Option<Value> {
    let captured = FENCED_OBJECT.captures(raw)?.get(1)?.as_str();
    parse_normalized(captured)
}

/// Strategy 2: the brace-balanced span starting at the first `{`, found by
/// depth counting so arbitrarily nested objects match whole. The scan does
/// not track string literals; a `}` inside a string closes the span early,
/// the parse then fails, and strategy 3 takes over.
fn from_balanced_braces(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in raw[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return parse_normalized(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strategy 3: strip fence markers and any leading/trailing non-brace text,
/// then parse only if what remains is brace-delimited.
fn from_stripped_text(raw: &str) -> Option<Value> {
    let stripped = raw.replace("```json", "").replace("```", "");
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_normalized(&stripped[start..=end])
}

fn parse_normalized(candidate: &str) -> Option<Value> {
    let cleaned = clean_json_string(candidate);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => Some(Value::Object(map)),
        _ => None,
    }
}

/// Normalize the common defects of model-emitted JSON: comments, embedded
/// function literals, trailing commas, padded key names, and irregular
/// whitespace.
pub fn clean_json_string(candidate: &str) -> String {
    let cleaned = BLOCK_COMMENT.replace_all(candidate, "");
    let cleaned = LINE_COMMENT.replace_all(&cleaned, "");
    let cleaned = FUNCTION_LITERAL.replace_all(&cleaned, "\"[Function]\"");
    let cleaned = TRAILING_COMMA.replace_all(&cleaned, "$1");
    let cleaned = PADDED_KEY.replace_all(&cleaned, "\"$1\"");
    let cleaned = WHITESPACE_RUN.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}

const INTERROGATIVE_MARKERS: &[&str] = &[
    "？",
    "?",
    "请问",
    "请明确",
    "请具体",
    "请提供",
    "还是",
    "please specify",
    "please clarify",
    "could you",
];

const PLAN_KEY_MARKERS: &[&str] = &["\"plan\"", "\"steps\""];

/// Lexical heuristic for texts that are a question back to the user rather
/// than a failed plan. Texts mentioning a plan-shaped key are excluded so a
/// half-broken plan object is not misread as a question.
fn looks_like_clarification(raw: &str) -> bool {
    let lowered = raw.to_lowercase();
    let interrogative = INTERROGATIVE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker));
    let plan_shaped = PLAN_KEY_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker));
    interrogative && !plan_shaped
}
