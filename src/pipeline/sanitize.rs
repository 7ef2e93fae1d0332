//! Response sanitizing: deterministic cleanup of raw model output before it
//! is parsed as JSON.
//!
//! Models are told to return bare JSON but regularly wrap it in a fenced
//! code block anyway. Rules, in order:
//!
//! 1. Strip invisible Unicode (BOM, zero-width spaces) the parser rejects
//! 2. Trim surrounding whitespace
//! 3. Strip one leading ` ```json ` or ` ``` ` fence and one trailing ` ``` `
//!
//! Fence stripping is idempotent: a sanitized response passes through
//! unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean a raw model response for JSON parsing.
pub fn sanitize_response(raw: &str) -> String {
    let s = remove_invisible_chars(raw);
    strip_json_fences(s.trim()).trim().to_string()
}

static RE_OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(?:json|JSON)?[ \t]*\r?\n?").unwrap());

static RE_CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```$").unwrap());

fn strip_json_fences(input: &str) -> &str {
    let start = RE_OPENING_FENCE.find(input).map_or(0, |m| m.end());
    let body = &input[start..];
    // Only strip the closing fence when an opening one was present; a bare
    // trailing ``` inside otherwise valid JSON is left for the parser to judge.
    if start == 0 {
        return body;
    }
    match RE_CLOSING_FENCE.find(body) {
        Some(m) => &body[..m.start()],
        None => body,
    }
}

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}'))
        .collect()
}
