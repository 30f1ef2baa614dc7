//! Best-effort JSON extraction from LLM response text.
//!
//! Model output is prose-wrapped more often than not, so this is a recovery
//! scanner rather than a strict decoder: each `{` is tried as a candidate
//! object start, the balanced span is located with a string-aware depth
//! counter, and the first span that parses wins. Text with no parseable
//! object degrades to `{"content": <original text>}`.

use serde_json::{Value, json};

/// Extract the first well-formed JSON object embedded in `text`.
///
/// Falls back to wrapping the raw text under a `content` key when no
/// balanced span parses. Never fails.
pub fn extract_json(text: &str) -> Value {
    let bytes = text.as_bytes();
    for (start, &b) in bytes.iter().enumerate() {
        if b != b'{' {
            continue;
        }
        if let Some(end) = balanced_span_end(bytes, start)
            && let Ok(value) = serde_json::from_str::<Value>(&text[start..=end])
            && value.is_object()
        {
            return value;
        }
    }
    json!({ "content": text })
}

/// Find the index of the `}` closing the object opened at `start`.
///
/// Tracks string literals and escapes so braces inside strings do not
/// affect the depth count. Returns `None` for unbalanced input.
fn balanced_span_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
