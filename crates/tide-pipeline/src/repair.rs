//! Structural repair of truncated JSON from the synthesizer.
//!
//! Applied only after a direct parse has failed. The text is cut after its
//! last `}` (or, when there is none, after the last complete token), then the
//! still-open arrays and objects are closed innermost first. When that last
//! `}` turns out to sit inside an unterminated string, the cut falls back to
//! the last `}` outside any string. The result may silently lose a trailing
//! partial element; callers treat it as best effort.

use serde_json::Value;

/// Best-effort repair of `raw`. Returns the candidate text; it may still fail
/// to parse.
#[must_use]
pub fn repair_json(raw: &str) -> String {
    let text = raw.find('{').map_or(raw, |open| &raw[open..]);
    let cut = text.rfind('}').map_or(text, |close| &text[..=close]);

    let state = scan(cut);
    let Some(string_start) = state.open_string_at else {
        return close_open(cut);
    };
    // Drop the unterminated string literal.
    let repaired = close_open(&cut[..string_start]);
    if serde_json::from_str::<Value>(&repaired).is_ok() {
        return repaired;
    }
    match state.last_close {
        Some(close) => close_open(&cut[..=close]),
        None => repaired,
    }
}

/// Trim a dangling separator from `cut` and close whatever it left open.
fn close_open(cut: &str) -> String {
    let trimmed = cut.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == ':');
    let state = scan(trimmed);

    let mut repaired = String::with_capacity(trimmed.len() + state.open.len());
    repaired.push_str(trimmed);
    for opener in state.open.iter().rev() {
        repaired.push(if *opener == b'[' { ']' } else { '}' });
    }
    repaired
}

struct Scan {
    /// Unclosed `{` / `[` in nesting order.
    open: Vec<u8>,
    /// Byte offset of an unterminated string literal's opening quote.
    open_string_at: Option<usize>,
    /// Byte offset of the last `}` outside string literals.
    last_close: Option<usize>,
}

/// Track bracket nesting outside string literals.
fn scan(text: &str) -> Scan {
    let mut open = Vec::new();
    let mut string_start = None;
    let mut last_close = None;
    let mut escaped = false;

    for (idx, byte) in text.bytes().enumerate() {
        if string_start.is_some() {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => string_start = None,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => string_start = Some(idx),
            b'{' | b'[' => open.push(byte),
            b'}' | b']' => {
                if byte == b'}' {
                    last_close = Some(idx);
                }
                open.pop();
            }
            _ => {}
        }
    }

    Scan {
        open,
        open_string_at: string_start,
        last_close,
    }
}
