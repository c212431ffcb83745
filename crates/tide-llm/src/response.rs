//! Post-processing of raw model text.

/// Unwrap a reply wrapped in a Markdown code fence (```` ```json ... ``` ````).
///
/// Text without a leading fence is returned trimmed. A missing closing fence
/// (truncated reply) keeps everything after the opening line. A fence on a
/// single line (```` ```json {"a":1}``` ````) keeps what follows the info string.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string (`json`, `JSON`, ...) up to the first newline, or
    // up to the payload when the whole fence sits on one line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => {
            let start = rest
                .find(|c: char| c == '{' || c == '[' || c.is_whitespace())
                .unwrap_or(rest.len());
            &rest[start..]
        }
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
