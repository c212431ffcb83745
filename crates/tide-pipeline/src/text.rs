//! Document text handling: HTML flattening, snippets, content caps.

use tide_core::entities::Document;

/// Characters kept in an Insight snippet before the ellipsis.
pub const SNIPPET_CHARS: usize = 200;

/// Elements whose content is never visible text.
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

const ENTITIES: [(&str, &str); 7] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Flatten HTML to whitespace-collapsed text.
///
/// Tags are replaced by a space, `<script>`/`<style>` bodies are dropped, and
/// a handful of common entities are decoded. This is a scanner, not a parser:
/// unterminated tags swallow the rest of the input.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    // ASCII lowercasing keeps byte offsets identical to `html`.
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(offset) = lower[pos..].find('<') {
        let tag_start = pos + offset;
        out.push_str(&html[pos..tag_start]);
        out.push(' ');

        let body_end = RAW_TEXT_TAGS
            .iter()
            .find(|name| lower[tag_start + 1..].starts_with(*name))
            .map_or(tag_start, |name| {
                lower[tag_start..]
                    .find(&format!("</{name}"))
                    .map_or(html.len(), |close| tag_start + close)
            });
        pos = lower[body_end..]
            .find('>')
            .map_or(html.len(), |close| body_end + close + 1);
    }
    out.push_str(&html[pos..]);

    let mut decoded = out;
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }
    collapse_whitespace(&decoded)
}

#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The readable body of a document: plain text when present, else flattened HTML.
#[must_use]
pub fn document_body(document: &Document) -> String {
    match (document.text.as_deref(), document.html.as_deref()) {
        (Some(text), _) if !text.trim().is_empty() => text.trim().to_string(),
        (_, Some(html)) => html_to_text(html),
        _ => String::new(),
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}

/// A short single-line preview of `body`, ending in `…` when cut.
#[must_use]
pub fn snippet(body: &str) -> String {
    let collapsed = collapse_whitespace(body);
    let cut = truncate_chars(&collapsed, SNIPPET_CHARS);
    if cut.len() == collapsed.len() {
        collapsed
    } else {
        format!("{}…", cut.trim_end())
    }
}
