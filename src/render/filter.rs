//! Content filters applied to backend HTML before display.
//!
//! The model behind the analysis endpoints occasionally decorates its answer:
//!
//! - Wrapping the HTML in ` ```html ... ``` ` fences
//! - Zero-width characters copied from the source document
//! - Placeholder headings such as "Translation of PDF" that label the output
//!   rather than belong to it
//!
//! [`clean_html`] removes the first two for every tool. Placeholders are
//! tool-specific and handled by [`strip_placeholders`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Undo cosmetic artefacts of the generating model.
///
/// Rules, in order:
/// 1. Strip outer code fences
/// 2. Normalise line endings
/// 3. Remove invisible Unicode characters
pub fn clean_html(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = normalise_line_endings(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:html|HTML)?\n(.*)\n```\s*$").unwrap());

pub fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Placeholder headings ─────────────────────────────────────────────────────

// The regex crate has no backreferences, so the closing tag is captured
// separately and compared in the replacer.
static RE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(h[1-6]|p)\b[^>]*>(.*?)</(h[1-6]|p)\s*>\s*").unwrap()
});
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Remove every heading or paragraph whose text is exactly one of
/// `placeholders`, ignoring case, surrounding whitespace and inline markup.
pub fn strip_placeholders(html: &str, placeholders: &[&str]) -> String {
    if placeholders.is_empty() {
        return html.to_string();
    }
    let wanted: Vec<String> = placeholders.iter().map(|p| fold(p)).collect();

    RE_BLOCK
        .replace_all(html, |caps: &Captures| {
            let whole = caps[0].to_string();
            if !caps[1].eq_ignore_ascii_case(&caps[3]) {
                return whole;
            }
            let text = fold(&RE_TAG.replace_all(&caps[2], ""));
            if wanted.contains(&text) {
                String::new()
            } else {
                whole
            }
        })
        .into_owned()
}

fn fold(s: &str) -> String {
    RE_WS.replace_all(s.trim(), " ").to_lowercase()
}
