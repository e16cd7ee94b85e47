//! Allow-list HTML sanitiser.
//!
//! Backend HTML is parsed as a fragment and re-serialised element by
//! element. Only allow-listed tags and attributes are written back; anything
//! else is either unwrapped (its children are kept) or, for active content
//! such as `<script>`, dropped together with everything inside it. Nothing is
//! trusted: demo content goes through the same path.

use scraper::{ElementRef, Html};

/// How much markup survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SanitizePolicy {
    /// Structure, emphasis, links and limited inline styling.
    #[default]
    Standard,
    /// As `Standard` but links are unwrapped and `style`/`class` dropped.
    Strict,
}

const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "div", "span", "section", "article",
    "header", "footer", "blockquote", "pre", "code", "ul", "ol", "li", "dl", "dt", "dd", "table",
    "caption", "thead", "tbody", "tfoot", "tr", "th", "td", "colgroup", "col", "strong", "b", "em",
    "i", "u", "s", "small", "sub", "sup", "mark", "abbr", "a",
];

/// Removed along with their content.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "noscript",
    "template", "svg", "math", "form", "input", "button", "textarea", "select", "option", "head",
    "title", "meta", "link", "base",
];

const VOID_TAGS: &[&str] = &["br", "hr", "col"];

const SAFE_STYLE_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "font-weight",
    "font-style",
    "font-size",
    "text-align",
    "text-decoration",
    "vertical-align",
    "margin-left",
    "padding",
    "padding-left",
    "border",
    "border-collapse",
    "width",
];

/// Sanitise `html` under `policy`.
pub fn sanitize(html: &str, policy: SanitizePolicy) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), policy, &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, policy: SanitizePolicy, out: &mut String) {
    for child in parent.children() {
        if let Some(text) = child.value().as_text() {
            push_escaped(out, text, false);
        } else if let Some(el) = ElementRef::wrap(child) {
            write_element(el, policy, out);
        }
        // comments, doctypes and processing instructions are dropped
    }
}

fn write_element(el: ElementRef<'_>, policy: SanitizePolicy, out: &mut String) {
    let name = el.value().name();

    if DROPPED_TAGS.contains(&name) {
        return;
    }
    let unwrap = !ALLOWED_TAGS.contains(&name) || (name == "a" && policy == SanitizePolicy::Strict);
    if unwrap {
        write_children(el, policy, out);
        return;
    }

    out.push('<');
    out.push_str(name);
    let mut has_href = false;
    for (attr, value) in el.value().attrs() {
        if let Some(clean) = clean_attribute(name, attr, value, policy) {
            has_href |= attr == "href";
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            push_escaped(out, &clean, true);
            out.push('"');
        }
    }
    if has_href {
        out.push_str(" rel=\"noopener noreferrer\"");
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }
    write_children(el, policy, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn clean_attribute(tag: &str, attr: &str, value: &str, policy: SanitizePolicy) -> Option<String> {
    match attr {
        "colspan" | "rowspan" if matches!(tag, "td" | "th") => {
            value.trim().parse::<u16>().ok().map(|n| n.to_string())
        }
        "align" if matches!(tag, "td" | "th" | "p" | "div") => {
            let v = value.trim().to_ascii_lowercase();
            matches!(v.as_str(), "left" | "right" | "center" | "justify").then_some(v)
        }
        "href" if tag == "a" => safe_href(value),
        "title" => Some(value.to_string()),
        "class" if policy == SanitizePolicy::Standard => Some(value.to_string()),
        "style" if policy == SanitizePolicy::Standard => clean_style(value),
        _ => None,
    }
}

fn safe_href(value: &str) -> Option<String> {
    let v = value.trim();
    let lower = v.to_ascii_lowercase();
    let ok = lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("mailto:")
        || lower.starts_with('#');
    ok.then(|| v.to_string())
}

/// Keep only declarations of safe properties with inert values.
fn clean_style(value: &str) -> Option<String> {
    let kept: Vec<String> = value
        .split(';')
        .filter_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let val = val.trim();
            let lower = val.to_ascii_lowercase();
            let inert = !val.is_empty()
                && !["url(", "expression", "javascript:", "@import", "<", "\\"]
                    .iter()
                    .any(|bad| lower.contains(bad));
            (SAFE_STYLE_PROPERTIES.contains(&prop.as_str()) && inert)
                .then(|| format!("{prop}: {val}"))
        })
        .collect();
    (!kept.is_empty()).then(|| kept.join("; "))
}

fn push_escaped(out: &mut String, s: &str, attribute: bool) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
