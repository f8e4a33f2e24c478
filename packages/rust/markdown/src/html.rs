//! Small HTML helpers used when rendering review pages.
//!
//! The review body is deliberately limited markdown: blank-line separated
//! blocks, `## ` headings, and hard line breaks. Anything richer is left to
//! the Astro build.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static BLOCK_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid regex"));

/// Reduce an HTML fragment (e.g. an AniList description) to plain text.
///
/// `<br>` becomes a newline, every other tag is dropped, and entities are
/// decoded.
pub fn strip_html(text: &str) -> String {
    static BR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

    if text.trim().is_empty() {
        return String::new();
    }

    let with_breaks = BR_RE.replace_all(text, "\n");
    let fragment = Html::parse_fragment(&with_breaks);
    let plain: String = fragment.root_element().text().collect();

    plain.replace('\u{a0}', " ").trim().to_string()
}

/// Escape text for safe use inside element content or a quoted attribute.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap blank-line separated paragraphs in `<p>`, single newlines become `<br>`.
pub fn paragraphize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "<p></p>".to_string();
    }
    BLOCK_SPLIT_RE
        .split(trimmed)
        .map(|p| format!("<p>{}</p>", p.trim().replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the review body: `## ` blocks become `<h2>`, the rest paragraphs.
pub fn markdown_to_html(markdown: &str) -> String {
    if markdown.is_empty() {
        return "<p></p>".to_string();
    }
    BLOCK_SPLIT_RE
        .split(markdown)
        .map(|block| {
            let trimmed = block.trim();
            if trimmed.is_empty() {
                String::new()
            } else if let Some(heading) = trimmed.strip_prefix("## ") {
                format!("<h2>{}</h2>", heading.trim())
            } else {
                format!("<p>{}</p>", trimmed.replace('\n', "<br>"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a display list such as `Bones, MAPPA` or `Rock • Jazz | Funk`.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split([',', '•', '|'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// One `<span class=…>` per token, or a single fallback chip when empty.
pub fn chip_markup(tokens: &[String], class_name: &str, fallback: &str) -> String {
    let chip = |token: &str| format!("<span class=\"{class_name}\">{}</span>", escape_text(token));
    if tokens.is_empty() {
        return chip(fallback);
    }
    tokens
        .iter()
        .map(|t| chip(t))
        .collect::<Vec<_>>()
        .join("\n          ")
}
