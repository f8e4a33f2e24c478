//! Review frontmatter: the `---` delimited metadata block at the top of `blog.md`.
//!
//! Values are written one per line as JSON literals, which keeps the block
//! valid YAML while letting the parser stay line-oriented.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::instrument;

use kawaii_shared::{KawaiiError, Kind, Result, Score, json_number};

/// Placeholder body written under a freshly scaffolded review.
pub const REVIEW_PLACEHOLDER: &str = "Write your review here...";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A parsed `blog.md`: ordered frontmatter fields plus the markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    fields: Vec<(String, Value)>,
    /// Markdown after the closing `---`, trimmed.
    pub body: String,
}

impl Frontmatter {
    /// Raw value for `key` (last occurrence wins, as with a map).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Value of the first key in `keys` that is present and not `null`.
    pub fn first_present(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .find_map(|k| self.get(k).filter(|v| !v.is_null()))
    }

    /// String form of a field. Numbers and booleans are stringified;
    /// `null`, missing, and empty strings are `None`.
    pub fn str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Numeric form of a field; numeric strings are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        value_as_number(self.get(key)?)
    }

    /// The `score` field. Text scores keep the author's wording; `null`
    /// and blank strings mean unscored.
    pub fn score(&self) -> Option<Score> {
        match self.get("score")? {
            Value::Number(n) => n.as_f64().map(Score::Number),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(Score::Text(s.clone())),
            Value::Null => None,
            other => Some(Score::Text(other.to_string())),
        }
    }
}

/// Strict numeric reading of a JSON value: numbers, or strings that are
/// entirely a number.
pub fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Split a review file into frontmatter fields and body.
///
/// The file must open with a `---` line and close the block with another
/// `---` line. Each `key: value` line is decoded as JSON when possible,
/// single-quoted strings are unquoted, and anything else is kept verbatim.
#[instrument(skip_all, fields(len = markdown.len()))]
pub fn parse(markdown: &str) -> Result<Frontmatter> {
    static BLOCK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)\A---\n(.*?)\n---\n?(.*)\z").expect("valid regex"));

    let normalized = markdown.replace("\r\n", "\n");
    let caps = BLOCK_RE
        .captures(&normalized)
        .ok_or_else(|| KawaiiError::parse("missing frontmatter block"))?;

    let fields = caps[1]
        .lines()
        .filter_map(|line| {
            let (key, raw) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), parse_value(raw)))
        })
        .collect();

    Ok(Frontmatter {
        fields,
        body: caps[2].trim().to_string(),
    })
}

fn parse_value(raw: &str) -> Value {
    let value = raw.trim();
    if value.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(value) {
        return parsed;
    }
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return Value::String(value[1..value.len() - 1].replace("''", "'"));
    }
    Value::String(value.to_string())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Everything written into a new review's frontmatter.
#[derive(Debug, Clone)]
pub struct ReviewFrontmatter<'a> {
    pub kind: Kind,
    pub title: &'a str,
    pub owner: &'a str,
    pub year: Option<i32>,
    pub genres: &'a str,
    /// Cover file name next to `blog.md` (e.g. `cover.jpg`).
    pub cover: &'a str,
    pub source_url: &'a str,
    /// RFC 3339 timestamp with milliseconds.
    pub created: &'a str,
    pub synopsis: &'a str,
    pub seasons: Option<u32>,
    pub episodes: Option<u32>,
    pub length_minutes: Option<f64>,
    pub runtime: &'a str,
    pub score: Option<&'a Score>,
    pub runtime_detail: &'a str,
}

/// Render a complete `blog.md` scaffold: frontmatter plus a review stub.
pub fn render_review(fm: &ReviewFrontmatter<'_>) -> String {
    let empty = || Value::String(String::new());
    let year = fm.year.map(|y| y.to_string()).unwrap_or_default();

    let mut lines = vec![
        "---".to_string(),
        format!("title: {}", json_str(fm.title)),
        format!("{}: {}", fm.kind.owner_key(), json_str(fm.owner)),
        format!("year: {year}"),
        format!("genres: {}", json_str(fm.genres)),
        format!("cover: {}", json_str(fm.cover)),
        format!("source_url: {}", json_str(fm.source_url)),
        format!("created: {}", json_str(fm.created)),
        format!("type: {}", json_str(fm.kind.as_str())),
        format!("synopsis: {}", json_str(fm.synopsis)),
    ];

    match fm.kind {
        Kind::Album => {
            let minutes = fm.length_minutes.map(json_number).unwrap_or_else(empty);
            lines.push(format!("length_minutes: {minutes}"));
        }
        Kind::Anime => {
            let seasons = fm.seasons.map(Value::from).unwrap_or_else(empty);
            let episodes = fm.episodes.map(Value::from).unwrap_or_else(empty);
            lines.push(format!("seasons: {seasons}"));
            lines.push(format!("episodes: {episodes}"));
        }
    }

    let score = fm.score.map(Score::to_json).unwrap_or(Value::Null);
    lines.extend([
        format!("runtime: {}", json_str(fm.runtime)),
        format!("score: {score}"),
        format!("runtime_detail: {}", json_str(fm.runtime_detail)),
        "---".to_string(),
        String::new(),
        "## Review".to_string(),
        String::new(),
        REVIEW_PLACEHOLDER.to_string(),
        String::new(),
    ]);

    lines.join("\n")
}

fn json_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
