//! The JSON review indexes (`data/anime.json`, `data/albums.json`) and the
//! inline `<script>` copies of them embedded in the site's HTML pages.
//!
//! The JSON file is written first, then each inline copy. There is no
//! atomicity across files; each individual file is replaced via rename.

use chrono::{DateTime, FixedOffset};
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use kawaii_shared::{IndexEntry, KawaiiError, Kind, Result};

use crate::site::{SitePaths, write_atomic};

/// Read the index rows for `kind`.
///
/// Rows are kept as raw JSON so hand-edited rows survive a rewrite whatever
/// their shape. A missing file, invalid JSON, or a top level that is not an
/// array is an empty index.
pub fn load(site: &SitePaths, kind: Kind) -> Vec<Value> {
    let path = site.data_file(kind);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "index not readable, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(Value::Array(rows)) => rows,
        Ok(_) => {
            warn!(path = %path.display(), "index is not a JSON array, starting empty");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "index is not valid JSON, starting empty");
            Vec::new()
        }
    }
}

/// The `slug` of a row, when it has a string one.
pub fn row_slug(row: &Value) -> Option<&str> {
    row.get("slug").and_then(Value::as_str)
}

/// Insert or replace the row for `entry.slug`, keep rows ordered by
/// `created`, and rewrite the index and its inline copies.
#[instrument(skip_all, fields(kind = %kind, slug = %entry.slug))]
pub fn upsert(site: &SitePaths, kind: Kind, entry: IndexEntry) -> Result<()> {
    let row = serde_json::to_value(&entry)
        .map_err(|e| KawaiiError::parse(format!("failed to serialize index row: {e}")))?;
    let mut rows = load(site, kind);
    rows.retain(|r| row_slug(r) != Some(entry.slug.as_str()));
    rows.push(row);
    sort_by_created(&mut rows);
    save(site, kind, &rows)?;
    info!(count = rows.len(), "index updated");
    Ok(())
}

/// Point the row for `slug` at its built page. Returns `false` (and writes
/// nothing) when there is no such row.
#[instrument(skip_all, fields(kind = %kind, slug, link))]
pub fn set_link(site: &SitePaths, kind: Kind, slug: &str, link: &str) -> Result<bool> {
    let mut rows = load(site, kind);
    let Some(Value::Object(row)) = rows.iter_mut().find(|r| row_slug(r) == Some(slug)) else {
        debug!("no index row to link");
        return Ok(false);
    };
    row.insert("link".to_string(), Value::String(link.to_string()));
    save(site, kind, &rows)?;
    Ok(true)
}

/// Drop the row for `slug`. Returns whether a row was removed; the files are
/// only rewritten when one was.
#[instrument(skip_all, fields(kind = %kind, slug))]
pub fn remove(site: &SitePaths, kind: Kind, slug: &str) -> Result<bool> {
    let mut rows = load(site, kind);
    let before = rows.len();
    rows.retain(|r| row_slug(r) != Some(slug));
    if rows.len() == before {
        return Ok(false);
    }
    save(site, kind, &rows)?;
    Ok(true)
}

/// Index rendering: two-space indented JSON with a trailing newline.
pub fn to_json_text(rows: &[Value]) -> Result<String> {
    let json = serde_json::to_string_pretty(rows)
        .map_err(|e| KawaiiError::parse(format!("failed to serialize index: {e}")))?;
    Ok(format!("{json}\n"))
}

/// Replace the body of each inline `<script id=…>` block for `kind` with
/// `json_text`. Missing files or blocks are skipped. Returns how many files
/// were rewritten.
#[instrument(skip_all, fields(kind = %kind))]
pub fn sync_inline(site: &SitePaths, kind: Kind, json_text: &str) -> usize {
    let mut updated = 0;
    for (file, id) in site.inline_targets(kind) {
        let html = match std::fs::read_to_string(&file) {
            Ok(html) => html,
            Err(e) => {
                debug!(file = %file.display(), error = %e, "inline target not readable, skipping");
                continue;
            }
        };
        let Some(replaced) = replace_script_block(&html, id, json_text) else {
            debug!(file = %file.display(), id, "script block not found, skipping");
            continue;
        };
        if replaced == html {
            continue;
        }
        match write_atomic(&file, replaced.as_bytes()) {
            Ok(()) => updated += 1,
            Err(e) => warn!(file = %file.display(), error = %e, "failed to update inline data"),
        }
    }
    updated
}

/// Swap the contents of the first `<script id="{id}" …>` element, keeping
/// the opening and closing tags and everything around them.
fn replace_script_block(html: &str, id: &str, json_text: &str) -> Option<String> {
    let pattern = format!(
        r#"(<script id="{}"[^>]*>)([\s\S]*?)(</script>)"#,
        regex::escape(id)
    );
    let re = Regex::new(&pattern).ok()?;
    if !re.is_match(html) {
        return None;
    }
    let body = json_text.trim();
    Some(
        re.replacen(html, 1, |caps: &Captures| {
            format!("{}\n{body}\n  {}", &caps[1], &caps[3])
        })
        .into_owned(),
    )
}

fn save(site: &SitePaths, kind: Kind, rows: &[Value]) -> Result<()> {
    let json_text = to_json_text(rows)?;
    write_atomic(&site.data_file(kind), json_text.as_bytes())?;
    sync_inline(site, kind, &json_text);
    Ok(())
}

/// Stable sort by creation time. Rows without a parseable `created` sort
/// first, in their existing order.
fn sort_by_created(rows: &mut [Value]) {
    rows.sort_by_key(parse_created);
}

fn parse_created(row: &Value) -> Option<DateTime<FixedOffset>> {
    let created = row.get("created")?.as_str()?;
    DateTime::parse_from_rfc3339(created.trim()).ok()
}
