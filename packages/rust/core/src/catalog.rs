//! `list` and `delete`: what reviews exist on disk, and removing one.

use std::fmt;
use std::path::PathBuf;

use tracing::{info, instrument, warn};

use kawaii_markdown::{Frontmatter, parse_frontmatter};
use kawaii_shared::{KawaiiError, Kind, Result, Scope, to_fixed};

use crate::index;
use crate::site::SitePaths;

/// One review as shown by `list`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub slug: String,
    /// Frontmatter title, or the slug when there is none.
    pub title: String,
    pub score: Option<f64>,
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.slug)?;
        if let Some(score) = self.score {
            write!(f, " • Score {}", to_fixed(score, 1))?;
        }
        Ok(())
    }
}

/// All reviews of one kind, sorted by title ignoring case.
#[derive(Debug, Clone)]
pub struct CatalogSection {
    pub kind: Kind,
    pub entries: Vec<CatalogEntry>,
}

#[instrument(skip_all, fields(?scope))]
pub fn list(site: &SitePaths, scope: Scope) -> Result<Vec<CatalogSection>> {
    scope
        .kinds()
        .into_iter()
        .map(|kind| {
            let mut entries: Vec<CatalogEntry> = site
                .list_slugs(kind)?
                .into_iter()
                .map(|slug| {
                    let fm = read_frontmatter(site, kind, &slug);
                    CatalogEntry {
                        title: fm
                            .as_ref()
                            .and_then(|fm| fm.str("title"))
                            .unwrap_or_else(|| slug.clone()),
                        score: fm.as_ref().and_then(|fm| fm.number("score")),
                        slug,
                    }
                })
                .collect();
            entries.sort_by_cached_key(|e| e.title.to_lowercase());
            Ok(CatalogSection { kind, entries })
        })
        .collect()
}

/// A review located for deletion, before the operator confirms.
#[derive(Debug, Clone)]
pub struct DeleteTarget {
    pub kind: Kind,
    pub slug: String,
    pub title: String,
    pub folder: PathBuf,
}

/// What `delete` removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    /// Whether the index held a row for the review.
    pub index_row_removed: bool,
}

/// Find the review folder for `slug`.
pub fn find(site: &SitePaths, kind: Kind, slug: &str) -> Result<DeleteTarget> {
    if slug.is_empty() || slug == "." || slug == ".." || slug.contains(['/', '\\']) {
        return Err(KawaiiError::validation(format!("invalid slug '{slug}'")));
    }
    let folder = site.entry_dir(kind, slug);
    if !folder.is_dir() {
        return Err(KawaiiError::NotFound(format!(
            "No {kind} review found for slug \"{slug}\"."
        )));
    }
    let title = read_frontmatter(site, kind, slug)
        .and_then(|fm| fm.str("title"))
        .unwrap_or_else(|| slug.to_string());
    Ok(DeleteTarget {
        kind,
        slug: slug.to_string(),
        title,
        folder,
    })
}

/// Remove the review folder and its index row.
#[instrument(skip_all, fields(kind = %target.kind, slug = %target.slug))]
pub fn delete(site: &SitePaths, target: &DeleteTarget) -> Result<DeleteReport> {
    std::fs::remove_dir_all(&target.folder).map_err(|e| KawaiiError::io(&target.folder, e))?;
    let index_row_removed = index::remove(site, target.kind, &target.slug)?;
    if index_row_removed {
        info!("review deleted");
    } else {
        warn!("review deleted, but it had no index row");
    }
    Ok(DeleteReport { index_row_removed })
}

fn read_frontmatter(site: &SitePaths, kind: Kind, slug: &str) -> Option<Frontmatter> {
    let markdown = std::fs::read_to_string(site.blog_path(kind, slug)).ok()?;
    parse_frontmatter(&markdown).ok()
}
