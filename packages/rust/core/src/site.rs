//! Site layout: where every artifact of a review lives relative to the root.
//!
//! ```text
//! <root>/
//! ├── anime/<slug>/{blog.md, cover.*, <slug>.html}
//! ├── album/<slug>/{blog.md, cover.*, <slug>.html}
//! ├── data/{anime.json, albums.json}
//! ├── templates/{anime.html, album.html}
//! └── index.html, anime/all-anime.html, album/all-album.html
//! ```

use std::path::{Path, PathBuf};

use uuid::Uuid;

use kawaii_shared::{AppConfig, InlineTarget, KawaiiError, Kind, Result};

const DATA_DIR: &str = "data";
const TEMPLATES_DIR: &str = "templates";
const BLOG_FILE: &str = "blog.md";

/// Resolves artifact paths for one site root.
#[derive(Debug, Clone)]
pub struct SitePaths {
    root: PathBuf,
    inline_targets: Vec<InlineTarget>,
}

impl SitePaths {
    pub fn new(root: impl Into<PathBuf>, config: &AppConfig) -> Self {
        Self {
            root: root.into(),
            inline_targets: config.inline_targets.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/anime` or `<root>/album`.
    pub fn content_dir(&self, kind: Kind) -> PathBuf {
        self.root.join(kind.content_dir())
    }

    pub fn entry_dir(&self, kind: Kind, slug: &str) -> PathBuf {
        self.content_dir(kind).join(slug)
    }

    pub fn blog_path(&self, kind: Kind, slug: &str) -> PathBuf {
        self.entry_dir(kind, slug).join(BLOG_FILE)
    }

    /// Built page: `<kind>/<slug>/<slug>.html`.
    pub fn page_path(&self, kind: Kind, slug: &str) -> PathBuf {
        self.entry_dir(kind, slug).join(format!("{slug}.html"))
    }

    /// Site-relative link stored in the index for a built page.
    pub fn page_link(&self, kind: Kind, slug: &str) -> String {
        format!("{}/{slug}/{slug}.html", kind.content_dir())
    }

    pub fn data_file(&self, kind: Kind) -> PathBuf {
        self.root.join(DATA_DIR).join(kind.data_file())
    }

    pub fn template_file(&self, kind: Kind) -> PathBuf {
        self.root.join(TEMPLATES_DIR).join(kind.template_file())
    }

    /// `(html file, script id)` pairs mirroring the index of `kind`.
    pub fn inline_targets(&self, kind: Kind) -> Vec<(PathBuf, &str)> {
        self.inline_targets
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| (self.root.join(&t.file), t.id.as_str()))
            .collect()
    }

    /// `path` relative to the root with `/` separators, for messages and
    /// index rows. Paths outside the root are shown as-is.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Names of the entry directories of `kind`, sorted. A missing content
    /// directory has no entries.
    pub fn list_slugs(&self, kind: Kind) -> Result<Vec<String>> {
        let dir = self.content_dir(kind);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(KawaiiError::io(&dir, e)),
        };

        let mut slugs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| KawaiiError::io(&dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| KawaiiError::io(entry.path(), e))?
                .is_dir();
            if is_dir {
                slugs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        slugs.sort();
        Ok(slugs)
    }
}

/// Write `content` to `path` via a sibling temp file and a rename, creating
/// parent directories as needed.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| KawaiiError::validation(format!("no parent for {}", path.display())))?;
    std::fs::create_dir_all(parent).map_err(|e| KawaiiError::io(parent, e))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{name}.{}.tmp", Uuid::now_v7()));

    if let Err(e) = write_and_rename(&temp, path, content) {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }
    tracing::debug!(path = %path.display(), size = content.len(), "wrote file");
    Ok(())
}

/// The temp file may be left partially written on error; the caller removes it.
fn write_and_rename(temp: &Path, path: &Path, content: &[u8]) -> Result<()> {
    std::fs::write(temp, content).map_err(|e| KawaiiError::io(temp, e))?;
    std::fs::rename(temp, path).map_err(|e| KawaiiError::io(path, e))
}
