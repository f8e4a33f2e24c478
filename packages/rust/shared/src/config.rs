//! Application configuration for KawaiiReview.
//!
//! A site may carry its own `kawaii.toml` at the site root; otherwise the
//! user-level `~/.kawaii/kawaii.toml` is used. CLI flags override config
//! file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KawaiiError, Result};
use crate::types::Kind;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "kawaii.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".kawaii";

// ---------------------------------------------------------------------------
// Config structs (matching kawaii.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Metadata API base URLs.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// HTML files carrying an inline copy of a JSON index.
    #[serde(default = "default_inline_targets")]
    pub inline_targets: Vec<InlineTarget>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            endpoints: EndpointsConfig::default(),
            inline_targets: default_inline_targets(),
        }
    }
}

impl AppConfig {
    /// Inline targets that mirror the index of `kind`.
    pub fn inline_targets_for(&self, kind: Kind) -> impl Iterator<Item = &InlineTarget> {
        self.inline_targets.iter().filter(move |t| t.kind == kind)
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// User-Agent sent to every metadata API.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of candidates offered in the chooser.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            candidate_limit: default_candidate_limit(),
        }
    }
}

fn default_user_agent() -> String {
    "KawaiiReviewCLI/1.0 (kawaiireview.local)".into()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_candidate_limit() -> usize {
    5
}

/// `[endpoints]` section. Overridable so a mirror or a mock server can stand in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_anilist")]
    pub anilist: String,
    #[serde(default = "default_jikan")]
    pub jikan: String,
    #[serde(default = "default_musicbrainz")]
    pub musicbrainz: String,
    #[serde(default = "default_cover_art")]
    pub cover_art: String,
    #[serde(default = "default_theaudiodb")]
    pub theaudiodb: String,
    #[serde(default = "default_itunes")]
    pub itunes: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            anilist: default_anilist(),
            jikan: default_jikan(),
            musicbrainz: default_musicbrainz(),
            cover_art: default_cover_art(),
            theaudiodb: default_theaudiodb(),
            itunes: default_itunes(),
        }
    }
}

impl EndpointsConfig {
    /// Point every endpoint at one base URL (used by tests with a mock server).
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            anilist: format!("{base}/anilist"),
            jikan: format!("{base}/jikan/v4"),
            musicbrainz: format!("{base}/musicbrainz/ws/2"),
            cover_art: format!("{base}/coverart"),
            theaudiodb: format!("{base}/theaudiodb/api/v1/json/2"),
            itunes: format!("{base}/itunes"),
        }
    }
}

fn default_anilist() -> String {
    "https://graphql.anilist.co".into()
}
fn default_jikan() -> String {
    "https://api.jikan.moe/v4".into()
}
fn default_musicbrainz() -> String {
    "https://musicbrainz.org/ws/2".into()
}
fn default_cover_art() -> String {
    "https://coverartarchive.org".into()
}
fn default_theaudiodb() -> String {
    "https://theaudiodb.com/api/v1/json/2".into()
}
fn default_itunes() -> String {
    "https://itunes.apple.com".into()
}

/// `[[inline_targets]]` entry: one `<script id=…>` block inside an HTML page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineTarget {
    /// Which index this block mirrors.
    pub kind: Kind,
    /// HTML file path, relative to the site root.
    pub file: String,
    /// `id` attribute of the `<script>` element.
    pub id: String,
}

fn default_inline_targets() -> Vec<InlineTarget> {
    let target = |kind, file: &str, id: &str| InlineTarget {
        kind,
        file: file.into(),
        id: id.into(),
    };
    vec![
        target(Kind::Anime, "index.html", "anime-data-inline"),
        target(Kind::Anime, "anime/all-anime.html", "anime-archive-data"),
        target(Kind::Album, "index.html", "album-data-inline"),
        target(Kind::Album, "album/all-album.html", "album-archive-data"),
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.kawaii/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| KawaiiError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.kawaii/kawaii.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve which config file applies to `site_root`, if any.
pub fn resolve_config_path(site_root: &Path) -> Option<PathBuf> {
    let site_config = site_root.join(CONFIG_FILE_NAME);
    if site_config.is_file() {
        return Some(site_config);
    }
    config_file_path().ok().filter(|p| p.is_file())
}

/// Load the config for `site_root`. Returns defaults if no file exists.
pub fn load_config(site_root: &Path) -> Result<AppConfig> {
    match resolve_config_path(site_root) {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!(root = %site_root.display(), "config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| KawaiiError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| KawaiiError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default `kawaii.toml` at the site root.
/// Returns the path to the created file.
pub fn init_config(site_root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(site_root).map_err(|e| KawaiiError::io(site_root, e))?;

    let path = site_root.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(KawaiiError::Conflict(format!(
            "config already exists at {}",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| KawaiiError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KawaiiError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kawaii-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("user_agent"));
        assert!(toml_str.contains("graphql.anilist.co"));
        assert!(toml_str.contains("anime-data-inline"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.candidate_limit, 5);
        assert_eq!(parsed.inline_targets.len(), 4);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
timeout_secs = 5

[endpoints]
jikan = "http://localhost:9000/v4"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.timeout_secs, 5);
        assert_eq!(config.defaults.candidate_limit, 5);
        assert_eq!(config.endpoints.jikan, "http://localhost:9000/v4");
        assert_eq!(config.endpoints.itunes, "https://itunes.apple.com");
        assert_eq!(config.inline_targets.len(), 4);
    }

    #[test]
    fn custom_inline_targets_replace_defaults() {
        let toml_str = r#"
[[inline_targets]]
kind = "album"
file = "music.html"
id = "albums"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.inline_targets_for(Kind::Album).count(), 1);
        assert_eq!(config.inline_targets_for(Kind::Anime).count(), 0);
    }

    #[test]
    fn site_config_is_preferred() {
        let root = temp_dir();
        std::fs::write(root.join(CONFIG_FILE_NAME), "[defaults]\ncandidate_limit = 3\n").unwrap();
        let config = load_config(&root).expect("load");
        assert_eq!(config.defaults.candidate_limit, 3);
    }

    #[test]
    fn init_refuses_to_clobber() {
        let root = temp_dir();
        let path = init_config(&root).expect("init");
        assert!(path.exists());
        assert!(matches!(init_config(&root), Err(KawaiiError::Conflict(_))));
    }
}
