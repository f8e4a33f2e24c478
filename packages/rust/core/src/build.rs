//! Page rendering: `blog.md` + per-kind template → `<slug>.html`.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use kawaii_markdown::{
    Frontmatter, apply_template, chip_markup, escape_text, markdown_to_html, paragraphize,
    parse_frontmatter, split_list, try_slugify, value_as_number,
};
use kawaii_shared::{
    KawaiiError, Kind, Result, Scope, Score, format_album_runtime, format_anime_runtime,
    to_fixed,
};

use crate::index;
use crate::site::{SitePaths, write_atomic};

const DEFAULT_COVER: &str = "cover.jpg";

/// Whether a build changed the page on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    /// The rendered page matched the existing file byte for byte.
    Unchanged,
}

/// Result of building one entry.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub kind: Kind,
    pub slug: String,
    pub output: PathBuf,
    pub outcome: BuildOutcome,
    /// Whether the index had a row to link to the page.
    pub linked: bool,
}

/// Render `<kind>/<slug>/blog.md` into `<kind>/<slug>/<slug>.html` and
/// link the page from the index.
#[instrument(skip_all, fields(kind = %kind, slug = slug_arg))]
pub fn build_entry(site: &SitePaths, kind: Kind, slug_arg: &str) -> Result<BuildReport> {
    let slug = try_slugify(slug_arg)
        .ok_or_else(|| KawaiiError::validation(format!("invalid slug '{slug_arg}'")))?;
    let blog_path = site.blog_path(kind, &slug);
    let markdown = match std::fs::read_to_string(&blog_path) {
        Ok(markdown) => markdown,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KawaiiError::NotFound(format!(
                "Could not find blog.md at {}",
                site.relative(&blog_path)
            )));
        }
        Err(e) => return Err(KawaiiError::io(&blog_path, e)),
    };
    let fm = parse_frontmatter(&markdown)?;

    let template_path = site.template_file(kind);
    let template = match std::fs::read_to_string(&template_path) {
        Ok(template) => template,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KawaiiError::NotFound(format!(
                "Could not find template at {}",
                site.relative(&template_path)
            )));
        }
        Err(e) => return Err(KawaiiError::io(&template_path, e)),
    };

    let html = render_page(kind, &template, &fm, slug_arg);
    let output = site.page_path(kind, &slug);
    let outcome = if digest_of_file(&output).is_some_and(|d| d == digest(html.as_bytes())) {
        debug!(output = %output.display(), "page unchanged");
        BuildOutcome::Unchanged
    } else {
        write_atomic(&output, html.as_bytes())?;
        BuildOutcome::Built
    };

    let linked = index::set_link(site, kind, &slug, &site.page_link(kind, &slug))?;
    info!(?outcome, linked, "page built");

    Ok(BuildReport {
        kind,
        slug,
        output,
        outcome,
        linked,
    })
}

/// Build every entry in `scope`, stopping at the first failure.
/// `on_start` is called before each entry.
pub fn build_all(
    site: &SitePaths,
    scope: Scope,
    mut on_start: impl FnMut(Kind, &str),
) -> Result<Vec<BuildReport>> {
    let mut targets = Vec::new();
    for kind in scope.kinds() {
        for slug in site.list_slugs(kind)? {
            targets.push((kind, slug));
        }
    }
    if targets.is_empty() {
        return Err(KawaiiError::NotFound(
            "No matching entries to build.".to_string(),
        ));
    }

    targets
        .iter()
        .map(|(kind, slug)| {
            on_start(*kind, slug);
            build_entry(site, *kind, slug)
        })
        .collect()
}

/// Fill the template for one entry. Pure: same inputs, same bytes.
pub fn render_page(kind: Kind, template: &str, fm: &Frontmatter, slug_arg: &str) -> String {
    let title = fm.str("title").unwrap_or_else(|| slug_arg.to_string());
    let cover = fm.str("cover").unwrap_or_else(|| DEFAULT_COVER.to_string());
    let eyebrow = fm.str("eyebrow").unwrap_or_else(|| kind.eyebrow().to_string());

    let owner = fm.str(kind.owner_key()).unwrap_or_default();
    let mut meta_chips = chip_markup(&split_list(&owner), "meta-chip", "Unknown");
    let runtime = runtime_display(kind, fm);
    if !runtime.is_empty() {
        meta_chips.push_str(&format!(
            "\n          <span class=\"meta-chip meta-chip-runtime\">{}</span>",
            escape_text(&runtime)
        ));
    }
    let genres = fm.str("genres").unwrap_or_default();
    let genre_chips = chip_markup(&split_list(&genres), "genre-chip", "Uncategorized");

    let score = ScoreDisplay::from_frontmatter(fm);

    let replacements = [
        ("title", escape_text(&title)),
        ("cover_class", kind.cover_class().to_string()),
        ("cover", escape_text(&cover)),
        ("eyebrow", escape_text(&eyebrow)),
        ("meta_label", kind.meta_label().to_string()),
        ("meta_chips", meta_chips),
        (
            "runtime_detail",
            escape_text(&fm.str("runtime_detail").unwrap_or_default()),
        ),
        ("genre_chips", genre_chips),
        ("score_ratio", score.ratio),
        ("score_text", escape_text(&score.text)),
        ("score_aria", escape_text(&score.aria)),
        ("synopsis", paragraphize(&fm.str("synopsis").unwrap_or_default())),
        ("review", markdown_to_html(&fm.body)),
        ("year", fm.str("year").unwrap_or_default()),
    ];
    apply_template(template, &replacements)
}

/// Runtime label, falling back to length or season/episode counts.
fn runtime_display(kind: Kind, fm: &Frontmatter) -> String {
    if let Some(runtime) = fm.str("runtime") {
        return runtime;
    }
    match kind {
        Kind::Album => fm
            .first_present(&["length_minutes", "minutes"])
            .and_then(value_as_number)
            .map(format_album_runtime)
            .unwrap_or_default(),
        Kind::Anime => {
            let count = |keys: &[&str]| {
                fm.first_present(keys)
                    .and_then(value_as_number)
                    .filter(|n| *n > 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
                    .map(|n| n as u32)
            };
            format_anime_runtime(
                count(&["seasons", "season_count", "season"]),
                count(&["episodes", "episode_count", "total_episodes"]),
            )
        }
    }
}

struct ScoreDisplay {
    text: String,
    ratio: String,
    aria: String,
}

impl ScoreDisplay {
    fn from_frontmatter(fm: &Frontmatter) -> Self {
        let score = fm.score();
        match score.as_ref().and_then(Score::as_number) {
            Some(score) => {
                let text = to_fixed(score, 1);
                Self {
                    ratio: to_fixed((score / 10.0).clamp(0.0, 1.0), 2),
                    aria: format!("Score {text} out of 10"),
                    text,
                }
            }
            None => Self {
                text: match score {
                    Some(Score::Text(text)) => text,
                    _ => "TBD".to_string(),
                },
                ratio: "0".to_string(),
                aria: "Unscored review".to_string(),
            },
        }
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn digest_of_file(path: &std::path::Path) -> Option<String> {
    std::fs::read(path).ok().map(|bytes| digest(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::tests::temp_site;
    use kawaii_shared::IndexEntry;

    const TEMPLATE: &str = r#"<title>{{ title }} · {{year}}</title>
<div class="{{cover_class}}"><img src="{{ cover }}"></div>
<p class="eyebrow">{{ eyebrow }}</p>
<dl><dt>{{ meta_label }}</dt><dd>
          {{ meta_chips }}</dd></dl>
<p>{{ runtime_detail }}</p>
<div>{{ genre_chips }}</div>
<meter value="{{ score_ratio }}" aria-label="{{ score_aria }}">{{ score_text }}</meter>
<section>{{ synopsis }}</section>
<article>{{ review }}</article>
{{ footer }}"#;

    const BLOG: &str = r#"---
title: "Cowboy Bebop"
studio: "Sunrise • Bones"
year: 1998
genres: "Action, Sci-Fi"
cover: "cover.png"
source_url: ""
created: "2024-01-01T00:00:00.000Z"
type: "anime"
synopsis: "Bounty hunters.\n\nIn space."
seasons: 1
episodes: 26
runtime: ""
score: 9.25
runtime_detail: "Aired Apr 1998 – Apr 1999"
---

## Review

See you, space cowboy.
Really."#;

    fn seed(site: &SitePaths, kind: Kind, slug: &str, blog: &str) {
        let dir = site.entry_dir(kind, slug);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("blog.md"), blog).unwrap();
        let tpl = site.template_file(kind);
        std::fs::create_dir_all(tpl.parent().unwrap()).unwrap();
        std::fs::write(tpl, TEMPLATE).unwrap();
    }

    #[test]
    fn renders_every_placeholder() {
        let fm = parse_frontmatter(BLOG).unwrap();
        let html = render_page(Kind::Anime, TEMPLATE, &fm, "cowboy-bebop");
        assert_eq!(
            html,
            r#"<title>Cowboy Bebop · 1998</title>
<div class="post-cover post-cover-anime"><img src="cover.png"></div>
<p class="eyebrow">Anime review</p>
<dl><dt>Studios</dt><dd>
          <span class="meta-chip">Sunrise</span>
          <span class="meta-chip">Bones</span>
          <span class="meta-chip meta-chip-runtime">1 Season × 26 Episodes</span></dd></dl>
<p>Aired Apr 1998 – Apr 1999</p>
<div><span class="genre-chip">Action</span>
          <span class="genre-chip">Sci-Fi</span></div>
<meter value="0.93" aria-label="Score 9.3 out of 10">9.3</meter>
<section><p>Bounty hunters.</p>
<p>In space.</p></section>
<article><h2>Review</h2>
<p>See you, space cowboy.<br>Really.</p></article>
{{ footer }}"#
        );
    }

    #[test]
    fn sparse_frontmatter_falls_back() {
        let fm = parse_frontmatter("---\nlength_minutes: 61.5\nscore: \"TBD-ish\"\n---\n").unwrap();
        let html = render_page(Kind::Album, TEMPLATE, &fm, "mystery");
        assert!(html.starts_with("<title>mystery · </title>"));
        assert!(html.contains(r#"<img src="cover.jpg">"#));
        assert!(html.contains("<dt>Artists</dt>"));
        assert!(html.contains(r#"<span class="meta-chip">Unknown</span>"#));
        assert!(html.contains("meta-chip-runtime\">1 hr 02 mins</span>"));
        assert!(html.contains(r#"<span class="genre-chip">Uncategorized</span>"#));
        assert!(html.contains(r#"<meter value="0" aria-label="Unscored review">TBD-ish</meter>"#));
        assert!(html.contains("<section><p></p></section>"));
        assert!(html.contains("<article><p></p></article>"));
    }

    #[test]
    fn text_is_escaped_but_review_is_not() {
        let fm = parse_frontmatter(
            "---\ntitle: \"Tom & Jerry <3\"\nartist: \"A <b>\"\n---\nHello <em>there</em>",
        )
        .unwrap();
        let html = render_page(Kind::Album, TEMPLATE, &fm, "x");
        assert!(html.contains("<title>Tom &amp; Jerry &lt;3 · </title>"));
        assert!(html.contains(r#"<span class="meta-chip">A &lt;b&gt;</span>"#));
        assert!(html.contains("<article><p>Hello <em>there</em></p></article>"));
        assert!(html.contains(r#"<meter value="0" aria-label="Unscored review">TBD</meter>"#));
    }

    #[test]
    fn score_rounding_follows_exact_decimal_value() {
        let fm = parse_frontmatter("---\nscore: 8.35\n---\n").unwrap();
        let html = render_page(Kind::Anime, TEMPLATE, &fm, "x");
        assert!(html.contains(r#"<meter value="0.83" aria-label="Score 8.3 out of 10">8.3</meter>"#));

        let fm = parse_frontmatter("---\nscore: \"8.25 / 10\"\n---\n").unwrap();
        let html = render_page(Kind::Anime, TEMPLATE, &fm, "x");
        assert!(html.contains(r#"<meter value="0.82" aria-label="Score 8.3 out of 10">8.3</meter>"#));
    }

    #[test]
    fn anime_runtime_from_alternate_keys() {
        let fm = parse_frontmatter("---\nseason_count: 2\ntotal_episodes: \"24\"\n---\n").unwrap();
        assert_eq!(runtime_display(Kind::Anime, &fm), "2 Seasons × 24 Episodes");
        let fm = parse_frontmatter("---\nseasons: null\nseason: 1\n---\n").unwrap();
        assert_eq!(runtime_display(Kind::Anime, &fm), "1 Season");
    }

    #[test]
    fn build_writes_page_links_index_and_is_idempotent() {
        let site = temp_site();
        seed(&site, Kind::Anime, "cowboy-bebop", BLOG);
        index::upsert(
            &site,
            Kind::Anime,
            IndexEntry::new(
                Kind::Anime,
                "cowboy-bebop",
                "Cowboy Bebop",
                Some(1998),
                "Sunrise",
                "anime/cowboy-bebop/cover.png",
                "2024-01-01T00:00:00.000Z",
            ),
        )
        .unwrap();

        let first = build_entry(&site, Kind::Anime, "Cowboy Bebop").unwrap();
        assert_eq!(first.slug, "cowboy-bebop");
        assert_eq!(first.outcome, BuildOutcome::Built);
        assert!(first.linked);
        let bytes = std::fs::read(&first.output).unwrap();

        let second = build_entry(&site, Kind::Anime, "cowboy-bebop").unwrap();
        assert_eq!(second.outcome, BuildOutcome::Unchanged);
        assert_eq!(std::fs::read(&second.output).unwrap(), bytes);

        let rows = index::load(&site, Kind::Anime);
        assert_eq!(rows[0]["link"], "anime/cowboy-bebop/cowboy-bebop.html");
        let _ = std::fs::remove_dir_all(site.root());
    }

    #[test]
    fn build_without_index_row_still_writes_page() {
        let site = temp_site();
        seed(&site, Kind::Album, "kid-a", "---\ntitle: \"Kid A\"\n---\n");
        let report = build_entry(&site, Kind::Album, "kid-a").unwrap();
        assert!(!report.linked);
        assert!(report.output.exists());
        assert!(!site.data_file(Kind::Album).exists());
        let _ = std::fs::remove_dir_all(site.root());
    }

    #[test]
    fn missing_blog_is_not_found() {
        let site = temp_site();
        let err = build_entry(&site, Kind::Album, "nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "not found: Could not find blog.md at album/nope/blog.md"
        );
        let _ = std::fs::remove_dir_all(site.root());
    }

    #[test]
    fn slug_without_letters_or_digits_is_rejected() {
        let site = temp_site();
        seed(&site, Kind::Anime, "entry", "---\ntitle: \"Fallback\"\n---\n");
        let err = build_entry(&site, Kind::Anime, "!!!").unwrap_err();
        assert!(matches!(err, KawaiiError::Validation { .. }));
        assert!(!site.page_path(Kind::Anime, "entry").exists());
        let _ = std::fs::remove_dir_all(site.root());
    }

    #[test]
    fn build_all_walks_scope() {
        let site = temp_site();
        let err = build_all(&site, Scope::All, |_, _| {}).unwrap_err();
        assert_eq!(err.to_string(), "not found: No matching entries to build.");

        seed(&site, Kind::Anime, "akira", "---\ntitle: \"Akira\"\n---\n");
        seed(&site, Kind::Anime, "paprika", "---\ntitle: \"Paprika\"\n---\n");
        let mut started = Vec::new();
        let reports = build_all(&site, Scope::All, |kind, slug| {
            started.push(format!("{kind} {slug}"));
        })
        .unwrap();
        assert_eq!(started, vec!["anime akira", "anime paprika"]);
        assert_eq!(reports.len(), 2);

        assert!(build_all(&site, Scope::Album, |_, _| {}).is_err());
        let _ = std::fs::remove_dir_all(site.root());
    }
}
