//! `new` pipeline: title → metadata candidates → operator choice → runtime
//! and score → review folder (cover + `blog.md`) → index row.
//!
//! Nothing is rolled back on failure: a cover that was already downloaded
//! stays on disk if a later step fails.

use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use kawaii_markdown::{ReviewFrontmatter, parse_frontmatter, render_review, slugify, suffixed};
use kawaii_shared::{Candidate, IndexEntry, KawaiiError, Kind, Result, Score, SourceKind};
use kawaii_sources::{SearchProgress, SearchQuery, SourceClient, populate_runtime, resolve};

use crate::index;
use crate::site::{SitePaths, write_atomic};

const DEFAULT_COVER_EXT: &str = ".jpg";

// ---------------------------------------------------------------------------
// Interaction
// ---------------------------------------------------------------------------

/// Operator interaction. The CLI reads stdin; tests script the answers.
pub trait Prompter: Send + Sync {
    /// Show `prompt` and return the answer with surrounding whitespace removed.
    fn ask(&self, prompt: &str) -> Result<String>;
    /// Show an informational line.
    fn say(&self, line: &str);
}

/// Progress callback for the `new` pipeline.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, outcome: &ReviewOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _outcome: &ReviewOutcome) {}
}

/// Forwards source-chain progress to the pipeline reporter.
struct PipelineSearchProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl SearchProgress for PipelineSearchProgress<'_> {
    fn querying(&self, source: SourceKind) {
        self.inner.phase(&format!("Searching {source}"));
    }

    fn answered(&self, source: SourceKind, count: usize) {
        debug!(%source, count, "source answered");
    }
}

// ---------------------------------------------------------------------------
// Config and outcome
// ---------------------------------------------------------------------------

/// Everything the `new` pipeline needs from the command line.
#[derive(Debug, Clone)]
pub struct NewReviewConfig {
    pub kind: Kind,
    pub title: String,
    pub year: Option<i32>,
    pub artist: Option<String>,
    /// Raw score input; prompted for when absent.
    pub score: Option<String>,
    pub dry_run: bool,
    pub overwrite: bool,
    /// Skip every prompt: accept the first candidate, leave unknowns blank.
    pub assume_yes: bool,
    /// How many candidates the chooser lists.
    pub candidate_limit: usize,
}

/// Options for writing a chosen candidate to disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOptions {
    pub dry_run: bool,
    pub overwrite: bool,
}

/// What a dry run would have written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewPreview {
    #[serde(skip)]
    pub kind: Kind,
    #[serde(skip)]
    pub slug: String,
    pub title: String,
    pub owner: String,
    pub runtime: String,
    pub runtime_detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    pub cover: String,
}

/// A freshly scaffolded review folder.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedReview {
    pub kind: Kind,
    pub slug: String,
    pub folder: PathBuf,
    pub cover_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    DryRun(ReviewPreview),
    Created(CreatedReview),
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full `new` pipeline.
///
/// 1. Ask for a missing year (and artist, for albums)
/// 2. Resolve candidates through the source chain
/// 3. Let the operator choose one
/// 4. Fill in runtime details and the score
/// 5. Write the review folder and index row
#[instrument(skip_all, fields(kind = %config.kind, title = %config.title))]
pub async fn new_review(
    site: &SitePaths,
    client: &SourceClient,
    config: &NewReviewConfig,
    prompter: &dyn Prompter,
    progress: &dyn ProgressReporter,
) -> Result<ReviewOutcome> {
    let title = config.title.trim();
    if title.is_empty() {
        return Err(KawaiiError::validation("a title is required"));
    }

    let interactive = !config.assume_yes;
    let year = match config.year {
        Some(year) => Some(year),
        None if interactive => {
            parse_year(&prompter.ask("Release year (leave blank to skip): ")?)
        }
        None => None,
    };
    let artist = match (&config.artist, config.kind) {
        (Some(artist), _) => Some(artist.clone()).filter(|a| !a.trim().is_empty()),
        (None, Kind::Album) if interactive => {
            Some(prompter.ask("Artist name (optional): ")?).filter(|a| !a.is_empty())
        }
        _ => None,
    };

    let query = SearchQuery {
        title: title.to_string(),
        year,
        artist,
    };
    let search_progress = PipelineSearchProgress { inner: progress };
    let resolution = resolve(client, config.kind, &query, &search_progress).await?;
    info!(source = %resolution.source, count = resolution.candidates.len(), "candidates found");

    progress.phase("Waiting for selection");
    let mut candidate = choose_candidate(
        config.kind,
        resolution.candidates,
        config.candidate_limit,
        prompter,
        config.assume_yes,
    )?;

    progress.phase("Collecting runtime");
    populate_runtime(client, config.kind, &mut candidate).await;

    candidate.score = match &config.score {
        Some(raw) => Score::parse(raw),
        None if interactive => collect_score(prompter)?,
        None => None,
    };

    progress.phase("Writing review");
    let options = CreateOptions {
        dry_run: config.dry_run,
        overwrite: config.overwrite,
    };
    let outcome = create_review(site, client, config.kind, &candidate, options).await?;
    progress.done(&outcome);
    Ok(outcome)
}

fn parse_year(answer: &str) -> Option<i32> {
    let year = answer.trim().parse().ok();
    if year.is_none() && !answer.trim().is_empty() {
        warn!(answer, "ignoring unparseable year");
    }
    year
}

/// Let the operator pick one candidate.
///
/// A single candidate asks for a Y/n confirmation; several are listed (up to
/// `limit`) and chosen by number. An empty selection or a "no" cancels.
pub fn choose_candidate(
    kind: Kind,
    mut candidates: Vec<Candidate>,
    limit: usize,
    prompter: &dyn Prompter,
    assume_yes: bool,
) -> Result<Candidate> {
    if candidates.is_empty() {
        return Err(KawaiiError::NotFound(format!("No {kind} matches found.")));
    }

    if candidates.len() == 1 {
        let only = candidates.remove(0);
        if assume_yes {
            return Ok(only);
        }
        let answer = prompter
            .ask(&format!(
                "Is this what you're looking for? (Y/n): {}\n> ",
                only.describe()
            ))?
            .to_lowercase();
        return match answer.as_str() {
            "" | "y" | "yes" => Ok(only),
            _ => Err(KawaiiError::Cancelled),
        };
    }

    let shown = candidates.len().min(limit.max(1));
    prompter.say(&format!("Multiple {kind} matches found:"));
    for (i, candidate) in candidates.iter().take(shown).enumerate() {
        prompter.say(&format!("{}. {}", i + 1, candidate.describe()));
    }
    if assume_yes {
        return Ok(candidates.remove(0));
    }

    loop {
        let answer = prompter.ask(&format!("Select 1-{shown} (or press Enter to cancel): "))?;
        if answer.is_empty() {
            return Err(KawaiiError::Cancelled);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=shown).contains(&n) => return Ok(candidates.swap_remove(n - 1)),
            _ => prompter.say("Invalid selection."),
        }
    }
}

/// Ask for a score. Blank skips; numbers are clamped into 0..=10.
pub fn collect_score(prompter: &dyn Prompter) -> Result<Option<Score>> {
    let answer = prompter.ask("Score (0-10, leave blank to skip): ")?;
    Ok(Score::parse(&answer))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// `cover<ext>`, where the extension comes from the image URL's path.
pub fn cover_file_name(cover_url: &str) -> String {
    let ext = Url::parse(cover_url)
        .ok()
        .and_then(|url| {
            let name = url.path_segments()?.next_back()?.to_string();
            let dot = name.rfind('.').filter(|&i| i > 0 && i + 1 < name.len())?;
            Some(name[dot..].to_lowercase())
        })
        .unwrap_or_else(|| DEFAULT_COVER_EXT.to_string());
    format!("cover{ext}")
}

/// Slug for `title`, stepping past folders that hold a different review.
///
/// Returns the slug and whether its folder already exists (holding a review
/// with the same title).
fn claim_slug(site: &SitePaths, kind: Kind, title: &str) -> (String, bool) {
    let base = slugify(title);
    let mut n = 1;
    loop {
        let slug = suffixed(&base, n);
        let dir = site.entry_dir(kind, &slug);
        if !dir.exists() {
            return (slug, false);
        }
        match existing_title(site, kind, &slug) {
            Some(existing) if existing != title => {
                debug!(%slug, %existing, "slug taken by another review");
                n += 1;
            }
            _ => return (slug, true),
        }
    }
}

fn existing_title(site: &SitePaths, kind: Kind, slug: &str) -> Option<String> {
    let markdown = std::fs::read_to_string(site.blog_path(kind, slug)).ok()?;
    parse_frontmatter(&markdown).ok()?.str("title")
}

/// Write the chosen candidate as a new review folder and index row.
#[instrument(skip_all, fields(kind = %kind, title = %candidate.title, dry_run = options.dry_run))]
pub async fn create_review(
    site: &SitePaths,
    client: &SourceClient,
    kind: Kind,
    candidate: &Candidate,
    options: CreateOptions,
) -> Result<ReviewOutcome> {
    let (slug, exists) = claim_slug(site, kind, &candidate.title);
    let folder = site.entry_dir(kind, &slug);

    if options.dry_run {
        return Ok(ReviewOutcome::DryRun(ReviewPreview {
            kind,
            slug,
            title: candidate.title.clone(),
            owner: candidate.owner.clone(),
            runtime: candidate.runtime.clone(),
            runtime_detail: candidate.runtime_detail.clone(),
            score: candidate.score.clone(),
            cover: candidate.cover_url.clone(),
        }));
    }

    if exists {
        if !options.overwrite {
            return Err(KawaiiError::Conflict(format!(
                "Folder already exists: {} (use --overwrite)",
                site.relative(&folder)
            )));
        }
        info!(folder = %folder.display(), "overwriting existing review");
        std::fs::remove_dir_all(&folder).map_err(|e| KawaiiError::io(&folder, e))?;
    }
    std::fs::create_dir_all(&folder).map_err(|e| KawaiiError::io(&folder, e))?;

    let cover_name = cover_file_name(&candidate.cover_url);
    let cover_path = folder.join(&cover_name);
    let cover_bytes = if candidate.cover_url.is_empty() {
        Vec::new()
    } else {
        info!(url = %candidate.cover_url, dest = %site.relative(&cover_path), "downloading cover");
        client.download(&candidate.cover_url).await?
    };
    write_atomic(&cover_path, &cover_bytes)?;

    let created = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let markdown = render_review(&ReviewFrontmatter {
        kind,
        title: &candidate.title,
        owner: &candidate.owner,
        year: candidate.year,
        genres: &candidate.genres,
        cover: &cover_name,
        source_url: &candidate.source_url,
        created: &created,
        synopsis: &candidate.synopsis,
        seasons: candidate.seasons,
        episodes: candidate.episodes,
        length_minutes: candidate.length_minutes,
        runtime: &candidate.runtime,
        score: candidate.score.as_ref(),
        runtime_detail: &candidate.runtime_detail,
    });
    write_atomic(&site.blog_path(kind, &slug), markdown.as_bytes())?;

    let entry = IndexEntry::new(
        kind,
        slug.as_str(),
        candidate.title.as_str(),
        candidate.year,
        candidate.owner.as_str(),
        site.relative(&cover_path),
        created,
    );
    index::upsert(site, kind, entry)?;

    info!(%slug, "review scaffolded");
    Ok(ReviewOutcome::Created(CreatedReview {
        kind,
        slug,
        folder,
        cover_name,
    }))
}
