//! CLI command definitions, routing, and tracing setup.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use kawaii_core::catalog;
use kawaii_core::{
    BuildOutcome, BuildReport, NewReviewConfig, ProgressReporter, Prompter, ReviewOutcome,
    SitePaths, SourceClient, build_all, build_entry, new_review,
};
use kawaii_shared::{
    AppConfig, KawaiiError, Kind, Scope, init_config, load_config, resolve_config_path,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// KawaiiReview: scaffold and publish anime and album reviews.
#[derive(Parser)]
#[command(
    name = "kawaii",
    version,
    about = "Scaffold, build, and manage anime and album reviews for a static review blog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Site root (defaults to the current directory).
    #[arg(long, env = "KAWAII_ROOT", global = true)]
    pub root: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Look up a title and scaffold a new review folder.
    New {
        /// Review kind: anime or album.
        kind: Kind,

        /// Title to search for.
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        /// Release year (prompted for when omitted).
        #[arg(long)]
        year: Option<i32>,

        /// Album artist (prompted for when omitted).
        #[arg(long)]
        artist: Option<String>,

        /// Score out of 10 (prompted for when omitted).
        #[arg(long)]
        score: Option<String>,

        /// Resolve and print the review without writing anything.
        #[arg(long, env = "KAWAII_DRY_RUN", value_parser = FalseyValueParser::new())]
        dry_run: bool,

        /// Replace an existing review folder for the same title.
        #[arg(long, env = "KAWAII_OVERWRITE", value_parser = FalseyValueParser::new())]
        overwrite: bool,

        /// Skip all prompts and take the first candidate.
        #[arg(short, long)]
        yes: bool,
    },

    /// Render one review page from its blog.md.
    Build {
        /// Review kind: anime or album.
        kind: Kind,

        /// Review slug (folder name).
        slug: String,
    },

    /// Render every review page.
    BuildAll {
        /// anime, album, or all.
        #[arg(default_value = "all")]
        scope: Scope,
    },

    /// List existing reviews.
    List {
        /// anime, album, or all.
        #[arg(default_value = "all")]
        scope: Scope,
    },

    /// Delete a review folder and its index row.
    Delete {
        /// Review kind: anime or album.
        kind: Kind,

        /// Review slug (folder name).
        slug: String,

        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default kawaii.toml at the site root.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "kawaii=warn",
        1 => "kawaii=info",
        2 => "kawaii=debug",
        _ => "kawaii=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
    };

    let result = match cli.command {
        Command::New {
            kind,
            title,
            year,
            artist,
            score,
            dry_run,
            overwrite,
            yes,
        } => {
            let request = NewRequest {
                kind,
                title: title.join(" "),
                year,
                artist,
                score,
                dry_run,
                overwrite,
                assume_yes: yes,
            };
            cmd_new(root, request).await
        }
        Command::Build { kind, slug } => cmd_build(root, kind, &slug),
        Command::BuildAll { scope } => cmd_build_all(root, scope),
        Command::List { scope } => cmd_list(root, scope),
        Command::Delete { kind, slug, yes } => cmd_delete(root, kind, &slug, yes),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(root),
            ConfigAction::Show => cmd_config_show(root),
        },
    };

    match result {
        Err(report) if matches!(
            report.downcast_ref::<KawaiiError>(),
            Some(KawaiiError::Cancelled)
        ) => {
            println!("Cancelled.");
            Ok(())
        }
        other => other,
    }
}

fn open_site(root: PathBuf) -> Result<(AppConfig, SitePaths)> {
    let config = load_config(&root)?;
    let site = SitePaths::new(root, &config);
    Ok((config, site))
}

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

/// Flags of the `new` subcommand.
struct NewRequest {
    kind: Kind,
    title: String,
    year: Option<i32>,
    artist: Option<String>,
    score: Option<String>,
    dry_run: bool,
    overwrite: bool,
    assume_yes: bool,
}

async fn cmd_new(root: PathBuf, request: NewRequest) -> Result<()> {
    let (config, site) = open_site(root)?;
    let client = SourceClient::new(&config)?;

    let review_config = NewReviewConfig {
        kind: request.kind,
        title: request.title,
        year: request.year,
        artist: request.artist,
        score: request.score,
        dry_run: request.dry_run,
        overwrite: request.overwrite,
        assume_yes: request.assume_yes,
        candidate_limit: config.defaults.candidate_limit,
    };

    info!(
        kind = %review_config.kind,
        title = %review_config.title,
        dry_run = review_config.dry_run,
        "creating review"
    );

    let reporter = CliProgress::new();
    let prompter = StdinPrompter::new(reporter.spinner.clone());
    let result = new_review(&site, &client, &review_config, &prompter, &reporter).await;
    reporter.spinner.finish_and_clear();

    match result? {
        ReviewOutcome::DryRun(preview) => {
            let folder = site.relative(&site.entry_dir(preview.kind, &preview.slug));
            println!("[dry-run] Would create {folder}");
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        ReviewOutcome::Created(created) => {
            println!(
                "Created {} review scaffold at {}",
                created.kind,
                site.relative(&created.folder)
            );
            println!("- Markdown: blog.md");
            println!("- Cover: {}", created.cover_name);
            println!();
            println!(
                "Write the review, then run: kawaii build {} {}",
                created.kind, created.slug
            );
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// build / build-all
// ---------------------------------------------------------------------------

fn cmd_build(root: PathBuf, kind: Kind, slug: &str) -> Result<()> {
    let (_, site) = open_site(root)?;
    let report = build_entry(&site, kind, slug)?;
    print_build(&site, &report);
    Ok(())
}

fn cmd_build_all(root: PathBuf, scope: Scope) -> Result<()> {
    let (_, site) = open_site(root)?;
    let reports = build_all(&site, scope, |kind, slug| {
        println!("→ Building {kind} {slug}");
    })?;
    for report in &reports {
        print_build(&site, report);
    }
    let built = reports
        .iter()
        .filter(|r| r.outcome == BuildOutcome::Built)
        .count();
    println!();
    println!(
        "  {} page(s) built, {} unchanged.",
        built,
        reports.len() - built
    );
    Ok(())
}

fn print_build(site: &SitePaths, report: &BuildReport) {
    let output = site.relative(&report.output);
    match report.outcome {
        BuildOutcome::Built => println!("Built {} page → {output}", report.kind),
        BuildOutcome::Unchanged => println!("Unchanged {} page → {output}", report.kind),
    }
    if !report.linked {
        warn!(kind = %report.kind, slug = %report.slug, "no index row to link");
    }
}

// ---------------------------------------------------------------------------
// list / delete
// ---------------------------------------------------------------------------

fn cmd_list(root: PathBuf, scope: Scope) -> Result<()> {
    let (_, site) = open_site(root)?;
    let sections = catalog::list(&site, scope)?;
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}:", section.kind.section_label());
        if section.entries.is_empty() {
            println!("  (none)");
        }
        for entry in &section.entries {
            println!("  - {entry}");
        }
    }
    Ok(())
}

fn cmd_delete(root: PathBuf, kind: Kind, slug: &str, yes: bool) -> Result<()> {
    let (_, site) = open_site(root)?;
    let target = catalog::find(&site, kind, slug)?;

    if !yes {
        let prompter = StdinPrompter::new(ProgressBar::hidden());
        let answer = prompter.ask(&format!(
            "Delete {} ({kind})? Are you sure? (y|N) ",
            target.title
        ))?;
        if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let report = catalog::delete(&site, &target)?;
    if !report.index_row_removed {
        println!("Deleted files, but entry was not present in data JSON.");
    }
    println!(
        "Removed {kind} review \"{}\" ({}).",
        target.title, target.slug
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(root: PathBuf) -> Result<()> {
    let path = init_config(&root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: PathBuf) -> Result<()> {
    match resolve_config_path(&root) {
        Some(path) => println!("# {}", path.display()),
        None => println!("# defaults (no kawaii.toml found)"),
    }
    let config = load_config(&root)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _outcome: &ReviewOutcome) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Terminal prompts
// ---------------------------------------------------------------------------

/// Reads answers from stdin. The spinner is paused while a prompt is shown.
struct StdinPrompter {
    spinner: ProgressBar,
}

impl StdinPrompter {
    fn new(spinner: ProgressBar) -> Self {
        Self { spinner }
    }
}

impl Prompter for StdinPrompter {
    fn ask(&self, prompt: &str) -> kawaii_shared::Result<String> {
        self.spinner.suspend(|| {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{prompt}")
                .and_then(|()| stdout.flush())
                .map_err(|e| KawaiiError::io("<stdout>", e))?;

            // EOF reads as an empty answer.
            let mut answer = String::new();
            io::stdin()
                .lock()
                .read_line(&mut answer)
                .map_err(|e| KawaiiError::io("<stdin>", e))?;
            Ok(answer.trim().to_string())
        })
    }

    fn say(&self, line: &str) {
        self.spinner.suspend(|| println!("{line}"));
    }
}
