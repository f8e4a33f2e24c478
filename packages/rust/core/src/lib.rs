//! Core workflows for KawaiiReview.
//!
//! This crate ties metadata resolution, frontmatter rendering, and the
//! denormalized JSON index together into the CLI's commands:
//!
//! - [`review`]: scaffold a new review (`new`)
//! - [`build`]: render review pages (`build`, `build-all`)
//! - [`catalog`]: `list` and `delete`
//! - [`index`]: JSON index + inline `<script>` sync
//! - [`site`]: site root layout

pub mod build;
pub mod catalog;
pub mod index;
pub mod review;
pub mod site;

pub use build::{BuildOutcome, BuildReport, build_all, build_entry};
pub use catalog::{CatalogEntry, CatalogSection, DeleteReport, DeleteTarget};
pub use review::{
    CreateOptions, CreatedReview, NewReviewConfig, ProgressReporter, Prompter, ReviewOutcome,
    ReviewPreview, SilentProgress, new_review,
};
pub use site::SitePaths;

pub use kawaii_sources::SourceClient;
