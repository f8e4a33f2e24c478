//! Shared types, error model, and configuration for KawaiiReview.
//!
//! This crate is the foundation depended on by all other KawaiiReview crates.
//! It provides:
//! - [`KawaiiError`]: the unified error type
//! - Domain types ([`Kind`], [`Candidate`], [`IndexEntry`], [`Score`])
//! - Runtime label formatting shared by scaffolding and page builds
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod runtime;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, DefaultsConfig, EndpointsConfig, InlineTarget, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_config_path,
};
pub use error::{KawaiiError, Result};
pub use runtime::{
    PartialDate, airing_window, format_album_runtime, format_anime_runtime, format_date_label,
    release_detail,
};
pub use types::{
    Candidate, IndexEntry, Kind, Score, Scope, SourceKind, json_number, leading_float,
    to_fixed,
};
