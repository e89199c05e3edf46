//! Shared types, error model, and configuration for Wordy.
//!
//! This crate is the foundation depended on by all other Wordy crates.
//! It provides:
//! - [`WordyError`] — the unified error type
//! - Domain types ([`Source`], [`SourceRole`], [`FetchResult`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompilerConfig, DefaultsConfig, GenerationConfig, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{Result, WordyError};
pub use types::{FetchResult, Source, SourceRole, normalize_url};
