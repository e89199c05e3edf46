//! Application configuration for Wordy.
//!
//! User config lives at `~/.wordy/wordy.toml`.
//! Every section is optional; missing values fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WordyError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "wordy.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".wordy";

// ---------------------------------------------------------------------------
// Config structs (matching wordy.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Search-result discovery.
    #[serde(default)]
    pub search: SearchConfig,

    /// Generative text service.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// External document compiler.
    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Final artifact file name, relative to the working directory.
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Number of search results to compare against.
    #[serde(default = "default_result_count")]
    pub result_count: usize,

    /// Per-page fetch timeout.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Maximum competitor pages fetched at once.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_file: default_output_file(),
            result_count: default_result_count(),
            fetch_timeout_secs: default_fetch_timeout(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

fn default_output_file() -> String {
    "seo_comparison_output.pdf".into()
}
fn default_result_count() -> usize {
    10
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_fetch_concurrency() -> usize {
    4
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTML search endpoint queried with `?q=<keyword>`.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on a single generation request.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-4o".into()
}
fn default_generation_timeout() -> u64 {
    300
}

/// `[compiler]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Compiler executable.
    #[serde(default = "default_compiler_command")]
    pub command: String,

    /// Arguments placed before the source file name.
    #[serde(default = "default_compiler_args")]
    pub args: Vec<String>,

    /// Extension of the artifact the compiler writes beside its input.
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    /// Upper bound on a single compiler run.
    #[serde(default = "default_compiler_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: default_compiler_command(),
            args: default_compiler_args(),
            artifact_extension: default_artifact_extension(),
            timeout_secs: default_compiler_timeout(),
        }
    }
}

fn default_compiler_command() -> String {
    "pdflatex".into()
}
fn default_compiler_args() -> Vec<String> {
    vec!["-interaction=nonstopmode".into(), "-halt-on-error".into()]
}
fn default_artifact_extension() -> String {
    "pdf".into()
}
fn default_compiler_timeout() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.wordy/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| WordyError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.wordy/wordy.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WordyError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| WordyError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| WordyError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WordyError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WordyError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the generation API key env var is set and non-empty.
pub fn validate_api_key(config: &GenerationConfig) -> Result<()> {
    let var_name = &config.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(WordyError::config(format!(
            "generation API key not found. Set the {var_name} environment variable."
        ))),
    }
}
