//! Error types for Wordy.
//!
//! Library crates use [`WordyError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Wordy operations.
#[derive(Debug, thiserror::Error)]
pub enum WordyError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error outside the per-source fetch boundary.
    #[error("network error: {0}")]
    Network(String),

    /// Search-result discovery failed.
    #[error("search error: {0}")]
    Search(String),

    /// The generative text service failed or returned no content.
    #[error("generation error: {0}")]
    Generation(String),

    /// Generated markup is not a complete document.
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    /// The external document compiler failed.
    #[error("compilation error: {message}{}", format_diagnostics(.diagnostics))]
    Compilation {
        message: String,
        diagnostics: Option<String>,
    },

    /// A bounded operation ran past its deadline.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A pipeline stage failed; `state` names the stage.
    #[error("pipeline failed during {state}: {source}")]
    Pipeline {
        state: String,
        #[source]
        source: Box<WordyError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WordyError>;

fn format_diagnostics(diagnostics: &Option<String>) -> String {
    match diagnostics {
        Some(text) if !text.trim().is_empty() => format!("\n--- compiler output ---\n{text}"),
        _ => String::new(),
    }
}

impl WordyError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-document error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    /// Create a compilation error with optional captured compiler output.
    pub fn compilation(msg: impl Into<String>, diagnostics: Option<String>) -> Self {
        Self::Compilation {
            message: msg.into(),
            diagnostics,
        }
    }

    /// Create a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the failing pipeline state to an error.
    pub fn in_state(self, state: impl std::fmt::Display) -> Self {
        Self::Pipeline {
            state: state.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through pipeline wrappers.
    pub fn root(&self) -> &WordyError {
        match self {
            Self::Pipeline { source, .. } => source.root(),
            other => other,
        }
    }
}
