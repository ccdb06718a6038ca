//! Error types for template rendering.
//!
//! Every variant is fatal to the render that produced it: the caller gets the
//! error and no output at all, never a half-rendered page.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// `retrieve`/`show` was called before a template was set.
    #[error("template file has not been set")]
    TemplateNotSet,

    /// The configured template directory does not exist.
    #[error("template directory '{}' does not exist", .0.display())]
    TemplateDirectoryNotFound(PathBuf),

    /// The template file does not exist under the template directory.
    #[error("template '{}' does not exist", .0.display())]
    TemplateNotFound(PathBuf),

    /// An `#include` names a file that does not exist.
    #[error("{} doesn't exist, cannot include file", .0.display())]
    IncludeNotFound(PathBuf),

    /// An `#include` chain includes a file that is already being included.
    #[error("include cycle detected: {}", display_chain(.0))]
    IncludeCycle(Vec<PathBuf>),

    /// An `#include` chain is nested deeper than the configured limit.
    #[error("include depth limit of {limit} exceeded at '{}'", .path.display())]
    IncludeDepthExceeded {
        /// The configured maximum depth.
        limit: usize,
        /// The include that would have exceeded it.
        path: PathBuf,
    },

    /// A directive could not be parsed (strict mode only).
    #[error("malformed directive: {0}")]
    MalformedDirective(String),

    /// Bound data could not be turned into a context.
    #[error("context error: {0}")]
    ContextError(String),

    /// Data serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    ConfigError(String),

    /// I/O error (e.g., reading a template from disk).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RenderError {
    /// Returns true for the errors raised while resolving `#include` directives.
    pub fn is_include_error(&self) -> bool {
        matches!(
            self,
            RenderError::IncludeNotFound(_)
                | RenderError::IncludeCycle(_)
                | RenderError::IncludeDepthExceeded { .. }
        )
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub(crate) fn io_context(path: &Path, err: std::io::Error) -> RenderError {
    RenderError::IoError(std::io::Error::new(
        err.kind(),
        format!("failed to read {}: {}", path.display(), err),
    ))
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::ConfigError(err.to_string())
    }
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
