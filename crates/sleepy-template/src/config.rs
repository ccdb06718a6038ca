//! Template configuration.
//!
//! Configuration is plain data with sensible defaults. It can be built in code
//! with the builder-style setters, or loaded from YAML:
//!
//! ```rust
//! use sleepy_template::TemplateConfig;
//!
//! let config = TemplateConfig::from_yaml(r#"
//! directory: app/templates
//! extension: .html
//! strict: true
//! "#).unwrap();
//!
//! assert_eq!(config.extension, ".html");
//! assert_eq!(config.max_include_depth, 32);
//! ```

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{io_context, RenderError, Result};

/// Default template file extension.
pub const DEFAULT_EXTENSION: &str = ".tpl";

/// Default template directory, relative to the working directory.
pub const DEFAULT_DIRECTORY: &str = "templates";

/// Default maximum nesting of `#include` directives.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Where templates live and how strictly directives are treated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Directory holding template and include files.
    pub directory: PathBuf,

    /// Extension appended to template and include names, including the dot.
    pub extension: String,

    /// How deeply `#include` directives may nest before the render fails.
    pub max_include_depth: usize,

    /// Report malformed directives as errors instead of leaving them as text.
    pub strict: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            extension: DEFAULT_EXTENSION.to_string(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            strict: false,
        }
    }
}

impl TemplateConfig {
    /// Creates the default configuration rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Sets the template extension. A missing leading dot is added.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = if extension.is_empty() || extension.starts_with('.') {
            extension
        } else {
            format!(".{}", extension)
        };
        self
    }

    /// Sets the maximum include depth.
    pub fn max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Enables or disables strict directive parsing.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parses a configuration from YAML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ConfigError`] on invalid YAML or unknown fields.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(yaml)?;
        let extension = std::mem::take(&mut config.extension);
        Ok(config.extension(extension))
    }

    /// Reads and parses a YAML configuration file.
    ///
    /// A relative `directory` is resolved against the file's parent directory.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| io_context(path, e))?;
        let mut config = Self::from_yaml(&content)?;
        if config.directory.is_relative() {
            if let Some(parent) = path.parent() {
                config.directory = parent.join(&config.directory);
            }
        }
        Ok(config)
    }

    /// Returns the file path for a template or include name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}", name.trim(), self.extension))
    }

    /// Returns true if `name` is absolute or climbs out with `..`, so that
    /// [`path_for`](Self::path_for) would point outside the directory.
    pub fn escapes_directory(name: &str) -> bool {
        Path::new(name.trim()).components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        })
    }

    /// Checks that the configured directory exists.
    pub fn check_directory(&self) -> Result<()> {
        if self.directory.is_dir() {
            Ok(())
        } else {
            Err(RenderError::TemplateDirectoryNotFound(self.directory.clone()))
        }
    }
}
