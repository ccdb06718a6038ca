//! Command-line arguments and the data they point at.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use serde_json::Value;
use sleepy_template::TemplateConfig;

/// Render a directive template with data from files and flags.
#[derive(Debug, Parser)]
#[command(name = "sleepy", version, about)]
pub struct Cli {
    /// Template name, relative to the template directory, without extension
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Template directory (overrides the configuration file)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Template file extension (overrides the configuration file)
    #[arg(short, long, value_name = "EXT")]
    pub ext: Option<String>,

    /// JSON or YAML file whose top-level mapping is bound; repeatable
    #[arg(long = "data", value_name = "FILE")]
    pub data: Vec<PathBuf>,

    /// Bind a single value, parsed as JSON when possible; repeatable
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, Value)>,

    /// Fail on malformed directives instead of leaving them as text
    #[arg(long)]
    pub strict: bool,

    /// Write the output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Builds the template configuration. Flags win over the config file.
    pub fn template_config(&self) -> Result<TemplateConfig> {
        let mut config = match &self.config {
            Some(path) => TemplateConfig::from_yaml_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => TemplateConfig::default(),
        };

        if let Some(dir) = &self.dir {
            config.directory = dir.clone();
        }
        if let Some(ext) = &self.ext {
            config = config.extension(ext.as_str());
        }
        if self.strict {
            config = config.strict(true);
        }
        Ok(config)
    }
}

/// Parses `KEY=VALUE`. The value is JSON if it parses as JSON, else a string.
pub fn parse_assignment(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{}`", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Reads a data file, choosing the format from its extension.
pub fn load_data(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read data file {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let value = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?,
        _ => bail!(
            "unsupported data file {}: expected .json, .yaml or .yml",
            path.display()
        ),
    };
    Ok(value)
}
