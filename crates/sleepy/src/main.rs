//! `sleepy`: render a template directory from the command line.
//!
//! ```text
//! sleepy --dir templates --data site.yaml --set title=Home pages/home
//! ```
//!
//! Data files are bound in the order given, then `--set` values, so later
//! sources win. Logs go to stderr and are controlled by `RUST_LOG`, which
//! defaults to `warn`.

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser;
use sleepy_template::Template;
use tracing_subscriber::EnvFilter;

use crate::cli::{load_data, Cli};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.template_config()?;
    tracing::debug!(?config, template = %cli.template, "starting render");

    let mut template = Template::open(&cli.template, config)
        .with_context(|| format!("cannot open template `{}`", cli.template))?;

    for path in &cli.data {
        let data = load_data(path)?;
        template
            .bind_all(&data)
            .with_context(|| format!("cannot bind {}", path.display()))?;
    }
    for (key, value) in cli.set {
        template.bind_value(&key, value);
    }

    match &cli.output {
        Some(path) => {
            let output = template.retrieve()?;
            std::fs::write(path, output)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => template.show()?,
    }
    Ok(())
}
