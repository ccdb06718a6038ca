//! `#include` expansion.
//!
//! `{{ #include components/header }}` is replaced by the raw contents of
//! `<directory>/components/header<extension>`. Included text is scanned for
//! further includes before the outer scan moves on, so nesting resolves
//! depth-first and leftmost-first.
//!
//! A missing file aborts the render. So does an include of a file that is
//! already being included further up the chain, and a chain nested deeper than
//! [`TemplateConfig::max_include_depth`]. In strict mode an absolute name or
//! one with a `..` segment is rejected before the filesystem is touched.

use std::path::{Path, PathBuf};

use super::scanner::{lex, TagKind};
use crate::config::TemplateConfig;
use crate::error::{io_context, RenderError, Result};

/// Expands every `#include` in `source`.
///
/// `origin` is the file `source` was read from, if any. It starts the include
/// chain, so a template that includes itself is reported as a cycle.
pub(crate) fn expand_includes(
    config: &TemplateConfig,
    source: &str,
    origin: Option<&Path>,
) -> Result<String> {
    let mut chain = Vec::new();
    if let Some(origin) = origin {
        chain.push(canonical(origin)?);
    }
    Includer { config, chain }.expand(source, 0)
}

struct Includer<'a> {
    config: &'a TemplateConfig,
    /// Canonical paths of the files currently being expanded, outermost first.
    chain: Vec<PathBuf>,
}

impl Includer<'_> {
    fn expand(&mut self, source: &str, depth: usize) -> Result<String> {
        let includes: Vec<_> = lex(source)
            .into_iter()
            .filter(|tag| tag.kind == TagKind::Include)
            .collect();
        if includes.is_empty() {
            return Ok(source.to_string());
        }

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;

        for tag in includes {
            out.push_str(&source[cursor..tag.start]);
            cursor = tag.end;

            let name = tag.args();
            if name.is_empty() {
                if self.config.strict {
                    return Err(RenderError::MalformedDirective(format!(
                        "`{}` names no file",
                        tag.text
                    )));
                }
                out.push_str(tag.text);
                continue;
            }

            if self.config.strict && TemplateConfig::escapes_directory(name) {
                return Err(RenderError::MalformedDirective(format!(
                    "`{}` names a file outside the template directory",
                    tag.text
                )));
            }

            out.push_str(&self.inline(name, depth + 1)?);
        }

        out.push_str(&source[cursor..]);
        Ok(out)
    }

    fn inline(&mut self, name: &str, depth: usize) -> Result<String> {
        let path = self.config.path_for(name);
        if !path.is_file() {
            return Err(RenderError::IncludeNotFound(path));
        }
        if depth > self.config.max_include_depth {
            return Err(RenderError::IncludeDepthExceeded {
                limit: self.config.max_include_depth,
                path,
            });
        }

        let resolved = canonical(&path)?;
        if self.chain.contains(&resolved) {
            let mut cycle = self.chain.clone();
            cycle.push(resolved);
            return Err(RenderError::IncludeCycle(cycle));
        }

        tracing::debug!(path = %path.display(), depth, "include: inlining");
        let content = std::fs::read_to_string(&path).map_err(|e| io_context(&path, e))?;

        self.chain.push(resolved);
        let expanded = self.expand(&content, depth);
        self.chain.pop();
        expanded
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| io_context(path, e))
}
