//! The recursive render step shared by templates and sub-blocks.

use serde_json::Value;
use sleepy_hooks::Hooks;

use super::scanner::BlockScan;
use super::{condition, each, placeholder};
use crate::context::{format_value, Context};
use crate::error::{RenderError, Result};

/// One render pass: each blocks, if blocks, the `prerender_template` filter,
/// then placeholders.
///
/// Includes are not part of the pass; they are expanded once per template
/// before the first pass runs.
pub(crate) struct Pass<'a> {
    pub hooks: &'a dyn Hooks,
    pub strict: bool,
}

impl<'a> Pass<'a> {
    pub fn new(hooks: &'a dyn Hooks, strict: bool) -> Self {
        Self { hooks, strict }
    }

    /// Renders `source` against `ctx`, recursing into every directive block.
    pub fn render(&self, source: &str, ctx: &Context) -> Result<String> {
        let rendered = each::expand_each(self, source, ctx)?;
        let rendered = condition::expand_if(self, &rendered, ctx)?;
        let rendered = filter_text(self.hooks, "prerender_template", rendered);
        Ok(placeholder::substitute(self.hooks, &rendered, ctx))
    }

    /// Reports a malformed directive: an error in strict mode, a trace otherwise.
    pub fn malformed(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        if self.strict {
            return Err(RenderError::MalformedDirective(message));
        }
        tracing::trace!(%message, "leaving malformed directive as text");
        Ok(())
    }

    /// Reports unmatched block markers found by a scan.
    pub fn check_unmatched(&self, scan: &BlockScan<'_>) -> Result<()> {
        match scan.unmatched.first() {
            Some(tag) => self.malformed(format!("unmatched `{}`", tag)),
            None => Ok(()),
        }
    }
}

/// Passes text through a filter and turns the result back into text.
pub(crate) fn filter_text(hooks: &dyn Hooks, name: &str, text: String) -> String {
    match hooks.apply_filter(name, Value::String(text)) {
        Value::String(s) => s,
        other => format_value(&other),
    }
}
