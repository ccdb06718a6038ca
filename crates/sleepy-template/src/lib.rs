//! # Sleepy Template - Directive Text Templates
//!
//! `sleepy-template` renders text templates built from a handful of
//! directives against a tree of bound data:
//!
//! - `{{ key arg... }}` placeholders, with dotted keys (`user.address.city`)
//! - `{{ #include name }}` to inline another template file
//! - `{{ #each item in list }} ... {{ /each }}` to repeat a block per element
//! - `{{ #if lhs op rhs }} ... {{ /if }}` to keep or drop a block
//!
//! It is deliberately small. There are no expressions beyond a single
//! comparison, no user-defined functions and no `else`. Extension happens
//! through named hooks (see [`sleepy_hooks`]) that can observe the render and
//! transform values at every stage.
//!
//! ## Quick Start
//!
//! ```rust
//! use sleepy_template::render;
//! use serde_json::json;
//!
//! let output = render(
//!     "{{#each u in users}}{{iterator}}.{{u.name}} {{/each}}",
//!     &json!({"users": [{"name": "Ann"}, {"name": "Bo"}]}),
//! ).unwrap();
//!
//! assert_eq!(output, "1.Ann 2.Bo ");
//! ```
//!
//! ## Template Files
//!
//! A [`Template`] session selects a file `<directory>/<name><extension>`,
//! collects bound data and renders on demand:
//!
//! ```rust,ignore
//! use sleepy_template::{Template, TemplateConfig};
//!
//! let mut page = Template::open("users/list", TemplateConfig::new("./templates"))?;
//! page.bind("title", "Members")?;
//! page.bind_all(&site)?;
//! let html = page.retrieve()?;
//! ```
//!
//! Keys are case-insensitive at every depth: binding `"Title"` and reading
//! `{{ TITLE }}` resolve to the same value. Missing keys render as nothing.
//!
//! ## Iteration
//!
//! Inside an `#each` block the context is the current element's fields plus
//! `iterator` (1-based), `zebra` (`odd`/`even`) and the element itself under
//! the item name. Anything that is not a non-empty sequence of mappings
//! renders the block once against the outer context.
//!
//! ## Conditionals
//!
//! `#if` takes exactly `lhs operator rhs`. See [`Operator`] for the operators
//! and how mixed values compare. Operands are data; nothing is evaluated.
//!
//! ## Errors
//!
//! Every failure is a [`RenderError`] and aborts the render with no partial
//! output. A missing include is [`RenderError::IncludeNotFound`]; include
//! cycles and runaway nesting are caught too.

mod config;
mod context;
mod error;
mod template;

pub use config::{
    TemplateConfig, DEFAULT_DIRECTORY, DEFAULT_EXTENSION, DEFAULT_MAX_INCLUDE_DEPTH,
};
pub use context::{format_value, normalize_key, normalize_value, resolve_path, Context};
pub use error::{RenderError, Result};
pub use template::{zebra, Capture, Operator, Template};

use serde::Serialize;

/// Renders an in-memory template against `data` with the default
/// configuration and no hooks.
///
/// `data` must serialize to a mapping. Includes resolve against
/// [`DEFAULT_DIRECTORY`] in the working directory.
///
/// # Errors
///
/// [`RenderError::ContextError`] if `data` is not a mapping, plus anything
/// [`Template::render`] can return.
pub fn render<T: Serialize + ?Sized>(source: &str, data: &T) -> Result<String> {
    let mut template = Template::new(TemplateConfig::default());
    template.bind_all(data)?;
    template.render(source)
}
