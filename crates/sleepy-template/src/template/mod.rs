//! Directive rendering.
//!
//! A template is plain text with `{{ ... }}` tags. Four kinds of tag do
//! something; everything else passes through untouched.
//!
//! ```text
//! {{ #include partials/header }}
//! <ul>
//! {{ #each u in users }}
//!   <li class="{{ zebra }}">
//!     {{ iterator }}. {{ u.name }}
//!     {{ #if u.role == "admin" }}(admin){{ /if }}
//!   </li>
//! {{ /each }}
//! </ul>
//! ```
//!
//! ## Pipeline
//!
//! Includes are expanded once, before anything else, by inlining the named
//! files. The expanded source then goes through one render pass:
//!
//! 1. `#each` blocks expand, each iteration rendered by a nested pass
//! 2. `#if` blocks are kept (rendered by a nested pass) or dropped
//! 3. the `prerender_template` filter sees the text
//! 4. placeholders are substituted
//!
//! Nested passes run the same four steps on a block's inner text with the
//! block's context, so directives nest to any depth and per-iteration values
//! never escape their block.
//!
//! ## Malformed directives
//!
//! A block header that cannot be parsed, an unknown operator, or an open
//! marker without its close is left in the output as literal text. With
//! [`TemplateConfig::strict`](crate::TemplateConfig::strict) set they become
//! [`RenderError::MalformedDirective`](crate::RenderError::MalformedDirective).

mod capture;
mod condition;
mod each;
mod include;
mod pipeline;
mod placeholder;
mod renderer;
mod scanner;

pub use capture::Capture;
pub use condition::Operator;
pub use each::zebra;
pub use renderer::Template;
