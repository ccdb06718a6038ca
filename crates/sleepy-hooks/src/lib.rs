//! Named extension points for the sleepy template renderer.
//!
//! Hooks let outside code observe and transform a render without touching
//! template content. There are two kinds:
//!
//! - **Actions** are notifications. The renderer fires them at fixed points
//!   (`template_start`, `template_start_<name>`) and ignores any result.
//! - **Filters** transform a value. Every handler registered under a name runs
//!   in registration order, each receiving the previous handler's output. A
//!   filter with no handlers is the identity.
//!
//! The renderer only depends on the [`Hooks`] trait. [`HookRegistry`] is the
//! ordinary implementation, [`NoHooks`] does nothing, and [`RecordingHooks`]
//! wraps another implementation and remembers every hook name it was asked
//! about, which is handy when asserting call order in tests.
//!
//! # Example
//!
//! ```rust
//! use sleepy_hooks::{HookRegistry, Hooks};
//! use serde_json::{json, Value};
//!
//! let hooks = HookRegistry::new()
//!     .on_filter("render_placeholder_title", |args| match args {
//!         Value::Array(mut items) if !items.is_empty() => {
//!             let title = items.remove(0);
//!             json!(title.as_str().unwrap_or_default().to_uppercase())
//!         }
//!         other => other,
//!     });
//!
//! let out = hooks.apply_filter("render_placeholder_title", json!(["hello"]));
//! assert_eq!(out, json!("HELLO"));
//!
//! // Names are case-insensitive.
//! let untouched = hooks.apply_filter("RENDER_PLACEHOLDER_BODY", json!("x"));
//! assert_eq!(untouched, json!("x"));
//! ```
//!
//! # Thread Safety
//!
//! Handlers are `Send + Sync` and held behind `Arc`, so a fully built registry
//! can be shared by many templates rendering on different threads. Registration
//! takes `&mut self`; finish registering before sharing.

mod recording;
mod registry;

pub use recording::{HookCall, RecordingHooks};
pub use registry::{ActionFn, FilterFn, HookRegistry};

use serde_json::Value;

/// The extension-point interface consumed by the renderer.
pub trait Hooks: Send + Sync {
    /// Fires every action registered under `name`.
    fn fire_action(&self, name: &str);

    /// Passes `value` through every filter registered under `name`.
    ///
    /// Returns `value` unchanged when no filter is registered.
    fn apply_filter(&self, name: &str, value: Value) -> Value;
}

/// A [`Hooks`] implementation with no handlers at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl Hooks for NoHooks {
    fn fire_action(&self, _name: &str) {}

    fn apply_filter(&self, _name: &str, value: Value) -> Value {
        value
    }
}

/// Normalizes a hook name: trimmed and lower-cased.
pub fn hook_name(name: &str) -> String {
    name.trim().to_lowercase()
}
