//! Ordered callback registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::{hook_name, Hooks};

/// Type alias for action handlers.
pub type ActionFn = Arc<dyn Fn() + Send + Sync>;

/// Type alias for filter handlers.
///
/// A filter receives the current value and returns the replacement.
pub type FilterFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Registry of named actions and filters.
///
/// Handlers run in the order they were registered. Names are normalized with
/// [`hook_name`], so `"Render_Template"` and `"render_template"` are the same
/// hook point.
#[derive(Clone, Default)]
pub struct HookRegistry {
    actions: HashMap<String, Vec<ActionFn>>,
    filters: HashMap<String, Vec<FilterFn>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.filters.is_empty()
    }

    /// Adds an action handler, builder style.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sleepy_hooks::{HookRegistry, Hooks};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let started = Arc::new(AtomicUsize::new(0));
    /// let counter = started.clone();
    ///
    /// let hooks = HookRegistry::new().on_action("template_start", move || {
    ///     counter.fetch_add(1, Ordering::SeqCst);
    /// });
    ///
    /// hooks.fire_action("template_start");
    /// assert_eq!(started.load(Ordering::SeqCst), 1);
    /// ```
    pub fn on_action<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.add_action(name, f);
        self
    }

    /// Adds a filter handler, builder style.
    pub fn on_filter<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.add_filter(name, f);
        self
    }

    /// Adds an action handler.
    pub fn add_action<F>(&mut self, name: &str, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.actions
            .entry(hook_name(name))
            .or_default()
            .push(Arc::new(f));
    }

    /// Adds a filter handler.
    pub fn add_filter<F>(&mut self, name: &str, f: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.filters
            .entry(hook_name(name))
            .or_default()
            .push(Arc::new(f));
    }

    /// Returns true if at least one action is registered under `name`.
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(&hook_name(name))
    }

    /// Returns true if at least one filter is registered under `name`.
    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(&hook_name(name))
    }
}

impl Hooks for HookRegistry {
    fn fire_action(&self, name: &str) {
        if let Some(handlers) = self.actions.get(&hook_name(name)) {
            tracing::trace!(hook = name, handlers = handlers.len(), "firing action");
            for handler in handlers {
                handler();
            }
        }
    }

    fn apply_filter(&self, name: &str, value: Value) -> Value {
        match self.filters.get(&hook_name(name)) {
            Some(handlers) => {
                tracing::trace!(hook = name, handlers = handlers.len(), "applying filter");
                handlers.iter().fold(value, |current, handler| handler(current))
            }
            None => value,
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        let mut filters: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        actions.sort_unstable();
        filters.sort_unstable();
        f.debug_struct("HookRegistry")
            .field("actions", &actions)
            .field("filters", &filters)
            .finish()
    }
}
