//! A [`Hooks`] wrapper that records every call.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::{hook_name, Hooks, NoHooks};

/// One recorded hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    /// An action was fired.
    Action(String),
    /// A filter was applied.
    Filter(String),
}

impl HookCall {
    /// Returns the normalized hook name.
    pub fn name(&self) -> &str {
        match self {
            HookCall::Action(name) | HookCall::Filter(name) => name,
        }
    }
}

/// Wraps another [`Hooks`] implementation and records the name of every
/// action fired and filter applied, in call order.
///
/// Calls are forwarded unchanged to the inner implementation.
///
/// ```rust
/// use sleepy_hooks::{HookCall, Hooks, RecordingHooks};
/// use serde_json::json;
///
/// let hooks = RecordingHooks::new();
/// hooks.fire_action("template_start");
/// hooks.apply_filter("render_template", json!("page"));
///
/// assert_eq!(
///     hooks.calls(),
///     vec![
///         HookCall::Action("template_start".into()),
///         HookCall::Filter("render_template".into()),
///     ]
/// );
/// ```
pub struct RecordingHooks {
    inner: Arc<dyn Hooks>,
    calls: Mutex<Vec<HookCall>>,
}

impl RecordingHooks {
    /// Records calls without forwarding them anywhere.
    pub fn new() -> Self {
        Self::wrap(Arc::new(NoHooks))
    }

    /// Records calls and forwards them to `inner`.
    pub fn wrap(inner: Arc<dyn Hooks>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<HookCall> {
        self.lock().clone()
    }

    /// Returns the recorded hook names, without the call kind.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|c| c.name().to_string()).collect()
    }

    /// Forgets every recorded call.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HookCall>> {
        // A poisoned log is still a valid log.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RecordingHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl Hooks for RecordingHooks {
    fn fire_action(&self, name: &str) {
        self.lock().push(HookCall::Action(hook_name(name)));
        self.inner.fire_action(name);
    }

    fn apply_filter(&self, name: &str, value: Value) -> Value {
        self.lock().push(HookCall::Filter(hook_name(name)));
        self.inner.apply_filter(name, value)
    }
}
