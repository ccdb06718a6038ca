//! The [`Template`] render session.
//!
//! A `Template` owns a configuration, a hook implementation, the bound data and
//! optionally the name of a template file. Rendering never mutates it, so one
//! session can be rendered any number of times with the same result.
//!
//! ```rust,ignore
//! use sleepy_template::{Template, TemplateConfig};
//!
//! let mut page = Template::open("home", TemplateConfig::new("./templates"))?;
//! page.bind("title", "Welcome")?;
//! page.bind("users", &users)?;
//! page.show()?;
//! ```

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use sleepy_hooks::{Hooks, NoHooks};

use super::capture::Capture;
use super::include::expand_includes;
use super::pipeline::{filter_text, Pass};
use crate::config::TemplateConfig;
use crate::context::{normalize_key, Context};
use crate::error::{io_context, RenderError, Result};

/// A template render session.
///
/// # Hooks
///
/// Every stage calls out to the session's [`Hooks`]:
///
/// | Hook | Kind | When |
/// |------|------|------|
/// | `template_start` | action | on construction |
/// | `template_start_<name>` | action | after [`set_template`](Self::set_template) succeeds |
/// | `bind_placeholder_<key>` | filter | on every scalar bind |
/// | `template_get_<key>` | filter | on [`get`](Self::get) |
/// | `template_each_array` | filter | once per iterated `#each` sequence |
/// | `template_each`, `template_each_<item>` | filter | once per `#each` element |
/// | `prerender_template` | filter | before placeholders, once per render pass |
/// | `render_placeholder_<key>` | filter | once per distinct placeholder |
/// | `render_template_<name>`, `render_template` | filter | on the final output of [`retrieve`](Self::retrieve) |
pub struct Template {
    config: TemplateConfig,
    hooks: Arc<dyn Hooks>,
    data: Context,
    name: Option<String>,
}

impl Template {
    /// Creates a session without hooks.
    pub fn new(config: TemplateConfig) -> Self {
        Self::with_hooks(config, Arc::new(NoHooks))
    }

    /// Creates a session that reports to `hooks`. Fires `template_start`.
    pub fn with_hooks(config: TemplateConfig, hooks: Arc<dyn Hooks>) -> Self {
        hooks.fire_action("template_start");
        Self {
            config,
            hooks,
            data: Context::new(),
            name: None,
        }
    }

    /// Creates a session for the named template file.
    ///
    /// # Errors
    ///
    /// See [`set_template`](Self::set_template).
    pub fn open(name: &str, config: TemplateConfig) -> Result<Self> {
        Self::open_with_hooks(name, config, Arc::new(NoHooks))
    }

    /// Creates a session with hooks for the named template file.
    pub fn open_with_hooks(
        name: &str,
        config: TemplateConfig,
        hooks: Arc<dyn Hooks>,
    ) -> Result<Self> {
        let mut template = Self::with_hooks(config, hooks);
        template.set_template(name)?;
        Ok(template)
    }

    /// Selects the template file `<directory>/<name><extension>`.
    ///
    /// # Errors
    ///
    /// [`RenderError::TemplateDirectoryNotFound`] if the configured directory
    /// is missing, [`RenderError::TemplateNotFound`] if the file is.
    pub fn set_template(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        self.config.check_directory()?;
        let path = self.config.path_for(name);
        if !path.is_file() {
            return Err(RenderError::TemplateNotFound(path));
        }

        tracing::debug!(template = name, path = %path.display(), "template selected");
        self.name = Some(name.to_string());
        self.hooks.fire_action(&format!("template_start_{}", name));
        Ok(())
    }

    /// Binds a serializable value under `key`. Later binds of the same key win.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SerializationError`] if `value` cannot be
    /// serialized.
    pub fn bind<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.bind_value(key, value);
        Ok(())
    }

    /// Binds a JSON value under `key`.
    ///
    /// Scalars pass through the `bind_placeholder_<key>` filter first; mappings
    /// and sequences are bound as given.
    pub fn bind_value(&mut self, key: &str, value: Value) {
        let key = normalize_key(key);
        let value = match value {
            Value::Object(_) | Value::Array(_) => value,
            scalar => self
                .hooks
                .apply_filter(&format!("bind_placeholder_{}", key), scalar),
        };
        tracing::trace!(%key, "bound");
        self.data.insert(&key, value);
    }

    /// Binds every entry of a value that serializes to a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ContextError`] if `data` is not a mapping.
    pub fn bind_all<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<()> {
        for (key, value) in Context::from_serialize(data)? {
            self.bind_value(&key, value);
        }
        Ok(())
    }

    /// Returns the value bound at a dotted path, passed through the
    /// `template_get_<key>` filter. Missing keys yield `null`.
    pub fn get(&self, key: &str) -> Value {
        let key = normalize_key(key);
        let value = self.data.resolve(&key).cloned().unwrap_or(Value::Null);
        self.hooks
            .apply_filter(&format!("template_get_{}", key), value)
    }

    /// Starts capturing output to bind later with [`bind_stop`](Self::bind_stop).
    pub fn bind_start(&self) -> Capture {
        Capture::new()
    }

    /// Binds the captured text under `key`.
    pub fn bind_stop(&mut self, key: &str, capture: Capture) {
        self.bind_value(key, Value::String(capture.into_string()));
    }

    /// Renders an in-memory template source against the bound data.
    ///
    /// Includes resolve against the configured directory.
    pub fn render(&self, source: &str) -> Result<String> {
        let expanded = expand_includes(&self.config, source, None)?;
        self.pass().render(&expanded, &self.data)
    }

    /// Renders the selected template file.
    ///
    /// # Errors
    ///
    /// [`RenderError::TemplateNotSet`] if no template was selected, plus any
    /// error raised while reading the file or resolving its directives.
    pub fn retrieve(&self) -> Result<String> {
        let name = self.name.as_deref().ok_or(RenderError::TemplateNotSet)?;
        let path = self.path().ok_or(RenderError::TemplateNotSet)?;
        self.config.check_directory()?;
        if !path.is_file() {
            return Err(RenderError::TemplateNotFound(path));
        }

        tracing::debug!(template = name, "rendering");
        let source = std::fs::read_to_string(&path).map_err(|e| io_context(&path, e))?;
        let expanded = expand_includes(&self.config, &source, Some(&path))?;
        let output = self.pass().render(&expanded, &self.data)?;

        let output = filter_text(
            self.hooks.as_ref(),
            &format!("render_template_{}", name),
            output,
        );
        Ok(filter_text(self.hooks.as_ref(), "render_template", output))
    }

    /// Renders the selected template to standard output.
    pub fn show(&self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.show_to(&mut lock)
    }

    /// Renders the selected template to `writer`.
    ///
    /// The whole output is rendered before anything is written, so a failed
    /// render writes nothing.
    pub fn show_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        let output = self.retrieve()?;
        writer.write_all(output.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// The selected template name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The selected template file, if any.
    pub fn path(&self) -> Option<PathBuf> {
        self.name.as_deref().map(|name| self.config.path_for(name))
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// The bound data.
    pub fn data(&self) -> &Context {
        &self.data
    }

    fn pass(&self) -> Pass<'_> {
        Pass::new(self.hooks.as_ref(), self.config.strict)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("config", &self.config)
            .field("name", &self.name)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
