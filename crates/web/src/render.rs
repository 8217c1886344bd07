//! Template rendering boundary.
//!
//! The handler chain only sees the [`Renderer`] trait; [`HandlebarsRenderer`] is the
//! implementation shipped with the crate. Templates are registered before serving
//! starts and are read-only afterwards.

use crate::error::RenderError;
use handlebars::Handlebars;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;

/// Turns a named template plus data into an HTML body.
#[cfg_attr(test, mockall::automock)]
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError>;
}

/// A [`Renderer`] backed by a Handlebars registry.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        Self { registry }
    }

    /// Loads every file under `dir` whose extension is `extension`, recursively.
    ///
    /// A template is named after its path relative to `dir` without the extension,
    /// with `/` as separator: `templates/user/show.hbs` registers `user/show`.
    pub fn from_directory(dir: impl AsRef<Path>, extension: &str) -> Result<Self, RenderError> {
        let mut renderer = Self::new();
        let dir = dir.as_ref();
        renderer.load_dir(dir, dir, extension.trim_start_matches('.'))?;
        Ok(renderer)
    }

    pub fn register_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.registry.register_template_string(name, source)?;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    fn load_dir(&mut self, base: &Path, dir: &Path, extension: &str) -> Result<(), RenderError> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.load_dir(base, &path, extension)?;
                continue;
            }
            if path.extension().is_none_or(|ext| ext != extension) {
                continue;
            }

            let name = path
                .strip_prefix(base)
                .unwrap_or(&path)
                .with_extension("")
                .to_string_lossy()
                .replace('\\', "/");
            let source = fs::read_to_string(&path)?;
            self.register_template(&name, &source)?;
        }
        Ok(())
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlebarsRenderer").field("templates", &self.registry.get_templates().len()).finish()
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError> {
        Ok(self.registry.render(template, data)?)
    }
}
