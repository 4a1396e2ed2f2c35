//! Template renderer and rendering functionality for StempelWerk.
//! Templates are loaded by name from the template directory and rendered
//! with MiniJinja; stencils are reachable through the same loader.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::plugin::PluginRegistry;
use log::trace;
use minijinja::{context, path_loader, Environment, ErrorKind, Value};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template.
    ///
    /// # Arguments
    /// * `template_name` - Forward-slash separated path relative to the template directory
    /// * `globals` - Global namespace, exposed to templates as `globals`
    ///
    /// # Returns
    /// * `Result<String>` - Rendered text, possibly holding several files
    fn render(
        &self,
        template_name: &str,
        globals: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates the environment for `settings` and applies the configured
    /// plugins from `registry`.
    ///
    /// # Errors
    /// * `Error::PluginError` if a plugin is unknown or fails
    pub fn new(settings: &Settings, registry: &PluginRegistry) -> Result<Self> {
        let mut env = Environment::new();
        env.set_loader(path_loader(settings.template_dir.clone()));
        env.set_trim_blocks(settings.jinja_options.trim_blocks);
        env.set_lstrip_blocks(settings.jinja_options.lstrip_blocks);
        env.set_keep_trailing_newline(settings.jinja_options.keep_trailing_newline);

        if !settings.custom_modules.is_empty() {
            trace!("Loading custom modules:");
        }
        let env = registry.apply_all(env, &settings.custom_modules, settings)?;

        Ok(Self { env })
    }

    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }
}

fn render_error(template_name: &str, err: minijinja::Error) -> Error {
    if err.kind() == ErrorKind::SyntaxError {
        return Error::TemplateSyntaxError {
            template: err.name().unwrap_or(template_name).to_string(),
            line: err.line().unwrap_or(0),
            message: err.detail().unwrap_or("syntax error").to_string(),
        };
    }
    Error::TemplateError { template: template_name.to_string(), source: err }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(
        &self,
        template_name: &str,
        globals: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<String> {
        let template =
            self.env.get_template(template_name).map_err(|e| render_error(template_name, e))?;

        template
            .render(context! { globals => Value::from_serialize(globals) })
            .map_err(|e| render_error(template_name, e))
    }
}
