//! Plugins customizing the template environment.
//!
//! A plugin receives the environment and a copy of the settings and returns
//! the updated environment. Plugins run in the order listed under
//! `custom_modules`; any failure stops the run.

use crate::config::Settings;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::trace;
use minijinja::Environment;

/// Capability to update the template environment before rendering.
pub trait EnvironmentPlugin {
    /// Name used in the `custom_modules` setting.
    fn name(&self) -> &str;

    /// Updates the environment. `settings` is a copy; changing it has no
    /// effect on the run.
    fn apply(&self, env: Environment<'static>, settings: Settings) -> Result<Environment<'static>>;
}

/// Adds the `upper_first` and `add_exclamation_mark` filters.
pub struct TextFilters;

impl EnvironmentPlugin for TextFilters {
    fn name(&self) -> &str {
        "add_filters"
    }

    fn apply(&self, mut env: Environment<'static>, _: Settings) -> Result<Environment<'static>> {
        env.add_filter("upper_first", |value: String| -> String {
            let mut chars = value.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        });
        env.add_filter("add_exclamation_mark", |value: String, is_spanish: Option<bool>| -> String {
            if is_spanish.unwrap_or(false) {
                format!("¡{value}!")
            } else {
                format!("{value}!")
            }
        });
        trace!("Added 2 filters: \"add_exclamation_mark\", \"upper_first\"");
        Ok(env)
    }
}

/// Adds the `spanish` test.
pub struct LanguageTests;

impl EnvironmentPlugin for LanguageTests {
    fn name(&self) -> &str {
        "add_tests"
    }

    fn apply(&self, mut env: Environment<'static>, _: Settings) -> Result<Environment<'static>> {
        env.add_test("spanish", |value: String| -> bool { value.contains("este es") });
        trace!("Added 1 test: \"spanish\"");
        Ok(env)
    }
}

/// Plugins available by name.
pub struct PluginRegistry {
    plugins: IndexMap<String, Box<dyn EnvironmentPlugin>>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PluginRegistry {
    pub fn empty() -> Self {
        Self { plugins: IndexMap::new() }
    }

    /// Registry holding the plugins shipped with StempelWerk.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(TextFilters));
        registry.register(Box::new(LanguageTests));
        registry
    }

    /// Registers a plugin, replacing any plugin of the same name.
    pub fn register(&mut self, plugin: Box<dyn EnvironmentPlugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Applies the named plugins in order.
    ///
    /// # Errors
    /// * `Error::PluginError` if a name is unknown, or whatever the plugin returns
    pub fn apply_all<S: AsRef<str>>(
        &self,
        mut env: Environment<'static>,
        names: &[S],
        settings: &Settings,
    ) -> Result<Environment<'static>> {
        for name in names {
            let name = name.as_ref();
            let plugin = self.plugins.get(name).ok_or_else(|| Error::PluginError {
                name: name.to_string(),
                message: format!(
                    "unknown plugin (available: {})",
                    self.names().collect::<Vec<_>>().join(", ")
                ),
            })?;

            trace!("  [ {name} ]");
            env = plugin.apply(env, settings.clone())?;
        }
        Ok(env)
    }
}
