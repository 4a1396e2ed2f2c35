//! Configuration handling for StempelWerk.
//! Loads the JSON (or YAML) configuration file, resolves every path against
//! the root directory and parses the global namespace handed to templates.

use crate::error::{Error, Result};
use crate::splitter::{LineEnding, LineEndingPolicy, Markers};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Rendering options forwarded to the template environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JinjaOptions {
    pub trim_blocks: bool,
    pub lstrip_blocks: bool,
    pub keep_trailing_newline: bool,
}

fn default_last_run_file() -> String {
    ".last_run".to_string()
}

fn default_marker_new_file() -> String {
    "### New file:".to_string()
}

fn default_marker_content() -> String {
    "### Content:".to_string()
}

fn default_executable_suffixes() -> Vec<String> {
    vec![".sh".to_string()]
}

/// Configuration file as written by the user.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    root_dir: String,
    template_dir: String,
    output_dir: String,
    #[serde(default, alias = "included_suffixes", alias = "included_file_extensions")]
    included_file_names: Vec<String>,
    #[serde(default)]
    excluded_file_names: Vec<String>,
    #[serde(default)]
    stencil_dir_name: String,
    #[serde(default)]
    create_directories: bool,
    #[serde(default)]
    jinja_options: JinjaOptions,
    #[serde(default)]
    custom_modules: Vec<String>,
    #[serde(default = "default_last_run_file")]
    last_run_file: String,
    #[serde(default = "default_marker_new_file")]
    marker_new_file: String,
    #[serde(default = "default_marker_content")]
    marker_content: String,
    #[serde(default)]
    newline: Option<LineEnding>,
    #[serde(default)]
    newline_overrides: IndexMap<String, LineEnding>,
    #[serde(default = "default_executable_suffixes")]
    executable_suffixes: Vec<String>,
}

/// Resolved, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root_dir: PathBuf,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub included_file_names: Vec<String>,
    pub excluded_file_names: Vec<String>,
    /// Name of the directories holding stencils; empty if there are none.
    pub stencil_dir_name: String,
    pub create_directories: bool,
    pub jinja_options: JinjaOptions,
    /// Names of environment plugins, applied in this order.
    pub custom_modules: Vec<String>,
    pub last_run_file: PathBuf,
    pub markers: Markers,
    pub line_endings: LineEndingPolicy,
    pub executable_suffixes: Vec<String>,
    pub global_namespace: serde_json::Map<String, serde_json::Value>,
}

/// Expands a leading `~` and joins `original` onto `root_dir`.
pub fn finalize_path<P: AsRef<Path>>(root_dir: P, original: &str) -> PathBuf {
    let original = original.trim();

    let expanded = match original.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(rest.trim_start_matches('/')),
                None => PathBuf::from(original),
            }
        }
        _ => PathBuf::from(original),
    };

    root_dir.as_ref().join(expanded)
}

impl Settings {
    /// Loads settings from a configuration file and creates the template and
    /// output directories if they are missing.
    ///
    /// # Arguments
    /// * `config_path` - Configuration file; `root_dir` is relative to its directory
    /// * `globals` - Inline JSON object or path to a JSON file
    ///
    /// # Errors
    /// * `Error::ConfigNotFoundError` if the configuration or globals file is missing
    /// * `Error::ConfigError` if either cannot be parsed
    pub fn load<P: AsRef<Path>>(config_path: P, globals: Option<&str>) -> Result<Self> {
        let config_path = config_path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let content = read_config_file(config_path)?;
        let is_yaml = matches!(
            config_path.extension().and_then(|ext| ext.to_str()),
            Some("yml") | Some("yaml")
        );
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new(""));

        let mut settings = Self::parse(&content, is_yaml, base_dir)?;
        settings.global_namespace = parse_globals(globals)?;
        settings.ensure_directories()?;

        Ok(settings)
    }

    /// Parses configuration content without touching the file system.
    pub fn parse<P: AsRef<Path>>(content: &str, is_yaml: bool, base_dir: P) -> Result<Self> {
        let file: ConfigFile = if is_yaml {
            serde_yaml::from_str(content)
                .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {e}")))?
        } else {
            serde_json::from_str(content)
                .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {e}")))?
        };

        let markers = Markers::new(file.marker_new_file, file.marker_content)?;

        let root_dir = finalize_path(base_dir, &file.root_dir);
        let template_dir = finalize_path(&root_dir, &file.template_dir);
        let output_dir = finalize_path(&root_dir, &file.output_dir);
        let last_run_file = finalize_path(&root_dir, &file.last_run_file);

        let line_endings = LineEndingPolicy::new(file.newline, file.newline_overrides);

        Ok(Self {
            root_dir,
            template_dir,
            output_dir,
            included_file_names: file.included_file_names,
            excluded_file_names: file.excluded_file_names,
            stencil_dir_name: file.stencil_dir_name.trim().to_string(),
            create_directories: file.create_directories,
            jinja_options: file.jinja_options,
            custom_modules: file.custom_modules,
            last_run_file,
            markers,
            line_endings,
            executable_suffixes: file.executable_suffixes,
            global_namespace: serde_json::Map::new(),
        })
    }

    /// Creates the template and output directories.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.template_dir, &self.output_dir] {
            if !dir.is_dir() {
                debug!("Creating directory {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ConfigNotFoundError { path: path.display().to_string() },
        _ => Error::IoError(e),
    })
}

/// Parses the global namespace passed on the command line.
///
/// Values starting with `{` are parsed as inline JSON, anything else is the
/// path of a JSON file. No value yields an empty namespace.
pub fn parse_globals(globals: Option<&str>) -> Result<serde_json::Map<String, serde_json::Value>> {
    let Some(globals) = globals else {
        return Ok(serde_json::Map::new());
    };

    let (content, source) = if globals.trim_start().starts_with('{') {
        (globals.to_string(), "command line".to_string())
    } else {
        let path = finalize_path("", globals);
        (read_config_file(&path)?, path.display().to_string())
    };

    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| Error::ConfigError(format!("Global variables from {source} are broken: {e}")))?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(Error::ConfigError(format!(
            "Global variables from {source} must be a JSON object"
        ))),
    }
}
