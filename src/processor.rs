//! Core template processing orchestration.
//!
//! One run walks the template directory, renders every selected template,
//! splits the output into files and writes them. The start of the run is
//! persisted afterwards so that the next incremental run only picks up
//! templates modified since.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::renderer::TemplateRenderer;
use crate::selector::Selector;
use crate::splitter::OutputWriter;
use crate::tracker::{RunStart, RunTracker};
use crate::walker::{walk, WalkOptions};
use log::{info, trace};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

/// Totals of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed_templates: usize,
    pub saved_files: usize,
    pub elapsed: Duration,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TOTAL: {} templates => {} files in {:.3?}",
            self.processed_templates, self.saved_files, self.elapsed
        )
    }
}

pub struct Processor<'a> {
    settings: &'a Settings,
    renderer: &'a dyn TemplateRenderer,
    writer: OutputWriter,
    tracker: RunTracker,
}

impl<'a> Processor<'a> {
    pub fn new(settings: &'a Settings, renderer: &'a dyn TemplateRenderer) -> Self {
        Self {
            settings,
            renderer,
            writer: OutputWriter::from_settings(settings),
            tracker: RunTracker::new(&settings.last_run_file),
        }
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    /// Selector for templates: stencil directories are never rendered directly.
    pub fn selector(&self, cutoff: Option<i64>) -> Result<Selector> {
        let excluded_directory_names = [self.settings.stencil_dir_name.as_str()];
        let excluded_file_names: Vec<&str> =
            self.settings.excluded_file_names.iter().map(String::as_str).collect();
        let included_file_names: Vec<&str> =
            self.settings.included_file_names.iter().map(String::as_str).collect();

        let selector = Selector::new(
            &excluded_directory_names[..],
            &excluded_file_names[..],
            &included_file_names[..],
        )?;
        Ok(selector.with_cutoff(cutoff))
    }

    /// Name of a template for the renderer: its path relative to the
    /// template directory, separated by forward slashes on every platform.
    pub fn template_name<P: AsRef<Path>>(&self, template_path: P) -> Result<String> {
        let template_path = template_path.as_ref();
        let relative = template_path.strip_prefix(&self.settings.template_dir).map_err(|_| {
            Error::ConfigError(format!(
                "Template '{}' is not inside '{}'",
                template_path.display(),
                self.settings.template_dir.display()
            ))
        })?;

        Ok(relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"))
    }

    /// Verifies that the template directory holds templates and, when
    /// stencils are configured, at least one stencil.
    ///
    /// # Errors
    /// * `Error::NoTemplatesError` if the template directory holds no files
    /// * `Error::NoStencilsError` if no file lies in a stencil directory
    pub fn check_templates(&self) -> Result<()> {
        let all_files = walk(&self.settings.template_dir, WalkOptions::default(), &Selector::default())?;
        if all_files.is_empty() {
            return Err(Error::NoTemplatesError {
                template_dir: self.settings.template_dir.display().to_string(),
            });
        }

        let stencil_dir_name = self.settings.stencil_dir_name.as_str();
        if stencil_dir_name.is_empty() {
            return Ok(());
        }

        let stencils: Vec<PathBuf> = all_files
            .into_iter()
            .filter_map(|path| {
                let relative = path.strip_prefix(&self.settings.template_dir).ok()?.to_path_buf();
                relative
                    .components()
                    .any(|component| component.as_os_str() == stencil_dir_name)
                    .then_some(relative)
            })
            .collect();

        if stencils.is_empty() {
            return Err(Error::NoStencilsError { stencil_dir_name: stencil_dir_name.to_string() });
        }

        trace!("Available stencils:");
        for stencil in &stencils {
            trace!("  - {}", stencil.display());
        }
        Ok(())
    }

    /// Renders one template and writes the files it declares.
    ///
    /// Returns the number of files written.
    pub fn render_template<P: AsRef<Path>>(
        &self,
        template_path: P,
        globals: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<usize> {
        let template_name = self.template_name(template_path)?;
        info!("- {template_name}");

        let rendered = self.renderer.render(&template_name, globals)?;
        self.writer.write_rendered(&rendered, &self.settings.markers)
    }

    /// Runs the whole pipeline.
    ///
    /// # Arguments
    /// * `only_modified` - Skip templates not modified since the last run
    /// * `extra_globals` - Overwrites entries of the configured global namespace
    ///
    /// # Errors
    /// * `Error::NoTemplatesError` if a full run finds no template
    ///
    /// Any error stops the run; files written before it are kept and the run
    /// marker is left untouched.
    pub fn process_templates(
        &self,
        only_modified: bool,
        extra_globals: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<RunStats> {
        // captured before reading any template, so files changed while this
        // run is in progress count as modified on the next run
        let start = RunStart::now();
        let clock = Instant::now();

        let cutoff = self.tracker.cutoff(only_modified)?;
        let selector = self.selector(cutoff)?;
        let templates = walk(&self.settings.template_dir, WalkOptions::default(), &selector)?;

        if templates.is_empty() {
            // an incremental run may legitimately find nothing to do
            if cutoff.is_none() {
                return Err(Error::NoTemplatesError {
                    template_dir: self.settings.template_dir.display().to_string(),
                });
            }
            info!("No templates to process.");
            return Ok(RunStats { elapsed: clock.elapsed(), ..RunStats::default() });
        }

        self.check_templates()?;

        let mut globals = self.settings.global_namespace.clone();
        if let Some(extra_globals) = extra_globals {
            for (key, value) in extra_globals {
                globals.insert(key.clone(), value.clone());
            }
        }

        let mut saved_files = 0;
        for template in &templates {
            saved_files += self.render_template(template, &globals)?;
        }

        self.tracker.commit(start, templates.len())?;

        let stats = RunStats {
            processed_templates: templates.len(),
            saved_files,
            elapsed: clock.elapsed(),
        };
        trace!("Time per template file: {:?}", stats.elapsed / stats.processed_templates as u32);
        if stats.saved_files > 0 {
            trace!("Time per output file:   {:?}", stats.elapsed / stats.saved_files as u32);
        }

        Ok(stats)
    }
}
