//! Error handling for StempelWerk.
//! Defines the error type and result alias used throughout the application.

use std::io;
use thiserror::Error;

/// All errors that can stop a StempelWerk run.
///
/// Every variant is fatal: the caller reports it and the process exits
/// with a non-zero status. Files written by earlier templates of the same
/// run are left in place.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Listing a directory failed while walking the template tree
    #[error("Failed to walk directory: {0}.")]
    WalkError(#[from] walkdir::Error),

    /// A file name pattern could not be compiled
    #[error("Invalid file name pattern: {0}.")]
    GlobError(#[from] globset::Error),

    #[error("File '{path}' not found.")]
    ConfigNotFoundError { path: String },

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("Template syntax error in '{template}' (line {line}): {message}.")]
    TemplateSyntaxError { template: String, line: usize, message: String },

    /// Any other failure reported by the rendering engine
    #[error("Failed to render template '{template}': {source}.")]
    TemplateError {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("No templates found in '{template_dir}'.")]
    NoTemplatesError { template_dir: String },

    #[error("No stencils found in directories named '{stencil_dir_name}'.")]
    NoStencilsError { stencil_dir_name: String },

    /// Rendered output could not be split into files
    #[error(
        "There was a problem with splitting the output into files ({reason}); check \"marker_new_file\", \"marker_content\" and your templates."
    )]
    MarkerError { reason: String },

    #[error("Directory '{directory}' does not exist.")]
    MissingDirectoryError { directory: String },

    #[error("Last run file '{path}' is broken: '{content}' is not a UNIX timestamp.")]
    RunMarkerError { path: String, content: String },

    #[error("Plugin '{name}' failed: {message}.")]
    PluginError { name: String, message: String },
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("ERROR: {err}");
    std::process::exit(1);
}
