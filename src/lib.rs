//! StempelWerk generates files from Jinja templates.
//! It decides which templates need re-processing, renders them and splits
//! the output of every template into any number of files.

/// Command-line interface module for the StempelWerk application
pub mod cli;

/// Configuration handling
/// Supports JSON and YAML formats
pub mod config;

/// Error types and handling for the StempelWerk application
pub mod error;

pub mod logger;

/// Environment plugins (custom filters and tests)
pub mod plugin;

/// Core template processing orchestration
/// Combines all components to generate the final output
pub mod processor;

/// Template rendering
pub mod renderer;

/// Directory and file selection rules
pub mod selector;

/// Splitting rendered output into files and writing them
pub mod splitter;

pub mod timestamp;

/// Last-run marker for incremental runs
pub mod tracker;

/// Ordered, selective directory walk
pub mod walker;
