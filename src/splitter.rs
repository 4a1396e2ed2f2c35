//! Splitting of rendered template output into files, and writing them.
//!
//! A single template renders to one text blob. Each file inside it starts
//! with the "new file" marker, followed by the relative output path, the
//! "content" marker and the file content:
//!
//! ```text
//! ### New file: sql/create_table.sql
//! ### Content:
//! CREATE TABLE ...
//! ```

use crate::config::Settings;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// The two sentinels separating files in rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    new_file: String,
    content: String,
}

impl Markers {
    /// # Errors
    /// * `Error::ConfigError` if a marker is empty or one marker contains the
    ///   other, which would make splitting ambiguous
    pub fn new<S: Into<String>>(new_file: S, content: S) -> Result<Self> {
        let (new_file, content) = (new_file.into(), content.into());
        if new_file.is_empty() || content.is_empty() {
            return Err(Error::ConfigError(
                "\"marker_new_file\" and \"marker_content\" must not be empty".to_string(),
            ));
        }
        if new_file.contains(&content) || content.contains(&new_file) {
            return Err(Error::ConfigError(
                "\"marker_new_file\" and \"marker_content\" must not contain each other"
                    .to_string(),
            ));
        }
        Ok(Self { new_file, content })
    }

    pub fn new_file(&self) -> &str {
        &self.new_file
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Line ending written to an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LineEnding {
    Lf,
    CrLf,
    /// Whatever the platform uses
    Native,
}

impl TryFrom<String> for LineEnding {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "\n" | "lf" => Ok(Self::Lf),
            "\r\n" | "crlf" => Ok(Self::CrLf),
            "" | "native" => Ok(Self::Native),
            other => Err(format!("unknown newline {other:?}, expected \"lf\", \"crlf\" or \"native\"")),
        }
    }
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Native if cfg!(windows) => "\r\n",
            Self::Native => "\n",
        }
    }

    /// Rewrites every line break of `content` to this line ending.
    ///
    /// `Native` keeps the rendered line breaks where the platform uses `\n`.
    pub fn apply<'a>(&self, content: &'a str) -> Cow<'a, str> {
        if *self == Self::Native && !cfg!(windows) {
            return Cow::Borrowed(content);
        }

        let normalized = if content.contains("\r\n") {
            Cow::Owned(content.replace("\r\n", "\n"))
        } else {
            Cow::Borrowed(content)
        };

        match self.as_str() {
            "\n" => normalized,
            ending => Cow::Owned(normalized.replace('\n', ending)),
        }
    }
}

/// Maps file extensions to forced line endings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEndingPolicy {
    default: LineEnding,
    by_extension: IndexMap<String, LineEnding>,
}

impl Default for LineEndingPolicy {
    fn default() -> Self {
        Self::new(None, IndexMap::new())
    }
}

impl LineEndingPolicy {
    /// Batch files must use Windows line endings, otherwise seemingly random
    /// lines get executed. `overrides` replace or extend the built-in table.
    pub fn new(default: Option<LineEnding>, overrides: IndexMap<String, LineEnding>) -> Self {
        let mut by_extension = IndexMap::from([
            (".bat".to_string(), LineEnding::CrLf),
            (".ps1".to_string(), LineEnding::CrLf),
            (".sh".to_string(), LineEnding::Lf),
        ]);

        for (extension, ending) in overrides {
            let extension = if extension.starts_with('.') {
                extension
            } else {
                format!(".{extension}")
            };
            by_extension.insert(extension, ending);
        }

        Self { default: default.unwrap_or(LineEnding::Native), by_extension }
    }

    pub fn for_path(&self, path: &Path) -> LineEnding {
        path.extension()
            .and_then(|extension| {
                self.by_extension.get(&format!(".{}", extension.to_string_lossy())).copied()
            })
            .unwrap_or(self.default)
    }
}

/// One output file: a path relative to the output directory and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteUnit {
    pub path: PathBuf,
    pub content: String,
}

impl WriteUnit {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(path: P, content: S) -> Self {
        Self { path: path.into(), content: content.into() }
    }
}

fn marker_error<S: Into<String>>(reason: S) -> Error {
    Error::MarkerError { reason: reason.into() }
}

/// Splits rendered output into write units, in order of appearance.
///
/// Whitespace-only chunks (normally the text before the first marker) are
/// dropped. Every other chunk needs exactly one content marker and a file
/// name; files without content are skipped.
///
/// # Errors
/// * `Error::MarkerError` if any chunk is malformed; nothing of the blob
///   should be written in that case
pub fn split_output(rendered: &str, markers: &Markers) -> Result<Vec<WriteUnit>> {
    let mut units = Vec::new();

    for chunk in rendered.split(markers.new_file()) {
        if chunk.trim().is_empty() {
            continue;
        }

        let content_markers = chunk.matches(markers.content()).count();
        if content_markers != 1 {
            return Err(marker_error(format!(
                "expected one \"marker_content\" per file, found {content_markers}"
            )));
        }

        let (path, content) = chunk
            .split_once(markers.content())
            .ok_or_else(|| marker_error("\"marker_content\" not found"))?;

        let path = path.trim();
        if path.is_empty() {
            return Err(marker_error("file name is empty"));
        }

        let content = content.trim_start();
        if content.is_empty() {
            debug!("  - skipping '{path}', nothing to write");
            continue;
        }

        units.push(WriteUnit::new(path, content));
    }

    Ok(units)
}

/// Writes units below an output directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    create_directories: bool,
    line_endings: LineEndingPolicy,
    executable_suffixes: Vec<String>,
}

impl OutputWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P, create_directories: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            create_directories,
            line_endings: LineEndingPolicy::default(),
            executable_suffixes: vec![".sh".to_string()],
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            create_directories: settings.create_directories,
            line_endings: settings.line_endings.clone(),
            executable_suffixes: settings.executable_suffixes.clone(),
        }
    }

    pub fn with_line_endings(mut self, line_endings: LineEndingPolicy) -> Self {
        self.line_endings = line_endings;
        self
    }

    pub fn with_executable_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.executable_suffixes = suffixes;
        self
    }

    pub fn target_path(&self, unit: &WriteUnit) -> PathBuf {
        self.output_dir.join(&unit.path)
    }

    /// Splits `rendered` and writes every file in it.
    ///
    /// All chunks are validated before the first file is written.
    /// Returns the number of files written.
    pub fn write_rendered(&self, rendered: &str, markers: &Markers) -> Result<usize> {
        let units = split_output(rendered, markers)?;
        for unit in &units {
            self.write(unit)?;
        }
        Ok(units.len())
    }

    /// Writes one unit and returns its absolute path.
    ///
    /// # Errors
    /// * `Error::MissingDirectoryError` if the parent directory is missing and
    ///   directories may not be created
    /// * `Error::IoError` if writing fails
    pub fn write(&self, unit: &WriteUnit) -> Result<PathBuf> {
        let target = self.target_path(unit);

        if let Some(parent) = target.parent() {
            if !parent.is_dir() {
                if !self.create_directories {
                    return Err(Error::MissingDirectoryError {
                        directory: parent.display().to_string(),
                    });
                }
                fs::create_dir_all(parent)?;
                debug!("  - created directory '{}'", parent.display());
            }
        }

        let ending = self.line_endings.for_path(&target);
        fs::write(&target, ending.apply(&unit.content).as_bytes())?;
        debug!("  - {}", unit.path.display());

        if self.is_executable(&target) {
            make_executable(&target)?;
        }

        Ok(target)
    }

    fn is_executable(&self, path: &Path) -> bool {
        let name = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
        self.executable_suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

/// Grants the owner execute permission. No-op outside Unix.
fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(permissions.mode() | 0o100);
        fs::set_permissions(path, permissions)?;
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Markers {
        Markers::new("### New file:", "### Content:").unwrap()
    }

    #[test]
    fn test_markers_must_differ() {
        assert!(Markers::new("", "### Content:").is_err());
        assert!(Markers::new("###", "###").is_err());
    }

    #[test]
    fn test_markers_must_not_overlap() {
        assert!(matches!(Markers::new("###", "### Content:"), Err(Error::ConfigError(_))));
        assert!(matches!(Markers::new("### New file:", "New"), Err(Error::ConfigError(_))));
        assert!(Markers::new("### New file:", "### Content:").is_ok());
    }

    #[test]
    fn test_line_ending_from_config_strings() {
        assert_eq!(LineEnding::try_from("\r\n".to_string()), Ok(LineEnding::CrLf));
        assert_eq!(LineEnding::try_from("LF".to_string()), Ok(LineEnding::Lf));
        assert_eq!(LineEnding::try_from("".to_string()), Ok(LineEnding::Native));
        assert!(LineEnding::try_from("\r".to_string()).is_err());
    }

    #[test]
    fn test_apply_normalizes_first() {
        assert_eq!(LineEnding::CrLf.apply("a\r\nb\n"), "a\r\nb\r\n");
        assert_eq!(LineEnding::Lf.apply("a\r\nb\n"), "a\nb\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_native_keeps_rendered_line_breaks() {
        assert_eq!(LineEnding::Native.apply("a\r\nb\n"), "a\r\nb\n");
    }

    #[test]
    fn test_policy_table_and_overrides() {
        let overrides = IndexMap::from([
            ("sh".to_string(), LineEnding::CrLf),
            (".sql".to_string(), LineEnding::CrLf),
        ]);
        let policy = LineEndingPolicy::new(Some(LineEnding::Lf), overrides);

        assert_eq!(policy.for_path(Path::new("run.bat")), LineEnding::CrLf);
        assert_eq!(policy.for_path(Path::new("run.sh")), LineEnding::CrLf);
        assert_eq!(policy.for_path(Path::new("a/b.sql")), LineEnding::CrLf);
        assert_eq!(policy.for_path(Path::new("a/b.txt")), LineEnding::Lf);
        assert_eq!(policy.for_path(Path::new("Makefile")), LineEnding::Lf);
    }

    #[test]
    fn test_leading_noise_is_dropped() {
        let units = split_output("  \n### New file: a.txt\n### Content:\n\nX\n", &markers()).unwrap();
        assert_eq!(units, vec![WriteUnit::new("a.txt", "X\n")]);
    }

    #[test]
    fn test_blank_content_is_skipped() {
        let rendered = "### New file: a.txt\n### Content:\n  \n### New file: b.txt\n### Content:B";
        assert_eq!(split_output(rendered, &markers()).unwrap(), vec![WriteUnit::new("b.txt", "B")]);
    }

    #[test]
    fn test_nothing_to_split() {
        assert!(split_output("", &markers()).unwrap().is_empty());
        assert!(split_output("\n\n", &markers()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_content_marker() {
        let result = split_output("### New file: a.txt\nX", &markers());
        assert!(matches!(result, Err(Error::MarkerError { .. })));
    }

    #[test]
    fn test_text_before_first_marker() {
        let result = split_output("oops\n### New file: a.txt\n### Content:X", &markers());
        assert!(matches!(result, Err(Error::MarkerError { .. })));
    }

    #[test]
    fn test_two_content_markers() {
        let rendered = "### New file: a.txt\n### Content:X\n### Content:Y";
        assert!(matches!(split_output(rendered, &markers()), Err(Error::MarkerError { .. })));
    }

    #[test]
    fn test_empty_file_name() {
        let rendered = "### New file:   \n### Content:X";
        assert!(matches!(split_output(rendered, &markers()), Err(Error::MarkerError { .. })));
    }
}
