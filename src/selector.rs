//! Rules deciding which directories and files a walk picks up.
//!
//! Directory names are compared exactly. File patterns are globs matched
//! against the file name; a pattern containing `/` is matched against as
//! many trailing path components as it has.

use crate::error::Result;
use crate::timestamp::unix_ceil;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};
use std::time::SystemTime;

/// Glob patterns grouped by the number of path components they span.
#[derive(Debug, Clone)]
enum PatternSet {
    Any,
    Globs(Vec<(usize, GlobSet)>),
}

impl PatternSet {
    fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builders: BTreeMap<usize, GlobSetBuilder> = BTreeMap::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim_matches('/');
            let depth = pattern.split('/').filter(|part| !part.is_empty()).count();
            let glob = GlobBuilder::new(pattern).literal_separator(true).build()?;
            builders.entry(depth.max(1)).or_insert_with(GlobSetBuilder::new).add(glob);
        }

        let mut by_depth = Vec::with_capacity(builders.len());
        for (depth, builder) in builders {
            by_depth.push((depth, builder.build()?));
        }
        Ok(Self::Globs(by_depth))
    }

    fn is_match(&self, path: &Path) -> bool {
        let by_depth = match self {
            Self::Any => return true,
            Self::Globs(by_depth) if by_depth.is_empty() => return false,
            Self::Globs(by_depth) => by_depth,
        };

        let components: Vec<String> = path
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        by_depth.iter().any(|(depth, globs)| {
            if components.len() < *depth {
                return false;
            }
            let suffix = components[components.len() - depth..].join("/");
            globs.is_match(suffix)
        })
    }
}

/// Which entries a walk includes.
///
/// Immutable once built; one selector drives a whole walk.
#[derive(Debug, Clone)]
pub struct Selector {
    excluded_directory_names: BTreeSet<String>,
    excluded_file_names: PatternSet,
    included_file_names: PatternSet,
    modification_cutoff: Option<i64>,
}

impl Selector {
    /// Builds a selector. An empty inclusion list includes every file.
    ///
    /// # Errors
    /// * `Error::GlobError` if a pattern is not a valid glob
    pub fn new<S: AsRef<str>>(
        excluded_directory_names: &[S],
        excluded_file_names: &[S],
        included_file_names: &[S],
    ) -> Result<Self> {
        let included_file_names = if included_file_names.is_empty() {
            PatternSet::Any
        } else {
            PatternSet::new(included_file_names)?
        };

        Ok(Self {
            excluded_directory_names: excluded_directory_names
                .iter()
                .map(|name| name.as_ref().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            excluded_file_names: PatternSet::new(excluded_file_names)?,
            included_file_names,
            modification_cutoff: None,
        })
    }

    /// Only include files whose rounded-up modification time is at or after
    /// `cutoff` (UNIX seconds).
    pub fn with_cutoff(mut self, cutoff: Option<i64>) -> Self {
        self.modification_cutoff = cutoff;
        self
    }

    pub fn cutoff(&self) -> Option<i64> {
        self.modification_cutoff
    }

    /// Directories are only filtered by name so that modified files deep
    /// inside old directories are still found.
    pub fn includes_directory(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => !self.excluded_directory_names.contains(name.to_string_lossy().as_ref()),
            None => true,
        }
    }

    /// Applies the exclusion and inclusion patterns to a file path.
    pub fn includes_file_name(&self, path: &Path) -> bool {
        if self.excluded_file_names.is_match(path) {
            return false;
        }
        self.included_file_names.is_match(path)
    }

    /// Boundary inclusive: a file modified within the cutoff second passes.
    pub fn is_modified(&self, modified: SystemTime) -> bool {
        match self.modification_cutoff {
            Some(cutoff) => unix_ceil(modified) >= cutoff,
            None => true,
        }
    }

    /// Full file check. `modified` is only called when a cutoff is set, so
    /// a full run never stats a file.
    pub fn includes_file<F>(&self, path: &Path, modified: F) -> Result<bool>
    where
        F: FnOnce() -> Result<SystemTime>,
    {
        if !self.includes_file_name(path) {
            return Ok(false);
        }
        if self.modification_cutoff.is_none() {
            return Ok(true);
        }
        Ok(self.is_modified(modified()?))
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self {
            excluded_directory_names: BTreeSet::new(),
            excluded_file_names: PatternSet::Globs(Vec::new()),
            included_file_names: PatternSet::Any,
            modification_cutoff: None,
        }
    }
}
