//! Selective, deterministically ordered directory walk.
//!
//! Within one directory, directories and files are each sorted by path.
//! `directories_first` decides whether the fully expanded sub-directories
//! of a level come before or after the files of that same level, at every
//! depth. With `include_directories`, a directory is emitted right before
//! its own contents.

use crate::error::Result;
use crate::selector::Selector;
use log::trace;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Traversal flags that do not depend on file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub directories_first: bool,
    pub include_directories: bool,
    /// Symbolic links are invisible unless this is set; when set they are
    /// treated as whatever they point to.
    pub follow_symlinks: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self { directories_first: true, include_directories: false, follow_symlinks: false }
    }
}

/// Kinds of symbolic links resolved while sorting.
///
/// Sorting sees entries before walkdir follows them, so a followed link
/// needs its own stat. Each link is resolved once per walk.
struct LinkKinds {
    follow_symlinks: bool,
    is_dir: HashMap<PathBuf, bool>,
}

impl LinkKinds {
    fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks, is_dir: HashMap::new() }
    }

    fn is_directory(&mut self, entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        if !file_type.is_symlink() {
            return file_type.is_dir();
        }
        if !self.follow_symlinks {
            return false;
        }
        *self.is_dir.entry(entry.path().to_path_buf()).or_insert_with(|| {
            fs::metadata(entry.path()).map(|meta| meta.is_dir()).unwrap_or(false)
        })
    }
}

/// A followed link whose target does not exist resolves to neither a
/// directory nor a file.
fn is_dangling_link(err: &walkdir::Error) -> bool {
    let not_found = err.io_error().is_some_and(|e| e.kind() == ErrorKind::NotFound);
    not_found
        && err.path().is_some_and(|path| {
            fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
        })
}

/// Walks `root` and returns the selected paths in walk order.
///
/// # Arguments
/// * `root` - Directory to walk; not itself part of the result
/// * `options` - Ordering and symlink flags
/// * `selector` - Name and modification time rules
///
/// # Errors
/// * `Error::WalkError` if any directory cannot be listed or a followed
///   link loops; there are no partial results. Dangling links are skipped.
pub fn walk<P: AsRef<Path>>(
    root: P,
    options: WalkOptions,
    selector: &Selector,
) -> Result<Vec<PathBuf>> {
    let WalkOptions { directories_first, include_directories, follow_symlinks } = options;

    let entries = WalkDir::new(root.as_ref())
        .min_depth(1)
        .follow_links(follow_symlinks)
        .sort_by({
            let mut link_kinds = LinkKinds::new(follow_symlinks);
            move |a, b| {
                let (a_is_dir, b_is_dir) = (link_kinds.is_directory(a), link_kinds.is_directory(b));
                let kind = if directories_first {
                    b_is_dir.cmp(&a_is_dir)
                } else {
                    a_is_dir.cmp(&b_is_dir)
                };
                match kind {
                    Ordering::Equal => a.path().cmp(b.path()),
                    unequal => unequal,
                }
            }
        })
        .into_iter()
        // entries reaching the filter are already followed
        .filter_entry(|entry| {
            !entry.file_type().is_dir() || selector.includes_directory(entry.path())
        });

    let mut found = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_dangling_link(&err) => {
                trace!("Skipping dangling link '{}'", err.path().unwrap_or(Path::new("")).display());
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if include_directories {
                found.push(entry.into_path());
            }
        } else if file_type.is_file() {
            let included =
                selector.includes_file(entry.path(), || Ok(entry.metadata()?.modified()?))?;
            if included {
                found.push(entry.into_path());
            }
        } else {
            trace!("Skipping '{}'", entry.path().display());
        }
    }

    Ok(found)
}
