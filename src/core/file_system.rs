use super::models::EligibilityFilter;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/*
 * This module provides the file system side of bundling: listing the
 * immediate subdirectories of a directory and walking a bundle unit to
 * collect its eligible files in a stable order. Excluded directory names are
 * pruned before the walk descends into them, and directories reached a
 * second time through symbolic links are skipped so link cycles terminate.
 */

#[derive(Debug)]
pub enum FileSystemError {
    Io(PathBuf, io::Error),
    InvalidPath(PathBuf),
}

impl std::fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileSystemError::Io(path, e) => write!(f, "I/O error at {path:?}: {e}"),
            FileSystemError::InvalidPath(p) => write!(f, "Invalid path: {p:?}"),
        }
    }
}

impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileSystemError::Io(_, e) => Some(e),
            FileSystemError::InvalidPath(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FileSystemError>;

// An immediate child directory: its name and full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubDirectory {
    pub name: String,
    pub path: PathBuf,
}

/*
 * Defines the operations for scanning the file system.
 * Both operations must honor the filter's excluded directory names and
 * return their results in a deterministic order.
 */
pub trait FileSystemScannerOperations: Send + Sync {
    /*
     * Lists the immediate subdirectories of `dir` whose names are not
     * excluded, sorted by name. Symbolic links to directories are included.
     */
    fn list_subdirectories(&self, dir: &Path, filter: &EligibilityFilter)
    -> Result<Vec<SubDirectory>>;

    /*
     * Recursively collects the eligible files below `unit_root`. Within a
     * directory, files come first in lexicographic order, followed by the
     * contents of each subdirectory in lexicographic order.
     */
    fn collect_eligible_files(&self, unit_root: &Path, filter: &EligibilityFilter) -> Vec<PathBuf>;
}

pub struct CoreFileSystemScanner {}

impl CoreFileSystemScanner {
    pub fn new() -> Self {
        CoreFileSystemScanner {}
    }
}

impl Default for CoreFileSystemScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemScannerOperations for CoreFileSystemScanner {
    fn list_subdirectories(
        &self,
        dir: &Path,
        filter: &EligibilityFilter,
    ) -> Result<Vec<SubDirectory>> {
        if !dir.is_dir() {
            return Err(FileSystemError::InvalidPath(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|e| FileSystemError::Io(dir.to_path_buf(), e))?;
        let mut subdirs = Vec::new();
        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("FileSystemScanner: Skipping unreadable entry in {dir:?}: {e}");
                    continue;
                }
            };
            let path = entry.path();
            // `Path::is_dir` follows symbolic links.
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if filter.is_excluded_dir_name(&name) {
                log::debug!("FileSystemScanner: Excluding directory {path:?}.");
                continue;
            }
            subdirs.push(SubDirectory { name, path });
        }

        subdirs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subdirs)
    }

    fn collect_eligible_files(&self, unit_root: &Path, filter: &EligibilityFilter) -> Vec<PathBuf> {
        log::debug!("FileSystemScanner: Walking {unit_root:?}.");

        let mut visited_dirs: HashSet<PathBuf> = HashSet::new();
        let walker = WalkDir::new(unit_root)
            .follow_links(true)
            .sort_by(files_before_dirs)
            .into_iter()
            .filter_entry(|entry| should_descend(entry, filter, &mut visited_dirs));

        let mut files = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("FileSystemScanner: Walk error under {unit_root:?}: {e}");
                    continue;
                }
            };
            if entry.file_type().is_file() && filter.is_included_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        log::debug!(
            "FileSystemScanner: Found {} eligible files under {unit_root:?}.",
            files.len()
        );
        files
    }
}

fn files_before_dirs(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_is_dir = a.file_type().is_dir();
    let b_is_dir = b.file_type().is_dir();
    a_is_dir
        .cmp(&b_is_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/*
 * Entry predicate for the walk. Files always pass (eligibility is checked by
 * the caller). Directories are pruned when their name is excluded or when
 * their canonical path was already visited during this walk.
 */
fn should_descend(
    entry: &DirEntry,
    filter: &EligibilityFilter,
    visited_dirs: &mut HashSet<PathBuf>,
) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }

    if entry.depth() > 0 {
        let name = entry.file_name().to_string_lossy();
        if filter.is_excluded_dir_name(&name) {
            log::trace!("FileSystemScanner: Pruning excluded directory {:?}.", entry.path());
            return false;
        }
    }

    let real_path = match fs::canonicalize(entry.path()) {
        Ok(path) => path,
        Err(e) => {
            log::warn!(
                "FileSystemScanner: Cannot resolve {:?}, skipping: {e}",
                entry.path()
            );
            return false;
        }
    };
    if !visited_dirs.insert(real_path) {
        log::warn!(
            "FileSystemScanner: Directory {:?} was already visited (symbolic link cycle?), skipping.",
            entry.path()
        );
        return false;
    }
    true
}
