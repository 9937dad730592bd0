//! Local source tree collaborator.
//!
//! `SourceTree` is the narrow view of the host file system the reconciler
//! needs: exact lookup of an indexed file and the list of candidate files
//! under some directories. `DiskTree` implements it by scanning directories
//! with `glob`, detecting the language by extension and counting lines.

use crate::models::LocalFile;
use glob::{glob, Pattern};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub trait SourceTree {
    /// File indexed under exactly `path`.
    fn find_indexed_file(&self, path: &str) -> Option<LocalFile>;
    /// Absolute paths of all files under `dirs`, in a stable order.
    fn list_candidate_files(&self, dirs: &[String]) -> Vec<PathBuf>;
}

/// Language key for a file, by extension.
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let lang = match ext.as_str() {
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "c++" | "hh" | "hpp" | "hxx" | "h++" | "ipp" => "cpp",
        "cs" => "cs",
        "java" => "java",
        "js" | "jsx" | "mjs" | "cjs" => "js",
        "py" => "py",
        "php" => "php",
        _ => return None,
    };
    Some(lang)
}

fn count_lines(path: &Path) -> usize {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).lines().count(),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "could not read file for line count");
            0
        }
    }
}

/// Files found on disk below `root`.
pub struct DiskTree {
    root: PathBuf,
    files: HashMap<String, LocalFile>,
}

impl DiskTree {
    /// Index every file under `dirs` (relative to `root` unless absolute).
    ///
    /// Indexed paths are `root` joined with the file's relative path, so
    /// callers pass an absolute root to get absolute keys.
    pub fn scan(root: &Path, dirs: &[String]) -> Self {
        let root = root.to_path_buf();
        let paths = collect_files(&root, dirs);
        let files: HashMap<String, LocalFile> = paths
            .par_iter()
            .map(|p| {
                let lf = LocalFile {
                    path: p.clone(),
                    language: detect_language(p).map(str::to_string),
                    lines: count_lines(p),
                };
                (p.to_string_lossy().to_string(), lf)
            })
            .collect();
        debug!(root = %root.display(), files = files.len(), "indexed source tree");
        DiskTree { root, files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceTree for DiskTree {
    fn find_indexed_file(&self, path: &str) -> Option<LocalFile> {
        self.files.get(path).cloned()
    }

    fn list_candidate_files(&self, dirs: &[String]) -> Vec<PathBuf> {
        collect_files(&self.root, dirs)
    }
}

/// Regular files under each directory, deduplicated, in glob order.
fn collect_files(root: &Path, dirs: &[String]) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    for dir in dirs {
        let dir = dir.trim();
        if dir.is_empty() {
            continue;
        }
        // Collecting components drops interior `.` segments.
        let base: PathBuf = root.join(dir).components().collect();
        // Directory names may contain glob metacharacters (`proj[1]`).
        let pattern = format!("{}/**/*", Pattern::escape(&base.to_string_lossy()));
        let entries = match glob(&pattern) {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %base.display(), error = %e, "invalid source directory pattern");
                continue;
            }
        };
        for entry in entries.flatten() {
            if entry.is_file() && seen.insert(entry.clone()) {
                out.push(entry);
            }
        }
    }
    out
}

/// Split a comma-separated directory list.
pub fn split_dirs(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
