//! Remote-to-local path resolution.
//!
//! Paths reported by the analysis service are absolute paths on the build
//! machine. They are mapped to files of the local tree in three steps:
//! - strip a configured build prefix and re-root the rest under the
//!   working directory,
//! - rewrite separators for the target path style,
//! - look the path up exactly, then fall back to the first candidate file
//!   whose absolute path ends with it.
//!
//! Results are cached per remote path for the lifetime of one pass.

use crate::models::LocalFile;
use crate::tree::SourceTree;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
/// Separator convention of the local tree.
pub enum PathStyle {
    #[default]
    Posix,
    Windows,
}

impl PathStyle {
    pub fn parse(s: &str) -> Option<PathStyle> {
        match s.trim().to_ascii_lowercase().as_str() {
            "posix" | "unix" => Some(PathStyle::Posix),
            "windows" | "win" => Some(PathStyle::Windows),
            _ => None,
        }
    }

    pub fn separator(self) -> char {
        match self {
            PathStyle::Posix => '/',
            PathStyle::Windows => '\\',
        }
    }
}

/// Settings shared by every lookup of a pass.
#[derive(Debug, Clone, Default)]
pub struct PathSettings {
    pub strip_prefix: String,
    pub working_dir: String,
    pub style: PathStyle,
}

impl PathSettings {
    /// Local lookup path for a remote path (prefix stripping and separator
    /// rewriting only; no file-system access).
    pub fn lookup_path(&self, remote: &str) -> String {
        let mut path = remote.to_string();
        if !self.strip_prefix.is_empty() {
            if let Some(rest) = remote.strip_prefix(self.strip_prefix.as_str()) {
                let base = self.working_dir.trim_end_matches(['/', '\\']);
                let rest = rest.trim_start_matches(['/', '\\']);
                path = if rest.is_empty() {
                    base.to_string()
                } else {
                    format!("{}/{}", base, rest)
                };
                info!(path = %path, "full path after prefix stripped");
            }
        }
        let sep = self.style.separator();
        if sep != '/' {
            path = path.replace('/', &sep.to_string());
        }
        path
    }
}

/// Per-pass resolver; owns the lookup cache and the line-count ledger.
pub struct PathResolver<'a> {
    tree: &'a dyn SourceTree,
    candidates: Vec<PathBuf>,
    settings: PathSettings,
    cache: HashMap<String, LocalFile>,
    lines: HashMap<String, usize>,
    ambiguous: usize,
}

impl<'a> PathResolver<'a> {
    pub fn new(tree: &'a dyn SourceTree, candidates: Vec<PathBuf>, settings: PathSettings) -> Self {
        PathResolver {
            tree,
            candidates,
            settings,
            cache: HashMap::new(),
            lines: HashMap::new(),
            ambiguous: 0,
        }
    }

    /// Local file for `remote`, or `None` when nothing matches.
    pub fn resolve(&mut self, remote: &str) -> Option<LocalFile> {
        if let Some(hit) = self.cache.get(remote) {
            return Some(hit.clone());
        }
        let lookup = self.settings.lookup_path(remote);
        // Every candidate ends with the empty string.
        if lookup.trim().is_empty() {
            return None;
        }
        let found = self
            .tree
            .find_indexed_file(&lookup)
            .or_else(|| self.suffix_match(&lookup));
        let file = found?;
        self.lines.entry(lookup).or_insert(file.lines);
        self.cache.insert(remote.to_string(), file.clone());
        Some(file)
    }

    fn suffix_match(&mut self, lookup: &str) -> Option<LocalFile> {
        let mut matches = self
            .candidates
            .iter()
            .filter(|c| c.to_string_lossy().ends_with(lookup));
        let first = matches.next()?;
        let others = matches.count();
        if others > 0 {
            self.ambiguous += 1;
            warn!(
                path = %lookup,
                chosen = %first.display(),
                others,
                "path suffix matches several candidate files; using the first"
            );
        }
        debug!(path = %lookup, file = %first.display(), "resolved by suffix");
        self.tree.find_indexed_file(&first.to_string_lossy())
    }

    /// Sum of line counts across every file resolved so far.
    pub fn total_lines(&self) -> usize {
        self.lines.values().sum()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Number of suffix lookups that matched more than one candidate.
    pub fn ambiguous(&self) -> usize {
        self.ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeTree {
        files: Vec<LocalFile>,
        lookups: Cell<usize>,
    }

    impl SourceTree for FakeTree {
        fn find_indexed_file(&self, path: &str) -> Option<LocalFile> {
            self.lookups.set(self.lookups.get() + 1);
            self.files
                .iter()
                .find(|f| f.path.to_string_lossy() == path)
                .cloned()
        }

        fn list_candidate_files(&self, _dirs: &[String]) -> Vec<PathBuf> {
            self.files.iter().map(|f| f.path.clone()).collect()
        }
    }

    fn file(path: &str, lines: usize) -> LocalFile {
        LocalFile {
            path: PathBuf::from(path),
            language: Some("c".into()),
            lines,
        }
    }

    fn tree(paths: &[(&str, usize)]) -> FakeTree {
        FakeTree {
            files: paths.iter().map(|(p, l)| file(p, *l)).collect(),
            lookups: Cell::new(0),
        }
    }

    fn settings(prefix: &str, cwd: &str, style: PathStyle) -> PathSettings {
        PathSettings {
            strip_prefix: prefix.into(),
            working_dir: cwd.into(),
            style,
        }
    }

    #[test]
    fn strips_prefix_and_reroots() {
        let s = settings("/build", "/home/user", PathStyle::Posix);
        assert_eq!(s.lookup_path("/build/src/foo.c"), "/home/user/src/foo.c");
        // Prefix not present: path kept as is
        assert_eq!(s.lookup_path("/other/src/foo.c"), "/other/src/foo.c");
    }

    #[test]
    fn windows_style_rewrites_separators() {
        let s = settings("/build", "C:\\work", PathStyle::Windows);
        assert_eq!(s.lookup_path("/build/src/foo.c"), "C:\\work\\src\\foo.c");
        let s = settings("", "", PathStyle::Windows);
        assert_eq!(s.lookup_path("src/foo.c"), "src\\foo.c");
    }

    #[test]
    fn empty_prefix_is_ignored() {
        let s = settings("", "/home/user", PathStyle::Posix);
        assert_eq!(s.lookup_path("/build/src/foo.c"), "/build/src/foo.c");
    }

    #[test]
    fn exact_match_before_suffix_match() {
        let t = tree(&[("/x/home/user/src/foo.c", 1), ("/home/user/src/foo.c", 2)]);
        let cands = t.list_candidate_files(&[]);
        let mut r = PathResolver::new(&t, cands, settings("/build", "/home/user", PathStyle::Posix));
        let f = r.resolve("/build/src/foo.c").unwrap();
        assert_eq!(f.path, PathBuf::from("/home/user/src/foo.c"));
    }

    #[test]
    fn suffix_fallback_finds_single_candidate() {
        let t = tree(&[("/repo/module/src/foo.c", 10), ("/repo/bar.c", 4)]);
        let cands = t.list_candidate_files(&[]);
        let mut r = PathResolver::new(&t, cands, PathSettings::default());
        let f = r.resolve("src/foo.c").unwrap();
        assert_eq!(f.path, PathBuf::from("/repo/module/src/foo.c"));
        assert_eq!(r.total_lines(), 10);
    }

    #[test]
    fn first_suffix_match_wins() {
        let t = tree(&[("/a/src/foo.c", 1), ("/b/src/foo.c", 2)]);
        let cands = t.list_candidate_files(&[]);
        let mut r = PathResolver::new(&t, cands, PathSettings::default());
        assert_eq!(r.resolve("src/foo.c").unwrap().path, PathBuf::from("/a/src/foo.c"));
    }

    #[test]
    fn ambiguous_suffix_keeps_candidate_order() {
        let t = tree(&[
            ("/c/lib/src/foo.c", 3),
            ("/a/src/foo.c", 1),
            ("/b/src/foo.c", 2),
            ("/a/src/bar.c", 9),
        ]);
        let cands = t.list_candidate_files(&[]);
        let mut r = PathResolver::new(&t, cands, PathSettings::default());
        let f = r.resolve("src/foo.c").unwrap();
        assert_eq!(f.path, PathBuf::from("/c/lib/src/foo.c"));
        // Only the chosen file enters the line ledger.
        assert_eq!(r.total_lines(), 3);
        assert_eq!(r.cached(), 1);
        assert_eq!(r.ambiguous(), 1);
        // Cached hits do not warn again.
        r.resolve("src/foo.c").unwrap();
        assert_eq!(r.ambiguous(), 1);
        r.resolve("src/bar.c").unwrap();
        assert_eq!(r.ambiguous(), 1);
    }

    #[test]
    fn empty_remote_path_never_resolves() {
        let t = tree(&[("/repo/unrelated.c", 12)]);
        let cands = t.list_candidate_files(&[]);
        let mut r = PathResolver::new(&t, cands, PathSettings::default());
        assert!(r.resolve("").is_none());
        assert!(r.resolve("  ").is_none());
        // Stripping the whole path with no working directory leaves nothing.
        let mut r = PathResolver::new(
            &t,
            t.list_candidate_files(&[]),
            settings("/build", "", PathStyle::Posix),
        );
        assert!(r.resolve("/build").is_none());
        assert_eq!(r.total_lines(), 0);
        assert_eq!(r.cached(), 0);
    }

    #[test]
    fn misses_are_not_cached_and_hits_are() {
        let t = tree(&[("/repo/src/foo.c", 3)]);
        let cands = t.list_candidate_files(&[]);
        let mut r = PathResolver::new(&t, cands, PathSettings::default());
        assert!(r.resolve("/nowhere/zzz.c").is_none());
        assert_eq!(r.cached(), 0);

        r.resolve("/repo/src/foo.c").unwrap();
        let before = t.lookups.get();
        r.resolve("/repo/src/foo.c").unwrap();
        assert_eq!(t.lookups.get(), before);
        assert_eq!(r.cached(), 1);
    }

    #[test]
    fn line_counts_keyed_by_lookup_path() {
        let t = tree(&[("/repo/src/foo.c", 7)]);
        let cands = t.list_candidate_files(&[]);
        let mut r = PathResolver::new(&t, cands, PathSettings::default());
        r.resolve("/repo/src/foo.c").unwrap();
        // Different raw path reaching the same file counts under its own key.
        r.resolve("src/foo.c").unwrap();
        assert_eq!(r.total_lines(), 14);
        assert_eq!(r.cached(), 2);
    }

    #[test]
    fn path_style_parse() {
        assert_eq!(PathStyle::parse("Windows"), Some(PathStyle::Windows));
        assert_eq!(PathStyle::parse("posix"), Some(PathStyle::Posix));
        assert_eq!(PathStyle::parse("vms"), None);
        assert_eq!(PathStyle::Windows.separator(), '\\');
    }
}
