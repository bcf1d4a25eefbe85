//! Glob search below a folder.
//!
//! [`FindOptions`] describes what to look for; the walk itself runs on the
//! blocking pool via [`Folder::find_files`](crate::Folder::find_files) and
//! [`Folder::find_folders`](crate::Folder::find_folders).

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Cause, EntryKind};

/// A glob pattern that failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid glob pattern {pattern:?}")]
pub struct PatternError {
    pattern: String,
    #[source]
    source: globset::Error,
}

impl PatternError {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// What a folder search matches.
///
/// By default the search is recursive, includes hidden entries, does not
/// follow symlinks and matches everything. Without `follow_links`, a symlink
/// is still listed as the kind it points at but a linked folder is not
/// descended into; broken links are skipped.
///
/// A glob containing `/` is matched against the path relative to the
/// searched folder; any other glob is matched against the entry's name.
#[derive(Debug, Clone)]
pub struct FindOptions {
    recursive: bool,
    glob: Option<Glob>,
    extensions: Vec<String>,
    include_hidden: bool,
    follow_links: bool,
}

#[derive(Debug, Clone)]
struct Glob {
    matcher: GlobMatcher,
    whole_path: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            glob: None,
            extensions: Vec::new(),
            include_hidden: true,
            follow_links: false,
        }
    }
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the folder's direct children.
    pub fn children() -> Self {
        Self::default().recursive(false)
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// # Errors
    ///
    /// [`PatternError`] if `pattern` is not a valid glob.
    pub fn glob(mut self, pattern: &str) -> Result<Self, PatternError> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| PatternError {
                pattern: pattern.to_owned(),
                source,
            })?
            .compile_matcher();
        self.glob = Some(Glob {
            matcher,
            whole_path: pattern.contains('/'),
        });
        Ok(self)
    }

    /// Keeps only files whose extension is in `extensions`.
    ///
    /// Matching is case-sensitive; a leading dot is ignored. Folders are
    /// never filtered by extension.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_owned())
            .collect();
        self
    }

    /// Whether names starting with `.` are listed and descended into.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    fn matches(&self, relative: &Path, name: &str, kind: EntryKind) -> bool {
        if kind == EntryKind::File && !self.extensions.is_empty() {
            let extension = crate::path::split_extension(name).1;
            if !self.extensions.iter().any(|allowed| allowed == extension) {
                return false;
            }
        }
        match &self.glob {
            Some(glob) if glob.whole_path => glob.matcher.is_match(relative),
            Some(glob) => glob.matcher.is_match(name),
            None => true,
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Kind of the entry, seen through a symlink. Broken links and special
/// files yield `None`.
fn classify(entry: &DirEntry) -> Option<EntryKind> {
    let file_type = if entry.path_is_symlink() {
        std::fs::metadata(entry.path()).ok()?.file_type()
    } else {
        entry.file_type()
    };
    if file_type.is_dir() {
        Some(EntryKind::Folder)
    } else if file_type.is_file() {
        Some(EntryKind::File)
    } else {
        None
    }
}

/// Walks `root` and returns the matching paths of kind `want`, sorted.
///
/// Blocking; stops at the first traversal error.
pub(crate) fn walk(root: &Path, options: &FindOptions, want: EntryKind) -> Result<Vec<PathBuf>, Cause> {
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(options.follow_links);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut found = Vec::new();
    let entries = walker
        .into_iter()
        .filter_entry(|entry| options.include_hidden || entry.depth() == 0 || !is_hidden(entry));
    for entry in entries {
        let entry = entry.map_err(Cause::from_walk)?;
        let kind = match classify(&entry) {
            Some(kind) => kind,
            None => continue,
        };
        if kind != want {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let name = entry.file_name().to_string_lossy();
        if options.matches(relative, &name, kind) {
            found.push(entry.path().to_path_buf());
        }
    }

    found.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::Folder;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/nested")).unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join("b.json"), "{}").unwrap();
        fs::write(tmp.path().join("a.txt"), "").unwrap();
        fs::write(tmp.path().join("src/c.json"), "{}").unwrap();
        fs::write(tmp.path().join("src/nested/d.JSON"), "{}").unwrap();
        fs::write(tmp.path().join(".git/config"), "").unwrap();
        fs::write(tmp.path().join(".env"), "").unwrap();
        tmp
    }

    fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn default_walk_is_recursive_sorted_and_includes_hidden() {
        let tmp = setup();
        let found = walk(tmp.path(), &FindOptions::default(), EntryKind::File).unwrap();
        assert_eq!(
            names(&found, tmp.path()),
            [".env", ".git/config", "a.txt", "b.json", "src/c.json", "src/nested/d.JSON"]
        );
    }

    #[test]
    fn hidden_entries_can_be_skipped() {
        let tmp = setup();
        let options = FindOptions::default().include_hidden(false);
        let found = walk(tmp.path(), &options, EntryKind::File).unwrap();
        assert!(names(&found, tmp.path()).iter().all(|n| !n.starts_with('.')));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn extensions_are_case_sensitive_and_dot_insensitive() {
        let tmp = setup();
        let options = FindOptions::default().extensions([".json"]);
        let found = walk(tmp.path(), &options, EntryKind::File).unwrap();
        assert_eq!(names(&found, tmp.path()), ["b.json", "src/c.json"]);
    }

    #[test]
    fn name_glob_matches_at_any_depth() {
        let tmp = setup();
        let options = FindOptions::default().glob("*.json").unwrap();
        let found = walk(tmp.path(), &options, EntryKind::File).unwrap();
        assert_eq!(names(&found, tmp.path()), ["b.json", "src/c.json"]);
    }

    #[test]
    fn path_glob_matches_relative_path() {
        let tmp = setup();
        let options = FindOptions::default().glob("src/*").unwrap();
        let found = walk(tmp.path(), &options, EntryKind::File).unwrap();
        assert_eq!(names(&found, tmp.path()), ["src/c.json"]);

        let options = FindOptions::default().glob("src/**/*.JSON").unwrap();
        let found = walk(tmp.path(), &options, EntryKind::File).unwrap();
        assert_eq!(names(&found, tmp.path()), ["src/nested/d.JSON"]);
    }

    #[test]
    fn folders_ignore_extension_filter() {
        let tmp = setup();
        let options = FindOptions::default().extensions(["json"]).include_hidden(false);
        let found = walk(tmp.path(), &options, EntryKind::Folder).unwrap();
        assert_eq!(names(&found, tmp.path()), ["src", "src/nested"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_listed_as_their_target_kind() {
        let tmp = setup();
        std::os::unix::fs::symlink(tmp.path().join("a.txt"), tmp.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("src"), tmp.path().join("src-link")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("broken.txt")).unwrap();
        let options = FindOptions::default().include_hidden(false);

        let files = walk(tmp.path(), &options, EntryKind::File).unwrap();
        assert_eq!(
            names(&files, tmp.path()),
            ["a.txt", "b.json", "link.txt", "src/c.json", "src/nested/d.JSON"]
        );
        let folders = walk(tmp.path(), &options, EntryKind::Folder).unwrap();
        assert_eq!(names(&folders, tmp.path()), ["src", "src-link", "src/nested"]);
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = FindOptions::default().glob("a[").unwrap_err();
        assert_eq!(err.pattern(), "a[");
    }

    #[tokio::test]
    async fn empty_result_is_success() {
        let tmp = setup();
        let folder = Folder::new(tmp.path()).unwrap();
        let options = FindOptions::default().extensions(["png"]);
        assert!(folder.find_files(&options).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn find_files_returns_text_files() {
        let tmp = setup();
        let folder = Folder::new(tmp.path()).unwrap();
        let options = FindOptions::children().extensions(["txt"]);
        let files = folder.find_files(&options).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].read_text().await.unwrap(), "");
    }
}
