//! Name decomposition of absolute paths.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// The decomposed names of an absolute path.
///
/// Built once per entity and never mutated. `full_name` always equals
/// `base_name` when `extension` is empty and `base_name.extension`
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInfo {
    absolute_path: PathBuf,
    parent_path: PathBuf,
    parent_name: String,
    full_name: String,
    base_name: String,
    extension: String,
}

impl PathInfo {
    /// Decomposes `absolute_path`, which is expected to be normalised.
    pub fn new(absolute_path: PathBuf) -> Self {
        let full_name = file_name_of(&absolute_path);
        let parent_path = absolute_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| absolute_path.clone());
        let parent_name = file_name_of(&parent_path);
        let (base_name, extension) = split_extension(&full_name);

        Self {
            absolute_path,
            parent_path,
            parent_name,
            base_name: base_name.to_owned(),
            extension: extension.to_owned(),
            full_name,
        }
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    pub fn parent_path(&self) -> &Path {
        &self.parent_path
    }

    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Extension without the leading dot, or `""`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Same parent, different final name.
    pub(crate) fn renamed(&self, full_name: &str) -> Self {
        Self::new(self.parent_path.join(full_name))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Splits a file name at its last dot.
///
/// A leading dot (`.bashrc`) or a trailing one (`notes.`) does not start an
/// extension.
pub fn split_extension(full_name: &str) -> (&str, &str) {
    match full_name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < full_name.len() => {
            (&full_name[..dot], &full_name[dot + 1..])
        }
        _ => (full_name, ""),
    }
}

/// Joins a base name and an extension back into a full name.
pub(crate) fn join_extension(base_name: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        base_name.to_owned()
    } else {
        format!("{base_name}.{extension}")
    }
}
