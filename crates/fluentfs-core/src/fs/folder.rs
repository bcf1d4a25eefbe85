//! Folder entities.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codec::Text;
use crate::error::{EntryKind, FsError, FsResult, Operation, ResolveError};
use crate::fs::ops::{remove_path, stat_as};
use crate::fs::File;
use crate::path::{join_lexical, resolve_with, Environment, IntoPathPieces, PathInfo, SystemEnv};
use crate::pipeline::blocking;
use crate::search::{walk, FindOptions};

/// A folder at an absolute path.
///
/// Holds no handle and does not imply the folder exists. Navigation
/// ([`Folder::folder`], [`Folder::file`], [`Folder::parent`]) is purely
/// lexical; only the async operations touch the disk.
///
/// ```no_run
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// use fluentfs_core::Folder;
///
/// let logs = Folder::new(("~", "logs"))?;
/// logs.ensure_exists().await?;
/// logs.file("today.log").append_text("started\n").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Folder {
    info: PathInfo,
}

/// Serialisable name view of a [`Folder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderInfo {
    pub absolute_path: PathBuf,
    pub name: String,
    pub parent_path: PathBuf,
    pub parent_name: String,
}

impl Folder {
    /// Resolves `pieces` against the process environment.
    pub fn new(pieces: impl IntoPathPieces) -> Result<Self, ResolveError> {
        Self::with_env(&SystemEnv, pieces)
    }

    pub fn with_env(
        env: &dyn Environment,
        pieces: impl IntoPathPieces,
    ) -> Result<Self, ResolveError> {
        Ok(Self::from_absolute(resolve_with(env, pieces)?))
    }

    pub(crate) fn from_absolute(path: PathBuf) -> Self {
        Self {
            info: PathInfo::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.info.absolute_path()
    }

    /// Final segment, or the whole path for a root.
    pub fn name(&self) -> &str {
        match self.info.full_name() {
            "" => self.path().to_str().unwrap_or_default(),
            name => name,
        }
    }

    pub fn parent_path(&self) -> &Path {
        self.info.parent_path()
    }

    pub fn parent_name(&self) -> &str {
        self.info.parent_name()
    }

    pub fn info(&self) -> FolderInfo {
        FolderInfo {
            absolute_path: self.path().to_path_buf(),
            name: self.name().to_owned(),
            parent_path: self.parent_path().to_path_buf(),
            parent_name: self.parent_name().to_owned(),
        }
    }

    /// A folder below this one.
    pub fn folder(&self, pieces: impl IntoPathPieces) -> Folder {
        Folder::from_absolute(join_lexical(self.path(), pieces))
    }

    /// A text file below this one.
    pub fn file(&self, pieces: impl IntoPathPieces) -> File {
        File::from_absolute(join_lexical(self.path(), pieces), Text)
    }

    /// The enclosing folder. A root is its own parent.
    pub fn parent(&self) -> Folder {
        Folder::from_absolute(self.parent_path().to_path_buf())
    }

    /// This folder's path relative to `base`, if it lies below it.
    pub fn relative_to(&self, base: &Folder) -> Option<PathBuf> {
        self.path()
            .strip_prefix(base.path())
            .ok()
            .map(Path::to_path_buf)
    }

    /// # Errors
    ///
    /// A [`Operation::Stat`] error with [`crate::Cause::WrongKind`] when the
    /// path holds a file.
    pub async fn stat(&self) -> FsResult<Metadata> {
        stat_as(self.path(), EntryKind::Folder).await
    }

    /// `true` if a folder exists here. Never fails.
    pub async fn exists(&self) -> bool {
        self.stat().await.is_ok()
    }

    /// Creates this folder and any missing parents.
    pub async fn ensure_exists(&self) -> FsResult<()> {
        tokio::fs::create_dir_all(self.path())
            .await
            .map_err(|e| FsError::io(Operation::Write, self.path(), e, EntryKind::Folder))
    }

    /// Leaves this folder existing and empty.
    pub async fn ensure_empty(&self) -> FsResult<()> {
        let fail = |e: std::io::Error| FsError::io(Operation::Remove, self.path(), e, EntryKind::Folder);
        let mut entries = match tokio::fs::read_dir(self.path()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return self.ensure_exists().await,
            Err(e) => return Err(fail(e)),
        };
        while let Some(entry) = entries.next_entry().await.map_err(fail)? {
            remove_path(&entry.path()).await.map_err(fail)?;
        }
        Ok(())
    }

    /// Removes this folder and everything in it. A missing folder is not an
    /// error.
    pub async fn remove(&self) -> FsResult<()> {
        remove_path(self.path())
            .await
            .map_err(|e| FsError::io(Operation::Remove, self.path(), e, EntryKind::Folder))
    }

    /// Files below this folder matching `options`, sorted by path.
    ///
    /// # Errors
    ///
    /// Any failure while walking is a single [`Operation::Glob`] error.
    pub async fn find_files(&self, options: &FindOptions) -> FsResult<Vec<File>> {
        let paths = self.walk(options, EntryKind::File).await?;
        Ok(paths
            .into_iter()
            .map(|path| File::from_absolute(path, Text))
            .collect())
    }

    /// Folders below this folder matching `options`, sorted by path.
    pub async fn find_folders(&self, options: &FindOptions) -> FsResult<Vec<Folder>> {
        let paths = self.walk(options, EntryKind::Folder).await?;
        Ok(paths.into_iter().map(Folder::from_absolute).collect())
    }

    /// Files directly inside this folder.
    pub async fn child_files(&self) -> FsResult<Vec<File>> {
        self.find_files(&FindOptions::children()).await
    }

    /// Folders directly inside this folder.
    pub async fn child_folders(&self) -> FsResult<Vec<Folder>> {
        self.find_folders(&FindOptions::children()).await
    }

    async fn walk(&self, options: &FindOptions, want: EntryKind) -> FsResult<Vec<PathBuf>> {
        let root = self.path().to_path_buf();
        let options = options.clone();
        let found = blocking(Operation::Glob, self.path(), move || {
            walk(&root, &options, want)
        })
        .await?;
        tracing::debug!(folder = %self.path().display(), count = found.len(), "walked");
        Ok(found)
    }
}
