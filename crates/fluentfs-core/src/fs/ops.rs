//! Low-level filesystem steps shared by files and folders.

use std::fs::Metadata;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use crate::codec::Codec;
use crate::error::{Cause, EntryKind, FsError, FsResult, Operation};
use crate::fs::{File, Folder};

/// Stats `path` and checks it is of kind `expected`.
///
/// Symlinks are followed.
pub(crate) async fn stat_as(path: &Path, expected: EntryKind) -> FsResult<Metadata> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| FsError::io(Operation::Stat, path, e, expected))?;
    let actual = EntryKind::of(&metadata.file_type());
    if actual != expected {
        return Err(FsError::new(
            Operation::Stat,
            path,
            Cause::WrongKind { expected, actual },
        ));
    }
    Ok(metadata)
}

/// Removes whatever is at `path`. Nothing there is not an error.
pub(crate) async fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Creates every missing parent folder of `path`.
pub(crate) async fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

/// Where a relocation puts its result.
///
/// A file destination is used as is. A folder destination receives an entry
/// named like the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(PathBuf),
    Folder(PathBuf),
}

impl Destination {
    fn resolve(&self, source_name: &str) -> Option<PathBuf> {
        match self {
            Self::File(path) => Some(path.clone()),
            Self::Folder(_) if source_name.is_empty() => None,
            Self::Folder(folder) => Some(folder.join(source_name)),
        }
    }
}

impl<C: Codec> From<&File<C>> for Destination {
    fn from(file: &File<C>) -> Self {
        Self::File(file.path().to_path_buf())
    }
}

impl From<&Folder> for Destination {
    fn from(folder: &Folder) -> Self {
        Self::Folder(folder.path().to_path_buf())
    }
}

/// Runs one relocation: resolve the destination, make room for it, then
/// `perform` the actual copy, move or link.
///
/// Any failure is reported under `operation` with both paths attached.
/// Relocating an entry onto itself does nothing. A destination that contains
/// the source is rejected before anything is removed.
pub(crate) async fn relocate<F, Fut>(
    operation: Operation,
    source: &Path,
    source_name: &str,
    destination: Destination,
    perform: F,
) -> FsResult<PathBuf>
where
    F: FnOnce(PathBuf, PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let Some(target) = destination.resolve(source_name) else {
        let err = io::Error::new(io::ErrorKind::InvalidInput, "source has no file name");
        return Err(FsError::new(operation, source, Cause::Io(err)));
    };
    let fail = |err: io::Error| {
        FsError::io(operation, source, err, EntryKind::File).with_destination(&target)
    };

    tokio::fs::symlink_metadata(source).await.map_err(fail)?;
    if target == source {
        return Ok(source.to_path_buf());
    }
    if source.starts_with(&target) {
        return Err(fail(io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination contains the source",
        )));
    }
    ensure_parent(&target).await.map_err(fail)?;
    remove_path(&target).await.map_err(fail)?;
    perform(source.to_path_buf(), target.clone())
        .await
        .map_err(fail)?;

    tracing::debug!(
        %operation,
        source = %source.display(),
        destination = %target.display(),
        "relocated"
    );
    Ok(target)
}

pub(crate) async fn copy(source: PathBuf, target: PathBuf) -> io::Result<()> {
    tokio::fs::copy(&source, &target).await.map(|_| ())
}

/// Renames, falling back to copy + delete when a plain rename fails
/// (for example across devices).
pub(crate) async fn rename(source: PathBuf, target: PathBuf) -> io::Result<()> {
    if let Err(err) = tokio::fs::rename(&source, &target).await {
        tracing::debug!(error = %err, "rename failed, copying instead");
        tokio::fs::copy(&source, &target).await?;
        tokio::fs::remove_file(&source).await?;
    }
    Ok(())
}

pub(crate) async fn hard_link(source: PathBuf, target: PathBuf) -> io::Result<()> {
    tokio::fs::hard_link(&source, &target).await
}

pub(crate) async fn symlink(source: PathBuf, target: PathBuf) -> io::Result<()> {
    #[cfg(unix)]
    {
        tokio::fs::symlink(&source, &target).await
    }
    #[cfg(windows)]
    {
        tokio::fs::symlink_file(&source, &target).await
    }
}
