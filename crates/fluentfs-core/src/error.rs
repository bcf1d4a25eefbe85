//! Error types for `fluentfs-core`.
//!
//! Every filesystem operation returns [`FsResult<T>`], an alias for
//! `Result<T, FsError>`. An [`FsError`] names the [`Operation`] that failed,
//! the path it ran on, the destination for relocations and the [`Cause`]
//! the underlying failure was classified into.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::codec::Issues;

/// Destination recorded on a relocation error raised before a destination
/// path could be computed.
pub const UNRESOLVED_DESTINATION: &str = "<unresolved destination>";

/// The filesystem operation an [`FsError`] was raised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Stat,
    Read,
    Write,
    Append,
    Chmod,
    Remove,
    Copy,
    Move,
    Link,
    SymLink,
    Glob,
    Download,
}

impl Operation {
    /// Lower-case verb used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stat => "stat",
            Self::Read => "read",
            Self::Write => "write",
            Self::Append => "append to",
            Self::Chmod => "chmod",
            Self::Remove => "remove",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Link => "link",
            Self::SymLink => "symlink",
            Self::Glob => "glob",
            Self::Download => "download",
        }
    }

    /// Returns `true` for operations that carry a destination path.
    pub fn is_relocation(self) -> bool {
        matches!(self, Self::Copy | Self::Move | Self::Link | Self::SymLink)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a path turned out to be on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Folder,
    Symlink,
    Other,
}

impl EntryKind {
    pub fn of(file_type: &std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Folder
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Symlink => "symlink",
            Self::Other => "special file",
        })
    }
}

/// Why an operation failed.
#[derive(Debug, thiserror::Error)]
pub enum Cause {
    /// The path (or one of its parents) does not exist.
    #[error("no such file or folder")]
    NotFound(#[source] io::Error),

    /// A file was found where a folder was expected, or the reverse.
    #[error("expected a {expected} but found a {actual}")]
    WrongKind {
        expected: EntryKind,
        actual: EntryKind,
    },

    /// Any other I/O failure.
    #[error(transparent)]
    Io(io::Error),

    /// Text could not be parsed as the file's format.
    #[error("malformed {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// Parsed content did not satisfy the file's schema.
    #[error("content failed validation: {0}")]
    Invalid(Issues),

    /// Content could not be serialised, or serialised to nothing.
    #[error("could not serialise content: {0}")]
    Stringify(String),

    /// The caller's cancellation token fired before the operation finished.
    #[error("operation aborted")]
    Aborted,

    /// The HTTP request behind a download failed, or was answered with a
    /// non-success status.
    #[error("request failed")]
    Http(#[source] reqwest::Error),
}

impl Cause {
    /// Classifies an I/O error raised while working on a path that was
    /// expected to be of kind `expected`.
    pub fn from_io(err: io::Error, expected: EntryKind) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(err),
            io::ErrorKind::IsADirectory if expected != EntryKind::Folder => Self::WrongKind {
                expected,
                actual: EntryKind::Folder,
            },
            io::ErrorKind::NotADirectory if expected == EntryKind::Folder => Self::WrongKind {
                expected,
                actual: EntryKind::File,
            },
            _ => Self::Io(err),
        }
    }

    /// Classifies a directory-walk failure.
    pub fn from_walk(err: walkdir::Error) -> Self {
        let message = err.to_string();
        match err.into_io_error() {
            Some(io) => Self::from_io(io, EntryKind::Folder),
            None => Self::Io(io::Error::other(message)),
        }
    }
}

/// A failed filesystem operation.
#[derive(Debug, thiserror::Error)]
#[error(
    "failed to {operation} {}{}: {cause}",
    .path.display(),
    DestinationSuffix(.destination.as_deref())
)]
pub struct FsError {
    operation: Operation,
    path: PathBuf,
    destination: Option<PathBuf>,
    #[source]
    cause: Cause,
}

struct DestinationSuffix<'a>(Option<&'a Path>);

impl fmt::Display for DestinationSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(destination) => write!(f, " to {}", destination.display()),
            None => Ok(()),
        }
    }
}

impl FsError {
    /// Creates an error for `operation` on `path`.
    ///
    /// Relocation operations start out with the
    /// [`UNRESOLVED_DESTINATION`] placeholder; attach the real one with
    /// [`FsError::with_destination`].
    pub fn new(operation: Operation, path: impl Into<PathBuf>, cause: Cause) -> Self {
        let destination = operation
            .is_relocation()
            .then(|| PathBuf::from(UNRESOLVED_DESTINATION));
        Self {
            operation,
            path: path.into(),
            destination,
            cause,
        }
    }

    pub(crate) fn io(
        operation: Operation,
        path: impl Into<PathBuf>,
        err: io::Error,
        expected: EntryKind,
    ) -> Self {
        Self::new(operation, path, Cause::from_io(err, expected))
    }

    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    pub fn into_cause(self) -> Cause {
        self.cause
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.cause, Cause::NotFound(_))
    }

    pub fn is_wrong_kind(&self) -> bool {
        matches!(self.cause, Cause::WrongKind { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.cause, Cause::Aborted)
    }
}

/// Convenience alias used throughout `fluentfs-core`.
pub type FsResult<T> = Result<T, FsError>;

/// Failure to turn path pieces into an absolute path.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A `$NAME` piece named a variable that is not set.
    #[error("environment variable {0} is not set")]
    MissingEnvVar(String),

    /// `~` was used but no home directory is known.
    #[error("home directory could not be determined")]
    NoHomeDir,

    /// A platform folder (cache, config, ...) is unknown on this system.
    #[error("no {0} folder is known on this platform")]
    UnknownFolder(&'static str),

    /// Relative pieces need the current directory, which is unavailable.
    #[error("current directory is unavailable")]
    CurrentDir(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn relocation_errors_start_with_placeholder_destination() {
        let err = FsError::new(Operation::Copy, "/a.txt", Cause::Aborted);
        assert_eq!(err.destination(), Some(Path::new(UNRESOLVED_DESTINATION)));

        let err = FsError::new(Operation::Read, "/a.txt", Cause::Aborted);
        assert_eq!(err.destination(), None);
    }

    #[test]
    fn display_names_operation_paths_and_cause() {
        let err = FsError::new(Operation::Move, "/a.txt", Cause::Aborted).with_destination("/b.txt");
        assert_eq!(err.to_string(), "failed to move /a.txt to /b.txt: operation aborted");

        let err = FsError::new(Operation::Append, "/log.txt", Cause::Stringify("empty".into()));
        assert_eq!(
            err.to_string(),
            "failed to append to /log.txt: could not serialise content: empty"
        );
    }

    #[test]
    fn not_found_io_is_classified() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = FsError::io(Operation::Read, "/missing", io_err, EntryKind::File);
        assert!(err.is_not_found());
        assert!(err.source().is_some());
    }

    #[test]
    fn directory_where_file_expected_is_wrong_kind() {
        let io_err = io::Error::new(io::ErrorKind::IsADirectory, "dir");
        let cause = Cause::from_io(io_err, EntryKind::File);
        assert!(matches!(
            cause,
            Cause::WrongKind {
                expected: EntryKind::File,
                actual: EntryKind::Folder
            }
        ));
    }

    #[test]
    fn other_io_errors_stay_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let cause = Cause::from_io(io_err, EntryKind::File);
        assert!(matches!(cause, Cause::Io(_)));
        assert_eq!(cause.to_string(), "nope");
    }

    #[test]
    fn resolve_error_displays_variable() {
        let err = ResolveError::MissingEnvVar("PROJECT_ROOT".into());
        assert_eq!(err.to_string(), "environment variable PROJECT_ROOT is not set");
    }
}
