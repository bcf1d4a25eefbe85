//! Error types for `fluentfs-media`.

use std::io;
use std::path::PathBuf;

use fluentfs_core::{Cause, FsError};

/// Unified error type for image and video operations.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// A filesystem step failed (missing source, unwritable output, ...).
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The image could not be decoded or encoded.
    #[error("image error for {}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An external tool could not be started.
    #[error("could not run {program} for {}", .path.display())]
    Spawn {
        program: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external tool ran but reported failure.
    #[error("{program} failed for {}: {stderr}", .path.display())]
    Tool {
        program: &'static str,
        path: PathBuf,
        stderr: String,
    },

    /// Tool output was malformed or failed validation.
    #[error("unusable metadata for {}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        cause: Cause,
    },

    /// The tool reported success but produced no output file.
    #[error("{program} produced no output at {}", .path.display())]
    MissingOutput {
        program: &'static str,
        path: PathBuf,
    },

    /// A blocking decode task panicked or was cancelled.
    #[error("background media task failed")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience alias used throughout `fluentfs-media`.
pub type MediaResult<T> = Result<T, MediaError>;
