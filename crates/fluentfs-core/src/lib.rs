//! fluentfs core library: typed files and folders over an async filesystem.
//!
//! A [`Folder`] or [`File`] is an immutable absolute path built from path
//! pieces (`~` and `$NAME` are expanded). Navigation is synchronous and
//! lexical; every filesystem operation is an `async fn` returning
//! [`FsResult<T>`], so steps chain with `?` and the first failure wins.
//!
//! # Modules
//!
//! - [`path`]: piece resolution, normalisation and [`PathInfo`].
//! - [`fs`]: [`Folder`], [`File`], relocation, downloads and well-known folders.
//! - [`codec`]: plain text and schema-validated JSON / YAML / TOML content.
//! - [`search`]: glob and extension search below a folder.
//! - [`phash`]: perceptual-hash fingerprints and their comparison.
//! - [`config`]: library defaults read from TOML.
//! - [`error`]: [`FsError`], its [`Operation`] and [`Cause`], and [`ResolveError`].

pub mod codec;
pub mod config;
pub mod error;
pub mod fs;
pub mod path;
pub mod phash;
pub(crate) mod pipeline;
pub mod search;

pub use codec::{
    Codec, Format, Issue, Issues, Json, JsonCodec, Schema, SerdeSchema, Spacing, Structured, Text,
    Toml, TomlCodec, ValueSchema, Yaml, YamlCodec,
};
pub use config::{Config, ConfigFile};
pub use error::{
    Cause, EntryKind, FsError, FsResult, Operation, ResolveError, UNRESOLVED_DESTINATION,
};
pub use fs::known::{
    cache_folder, config_folder, current_folder, data_folder, home_folder, logs_folder,
    temp_folder,
};
pub use fs::{
    Destination, DownloadOptions, DownloadOutcome, DownloadProgress, File, Folder, FolderInfo,
    ReadOptions, WriteOptions,
};
pub use path::{Environment, FixedEnv, IntoPathPieces, PathInfo, PathPiece, SystemEnv};
pub use phash::{
    compare_phashes, phashes_match, PhashComparison, PhashParseError, PhashString, PhashThreshold,
    Similarity, ThresholdError,
};
pub use search::{FindOptions, PatternError};
pub use tokio_util::sync::CancellationToken;

/// Resolves a folder against the process environment.
pub fn folder(pieces: impl IntoPathPieces) -> Result<Folder, ResolveError> {
    Folder::new(pieces)
}

/// Resolves a text file against the process environment.
pub fn file(pieces: impl IntoPathPieces) -> Result<File, ResolveError> {
    File::new(pieces)
}
