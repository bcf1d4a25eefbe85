//! Library defaults loaded from a TOML file.
//!
//! A missing section or key falls back to its default, so an empty file is
//! a valid configuration.

use serde::{Deserialize, Serialize};

use crate::codec::{SerdeSchema, Spacing, TomlCodec};
use crate::error::{FsResult, ResolveError};
use crate::fs::known::config_folder;
use crate::fs::{File, Folder, WriteOptions};
use crate::phash::PhashThreshold;
use crate::search::FindOptions;

/// Folder name used below the platform config folder.
pub const APP_NAME: &str = "fluentfs";

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// A configuration file, read and written as TOML.
pub type ConfigFile = File<TomlCodec<SerdeSchema<Config>>>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub codec: CodecConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub phash: PhashConfig,
}

impl Config {
    /// The configuration file inside `folder`.
    pub fn file_in(folder: &Folder) -> ConfigFile {
        folder.file(CONFIG_FILE_NAME).toml(SerdeSchema::new())
    }

    /// `<config folder>/fluentfs/config.toml`.
    pub fn default_file() -> Result<ConfigFile, ResolveError> {
        Ok(Self::file_in(&config_folder()?.folder(APP_NAME)))
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// An [`crate::Operation::Read`] error: not found, an I/O cause,
    /// [`crate::Cause::Parse`] for malformed TOML or [`crate::Cause::Invalid`]
    /// for out-of-range values.
    pub async fn load(file: &ConfigFile) -> FsResult<Self> {
        let config = file.read().await?;
        tracing::debug!(path = %file.path().display(), "loaded config");
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub async fn load_or_default(file: &ConfigFile) -> FsResult<Self> {
        match Self::load(file).await {
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %file.path().display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub async fn save(&self, file: &ConfigFile) -> FsResult<()> {
        file.write(self, &WriteOptions::default()).await
    }

    /// Write options using the configured indentation.
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions::new().spacing(Spacing::Spaces(self.codec.indent))
    }

    /// Search options using the configured hidden and symlink handling.
    pub fn find_options(&self) -> FindOptions {
        FindOptions::new()
            .include_hidden(self.search.include_hidden)
            .follow_links(self.search.follow_links)
    }

    pub fn phash_threshold(&self) -> PhashThreshold {
        self.phash.threshold
    }
}

/// How structured files are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

/// How folder searches walk the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub include_hidden: bool,
    #[serde(default)]
    pub follow_links: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            include_hidden: true,
            follow_links: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhashConfig {
    #[serde(default)]
    pub threshold: PhashThreshold,
}

fn default_indent() -> usize {
    2
}

fn default_true() -> bool {
    true
}
