//! Files and folders: construction, navigation and the async operations on
//! them.

pub mod download;
pub mod file;
pub mod folder;
pub mod known;
pub(crate) mod ops;

use std::fmt;

pub use download::{DownloadOptions, DownloadOutcome, DownloadProgress};
pub use file::{File, ReadOptions, WriteOptions};
pub use folder::{Folder, FolderInfo};
pub use ops::Destination;

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

impl<C: crate::codec::Codec> fmt::Display for File<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}
