//! Well-known folders of the current user and platform.

use crate::error::ResolveError;
use crate::fs::Folder;
use crate::path::normalize;

pub fn home_folder() -> Result<Folder, ResolveError> {
    Folder::new("~")
}

pub fn current_folder() -> Result<Folder, ResolveError> {
    Folder::new(())
}

pub fn temp_folder() -> Result<Folder, ResolveError> {
    Folder::new(std::env::temp_dir())
}

/// Per-user cache folder (`$XDG_CACHE_HOME` or `~/.cache` on Linux).
pub fn cache_folder() -> Result<Folder, ResolveError> {
    platform_folder(dirs::cache_dir(), "cache")
}

/// Per-user config folder (`$XDG_CONFIG_HOME` or `~/.config` on Linux).
pub fn config_folder() -> Result<Folder, ResolveError> {
    platform_folder(dirs::config_dir(), "config")
}

/// Per-user data folder (`$XDG_DATA_HOME` or `~/.local/share` on Linux).
pub fn data_folder() -> Result<Folder, ResolveError> {
    platform_folder(dirs::data_dir(), "data")
}

/// Per-user log folder: the state folder where the platform has one,
/// otherwise the local data folder.
pub fn logs_folder() -> Result<Folder, ResolveError> {
    platform_folder(dirs::state_dir().or_else(dirs::data_local_dir), "logs")
}

fn platform_folder(
    path: Option<std::path::PathBuf>,
    kind: &'static str,
) -> Result<Folder, ResolveError> {
    match path {
        Some(path) if path.is_absolute() => Ok(Folder::from_absolute(normalize(&path))),
        _ => Err(ResolveError::UnknownFolder(kind)),
    }
}
