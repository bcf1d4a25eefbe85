//! Turning path pieces into absolute, normalised paths.
//!
//! A piece is any string-like or numeric value, or an existing entity. The
//! first piece may start with `~` for the home directory, and any piece of
//! the form `$NAME`, `%NAME%` on Windows, or a bare all-uppercase `NAME` is
//! replaced by that environment variable. Expansion reads the environment through the
//! [`Environment`] trait so tests can inject a fixed one.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::codec::Codec;
use crate::error::ResolveError;
use crate::fs::{File, Folder};

/// Read access to the process environment.
pub trait Environment: Send + Sync {
    fn var(&self, name: &str) -> Option<OsString>;
    fn home_dir(&self) -> Option<PathBuf>;
    fn current_dir(&self) -> io::Result<PathBuf>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}

/// A fixed environment, mostly useful in tests.
#[derive(Debug, Clone, Default)]
pub struct FixedEnv {
    vars: HashMap<String, OsString>,
    home: Option<PathBuf>,
    current_dir: PathBuf,
}

impl FixedEnv {
    pub fn new(current_dir: impl Into<PathBuf>) -> Self {
        Self {
            current_dir: current_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl Environment for FixedEnv {
    fn var(&self, name: &str) -> Option<OsString> {
        self.vars.get(name).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self.current_dir.clone())
    }
}

/// One segment handed to a path constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPiece(PathBuf);

impl PathPiece {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

macro_rules! piece_from_path_like {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PathPiece {
                fn from(value: $ty) -> Self {
                    PathPiece(PathBuf::from(value))
                }
            }
        )*
    };
}

piece_from_path_like!(&str, String, &String, &Path, PathBuf, &PathBuf, OsString);

macro_rules! piece_from_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PathPiece {
                fn from(value: $ty) -> Self {
                    PathPiece(PathBuf::from(value.to_string()))
                }
            }
        )*
    };
}

piece_from_number!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl From<&Folder> for PathPiece {
    fn from(folder: &Folder) -> Self {
        PathPiece(folder.path().to_path_buf())
    }
}

impl<C: Codec> From<&File<C>> for PathPiece {
    fn from(file: &File<C>) -> Self {
        PathPiece(file.path().to_path_buf())
    }
}

/// Anything that can be spread into a sequence of path pieces: a single
/// piece, a tuple, an array, a slice or a vector of them.
pub trait IntoPathPieces {
    fn into_path_pieces(self) -> Vec<PathPiece>;
}

macro_rules! single_piece {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoPathPieces for $ty {
                fn into_path_pieces(self) -> Vec<PathPiece> {
                    vec![PathPiece::from(self)]
                }
            }
        )*
    };
}

single_piece!(
    &str, String, &String, &Path, PathBuf, &PathBuf, OsString, u8, u16, u32, u64, usize, i8, i16,
    i32, i64, isize, &Folder,
);

impl<C: Codec> IntoPathPieces for &File<C> {
    fn into_path_pieces(self) -> Vec<PathPiece> {
        vec![PathPiece::from(self)]
    }
}

impl IntoPathPieces for () {
    fn into_path_pieces(self) -> Vec<PathPiece> {
        Vec::new()
    }
}

impl<P: Into<PathPiece>> IntoPathPieces for Vec<P> {
    fn into_path_pieces(self) -> Vec<PathPiece> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<P: Into<PathPiece>, const N: usize> IntoPathPieces for [P; N] {
    fn into_path_pieces(self) -> Vec<PathPiece> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<P: Into<PathPiece> + Clone> IntoPathPieces for &[P] {
    fn into_path_pieces(self) -> Vec<PathPiece> {
        self.iter().cloned().map(Into::into).collect()
    }
}

macro_rules! tuple_pieces {
    ($($name:ident),+) => {
        impl<$($name: Into<PathPiece>),+> IntoPathPieces for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_path_pieces(self) -> Vec<PathPiece> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

tuple_pieces!(A);
tuple_pieces!(A, B);
tuple_pieces!(A, B, C);
tuple_pieces!(A, B, C, D);
tuple_pieces!(A, B, C, D, E);

/// Resolves pieces against the real process environment.
pub fn resolve(pieces: impl IntoPathPieces) -> Result<PathBuf, ResolveError> {
    resolve_with(&SystemEnv, pieces)
}

/// Resolves pieces into an absolute, normalised path.
///
/// Expansion happens per piece, before joining. Empty pieces are skipped,
/// an absolute piece discards everything before it, and relative paths are
/// anchored at the current directory. `..` never climbs above the root.
///
/// # Errors
///
/// - [`ResolveError::MissingEnvVar`] if a `$NAME` piece names an unset variable.
/// - [`ResolveError::NoHomeDir`] if `~` is used and no home is known.
/// - [`ResolveError::CurrentDir`] if a relative path needs the current directory
///   and it cannot be read.
pub fn resolve_with(
    env: &dyn Environment,
    pieces: impl IntoPathPieces,
) -> Result<PathBuf, ResolveError> {
    let mut resolved: Option<PathBuf> = None;

    for (index, piece) in pieces.into_path_pieces().into_iter().enumerate() {
        let expanded = expand_piece(env, piece.into_path_buf(), index == 0)?;
        if expanded.as_os_str().is_empty() {
            continue;
        }
        let mut path = match resolved.take() {
            Some(path) => path,
            None if expanded.is_absolute() => PathBuf::new(),
            None => env.current_dir().map_err(ResolveError::CurrentDir)?,
        };
        path.push(expanded);
        resolved = Some(path);
    }

    let resolved = match resolved {
        Some(path) => path,
        None => env.current_dir().map_err(ResolveError::CurrentDir)?,
    };
    Ok(normalize(&resolved))
}

/// Joins pieces onto an already absolute base without any expansion.
pub fn join_lexical(base: &Path, pieces: impl IntoPathPieces) -> PathBuf {
    let mut joined = base.to_path_buf();
    for piece in pieces.into_path_pieces() {
        if !piece.as_path().as_os_str().is_empty() {
            joined.push(piece.as_path());
        }
    }
    normalize(&joined)
}

/// Removes `.` segments and folds `..` into its parent, lexically.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

fn expand_piece(
    env: &dyn Environment,
    piece: PathBuf,
    first: bool,
) -> Result<PathBuf, ResolveError> {
    let Some(text) = piece.to_str() else {
        return Ok(piece);
    };

    if first {
        if text == "~" {
            return env.home_dir().ok_or(ResolveError::NoHomeDir);
        }
        if let Some(rest) = text.strip_prefix("~/") {
            let home = env.home_dir().ok_or(ResolveError::NoHomeDir)?;
            return Ok(home.join(rest));
        }
    }

    match env_reference(text) {
        Some(name) => env
            .var(name)
            .map(PathBuf::from)
            .ok_or_else(|| ResolveError::MissingEnvVar(name.to_owned())),
        None => Ok(piece),
    }
}

/// `$NAME`, `%NAME%` on Windows, or a bare all-uppercase `NAME`.
fn env_reference(text: &str) -> Option<&str> {
    let name = match text.strip_prefix('$') {
        Some(name) => name,
        None if cfg!(windows) && text.starts_with('%') => {
            text.strip_prefix('%')?.strip_suffix('%')?
        }
        None => text,
    };
    (is_env_name(name) && name.chars().any(|c| c.is_ascii_uppercase())).then_some(name)
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
