//! Path resolution and name decomposition.

pub mod info;
pub mod resolve;

pub use info::{split_extension, PathInfo};
pub use resolve::{
    join_lexical, normalize, resolve, resolve_with, Environment, FixedEnv, IntoPathPieces,
    PathPiece, SystemEnv,
};
