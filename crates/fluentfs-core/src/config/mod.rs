//! Configuration for library defaults.

pub mod settings;

pub use settings::{Config, ConfigFile};
