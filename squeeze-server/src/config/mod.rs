//! Configuration management for the squeeze server
//!
//! A TOML file with `[server]` and `[storage]` tables. Every field has a
//! default, so an empty or missing file is valid.

mod defaults;
mod loader;
mod schema;

pub use defaults::DEFAULT_CONFIG_TOML;
pub use loader::ConfigLoader;
pub use schema::*;
