//! Configuration types and parsing for Piret
//!
//! Everything has a default, so an empty TOML document (or no file at all)
//! yields a working configuration.

pub mod parser;
pub mod types;

pub use parser::ConfigError;
pub use types::*;
