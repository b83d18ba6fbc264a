//! Configuration loading and parsing
//!
//! The machine configuration is compiled in from `machine.toml` and parsed
//! at boot by a custom no_std parser.

pub mod toml;

pub use toml::{parse_config, ConfigError, ParseError};
