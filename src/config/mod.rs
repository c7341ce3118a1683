//! Configuration management
//!
//! Defaults, an optional TOML file and `TALLY_*` environment overrides are
//! layered into a plain [`Config`] value that callers hand to the core.

pub mod settings;

pub use settings::Config;
