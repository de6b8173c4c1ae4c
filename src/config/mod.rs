// src/config/mod.rs

//! Optional TOML configuration for pipexec.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate values that serde cannot check on its own (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, Defaults, RawConfigFile, RawDefaults};
pub use validate::parse_duration;
