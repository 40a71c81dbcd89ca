// src/config/mod.rs

//! Configuration loading and validation for the console.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply env overrides (`loader.rs`).
//! - Validate endpoint URLs and capacities (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConnectionSection, ConsoleConfig, LogsSection, RawConsoleConfig, ServerSection,
};
