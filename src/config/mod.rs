// src/config/mod.rs

//! Configuration loading and validation for relaunch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like shell and glob sanity (`validate.rs`).
//!
//! The config file is optional; every setting has a default and most can be
//! overridden from the command line.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_config};
pub use model::{ConfigFile, RawConfigFile, RunSection, SessionSection, WatchSection};
