//! Configuration module for buildsweep
//!
//! Provides XDG-compliant layered configuration loading. The configuration
//! replaces the hard-coded repository root and build tool names.

pub mod loader;
pub mod model;

pub use loader::{config_layers, load_config, loaded_config_files};
pub use model::*;
