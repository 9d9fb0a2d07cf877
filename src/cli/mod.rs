//! CLI module for buildsweep
//!
//! Provides command-line interface with the following subcommands:
//! - `run` - Build every repository under the root
//! - `list` - List repositories and detected build systems
//! - `detect` - Detect the build system of one project
//! - `tools` - Check that build tools resolve
//! - `config` - Show configuration

pub mod commands;

pub use commands::{Cli, Commands, OutputFormat};
