//! Configuration model for buildsweep
//!
//! Defines the structure for XDG-compliant layered configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::BuildError;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Layout and run behaviour
    #[serde(default)]
    pub defaults: Defaults,

    /// Where build outcomes are appended
    #[serde(default)]
    pub results: ResultsConfig,

    /// Build tool commands
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Extra environment variables passed to every build
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Layout and run behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Root of the `<user>/<repo>` tree
    #[serde(default = "default_repos_root")]
    pub repos_root: String,

    /// Directory inside each repository that holds the project sources
    #[serde(default = "default_sources_dir")]
    pub sources_dir: String,

    /// File name of the per-project build log
    #[serde(default = "default_build_log")]
    pub build_log: String,

    /// Build output directory removed after each build
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Record spawn failures as failed builds instead of aborting
    #[serde(default)]
    pub keep_going: bool,

    /// Compile projects without a manifest with kotlinc
    #[serde(default)]
    pub compile_unmanaged: bool,
}

fn default_repos_root() -> String {
    "repos".to_string()
}

fn default_sources_dir() -> String {
    "sources".to_string()
}

fn default_build_log() -> String {
    "buildLog.txt".to_string()
}

fn default_output_dir() -> String {
    "build".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            repos_root: default_repos_root(),
            sources_dir: default_sources_dir(),
            build_log: default_build_log(),
            output_dir: default_output_dir(),
            keep_going: false,
            compile_unmanaged: false,
        }
    }
}

impl Defaults {
    /// Repository root with `~` and `$VAR` expanded
    pub fn expanded_root(&self) -> Result<PathBuf, BuildError> {
        expand_path(&self.repos_root)
    }
}

/// Result file locations, relative to the current directory unless absolute
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultsConfig {
    #[serde(default = "default_success_file")]
    pub success_file: String,

    #[serde(default = "default_failure_file")]
    pub failure_file: String,
}

fn default_success_file() -> String {
    "successfulBuilds.txt".to_string()
}

fn default_failure_file() -> String {
    "failureBuilds.txt".to_string()
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            success_file: default_success_file(),
            failure_file: default_failure_file(),
        }
    }
}

/// Build tool commands, one per build system
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_gradle")]
    pub gradle: ToolConfig,

    #[serde(default = "default_maven")]
    pub maven: ToolConfig,

    /// Used only when `defaults.compile_unmanaged` is set; the project path
    /// is appended to `args`
    #[serde(default = "default_kotlinc")]
    pub kotlinc: ToolConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            gradle: default_gradle(),
            maven: default_maven(),
            kotlinc: default_kotlinc(),
        }
    }
}

/// A single build tool invocation
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ToolConfig {
    /// Program name or path
    pub command: String,

    /// Arguments passed before any project-specific ones
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolConfig {
    pub fn new(command: impl Into<String>, args: &[&str]) -> Self {
        Self {
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Command line for display/logging
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn default_gradle() -> ToolConfig {
    ToolConfig::new("gradle", &["build"])
}

fn default_maven() -> ToolConfig {
    ToolConfig::new("mvn", &["install"])
}

fn default_kotlinc() -> ToolConfig {
    ToolConfig::new("kotlinc", &[])
}

/// Expand `~` and environment variables in a configured path
pub fn expand_path(raw: &str) -> Result<PathBuf, BuildError> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| BuildError::Config(format!("cannot expand '{}': {}", raw, e)))
}
