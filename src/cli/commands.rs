//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Batch builder for a tree of checked-out repositories.
///
/// Walks `<root>/<user>/<repo>/sources`, detects Gradle or Maven, runs the
/// build, and appends each outcome to successfulBuilds.txt or
/// failureBuilds.txt.
#[derive(Parser, Debug)]
#[command(name = "buildsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit diagnostics as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Config file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every repository under the root
    Run(RunArgs),

    /// List repositories and their detected build systems
    List(ListArgs),

    /// Detect which build system a project uses
    Detect(DetectArgs),

    /// Show whether each build tool can be found
    Tools(ToolsArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the `run` subcommand
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Repository root (defaults to `defaults.repos_root`)
    pub root: Option<String>,

    /// Record a build tool that cannot be started as a failed build and continue
    #[arg(long)]
    pub keep_going: bool,

    /// Compile projects without a build manifest using kotlinc
    #[arg(long)]
    pub compile_unmanaged: bool,
}

/// Arguments for the `list` subcommand
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Repository root (defaults to `defaults.repos_root`)
    pub root: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `detect` subcommand
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Project root to search for build manifests
    pub path: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `tools` subcommand
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `config` subcommand
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
    /// Plain text (one entry per line)
    Plain,
}
