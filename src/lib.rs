//! buildsweep - batch builder for a tree of checked-out repositories
//!
//! Walks `<root>/<user>/<repo>/sources`, detects which build system each
//! project uses, runs it, and records the outcome:
//! - **Gradle** - `build.gradle` or `build.gradle.kts`, built with `gradle build`
//! - **Maven** - `pom.xml`, built with `mvn install`
//! - **No manifest** - counted as a successful build
//!
//! ## Outputs
//!
//! - `buildLog.txt` next to each manifest, holding the merged tool output
//! - `successfulBuilds.txt` / `failureBuilds.txt`, one appended line per project
//! - a progress line on stdout per project

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod sweep;

pub use builder::{
    detect_build_system, BuildDispatcher, BuildOutcome, BuildSystemKind, DetectionResult, Tally,
};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::BuildError;
pub use executor::{exec_merged, ExecOptions, ExecResult, Launcher, ProcessLauncher};
pub use sweep::{discover_repositories, run_batch, RepositoryEntry};
