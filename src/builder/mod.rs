//! Build system detection and dispatch
//!
//! Supports:
//! - Gradle (`build.gradle`, `build.gradle.kts`)
//! - Maven (`pom.xml`)
//! - Projects without a manifest, optionally compiled with kotlinc

pub mod detect;
pub mod dispatch;
pub mod results;

pub use detect::{detect_build_system, BuildSystemKind, DetectionResult, MANIFESTS};
pub use dispatch::{progress_line, result_line, BuildDispatcher};
pub use results::{BuildOutcome, ResultLog, Tally};
