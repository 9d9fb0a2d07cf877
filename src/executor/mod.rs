//! Command execution module
//!
//! Provides process execution with:
//! - Merged stdout/stderr capture
//! - Environment variable injection
//! - Working directory control
//! - A [`Launcher`] seam for running builds without real tools

pub mod runner;

pub use runner::*;
