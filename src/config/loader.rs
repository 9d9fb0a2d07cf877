//! Configuration loader with XDG-compliant path resolution
//!
//! Loads configuration from multiple locations with layered priority:
//! 1. `/etc/buildsweep/config.toml` (lowest priority)
//! 2. `~/.config/buildsweep/config.toml`
//! 3. `~/.buildsweep.toml`
//! 4. `./.buildsweep.toml`
//! 5. the `--config` file (highest priority)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::model::Config;

/// Application name used for XDG directories
const APP_NAME: &str = "buildsweep";

/// Config file locations in merge order, lowest priority first
///
/// `override_path` (from `--config`) comes last and wins over every file.
pub fn config_layers(override_path: Option<&str>) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(format!("/etc/{}/config.toml", APP_NAME))];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("config.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}.toml", APP_NAME)));
    }
    paths.push(PathBuf::from(format!(".{}.toml", APP_NAME)));

    if let Some(path) = override_path {
        paths.push(PathBuf::from(path));
    }
    paths
}

/// The layers of [`config_layers`] that exist and will be merged
pub fn loaded_config_files(override_path: Option<&str>) -> Vec<PathBuf> {
    config_layers(override_path)
        .into_iter()
        .filter(|p| p.is_file())
        .collect()
}

/// Load the layered configuration
///
/// Built-in defaults, then every file from [`loaded_config_files`], then
/// `BUILDSWEEP_*` environment variables. A missing `--config` file is
/// warned about and skipped.
pub fn load_config(override_path: Option<&str>) -> Result<Config> {
    if let Some(path) = override_path {
        if !Path::new(path).is_file() {
            tracing::warn!("Override config not found: {}", path);
        }
    }

    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
    for path in loaded_config_files(override_path) {
        tracing::debug!(path = %path.display(), "loading config");
        figment = figment.merge(Toml::file(&path));
    }

    // BUILDSWEEP_DEFAULTS__REPOS_ROOT=/data maps to defaults.repos_root
    figment = figment.merge(Env::prefixed("BUILDSWEEP_").split("__"));

    figment.extract().context("Failed to load configuration")
}
