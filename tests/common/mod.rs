//! Common test utilities for buildsweep integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Workspace holding a repository tree, fake tools and a config file
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("repos")).expect("Failed to create repos dir");
        fs::create_dir_all(dir.path().join("bin")).expect("Failed to create bin dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn repos(&self) -> PathBuf {
        self.path().join("repos")
    }

    /// Creates `repos/<user>/<repo>/sources`, with `manifest` inside `subdir`
    pub fn add_repo(&self, user: &str, repo: &str, subdir: &str, manifest: Option<&str>) -> PathBuf {
        let sources = self.repos().join(user).join(repo).join("sources");
        let manifest_dir = sources.join(subdir);
        fs::create_dir_all(&manifest_dir).expect("Failed to create sources dir");
        if let Some(name) = manifest {
            fs::write(manifest_dir.join(name), "").expect("Failed to write manifest");
        }
        sources
    }

    /// Writes an executable shell script into `bin/`
    pub fn add_tool(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join("bin").join(name);
        fs::write(&path, content).expect("Failed to write tool script");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)
                .expect("Failed to get metadata")
                .permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).expect("Failed to set permissions");
        }

        path
    }

    /// Writes `config.toml` pointing gradle and mvn at scripts in `bin/`
    pub fn write_config(&self) -> PathBuf {
        let bin = self.path().join("bin");
        let content = format!(
            r#"
[defaults]
repos_root = "{repos}"

[results]
success_file = "{root}/successfulBuilds.txt"
failure_file = "{root}/failureBuilds.txt"

[tools.gradle]
command = "{bin}/gradle"
args = ["build"]

[tools.maven]
command = "{bin}/mvn"
args = ["install"]
"#,
            repos = self.repos().display(),
            root = self.path().display(),
            bin = bin.display(),
        );
        let path = self.path().join("config.toml");
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).unwrap_or_default()
    }
}

/// Tool that prints to both streams and succeeds
pub const PASSING_TOOL: &str = r#"#!/bin/sh
echo "running $0 $@"
echo "compiler warning" >&2
exit 0
"#;

/// Tool that reports an error and exits non-zero
pub const FAILING_TOOL: &str = r#"#!/bin/sh
echo "compiling"
echo "error: cannot find symbol" >&2
exit 1
"#;
