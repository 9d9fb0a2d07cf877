//! Repository discovery and the batch driver
//!
//! The repository tree is laid out as `<root>/<user>/<repo>`; every
//! second-level directory is one checkout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::{BuildDispatcher, Tally};
use crate::error::BuildError;
use crate::executor::Launcher;

/// One repository checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryEntry {
    pub user: String,
    pub name: String,
    pub path: PathBuf,
}

/// List every `<root>/<user>/<repo>` directory, sorted by user then name
///
/// Files at either level are skipped. Any listing error is returned.
pub fn discover_repositories(root: &Path) -> Result<Vec<RepositoryEntry>, BuildError> {
    if !root.is_dir() {
        return Err(BuildError::RootNotFound {
            path: root.display().to_string(),
        });
    }

    let mut repos = Vec::new();
    for user_dir in subdirectories(root)? {
        let user = file_name(&user_dir);
        for repo_dir in subdirectories(&user_dir)? {
            repos.push(RepositoryEntry {
                user: user.clone(),
                name: file_name(&repo_dir),
                path: repo_dir,
            });
        }
    }

    repos.sort_by(|a, b| (&a.user, &a.name).cmp(&(&b.user, &b.name)));
    tracing::debug!(root = %root.display(), count = repos.len(), "discovered repositories");
    Ok(repos)
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build every repository in order, one at a time
///
/// Stops at the first error; builds already recorded stay in the result
/// files.
pub fn run_batch<L: Launcher>(
    repos: &[RepositoryEntry],
    dispatcher: &BuildDispatcher<L>,
) -> Result<Tally, BuildError> {
    let mut tally = Tally::new(repos.len());
    tracing::info!(total = tally.total, "starting batch");

    for repo in repos {
        let span = tracing::info_span!("repo", user = %repo.user, name = %repo.name);
        let _guard = span.enter();
        dispatcher.dispatch(&repo.path, &mut tally)?;
    }

    tracing::info!(
        total = tally.total,
        successful = tally.successful,
        failed = tally.failed(),
        "batch finished"
    );
    Ok(tally)
}
