//! Build system auto-detection
//!
//! Walks a project tree looking for, in priority order:
//! - `build.gradle` (Gradle)
//! - `build.gradle.kts` (Gradle, Kotlin DSL)
//! - `pom.xml` (Maven)
//!
//! Every file of one name is considered before the next name is tried, so a
//! Gradle build anywhere in the tree wins over a Maven one.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

/// Manifest file names with the build system they identify, by priority
pub const MANIFESTS: &[(&str, BuildSystemKind)] = &[
    ("build.gradle", BuildSystemKind::Gradle),
    ("build.gradle.kts", BuildSystemKind::Gradle),
    ("pom.xml", BuildSystemKind::Maven),
];

/// Type of build system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildSystemKind {
    Gradle,
    Maven,
    /// No manifest found
    #[serde(rename = "NO")]
    None,
}

impl BuildSystemKind {
    /// Get the display name used in progress and result lines
    pub fn name(&self) -> &'static str {
        match self {
            BuildSystemKind::Gradle => "GRADLE",
            BuildSystemKind::Maven => "MAVEN",
            BuildSystemKind::None => "NO",
        }
    }
}

impl std::fmt::Display for BuildSystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of build system detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    /// The detected build system
    pub kind: BuildSystemKind,
    /// Directory holding the manifest, or the project root when none was found
    pub dir: PathBuf,
    /// Manifest file name that decided the kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<&'static str>,
}

impl DetectionResult {
    fn none(root: &Path) -> Self {
        Self {
            kind: BuildSystemKind::None,
            dir: root.to_path_buf(),
            manifest: None,
        }
    }
}

/// Detect which build system a project uses
///
/// Never fails: a tree without manifests (or a missing root) is
/// `BuildSystemKind::None` with `dir` set to `root` unchanged.
pub fn detect_build_system(root: &Path) -> DetectionResult {
    for &(name, kind) in MANIFESTS {
        if let Some(dir) = find_manifest_dir(root, name) {
            tracing::debug!(root = %root.display(), manifest = name, dir = %dir.display(), "detected {}", kind);
            return DetectionResult {
                kind,
                dir,
                manifest: Some(name),
            };
        }
    }

    tracing::debug!(root = %root.display(), "no build manifest found");
    DetectionResult::none(root)
}

/// Find the shallowest regular file called `file_name` under `root`
///
/// Returns its parent directory. Ties at the same depth go to the first
/// entry in file-name order.
fn find_manifest_dir(root: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .min_by_key(|entry| entry.depth())
        .and_then(|entry| entry.path().parent().map(Path::to_path_buf))
}
