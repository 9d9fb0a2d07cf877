//! Build dispatch
//!
//! Runs the build tool matching a repository's detected build system and
//! records the outcome: build log, progress line, result file entry and
//! removal of the build output directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use colored::Colorize;

use super::detect::{detect_build_system, BuildSystemKind, DetectionResult};
use super::results::{BuildOutcome, ResultLog, Tally};
use crate::config::Config;
use crate::error::BuildError;
use crate::executor::{ExecOptions, Launcher};

/// Builds one repository at a time
pub struct BuildDispatcher<L: Launcher> {
    config: Config,
    launcher: L,
    results: ResultLog,
}

impl<L: Launcher> BuildDispatcher<L> {
    pub fn new(config: Config, launcher: L) -> Self {
        let results = ResultLog::from_config(&config.results);
        Self {
            config,
            launcher,
            results,
        }
    }

    /// Project root searched for manifests inside a repository checkout
    pub fn project_path(&self, repo: &Path) -> PathBuf {
        repo.join(&self.config.defaults.sources_dir)
    }

    /// Build the repository at `repo` and record the outcome in `tally`
    ///
    /// Blocks until the build tool exits. A failed build is `Ok(Failure)`;
    /// `Err` means the repository could not be processed at all.
    pub fn dispatch(&self, repo: &Path, tally: &mut Tally) -> Result<BuildOutcome, BuildError> {
        let project_path = self.project_path(repo);
        let detection = detect_build_system(&project_path);

        let exit_code = self.run_build(&project_path, &detection)?;
        let outcome = BuildOutcome::from_exit_code(exit_code);
        tally.record(outcome);

        let progress = progress_line(tally, &project_path, detection.kind, outcome);
        match outcome {
            BuildOutcome::Successful => println!("{}", progress.green()),
            BuildOutcome::Failure => println!("{}", progress.red()),
        }

        self.results
            .append(outcome, &result_line(&project_path, detection.kind, outcome))?;

        self.remove_output_dir(&detection.dir);

        Ok(outcome)
    }

    /// Run the tool for `detection` and return its exit code
    fn run_build(
        &self,
        project_path: &Path,
        detection: &DetectionResult,
    ) -> Result<Option<i32>, BuildError> {
        let tools = &self.config.tools;
        let (tool, args) = match detection.kind {
            BuildSystemKind::Gradle => (&tools.gradle, tools.gradle.args.clone()),
            BuildSystemKind::Maven => (&tools.maven, tools.maven.args.clone()),
            BuildSystemKind::None if self.config.defaults.compile_unmanaged => {
                let mut args = tools.kotlinc.args.clone();
                args.push(project_path.to_string_lossy().into_owned());
                (&tools.kotlinc, args)
            }
            BuildSystemKind::None => return Ok(Some(0)),
        };

        let log_path = detection.dir.join(&self.config.defaults.build_log);
        let options = ExecOptions::in_dir(&detection.dir).with_envs(&self.config.env);

        match self.launcher.launch(&tool.command, &args, &options) {
            Ok(result) => {
                tracing::info!(
                    project = %project_path.display(),
                    kind = %detection.kind,
                    exit_code = ?result.exit_code,
                    elapsed_ms = result.duration.as_millis() as u64,
                    "build finished"
                );
                write_build_log(&log_path, &result.log_text())?;
                Ok(result.exit_code)
            }
            Err(e) if self.config.defaults.keep_going && e.is_per_project() => {
                tracing::error!(project = %project_path.display(), command = %tool.command_line(), "{}", e);
                write_build_log(&log_path, &format!("{}\n", e))?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the build output directory that sits beside `manifest_dir`
    ///
    /// The directory removed is `<parent of manifest_dir>/build`, never a
    /// directory inside the detected project.
    fn remove_output_dir(&self, manifest_dir: &Path) {
        let Some(parent) = manifest_dir.parent() else {
            return;
        };
        let output = parent.join(&self.config.defaults.output_dir);
        match fs::remove_dir_all(&output) {
            Ok(()) => tracing::debug!(dir = %output.display(), "removed build output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", output.display(), e),
        }
    }
}

/// Replace the build log with `text`
fn write_build_log(path: &Path, text: &str) -> Result<(), BuildError> {
    fs::write(path, text).map_err(|e| BuildError::write_failed(path, e))
}

/// Console progress line, printed after `tally` includes this build
pub fn progress_line(
    tally: &Tally,
    project_path: &Path,
    kind: BuildSystemKind,
    outcome: BuildOutcome,
) -> String {
    let mut line = format!(
        "{}/{} successful out of {}, {}: {} {}",
        tally.successful,
        tally.attempted,
        tally.total,
        project_path.display(),
        kind,
        outcome.status()
    );
    if !outcome.is_success() {
        line.push_str(" (see build log)");
    }
    line
}

/// Line appended to the result file for `outcome`
pub fn result_line(project_path: &Path, kind: BuildSystemKind, outcome: BuildOutcome) -> String {
    format!("{}: {} {}", project_path.display(), kind, outcome.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;
    use crate::executor::{ExecResult, MockLauncher};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = Config::default();
            config.results.success_file = dir.path().join("ok.txt").to_string_lossy().into_owned();
            config.results.failure_file = dir.path().join("bad.txt").to_string_lossy().into_owned();
            Self { dir, config }
        }

        /// Create `<tmp>/repos/alice/<name>` with the given files under `sources`
        fn repo(&self, name: &str, files: &[&str]) -> PathBuf {
            let repo = self.dir.path().join("repos").join("alice").join(name);
            let sources = repo.join("sources");
            fs::create_dir_all(&sources).unwrap();
            for file in files {
                let path = sources.join(file);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, "").unwrap();
            }
            repo
        }

        fn successes(&self) -> String {
            fs::read_to_string(self.dir.path().join("ok.txt")).unwrap_or_default()
        }

        fn failures(&self) -> String {
            fs::read_to_string(self.dir.path().join("bad.txt")).unwrap_or_default()
        }
    }

    fn exited(code: i32, lines: &[&str]) -> ExecResult {
        ExecResult {
            exit_code: Some(code),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            duration: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_gradle_success() {
        let fx = Fixture::new();
        let repo = fx.repo("todo-app", &["build.gradle"]);
        let sources = repo.join("sources");
        fs::create_dir_all(repo.join("build/libs")).unwrap();

        let mut launcher = MockLauncher::new();
        let expected_dir = sources.clone();
        launcher
            .expect_launch()
            .withf(move |program, args, options| {
                program == "gradle"
                    && args == ["build".to_string()]
                    && options.working_dir.as_deref() == Some(expected_dir.as_path())
            })
            .times(1)
            .returning(|_, _, _| Ok(exited(0, &["> Task :build", "BUILD SUCCESSFUL in 3s"])));

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);
        let outcome = dispatcher.dispatch(&repo, &mut tally).unwrap();

        assert_eq!(outcome, BuildOutcome::Successful);
        assert_eq!(tally.successful, 1);
        assert_eq!(
            fs::read_to_string(sources.join("buildLog.txt")).unwrap(),
            "> Task :build\nBUILD SUCCESSFUL in 3s\n"
        );
        assert_eq!(
            fx.successes(),
            format!("{}: GRADLE BUILD SUCCESSFUL\n", sources.display())
        );
        assert!(fx.failures().is_empty());
        assert!(!repo.join("build").exists());
    }

    #[test]
    fn test_maven_failure() {
        let fx = Fixture::new();
        let repo = fx.repo("shop", &["backend/pom.xml"]);
        let backend = repo.join("sources/backend");
        fs::create_dir_all(repo.join("sources/build/classes")).unwrap();

        let mut launcher = MockLauncher::new();
        launcher
            .expect_launch()
            .withf(|program, args, _| program == "mvn" && args == ["install".to_string()])
            .times(1)
            .returning(|_, _, _| Ok(exited(1, &["[ERROR] COMPILATION ERROR", "[INFO] BUILD FAILURE"])));

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);
        let outcome = dispatcher.dispatch(&repo, &mut tally).unwrap();

        assert_eq!(outcome, BuildOutcome::Failure);
        assert_eq!(tally.failed(), 1);
        assert!(fx
            .failures()
            .trim_end()
            .ends_with("MAVEN BUILD FAILED"));
        assert!(fx.successes().is_empty());
        let log = fs::read_to_string(backend.join("buildLog.txt")).unwrap();
        assert!(log.contains("[ERROR] COMPILATION ERROR"));
        assert!(!repo.join("sources/build").exists());
    }

    #[test]
    fn test_no_manifest_is_success_without_spawning() {
        let fx = Fixture::new();
        let repo = fx.repo("scripts", &["src/Main.kt"]);

        let mut launcher = MockLauncher::new();
        launcher.expect_launch().never();

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);
        let outcome = dispatcher.dispatch(&repo, &mut tally).unwrap();

        assert_eq!(outcome, BuildOutcome::Successful);
        assert!(fx.successes().trim_end().ends_with("NO BUILD SUCCESSFUL"));
        assert!(!repo.join("sources/buildLog.txt").exists());
    }

    #[test]
    fn test_no_manifest_keeps_build_package_in_sources() {
        let fx = Fixture::new();
        let repo = fx.repo("kotlin-tools", &["build/Main.kt"]);
        fs::create_dir_all(repo.join("build/tmp")).unwrap();

        let mut launcher = MockLauncher::new();
        launcher.expect_launch().never();

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);
        dispatcher.dispatch(&repo, &mut tally).unwrap();

        assert!(repo.join("sources/build/Main.kt").exists());
        assert!(!repo.join("build").exists());
    }

    #[test]
    fn test_compile_unmanaged_runs_kotlinc() {
        let mut fx = Fixture::new();
        fx.config.defaults.compile_unmanaged = true;
        let repo = fx.repo("kotlin-snippets", &["Main.kt"]);
        let sources = repo.join("sources");

        let mut launcher = MockLauncher::new();
        let expected_arg = sources.to_string_lossy().into_owned();
        launcher
            .expect_launch()
            .withf(move |program, args, _| program == "kotlinc" && args == [expected_arg.clone()])
            .times(1)
            .returning(|_, _, _| Ok(exited(2, &["error: unresolved reference"])));

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);
        let outcome = dispatcher.dispatch(&repo, &mut tally).unwrap();

        assert_eq!(outcome, BuildOutcome::Failure);
        assert!(fx.failures().trim_end().ends_with("NO BUILD FAILED"));
        assert!(sources.join("buildLog.txt").exists());
    }

    #[test]
    fn test_build_log_is_overwritten() {
        let fx = Fixture::new();
        let repo = fx.repo("lib", &["build.gradle.kts"]);

        let mut launcher = MockLauncher::new();
        let mut run = 0;
        launcher.expect_launch().times(2).returning(move |_, _, _| {
            run += 1;
            Ok(exited(0, &[&format!("run {}", run)]))
        });

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(2);
        dispatcher.dispatch(&repo, &mut tally).unwrap();
        dispatcher.dispatch(&repo, &mut tally).unwrap();

        assert_eq!(
            fs::read_to_string(repo.join("sources/buildLog.txt")).unwrap(),
            "run 2\n"
        );
        assert_eq!(fx.successes().lines().count(), 2);
    }

    #[test]
    fn test_killed_process_is_failure() {
        let fx = Fixture::new();
        let repo = fx.repo("hung", &["build.gradle"]);

        let mut launcher = MockLauncher::new();
        launcher.expect_launch().returning(|_, _, _| {
            Ok(ExecResult {
                exit_code: None,
                lines: vec![],
                duration: Duration::ZERO,
            })
        });

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);

        assert_eq!(
            dispatcher.dispatch(&repo, &mut tally).unwrap(),
            BuildOutcome::Failure
        );
    }

    #[test]
    fn test_spawn_failure_aborts_by_default() {
        let fx = Fixture::new();
        let repo = fx.repo("app", &["pom.xml"]);

        let mut launcher = MockLauncher::new();
        launcher.expect_launch().returning(|program, args, _| {
            Err(BuildError::SpawnFailed {
                command: crate::executor::command_line(program, args),
                error: "No such file or directory (os error 2)".to_string(),
            })
        });

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);
        let err = dispatcher.dispatch(&repo, &mut tally).unwrap_err();

        assert!(matches!(err, BuildError::SpawnFailed { .. }));
        assert_eq!(tally.attempted, 0);
        assert!(fx.successes().is_empty());
        assert!(fx.failures().is_empty());
    }

    #[test]
    fn test_spawn_failure_recorded_with_keep_going() {
        let mut fx = Fixture::new();
        fx.config.defaults.keep_going = true;
        let repo = fx.repo("app", &["pom.xml"]);

        let mut launcher = MockLauncher::new();
        launcher.expect_launch().returning(|_, _, _| {
            Err(BuildError::SpawnFailed {
                command: "mvn install".to_string(),
                error: "No such file or directory (os error 2)".to_string(),
            })
        });

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);
        let outcome = dispatcher.dispatch(&repo, &mut tally).unwrap();

        assert_eq!(outcome, BuildOutcome::Failure);
        assert!(fx.failures().trim_end().ends_with("MAVEN BUILD FAILED"));
        let log = fs::read_to_string(repo.join("sources/buildLog.txt")).unwrap();
        assert!(log.contains("mvn install"));
    }

    #[test]
    fn test_env_and_custom_tool_are_passed() {
        let mut fx = Fixture::new();
        fx.config.tools.gradle = ToolConfig::new("./gradlew", &["assemble", "--offline"]);
        fx.config
            .env
            .insert("JAVA_HOME".to_string(), "/opt/jdk-17".to_string());
        let repo = fx.repo("wrapper", &["build.gradle"]);

        let mut launcher = MockLauncher::new();
        launcher
            .expect_launch()
            .withf(|program, args, options| {
                program == "./gradlew"
                    && args == ["assemble".to_string(), "--offline".to_string()]
                    && options.env.get("JAVA_HOME").map(String::as_str) == Some("/opt/jdk-17")
            })
            .times(1)
            .returning(|_, _, _| Ok(exited(0, &[])));

        let dispatcher = BuildDispatcher::new(fx.config.clone(), launcher);
        let mut tally = Tally::new(1);
        dispatcher.dispatch(&repo, &mut tally).unwrap();
    }

    #[test]
    fn test_progress_line_wording() {
        let path = Path::new("/repos/alice/todo/sources");
        let tally = Tally {
            total: 10,
            attempted: 4,
            successful: 3,
        };

        assert_eq!(
            progress_line(&tally, path, BuildSystemKind::Gradle, BuildOutcome::Successful),
            "3/4 successful out of 10, /repos/alice/todo/sources: GRADLE BUILD SUCCESSFUL"
        );
        assert_eq!(
            progress_line(&tally, path, BuildSystemKind::Maven, BuildOutcome::Failure),
            "3/4 successful out of 10, /repos/alice/todo/sources: MAVEN BUILD FAILED (see build log)"
        );
    }

    #[test]
    fn test_result_line_wording() {
        let path = Path::new("/repos/bob/empty/sources");
        assert_eq!(
            result_line(path, BuildSystemKind::None, BuildOutcome::Successful),
            "/repos/bob/empty/sources: NO BUILD SUCCESSFUL"
        );
    }
}
