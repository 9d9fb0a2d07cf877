//! buildsweep CLI entry point
//!
//! Usage:
//!   buildsweep run [ROOT]        Build every repository under ROOT
//!   buildsweep list [ROOT]       List repositories and detected build systems
//!   buildsweep detect <PATH>     Detect the build system of one project
//!   buildsweep tools             Check that build tools resolve
//!   buildsweep config            Show resolved configuration

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use buildsweep::builder::{detect_build_system, BuildDispatcher, BuildSystemKind};
use buildsweep::cli::{
    commands::{ConfigArgs, DetectArgs, ListArgs, RunArgs, ToolsArgs},
    Cli, Commands, OutputFormat,
};
use buildsweep::config::{expand_path, load_config, loaded_config_files, Config, ToolConfig};
use buildsweep::executor::{resolve_tool, ProcessLauncher};
use buildsweep::logging::{init_logging, LoggingConfig};
use buildsweep::sweep::{discover_repositories, run_batch};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_flags(cli.verbose, cli.log_json));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => run_builds(args, config_path),
        Commands::List(args) => list_repositories(args, config_path),
        Commands::Detect(args) => detect_project(args, config_path),
        Commands::Tools(args) => show_tools(args, config_path),
        Commands::Config(args) => show_config(args, config_path),
    }
}

/// Build every repository under the root
fn run_builds(args: RunArgs, config_path: Option<&str>) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.defaults.keep_going |= args.keep_going;
    config.defaults.compile_unmanaged |= args.compile_unmanaged;

    let root = resolve_root(args.root.as_deref(), &config)?;
    warn_missing_tools(&config);

    let repos = discover_repositories(&root)
        .with_context(|| format!("Failed to list repositories under {}", root.display()))?;

    let launcher = ProcessLauncher::new().context("Failed to start process runtime")?;
    let dispatcher = BuildDispatcher::new(config, launcher);
    let tally = run_batch(&repos, &dispatcher)?;

    println!();
    println!(
        "{}/{} projects built successfully",
        tally.successful, tally.total
    );

    Ok(())
}

/// List repositories and the build system each one would use
fn list_repositories(args: ListArgs, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let root = resolve_root(args.root.as_deref(), &config)?;
    let repos = discover_repositories(&root)
        .with_context(|| format!("Failed to list repositories under {}", root.display()))?;

    let rows: Vec<_> = repos
        .iter()
        .map(|repo| {
            let detection = detect_build_system(&repo.path.join(&config.defaults.sources_dir));
            (repo, detection)
        })
        .collect();

    match args.format {
        OutputFormat::Json => {
            let entries: Vec<_> = rows
                .iter()
                .map(|(repo, detection)| {
                    serde_json::json!({
                        "user": repo.user,
                        "name": repo.name,
                        "path": repo.path,
                        "kind": detection.kind,
                        "dir": detection.dir,
                        "manifest": detection.manifest,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Plain => {
            for (repo, detection) in &rows {
                println!("{}/{} {}", repo.user, repo.name, detection.kind);
            }
        }
        OutputFormat::Table => {
            println!("{}: {}", "Root".cyan(), root.display());
            println!();
            if rows.is_empty() {
                println!("No repositories found.");
                return Ok(());
            }

            let width = rows
                .iter()
                .map(|(repo, _)| repo.user.len() + repo.name.len() + 1)
                .max()
                .unwrap_or(10);
            for (repo, detection) in &rows {
                let label = format!("{}/{}", repo.user, repo.name);
                println!(
                    "  {:width$}  {:6}  {}",
                    label,
                    kind_label(detection.kind),
                    detection.dir.display(),
                    width = width
                );
            }
        }
    }

    Ok(())
}

/// Detect build system in a single project root
fn detect_project(args: DetectArgs, _config_path: Option<&str>) -> Result<()> {
    let path = absolute(Path::new(&args.path))?;
    if !path.is_dir() {
        anyhow::bail!("Project '{}' not found", args.path);
    }

    let detection = detect_build_system(&path);

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&detection)?);
        }
        OutputFormat::Plain => {
            println!("{}", detection.kind);
        }
        OutputFormat::Table => {
            println!("{}: {}", "Path".cyan(), path.display());
            println!("{}: {}", "Detected".cyan(), kind_label(detection.kind));
            if let Some(manifest) = detection.manifest {
                println!("{}: {}", "Manifest".cyan(), manifest);
            }
            println!("{}: {}", "Directory".cyan(), detection.dir.display());
        }
    }

    Ok(())
}

/// Show where each configured build tool resolves
fn show_tools(args: ToolsArgs, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let tools = configured_tools(&config);

    match args.format {
        OutputFormat::Json => {
            let entries: Vec<_> = tools
                .iter()
                .map(|(name, tool)| {
                    serde_json::json!({
                        "name": name,
                        "command": tool.command_line(),
                        "path": resolve_tool(&tool.command),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Plain => {
            for (name, tool) in &tools {
                match resolve_tool(&tool.command) {
                    Some(path) => println!("{} {}", name, path.display()),
                    None => println!("{} missing", name),
                }
            }
        }
        OutputFormat::Table => {
            for (name, tool) in &tools {
                let status = match resolve_tool(&tool.command) {
                    Some(path) => path.display().to_string().green(),
                    None => "not found".red(),
                };
                println!("  {:8} {:24} {}", name, tool.command_line(), status);
            }
        }
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(args: ConfigArgs, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        for path in loaded_config_files(config_path) {
            println!("# {}", path.display());
        }
        print!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}

/// Repository root from the command line or config, made absolute
fn resolve_root(root: Option<&str>, config: &Config) -> Result<PathBuf> {
    let root = match root {
        Some(raw) => expand_path(raw)?,
        None => config.defaults.expanded_root()?,
    };
    absolute(&root)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path))
    }
}

fn configured_tools(config: &Config) -> Vec<(&'static str, &ToolConfig)> {
    vec![
        ("gradle", &config.tools.gradle),
        ("maven", &config.tools.maven),
        ("kotlinc", &config.tools.kotlinc),
    ]
}

/// Warn about tools a run may need but that cannot be found
fn warn_missing_tools(config: &Config) {
    for (name, tool) in configured_tools(config) {
        if name == "kotlinc" && !config.defaults.compile_unmanaged {
            continue;
        }
        if resolve_tool(&tool.command).is_none() {
            tracing::warn!(
                "{} command '{}' not found; projects that need it will fail",
                name,
                tool.command
            );
        }
    }
}

fn kind_label(kind: BuildSystemKind) -> colored::ColoredString {
    match kind {
        BuildSystemKind::Gradle => kind.name().green(),
        BuildSystemKind::Maven => kind.name().blue(),
        BuildSystemKind::None => kind.name().yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_root_prefers_argument() {
        let config = Config::default();
        let root = resolve_root(Some("/data/repos"), &config).unwrap();
        assert_eq!(root, PathBuf::from("/data/repos"));
    }

    #[test]
    fn test_resolve_root_from_config_is_absolute() {
        let config = Config::default();
        let root = resolve_root(None, &config).unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("repos"));
    }

    #[test]
    fn test_configured_tools_order() {
        let config = Config::default();
        let names: Vec<_> = configured_tools(&config).iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["gradle", "maven", "kotlinc"]);
    }
}
