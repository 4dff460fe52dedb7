//! flagstrip: retire a feature flag from a JavaScript/TypeScript codebase.
//!
//! # Usage
//!
//! ```bash
//! # Preview which files would change (dry-run, the default)
//! flagstrip run src/ --flag archiveProjects
//!
//! # Rewrite the files
//! flagstrip run src/ --flag archiveProjects --apply
//!
//! # Print one rewritten file
//! flagstrip run src/Projects.tsx --flag archiveProjects --stdout
//!
//! # Generate default config
//! flagstrip init
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use flagstrip::cli::{validate_cli_semantics, Cli, Commands};
use flagstrip::config::{discover_and_load_config, FlagFileConfig};
use flagstrip::error::exit_code;
use flagstrip::runner::{self, RunOptions};
use flagstrip::FlagError;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::from(exit_code::INTERNAL_ERROR as u8);
    }

    for warning in validate_cli_semantics(&cli) {
        eprintln!("{}", warning);
    }

    match dispatch(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(error_exit_code(&err) as u8)
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides the CLI level.
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn dispatch(cli: Cli) -> Result<i32> {
    let file_config = load_file_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            paths,
            flag,
            no_skip,
            apply,
            stdout,
            no_ignore,
            jobs,
        } => {
            let resolve = file_config
                .resolve_options(flag.as_deref(), no_skip)
                .map_err(FlagError::from)?;
            let matcher = file_config.build_file_matcher().map_err(FlagError::from)?;
            info!(flag = %resolve.flag_name, "resolving flag");

            let options = RunOptions {
                resolve,
                apply,
                capture_output: stdout,
                no_ignore,
                jobs,
            };
            run(&paths, &matcher, &options, stdout, cli.quiet, cli.verbose)
        }
        Commands::Init { output, force } => {
            run_init(&output, force)?;
            Ok(exit_code::CLEAN)
        }
    }
}

fn run(
    paths: &[PathBuf],
    matcher: &flagstrip::FileMatcher,
    options: &RunOptions,
    stdout: bool,
    quiet: bool,
    verbose: bool,
) -> Result<i32> {
    let summary = runner::run(paths, matcher, options)?;

    if stdout {
        for report in &summary.reports {
            match (&report.outcome, &report.output) {
                (runner::FileOutcome::Failed(err), _) => eprintln!("Error: {}", err),
                (_, Some(output)) => print!("{}", output),
                (_, None) => {}
            }
        }
        return Ok(match summary.failed() {
            0 => exit_code::CLEAN,
            _ => summary.exit_code(),
        });
    }

    if !quiet {
        summary.print(verbose);
    } else {
        for report in &summary.reports {
            if let runner::FileOutcome::Failed(err) = &report.outcome {
                eprintln!("Error: {}", err);
            }
        }
    }
    Ok(summary.exit_code())
}

/// Load `.flagstrip.toml`, respecting `--config`.
///
/// An explicit config that fails to load is fatal; a discovered one only
/// warns, and defaults are used instead.
fn load_file_config(explicit: Option<&Path>) -> Result<FlagFileConfig> {
    if let Some(path) = explicit {
        let config = FlagFileConfig::load(path)
            .map_err(FlagError::from)
            .with_context(|| format!("loading config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        return Ok(config);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match discover_and_load_config(&cwd) {
        Ok(Some((config, path))) => {
            info!("Using config: {}", path.display());
            Ok(config)
        }
        Ok(None) => Ok(FlagFileConfig::default()),
        Err(e) => {
            eprintln!("Warning: failed to load .flagstrip.toml: {}", e);
            Ok(FlagFileConfig::default())
        }
    }
}

/// Execute the `init` command: generate a default `.flagstrip.toml`.
fn run_init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(InitError::Exists(output.to_path_buf()));
    }
    std::fs::write(output, FlagFileConfig::default_toml())
        .map_err(|e| FlagError::io_with_path(e, output))?;
    println!("Created {}", output.display());
    println!();
    println!("Set [flag].name to the flag you are retiring, then run `flagstrip run <paths>`.");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum InitError {
    #[error("{} already exists. Use --force to overwrite.", .0.display())]
    Exists(PathBuf),
}

/// Map an error chain to the process exit code.
fn error_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(flag_error) = err.downcast_ref::<FlagError>() {
        return flag_error.exit_code();
    }
    if err.downcast_ref::<InitError>().is_some() {
        return exit_code::CONFIG_ERROR;
    }
    exit_code::INTERNAL_ERROR
}
