//! CLI argument definitions and validation for flagstrip.
//!
//! Kept in the library so that tests can use [`Cli::try_parse_from`] to
//! verify argument handling without spawning a subprocess.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parse a positive (>= 1) usize value for CLI arguments.
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let val: usize = s.parse().map_err(|e| format!("invalid integer: {}", e))?;
    if val == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(val)
}

/// Reject empty or blank flag names at parse time.
fn parse_flag_name(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("flag name must not be empty".to_string());
    }
    Ok(s.to_string())
}

const AFTER_HELP: &str = concat!(
    "CONFIGURATION:\n",
    "  flagstrip looks for a .flagstrip.toml config file, searching from the\n",
    "  current directory up to the nearest .git root. Use `flagstrip init` to\n",
    "  generate a default config. CLI flags always override config file settings.\n",
    "\n",
    "EXIT CODES:\n",
    "  0  nothing to change, or changes applied\n",
    "  1  dry run found files that would change\n",
    "  2  configuration error\n",
    "  3  I/O error\n",
    "  4  parse error or rewrite failure",
);

/// flagstrip: retire a feature flag from a JavaScript/TypeScript codebase.
///
/// Resolves every check of one flag to `true`, then folds the surrounding
/// boolean logic, inlines flag variables and removes the dead branches.
///
/// Quick start:
///   flagstrip run src/ --flag archiveProjects           Preview (dry-run)
///   flagstrip run src/ --flag archiveProjects --apply   Rewrite files
///   flagstrip init                                      Generate .flagstrip.toml
#[derive(Parser, Debug)]
#[command(name = "flagstrip")]
#[command(author)]
#[command(version)]
#[command(about = "Resolve a feature flag and remove the code it guards", long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Enable debug logging (sets log level to DEBUG).
    #[arg(short, long, global = true, help_heading = "Global Options")]
    pub debug: bool,

    /// Suppress the summary and per-file report.
    #[arg(short, long, global = true, help_heading = "Global Options")]
    pub quiet: bool,

    /// Show per-pass rewrite counts and skipped files.
    #[arg(short, long, global = true, help_heading = "Global Options")]
    pub verbose: bool,

    /// Path to a .flagstrip.toml config file.
    ///
    /// By default, flagstrip searches from the current directory up to the
    /// nearest .git root. This flag overrides that discovery.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the flag in the given files.
    ///
    /// By default runs in DRY-RUN mode: lists the files that would change
    /// and exits with code 1 if there are any. Use --apply to write them.
    Run {
        /// Files or directories to process (recursive for directories).
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Flag to resolve. Overrides [flag].name in .flagstrip.toml.
        #[arg(short, long, value_parser = parse_flag_name)]
        flag: Option<String>,

        /// Process files even if they never mention the flag.
        #[arg(long)]
        no_skip: bool,

        /// Write rewritten files to disk (without this flag, dry-run only).
        #[arg(long, conflicts_with = "stdout")]
        apply: bool,

        /// Print the rewritten source of a single file to stdout.
        #[arg(long)]
        stdout: bool,

        /// Do not respect .gitignore and other ignore files.
        #[arg(long)]
        no_ignore: bool,

        /// Number of worker threads (>= 1). Defaults to one per CPU.
        #[arg(short, long, value_parser = parse_positive_usize)]
        jobs: Option<usize>,
    },

    /// Generate a default .flagstrip.toml configuration file.
    ///
    /// Creates the file in the current directory. Use --output to write to
    /// a different path.
    Init {
        /// Output path for the config file.
        #[arg(short, long, default_value = ".flagstrip.toml")]
        output: PathBuf,

        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Semantic validation
// ---------------------------------------------------------------------------

/// Validate constraints that clap's declarative API cannot express.
///
/// Returns warning messages to print to stderr. These are non-fatal.
pub fn validate_cli_semantics(cli: &Cli) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    if let Commands::Run { paths, stdout, .. } = &cli.command {
        if *stdout && (paths.len() > 1 || paths.iter().any(|p| p.is_dir())) {
            warnings.push(
                "Warning: --stdout prints every processed file back to back; pass a single file to get usable output"
                    .to_string(),
            );
        }
    }

    if cli.quiet && cli.verbose {
        warnings.push(
            "Warning: --quiet and --verbose are contradictory; --quiet takes precedence"
                .to_string(),
        );
    }

    warnings
}
