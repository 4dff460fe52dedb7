//! Batch execution: discover source files, resolve the flag in each one in
//! parallel and report or write back the results.
//!
//! Every file is independent (own parser, own tree), so files are fanned out
//! over a rayon pool. Writes go through a temp file in the target's
//! directory followed by a rename, so an interrupted run never leaves a
//! half-written source file behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::{FileMatcher, ResolveOptions};
use crate::error::{exit_code, FlagError, Result};
use crate::transform::{resolve_flag, Pass};

/// Extensions of the files the runner picks up when walking directories.
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// Settings for one `flagstrip run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub resolve: ResolveOptions,
    /// Write changed files back to disk.
    pub apply: bool,
    /// Keep the rewritten text of every processed file in its report.
    pub capture_output: bool,
    /// Ignore `.gitignore` and friends while walking directories.
    pub no_ignore: bool,
    /// Worker threads; `None` uses rayon's global pool.
    pub jobs: Option<usize>,
}

impl RunOptions {
    pub fn new(resolve: ResolveOptions) -> Self {
        Self {
            resolve,
            apply: false,
            capture_output: false,
            no_ignore: false,
            jobs: None,
        }
    }
}

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file never mentions the flag.
    Skipped,
    /// The passes ran but produced the same text.
    Unchanged,
    /// The file would change (dry run).
    Changed { rewrites: Vec<(Pass, usize)> },
    /// The file was rewritten on disk.
    Written { rewrites: Vec<(Pass, usize)> },
    Failed(FlagError),
}

/// Per-file result of a run.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    /// Rewritten source, when [`RunOptions::capture_output`] is set.
    pub output: Option<String>,
}

/// All file reports of a run, in path order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Changed { .. }))
    }

    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Process exit code for this run.
    ///
    /// Failures win (the most severe one), then pending dry-run changes.
    pub fn exit_code(&self) -> i32 {
        let worst_failure = self
            .reports
            .iter()
            .filter_map(|r| match &r.outcome {
                FileOutcome::Failed(err) => Some(err.exit_code()),
                _ => None,
            })
            .max();
        match worst_failure {
            Some(code) => code,
            None if self.changed() > 0 => exit_code::CHANGES_PENDING,
            None => exit_code::CLEAN,
        }
    }

    /// Print the per-file report to stdout and failures to stderr.
    pub fn print(&self, verbose: bool) {
        for report in &self.reports {
            let path = report.path.display();
            match &report.outcome {
                FileOutcome::Changed { rewrites } => {
                    println!("Would rewrite {}{}", path, format_rewrites(rewrites, verbose));
                }
                FileOutcome::Written { rewrites } => {
                    println!("Rewrote {}{}", path, format_rewrites(rewrites, verbose));
                }
                FileOutcome::Skipped if verbose => println!("Skipped {} (flag not mentioned)", path),
                FileOutcome::Unchanged if verbose => println!("Unchanged {}", path),
                FileOutcome::Failed(err) => eprintln!("Error: {}", err),
                FileOutcome::Skipped | FileOutcome::Unchanged => {}
            }
        }

        let total = self.reports.len();
        if self.written() > 0 {
            println!("{} of {} file(s) rewritten.", self.written(), total);
        } else if self.changed() > 0 {
            println!(
                "{} of {} file(s) would be rewritten. Run with --apply to write them.",
                self.changed(),
                total
            );
        } else {
            println!("No changes in {} file(s).", total);
        }
        if self.failed() > 0 {
            eprintln!("{} file(s) failed.", self.failed());
        }
    }
}

fn format_rewrites(rewrites: &[(Pass, usize)], verbose: bool) -> String {
    if !verbose {
        return String::new();
    }
    let parts: Vec<String> = rewrites
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(pass, count)| format!("{pass}: {count}"))
        .collect();
    format!(" ({})", parts.join(", "))
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Whether `path` has one of the [`SOURCE_EXTENSIONS`].
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Expand `paths` into the sorted list of source files to process.
///
/// Files named explicitly are taken as long as they are source files;
/// directories are walked respecting ignore files unless `no_ignore` is set.
/// The include/exclude globs apply to both.
pub fn discover_files(paths: &[PathBuf], matcher: &FileMatcher, no_ignore: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let metadata = fs::metadata(path).map_err(|e| FlagError::io_with_path(e, path))?;
        if metadata.is_file() {
            if !is_source_file(path) {
                warn!("skipping {}: not a JavaScript or TypeScript file", path.display());
                continue;
            }
            if matcher.is_included(path) {
                files.push(path.clone());
            }
            continue;
        }

        let mut builder = WalkBuilder::new(path);
        if no_ignore {
            builder
                .git_ignore(false)
                .git_global(false)
                .git_exclude(false)
                .ignore(false);
        }
        builder.hidden(true);

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("walk error under {}: {}", path.display(), e);
                    continue;
                }
            };
            let candidate = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file())
                && is_source_file(candidate)
                && matcher.is_included(candidate)
            {
                files.push(candidate.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    debug!(count = files.len(), "discovered source files");
    Ok(files)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Resolve the flag in one file, writing it back if requested.
pub fn process_file(path: &Path, options: &RunOptions) -> FileReport {
    match resolve_file(path, options) {
        Ok((outcome, output)) => FileReport {
            path: path.to_path_buf(),
            outcome,
            output,
        },
        Err(err) => FileReport {
            path: path.to_path_buf(),
            outcome: FileOutcome::Failed(err),
            output: None,
        },
    }
}

fn resolve_file(path: &Path, options: &RunOptions) -> Result<(FileOutcome, Option<String>)> {
    let bytes = fs::read(path).map_err(|e| FlagError::io_with_path(e, path))?;
    let source = String::from_utf8(bytes).map_err(|_| FlagError::Encoding {
        path: path.to_path_buf(),
    })?;

    let resolution = resolve_flag(&source, path, &options.resolve)?;
    let outcome = if resolution.skipped {
        FileOutcome::Skipped
    } else if !resolution.changed {
        FileOutcome::Unchanged
    } else if options.apply {
        write_atomic(path, &resolution.source)?;
        FileOutcome::Written {
            rewrites: resolution.rewrites.clone(),
        }
    } else {
        FileOutcome::Changed {
            rewrites: resolution.rewrites.clone(),
        }
    };
    let output = options.capture_output.then_some(resolution.source);
    Ok((outcome, output))
}

/// Discover files under `paths` and process them in parallel.
pub fn run(paths: &[PathBuf], matcher: &FileMatcher, options: &RunOptions) -> Result<RunSummary> {
    let files = discover_files(paths, matcher, options.no_ignore)?;
    let process = || -> Vec<FileReport> {
        files
            .par_iter()
            .map(|path| process_file(path, options))
            .collect()
    };

    let reports = match options.jobs {
        Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(process),
            Err(e) => {
                warn!("could not build a {}-thread pool ({}), using the global pool", jobs, e);
                process()
            }
        },
        None => process(),
    };

    Ok(RunSummary { reports })
}

/// Atomically replace the contents of `path`.
///
/// The content goes to a temp file next to the target, is synced, then
/// renamed over it. On failure the original file is untouched.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_path_for(path);
    let write = || -> std::io::Result<()> {
        let mut temp_file = File::create(&temp_path)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.sync_all()?;
        drop(temp_file);
        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(&temp_path, metadata.permissions())?;
        }
        fs::rename(&temp_path, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        FlagError::io_with_path(e, path)
    })?;
    debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// A unique temp file path in the same directory as `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    parent.join(format!(".{}.{}.{}.tmp", filename, std::process::id(), nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilesConfig;
    use tempfile::TempDir;

    const FLAGGED: &str = "if (useUiFlag('archiveProjects')) {\n    archive();\n}\n";

    fn options() -> RunOptions {
        RunOptions::new(ResolveOptions::new("archiveProjects"))
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_filters_extensions_and_globs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.ts", FLAGGED);
        write(dir.path(), "src/b.tsx", FLAGGED);
        write(dir.path(), "src/c.test.ts", FLAGGED);
        write(dir.path(), "src/readme.md", "x");

        let matcher = FileMatcher::new(&FilesConfig {
            include: vec![],
            exclude: vec!["**/*.test.ts".to_string()],
        })
        .unwrap();
        let files = discover_files(&[dir.path().to_path_buf()], &matcher, false).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ts", "b.tsx"]);
    }

    #[test]
    fn test_discover_missing_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = discover_files(&[dir.path().join("nope")], &FileMatcher::default(), false)
            .unwrap_err();
        assert_eq!(err.exit_code(), exit_code::IO_ERROR);
    }

    #[test]
    fn test_dry_run_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.ts", FLAGGED);
        let report = process_file(&path, &options());
        assert!(matches!(report.outcome, FileOutcome::Changed { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), FLAGGED);
    }

    #[test]
    fn test_apply_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.ts", FLAGGED);
        let mut opts = options();
        opts.apply = true;
        let report = process_file(&path, &opts);
        assert!(matches!(report.outcome, FileOutcome::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "archive();\n");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temp file should be renamed away");
    }

    #[test]
    fn test_capture_output() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.ts", FLAGGED);
        let mut opts = options();
        opts.capture_output = true;
        let report = process_file(&path, &opts);
        assert_eq!(report.output.as_deref(), Some("archive();\n"));
    }

    #[test]
    fn test_non_utf8_is_encoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.ts");
        fs::write(&path, [0xff, 0xfe, b'x']).unwrap();
        let report = process_file(&path, &options());
        assert!(matches!(
            report.outcome,
            FileOutcome::Failed(FlagError::Encoding { .. })
        ));
    }

    #[test]
    fn test_run_summary_exit_codes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.ts", FLAGGED);
        write(dir.path(), "b.ts", "other();\n");
        let paths = [dir.path().to_path_buf()];

        let summary = run(&paths, &FileMatcher::default(), &options()).unwrap();
        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.changed(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.exit_code(), exit_code::CHANGES_PENDING);

        let mut opts = options();
        opts.apply = true;
        opts.jobs = Some(2);
        let summary = run(&paths, &FileMatcher::default(), &opts).unwrap();
        assert_eq!(summary.written(), 1);
        assert_eq!(summary.exit_code(), exit_code::CLEAN);

        write(dir.path(), "c.ts", "if (useUiFlag('archiveProjects') {\n");
        let summary = run(&paths, &FileMatcher::default(), &options()).unwrap();
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.exit_code(), exit_code::INTERNAL_ERROR);
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.ts", "old");
        write_atomic(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
