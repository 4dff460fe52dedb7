//! Resolution options and `.flagstrip.toml` configuration file support.
//!
//! [`ResolveOptions`] is all the engine needs. The file config adds the
//! surrounding batch settings (which files to visit) and is merged with CLI
//! flags; CLI flags always take precedence over file config.
//!
//! # Example config
//!
//! ```toml
//! [flag]
//! name = "archiveProjects"
//! skip_no_flag = true
//!
//! [files]
//! include = ["src/**/*.tsx", "src/**/*.ts"]
//! exclude = ["**/node_modules/**", "**/*.test.ts"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flag name used when neither the CLI nor the config file names one.
pub const DEFAULT_FLAG_NAME: &str = "my-flag-to-remove";

/// Options for a single engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// The flag to resolve. Compared exactly against string literal values.
    pub flag_name: String,
    /// Return the input untouched when the flag name never appears as a
    /// string literal in the file.
    pub skip_no_flag: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            flag_name: DEFAULT_FLAG_NAME.to_string(),
            skip_no_flag: true,
        }
    }
}

impl ResolveOptions {
    /// Options for `flag_name` with the default short-circuit behaviour.
    pub fn new(flag_name: impl Into<String>) -> Self {
        Self {
            flag_name: flag_name.into(),
            ..Self::default()
        }
    }

    pub fn with_skip_no_flag(mut self, skip_no_flag: bool) -> Self {
        self.skip_no_flag = skip_no_flag;
        self
    }
}

/// Top-level `.flagstrip.toml` configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FlagFileConfig {
    /// Which flag to resolve and how.
    #[serde(default)]
    pub flag: FlagConfig,

    /// File include/exclude patterns.
    #[serde(default)]
    pub files: FilesConfig,
}

/// The `[flag]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FlagConfig {
    /// Flag name. Falls back to [`DEFAULT_FLAG_NAME`] when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Skip files that never mention the flag (default: true).
    #[serde(default = "default_true")]
    pub skip_no_flag: bool,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            name: None,
            skip_no_flag: true,
        }
    }
}

/// File include/exclude glob patterns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    /// Glob patterns for files to include. If empty, every JS/TS file found
    /// under the given paths is included.
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for files to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl FlagFileConfig {
    /// Parse a `.flagstrip.toml` file from a string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Parse)
    }

    /// Load and validate a `.flagstrip.toml` file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate semantic constraints that TOML schema cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.flag.name {
            validate_flag_name(name)?;
        }
        for pattern in self.files.include.iter().chain(&self.files.exclude) {
            globset::Glob::new(pattern)
                .map_err(|e| ConfigError::InvalidGlob(pattern.clone(), e.to_string()))?;
        }
        Ok(())
    }

    /// Merge CLI overrides into engine options.
    ///
    /// `cli_flag` wins over `[flag].name`; `no_skip` forces
    /// `skip_no_flag = false` regardless of the file.
    pub fn resolve_options(
        &self,
        cli_flag: Option<&str>,
        no_skip: bool,
    ) -> Result<ResolveOptions, ConfigError> {
        let flag_name = cli_flag
            .or(self.flag.name.as_deref())
            .unwrap_or(DEFAULT_FLAG_NAME);
        validate_flag_name(flag_name)?;
        Ok(ResolveOptions {
            flag_name: flag_name.to_string(),
            skip_no_flag: self.flag.skip_no_flag && !no_skip,
        })
    }

    /// Generate a default `.flagstrip.toml` config as a string.
    pub fn default_toml() -> &'static str {
        r#"# flagstrip configuration file

# The feature flag to resolve to `true`.
[flag]
# name = "archiveProjects"
#
# Leave files that never mention the flag untouched without rewriting them.
skip_no_flag = true

# File include/exclude glob patterns.
[files]
# include = ["src/**/*.ts", "src/**/*.tsx"]
# exclude = ["**/node_modules/**", "**/dist/**"]
"#
    }

    /// Build a compiled matcher from the file include/exclude patterns.
    pub fn build_file_matcher(&self) -> Result<FileMatcher, ConfigError> {
        FileMatcher::new(&self.files)
    }
}

fn validate_flag_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyFlagName);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// File matching
// ---------------------------------------------------------------------------

/// Compiled glob matcher for file include/exclude patterns.
#[derive(Debug, Default)]
pub struct FileMatcher {
    include: Option<globset::GlobSet>,
    exclude: Option<globset::GlobSet>,
}

impl FileMatcher {
    /// Build from a `FilesConfig`.
    pub fn new(files: &FilesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            include: build_glob_set(&files.include)?,
            exclude: build_glob_set(&files.exclude)?,
        })
    }

    /// Check whether a file path should be rewritten.
    ///
    /// Exclusions win over inclusions; with no include patterns every path
    /// not excluded is included.
    pub fn is_included(&self, path: &Path) -> bool {
        if let Some(ref exclude) = self.exclude {
            if exclude.is_match(path) {
                return false;
            }
        }
        if let Some(ref include) = self.include {
            return include.is_match(path);
        }
        true
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<globset::GlobSet>, ConfigError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            globset::Glob::new(pattern)
                .map_err(|e| ConfigError::InvalidGlob(pattern.clone(), e.to_string()))?,
        );
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| ConfigError::InvalidGlob("(build)".into(), e.to_string()))
}

// ---------------------------------------------------------------------------
// Config file discovery
// ---------------------------------------------------------------------------

/// Name of the config file.
pub const CONFIG_FILE_NAME: &str = ".flagstrip.toml";

/// Discover a `.flagstrip.toml` by walking up from `start_dir` to the
/// repository root (directory containing `.git`).
pub fn discover_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = if start_dir.is_file() {
        start_dir.parent()?.to_path_buf()
    } else {
        start_dir.to_path_buf()
    };

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        // The config lives at or below the repo root.
        if current.join(".git").exists() {
            return None;
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => return None,
        }
    }
}

/// Discover and load the config file, returning the parsed config and
/// its path. Returns `Ok(None)` if no config file is found.
pub fn discover_and_load_config(
    start_dir: &Path,
) -> Result<Option<(FlagFileConfig, PathBuf)>, ConfigError> {
    match discover_config(start_dir) {
        Some(path) => {
            let config = FlagFileConfig::load(&path)?;
            Ok(Some((config, path)))
        }
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from config file operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(toml::de::Error),

    #[error("flag name must not be empty")]
    EmptyFlagName,

    #[error("invalid glob pattern '{0}': {1}")]
    InvalidGlob(String, String),
}

// =========================================================================
// Tests
// =========================================================================
