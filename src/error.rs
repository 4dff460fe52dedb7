//! Central error types for flagstrip.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic
//! `Display` and `From` implementations.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;
use crate::transform::Pass;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Process exit codes for the `flagstrip` binary.
pub mod exit_code {
    /// Nothing to rewrite, or every rewrite was applied.
    pub const CLEAN: i32 = 0;
    /// Dry run found files that would be rewritten.
    pub const CHANGES_PENDING: i32 = 1;
    /// Configuration error (bad config file, invalid CLI args).
    pub const CONFIG_ERROR: i32 = 2;
    /// I/O error (file not found, permission denied, etc.).
    pub const IO_ERROR: i32 = 3;
    /// A file failed to parse, or a rewrite produced unparsable output.
    pub const INTERNAL_ERROR: i32 = 4;
}

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum FlagError {
    /// IO operation failed with path context.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Source file is not UTF-8 and cannot be rewritten as text.
    #[error("file is not valid UTF-8: {path}")]
    Encoding { path: PathBuf },

    /// The input contains syntax the grammar could not parse.
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// A pass produced text that no longer parses. Nothing is written.
    #[error("Rewrite error in {file} after the {pass} pass: {message}")]
    Rewrite {
        file: String,
        pass: Pass,
        message: String,
    },

    /// Grammar loading or query compilation failed.
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// Configuration file or option error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience type alias for Results using FlagError.
pub type Result<T> = std::result::Result<T, FlagError>;

impl FlagError {
    /// Create an IO error with path context.
    ///
    /// ```ignore
    /// let source = std::fs::read(path)
    ///     .map_err(|e| FlagError::io_with_path(e, path))?;
    /// ```
    #[inline]
    pub fn io_with_path(error: std::io::Error, path: impl AsRef<Path>) -> Self {
        FlagError::Io {
            path: path.as_ref().to_path_buf(),
            source: error,
        }
    }

    /// Exit code the binary reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlagError::Io { .. } | FlagError::Encoding { .. } => exit_code::IO_ERROR,
            FlagError::Config(_) => exit_code::CONFIG_ERROR,
            FlagError::Parse { .. } | FlagError::Rewrite { .. } | FlagError::TreeSitter(_) => {
                exit_code::INTERNAL_ERROR
            }
        }
    }
}
