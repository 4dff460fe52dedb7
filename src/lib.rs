//! flagstrip: resolve a feature flag to `true` in JavaScript and TypeScript
//! sources and delete the code it made dead.
//!
//! The engine is [`resolve_flag`]: a pure function from source text to source
//! text that runs five rewrite passes once each (see [`transform`]). The
//! `flagstrip` binary wraps it with file discovery, a `.flagstrip.toml`
//! config file, parallel execution and atomic write-back.
//!
//! ```
//! use std::path::Path;
//! use flagstrip::{resolve_flag, ResolveOptions};
//!
//! let source = "\
//! const enabled = this.flagResolver.isEnabled('archiveProjects');
//! if (enabled) {
//!     archive();
//! } else {
//!     legacyArchive();
//! }
//! ";
//! let options = ResolveOptions::new("archiveProjects");
//! let resolution = resolve_flag(source, Path::new("service.ts"), &options).unwrap();
//! assert_eq!(resolution.source, "archive();\n");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod syntax;
pub mod transform;

pub use cli::{validate_cli_semantics, Cli, Commands};
pub use config::{
    discover_and_load_config, discover_config, ConfigError, FileMatcher, FlagFileConfig,
    ResolveOptions, CONFIG_FILE_NAME, DEFAULT_FLAG_NAME,
};
pub use error::{exit_code, FlagError, Result};
pub use transform::{resolve_flag, resolve_flag_source, Pass, Resolution};
