//! Syntax layer: tree-sitter parsing, node helpers and text edits.
//!
//! - [`parser`]: grammar selection per file and parsing with error detection
//! - [`node`]: small accessors over tree-sitter nodes (text, string values, walks)
//! - [`edit`]: byte-range edits that replace or remove nodes and re-serialize
//! - [`query`]: compiled tree-sitter queries with readable compile errors

pub mod edit;
pub mod node;
pub mod parser;
pub mod query;

pub use edit::{Edit, EditSet, Replacement, Splice};
pub use parser::{Dialect, SourceParser};
