//! The flag resolution pipeline.
//!
//! Five passes run in a fixed order, each exactly once, each on a fresh tree
//! parsed from the previous pass's output:
//!
//! | Pass | Module | Rewrites |
//! |------|--------|----------|
//! | [`Pass::FlagCalls`] | [`flag_call`] | flag checks for the target flag to `true` |
//! | [`Pass::BooleanExpressions`] | [`logical`] | `&&` / `\|\|` with a literal operand |
//! | [`Pass::Variables`] | [`inline`] | literal-initialized bindings into their uses |
//! | [`Pass::Conditionals`] | [`conditional`] | `if` statements with a literal test |
//! | [`Pass::ConditionalElements`] | [`element`] | `<ConditionallyRender>` with a literal condition |
//!
//! There is no fixed-point loop. A cascade that needs a second round of
//! inlining and folding is left half-resolved, and running the pipeline
//! again on the output finishes it.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use flagstrip::{resolve_flag_source, ResolveOptions};
//!
//! let source = "if (useUiFlag('archiveProjects')) {\n    archive();\n}\n";
//! let options = ResolveOptions::new("archiveProjects");
//! let out = resolve_flag_source(source, Path::new("Projects.tsx"), &options).unwrap();
//! assert_eq!(out, "archive();\n");
//! ```

pub mod conditional;
pub mod element;
pub mod flag_call;
pub mod inline;
pub mod literal;
pub mod logical;
pub mod scope;

use std::fmt;
use std::path::Path;

use tracing::{debug, trace};
use tree_sitter::{Node, Tree};

use crate::config::ResolveOptions;
use crate::error::{FlagError, Result};
use crate::syntax::node::{descendants, string_value};
use crate::syntax::parser::first_syntax_error;
use crate::syntax::{Dialect, EditSet, SourceParser};

/// One stage of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pass {
    FlagCalls,
    BooleanExpressions,
    Variables,
    Conditionals,
    ConditionalElements,
}

impl Pass {
    /// Every pass, in the order the pipeline runs them.
    pub const ALL: [Pass; 5] = [
        Pass::FlagCalls,
        Pass::BooleanExpressions,
        Pass::Variables,
        Pass::Conditionals,
        Pass::ConditionalElements,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::FlagCalls => "flag-calls",
            Pass::BooleanExpressions => "boolean-expressions",
            Pass::Variables => "variables",
            Pass::Conditionals => "conditionals",
            Pass::ConditionalElements => "conditional-elements",
        }
    }

    /// Collect this pass's edits against the tree in `ctx`.
    fn collect(self, ctx: &PassContext<'_>) -> Result<EditSet> {
        match self {
            Pass::FlagCalls => flag_call::collect(ctx),
            Pass::BooleanExpressions => Ok(logical::collect(ctx)),
            Pass::Variables => Ok(inline::collect(ctx)),
            Pass::Conditionals => Ok(conditional::collect(ctx)),
            Pass::ConditionalElements => Ok(element::collect(ctx)),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a pass gets to look at.
pub(crate) struct PassContext<'a> {
    pub tree: &'a Tree,
    pub source: &'a str,
    pub dialect: Dialect,
    pub options: &'a ResolveOptions,
}

impl<'a> PassContext<'a> {
    pub fn root(&self) -> Node<'a> {
        self.tree.root_node()
    }
}

/// Result of resolving one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The rewritten source (the input itself when nothing changed).
    pub source: String,
    /// Whether `source` differs from the input.
    pub changed: bool,
    /// Whether the file was skipped because it never mentions the flag.
    pub skipped: bool,
    /// Number of edits each pass that ran produced.
    pub rewrites: Vec<(Pass, usize)>,
}

impl Resolution {
    fn skipped(source: &str) -> Self {
        Self {
            source: source.to_string(),
            changed: false,
            skipped: true,
            rewrites: Vec::new(),
        }
    }

    /// Total edits across all passes.
    pub fn total_rewrites(&self) -> usize {
        self.rewrites.iter().map(|(_, count)| count).sum()
    }
}

/// Whether any string literal under `root` has the value `flag_name`.
pub fn contains_flag_literal(root: Node<'_>, source: &str, flag_name: &str) -> bool {
    descendants(root)
        .filter(|node| node.kind() == "string")
        .any(|node| string_value(node, source).as_deref() == Some(flag_name))
}

/// Resolve `options.flag_name` to `true` in `source` and remove the code it
/// made dead.
///
/// `file` only selects the preferred grammar and labels errors; nothing is
/// read from disk. Sources the preferred grammar rejects are retried with
/// the other one.
///
/// # Errors
///
/// [`FlagError::Parse`] if the input has syntax errors under both grammars, and
/// [`FlagError::Rewrite`] if a pass produced text that no longer parses.
/// The input is never partially rewritten.
pub fn resolve_flag(source: &str, file: &Path, options: &ResolveOptions) -> Result<Resolution> {
    let label = file.display().to_string();
    let (mut parser, mut tree) = SourceParser::for_source(file, source)?;
    let dialect = parser.dialect();

    if options.skip_no_flag && !contains_flag_literal(tree.root_node(), source, &options.flag_name) {
        trace!(file = %label, flag = %options.flag_name, "flag not mentioned, skipping");
        return Ok(Resolution::skipped(source));
    }

    let mut text = source.to_string();
    let mut rewrites = Vec::with_capacity(Pass::ALL.len());

    for pass in Pass::ALL {
        let edits = {
            let ctx = PassContext {
                tree: &tree,
                source: &text,
                dialect,
                options,
            };
            pass.collect(&ctx)?
        };
        debug!(file = %label, pass = %pass, rewrites = edits.len(), "pass finished");
        rewrites.push((pass, edits.len()));
        if edits.is_empty() {
            continue;
        }

        let rewritten = edits.apply(&text);
        let next = parser.parse(&rewritten)?;
        if let Some(message) = first_syntax_error(&next, &rewritten) {
            return Err(FlagError::Rewrite {
                file: label,
                pass,
                message,
            });
        }
        text = rewritten;
        tree = next;
    }

    let changed = text != source;
    Ok(Resolution {
        source: text,
        changed,
        skipped: false,
        rewrites,
    })
}

/// [`resolve_flag`], returning only the rewritten text.
pub fn resolve_flag_source(source: &str, file: &Path, options: &ResolveOptions) -> Result<String> {
    resolve_flag(source, file, options).map(|resolution| resolution.source)
}
