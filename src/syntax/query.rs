//! Compiled tree-sitter queries.
//!
//! Query compile errors are programming errors in this crate's own patterns,
//! but the grammar version is chosen by the build, so they are reported with
//! enough context to see which node type or field went missing.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor, QueryError, QueryErrorKind};

use crate::error::{FlagError, Result};
use crate::syntax::Dialect;

/// A compiled query together with the capture that marks each match.
pub struct ShapeQuery {
    query: Query,
    target: u32,
}

impl ShapeQuery {
    /// Compile `pattern` for `dialect`; `target` names the capture returned
    /// by [`ShapeQuery::matches`].
    pub fn new(dialect: Dialect, name: &str, pattern: &str, target: &str) -> Result<Self> {
        let query = Query::new(&dialect.language(), pattern)
            .map_err(|e| FlagError::TreeSitter(format_query_error(dialect.name(), name, pattern, &e)))?;
        let target = query.capture_index_for_name(target).ok_or_else(|| {
            FlagError::TreeSitter(format!("{name} query has no @{target} capture"))
        })?;
        Ok(Self { query, target })
    }

    /// Every match under `root` as `(pattern_index, target node, captures)`.
    ///
    /// Text predicates such as `#eq?` are evaluated against `source`.
    pub fn matches<'t>(&self, root: Node<'t>, source: &str) -> Vec<ShapeMatch<'t>> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, root, source.as_bytes());
        let mut found = Vec::new();
        while let Some(m) = matches.next() {
            let Some(target) = m
                .captures
                .iter()
                .find(|c| c.index == self.target)
                .map(|c| c.node)
            else {
                continue;
            };
            let captures = m
                .captures
                .iter()
                .map(|c| (self.query.capture_names()[c.index as usize].to_string(), c.node))
                .collect();
            found.push(ShapeMatch {
                pattern: m.pattern_index,
                node: target,
                captures,
            });
        }
        found
    }
}

/// One query match.
#[derive(Debug, Clone)]
pub struct ShapeMatch<'t> {
    /// Index of the pattern (in source order) that matched.
    pub pattern: usize,
    /// The node captured by the query's target capture.
    pub node: Node<'t>,
    captures: Vec<(String, Node<'t>)>,
}

impl<'t> ShapeMatch<'t> {
    /// The node bound to `@name` in this match.
    pub fn capture(&self, name: &str) -> Option<Node<'t>> {
        self.captures
            .iter()
            .find(|(capture, _)| *capture == name)
            .map(|(_, node)| *node)
    }
}

/// Format a tree-sitter query error with the offending query line.
///
/// ```text
/// Invalid flag-call query for tsx (invalid field name)
///   Location: line 3, column 7
///   Error: argumnets
///    >>> 3 |   argumnets: (arguments . (string) @flag .)) @call
/// ```
pub fn format_query_error(
    lang_name: &str,
    query_name: &str,
    query_str: &str,
    error: &QueryError,
) -> String {
    let mut msg = format!(
        "Invalid {} query for {} ({})\n  Location: line {}, column {}\n",
        query_name,
        lang_name,
        format_error_kind(&error.kind),
        error.row + 1,
        error.column + 1,
    );
    if !error.message.is_empty() {
        msg.push_str("  Error: ");
        msg.push_str(&error.message);
        msg.push('\n');
    }
    if let Some(line) = query_str.lines().nth(error.row) {
        msg.push_str(&format!("   >>> {} | {}\n", error.row + 1, line));
    }
    msg
}

fn format_error_kind(kind: &QueryErrorKind) -> &'static str {
    match kind {
        QueryErrorKind::Syntax => "syntax error",
        QueryErrorKind::NodeType => "invalid node type",
        QueryErrorKind::Field => "invalid field name",
        QueryErrorKind::Capture => "invalid capture name",
        QueryErrorKind::Predicate => "invalid predicate",
        QueryErrorKind::Structure => "invalid pattern structure",
        QueryErrorKind::Language => "language mismatch",
    }
}
