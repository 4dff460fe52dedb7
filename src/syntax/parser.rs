//! Grammar selection and parsing.
//!
//! TypeScript and TSX are separate tree-sitter grammars. The TSX grammar is
//! required for JSX markup but cannot parse `<T>expr` type assertions, so the
//! grammar is picked from the file extension. A file the preferred grammar
//! rejects is retried with the other one, since JSX does turn up in `.ts`
//! files.

use std::fmt;
use std::path::Path;

use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{FlagError, Result};

/// Which tree-sitter-typescript grammar a file is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `LANGUAGE_TYPESCRIPT`, for `.ts`, `.mts` and `.cts`.
    TypeScript,
    /// `LANGUAGE_TSX`, for JSX-capable sources and plain JavaScript.
    Tsx,
}

impl Dialect {
    /// Pick the grammar from a file identifier's extension.
    ///
    /// Anything that is not explicitly TypeScript gets the TSX grammar, which
    /// is a superset of JavaScript and understands JSX.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts" | "mts" | "cts") => Self::TypeScript,
            _ => Self::Tsx,
        }
    }

    /// The other grammar.
    pub fn alternate(self) -> Self {
        match self {
            Self::TypeScript => Self::Tsx,
            Self::Tsx => Self::TypeScript,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
        }
    }

    pub fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tree-sitter parser bound to one dialect, reused across passes.
pub struct SourceParser {
    parser: Parser,
    dialect: Dialect,
}

impl fmt::Debug for SourceParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceParser")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl SourceParser {
    pub fn new(dialect: Dialect) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&dialect.language())
            .map_err(|e| FlagError::TreeSitter(e.to_string()))?;
        Ok(Self { parser, dialect })
    }

    /// Parse `source` with the grammar chosen for `path`, falling back to the
    /// other grammar if the first reports syntax errors.
    ///
    /// Returns the parser that produced a clean tree, so later re-parses use
    /// the same grammar.
    ///
    /// # Errors
    ///
    /// [`FlagError::Parse`] with the preferred grammar's error when neither
    /// grammar parses the source cleanly.
    pub fn for_source(path: &Path, source: &str) -> Result<(Self, Tree)> {
        let preferred = Dialect::from_path(path);
        let mut parser = Self::new(preferred)?;
        let tree = parser.parse(source)?;
        let Some(message) = first_syntax_error(&tree, source) else {
            return Ok((parser, tree));
        };

        let mut fallback = Self::new(preferred.alternate())?;
        let retry = fallback.parse(source)?;
        if first_syntax_error(&retry, source).is_none() {
            debug!(
                file = %path.display(),
                from = %preferred,
                to = %fallback.dialect,
                "parsed with the alternate grammar"
            );
            return Ok((fallback, retry));
        }

        Err(FlagError::Parse {
            file: path.display().to_string(),
            message,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse `source` into a fresh tree.
    ///
    /// tree-sitter recovers from syntax errors instead of failing; callers
    /// that need a clean tree check [`first_syntax_error`] afterwards.
    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| FlagError::TreeSitter(format!("{} parser returned no tree", self.dialect)))
    }
}

/// Describe the first `ERROR` or `MISSING` node in the tree, if any.
///
/// Positions are reported 1-based as `line:column`.
pub fn first_syntax_error(tree: &Tree, source: &str) -> Option<String> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }
    let node = find_error(root)?;
    let pos = node.start_position();
    let detail = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet: String = source
            .get(node.byte_range())
            .unwrap_or_default()
            .chars()
            .take(40)
            .collect();
        format!("unexpected `{}`", snippet.trim())
    };
    Some(format!("{} at {}:{}", detail, pos.row + 1, pos.column + 1))
}

fn find_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(find_error)
}
