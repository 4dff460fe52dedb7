//! Boolean literal recognition shared by every pass.
//!
//! A node is true-like/false-like when it is a `true`/`false` literal, or a
//! one-argument `Boolean(...)` call whose argument is such a literal.
//! Parentheses are transparent. Recognition is always done on the tree of
//! the current pass; nothing is cached between passes.

use tree_sitter::Node;

use crate::syntax::node::{significant_children, text, unwrap_parens};

/// Callee treated as an identity coercion to boolean.
pub const COERCION_CALLEE: &str = "Boolean";

/// The boolean a node stands for, if it is a recognized literal.
pub fn literal_value(node: Node<'_>, source: &str) -> Option<bool> {
    let node = unwrap_parens(node);
    match node.kind() {
        "call_expression" => coerced_literal(node, source),
        _ => bare_literal(node),
    }
}

pub fn is_true_like(node: Node<'_>, source: &str) -> bool {
    literal_value(node, source) == Some(true)
}

pub fn is_false_like(node: Node<'_>, source: &str) -> bool {
    literal_value(node, source) == Some(false)
}

fn bare_literal(node: Node<'_>) -> Option<bool> {
    match unwrap_parens(node).kind() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn coerced_literal(call: Node<'_>, source: &str) -> Option<bool> {
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "identifier" || text(callee, source) != COERCION_CALLEE {
        return None;
    }
    let arguments = call.child_by_field_name("arguments")?;
    if arguments.kind() != "arguments" {
        return None;
    }
    match significant_children(arguments).as_slice() {
        [argument] => bare_literal(*argument),
        _ => None,
    }
}
