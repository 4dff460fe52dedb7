//! Pass 2: short-circuit folding of `&&` and `||`.
//!
//! | Expression | Left true-like | Left false-like | Right true-like | Right false-like |
//! |------------|----------------|-----------------|-----------------|------------------|
//! | `l && r`   | `r`            | `l`             | `l`             | `r`              |
//! | `l \|\| r` | `l`            | `r`             | -               | -                |
//!
//! The first matching column wins. Every expression is classified against
//! this pass's input tree, so an expression whose operand only becomes a
//! literal through a fold in this same pass is left for the next run. The
//! kept operand is spliced with any edits inside it, so nested folds still
//! compose in the output text.

use tracing::trace;
use tree_sitter::Node;

use super::literal::literal_value;
use super::PassContext;
use crate::syntax::node::{descendants, text};
use crate::syntax::{Edit, EditSet};

/// Which operand replaces a logical expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keep {
    Left,
    Right,
}

pub(super) fn collect(ctx: &PassContext<'_>) -> EditSet {
    let mut edits = EditSet::new();

    for node in descendants(ctx.root()).filter(|n| n.kind() == "binary_expression") {
        let (Some(left), Some(operator), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            continue;
        };
        let keep = match operator.kind() {
            "&&" => fold_and(left, right, ctx.source),
            "||" => fold_or(left, right, ctx.source),
            _ => None,
        };
        let Some(keep) = keep else {
            continue;
        };
        let kept = match keep {
            Keep::Left => left,
            Keep::Right => right,
        };
        trace!(
            expr = text(node, ctx.source),
            kept = text(kept, ctx.source),
            "folded logical expression"
        );
        edits.push(Edit::splice(node.byte_range(), kept.byte_range()));
    }

    edits
}

fn fold_and(left: Node<'_>, right: Node<'_>, source: &str) -> Option<Keep> {
    match (literal_value(left, source), literal_value(right, source)) {
        (Some(true), _) => Some(Keep::Right),
        (Some(false), _) => Some(Keep::Left),
        (None, Some(true)) => Some(Keep::Left),
        (None, Some(false)) => Some(Keep::Right),
        (None, None) => None,
    }
}

fn fold_or(left: Node<'_>, _right: Node<'_>, source: &str) -> Option<Keep> {
    match literal_value(left, source) {
        Some(true) => Some(Keep::Left),
        Some(false) => Some(Keep::Right),
        None => None,
    }
}
