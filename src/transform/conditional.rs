//! Pass 4: collapse `if` statements whose test is a boolean literal.
//!
//! A true test keeps the consequent and drops any `else`; a false test drops
//! the whole statement, `else` included. Statements spliced out of a block
//! are re-indented to the column of the `if` they replace.

use tracing::trace;
use tree_sitter::Node;

use super::literal::literal_value;
use super::PassContext;
use crate::syntax::edit::{removal_range, splice_statements};
use crate::syntax::node::{descendants, in_statement_list};
use crate::syntax::{Edit, EditSet};

pub(super) fn collect(ctx: &PassContext<'_>) -> EditSet {
    let mut edits = EditSet::new();

    for statement in descendants(ctx.root()).filter(|n| n.kind() == "if_statement") {
        let Some(test) = statement.child_by_field_name("condition") else {
            continue;
        };
        let Some(consequence) = statement.child_by_field_name("consequence") else {
            continue;
        };
        let edit = match literal_value(test, ctx.source) {
            Some(true) => take_consequence(ctx.source, statement, consequence),
            Some(false) => drop_statement(ctx.source, statement),
            None => continue,
        };
        trace!(line = statement.start_position().row + 1, "collapsed if statement");
        edits.push(edit);
    }

    edits
}

fn take_consequence(source: &str, statement: Node<'_>, consequence: Node<'_>) -> Edit {
    if !in_statement_list(statement) {
        // `else if (true) x` / `for (...) if (true) x`: only one statement fits.
        return Edit::splice(statement.byte_range(), consequence.byte_range());
    }
    if consequence.kind() != "statement_block" {
        return splice_statements(source, statement.byte_range(), consequence.byte_range());
    }

    let mut cursor = consequence.walk();
    let body: Vec<Node<'_>> = consequence.named_children(&mut cursor).collect();
    match (body.first(), body.last()) {
        (Some(first), Some(last)) => splice_statements(
            source,
            statement.byte_range(),
            first.start_byte()..last.end_byte(),
        ),
        _ => Edit::remove(removal_range(source, statement.byte_range())),
    }
}

fn drop_statement(source: &str, statement: Node<'_>) -> Edit {
    if in_statement_list(statement) {
        return Edit::remove(removal_range(source, statement.byte_range()));
    }
    let else_clause = statement.parent().filter(|p| p.kind() == "else_clause");
    let outer_consequence = else_clause
        .and_then(|clause| clause.parent())
        .and_then(|outer| outer.child_by_field_name("consequence"));
    match (else_clause, outer_consequence) {
        (Some(clause), Some(consequence)) => {
            Edit::remove(consequence.end_byte()..clause.end_byte())
        }
        _ => Edit::replace(statement.byte_range(), "{}"),
    }
}
