//! Accessors over tree-sitter nodes.

use std::borrow::Cow;

use tree_sitter::{Node, TreeCursor};

/// Source text covered by `node`.
#[inline]
pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Strip any number of enclosing parentheses: `((x))` -> `x`.
pub fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match significant_children(node).into_iter().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Named children excluding comments.
pub fn significant_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

/// Decoded value of a `string` literal node, or `None` for anything else.
///
/// Only the escapes that can plausibly appear in a flag name are decoded;
/// anything unusual is kept verbatim, which can only make a comparison fail.
pub fn string_value<'s>(node: Node<'_>, source: &'s str) -> Option<Cow<'s, str>> {
    if node.kind() != "string" {
        return None;
    }
    let parts = significant_children(node);
    match parts.as_slice() {
        [] => Some(Cow::Borrowed("")),
        [only] if only.kind() == "string_fragment" => Some(Cow::Borrowed(text(*only, source))),
        _ => {
            let mut value = String::new();
            for part in parts {
                let raw = text(part, source);
                if part.kind() == "escape_sequence" {
                    value.push_str(&decode_escape(raw));
                } else {
                    value.push_str(raw);
                }
            }
            Some(Cow::Owned(value))
        }
    }
}

fn decode_escape(raw: &str) -> Cow<'_, str> {
    match raw {
        "\\'" => Cow::Borrowed("'"),
        "\\\"" => Cow::Borrowed("\""),
        "\\\\" => Cow::Borrowed("\\"),
        "\\n" => Cow::Borrowed("\n"),
        "\\t" => Cow::Borrowed("\t"),
        _ => Cow::Borrowed(raw),
    }
}

/// Whether `node` sits directly in a list of statements, where it can be
/// replaced by zero or more statements.
pub fn in_statement_list(node: Node<'_>) -> bool {
    node.parent().is_some_and(|parent| {
        matches!(
            parent.kind(),
            "program" | "statement_block" | "switch_case" | "switch_default"
        )
    })
}

/// Pre-order iterator over `root` and all of its descendants.
pub fn descendants(root: Node<'_>) -> Descendants<'_> {
    Descendants {
        cursor: root.walk(),
        done: false,
    }
}

/// See [`descendants`].
pub struct Descendants<'t> {
    cursor: TreeCursor<'t>,
    done: bool,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        if self.done {
            return None;
        }
        let node = self.cursor.node();
        if !self.cursor.goto_first_child() {
            loop {
                if self.cursor.goto_next_sibling() {
                    break;
                }
                if !self.cursor.goto_parent() {
                    self.done = true;
                    break;
                }
            }
        }
        Some(node)
    }
}
