//! Pass 3: inline bindings initialized to a boolean literal.
//!
//! ```typescript
//! const isEnabled = true;        // removed
//! if (isEnabled) { ... }         // -> if (true) { ... }
//! const cfg = { isEnabled };     // -> { isEnabled: true }
//! ```
//!
//! Only declarations that are statements of a block are considered; an
//! exported binding or a `for` head is left alone. Uses are resolved through
//! [`scope`](super::scope), so a shadowing binding in a nested scope keeps its
//! own uses. Each use gets its own copy of the initializer text.
//!
//! A binding that is ever written (`x = ...`, `x++`, redeclared in the same
//! scope) or used where a literal cannot go (`export { x }`, `typeof x` in a
//! type) is skipped entirely, declaration and uses alike.
//!
//! A `var` is hoisted to its function, so a read outside the block holding
//! the declaration, or before it, may see `undefined`. Such a binding is
//! skipped too.

use std::ops::Range;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use tree_sitter::Node;

use super::literal::literal_value;
use super::scope::{self, Usage};
use super::PassContext;
use crate::syntax::edit::removal_range;
use crate::syntax::node::{descendants, in_statement_list, text};
use crate::syntax::{Edit, EditSet};

const OCCURRENCE_KINDS: &[&str] = &[
    "identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
];

/// A declarator eligible for inlining.
struct Candidate<'t> {
    declaration: Node<'t>,
    declarator: Node<'t>,
    name: Node<'t>,
    value: Node<'t>,
    scope: Node<'t>,
    /// Bytes a read must fall in to see the initialized value.
    reach: Range<usize>,
}

pub(super) fn collect(ctx: &PassContext<'_>) -> EditSet {
    let source = ctx.source;
    let mut edits = EditSet::new();

    let candidates: Vec<Candidate<'_>> = descendants(ctx.root())
        .filter(|n| n.kind() == "variable_declarator")
        .filter_map(|n| candidate(n, source))
        .collect();
    if candidates.is_empty() {
        return edits;
    }

    let mut occurrences: FxHashMap<&str, Vec<Node<'_>>> = FxHashMap::default();
    for node in descendants(ctx.root()).filter(|n| OCCURRENCE_KINDS.contains(&n.kind())) {
        occurrences.entry(text(node, source)).or_default().push(node);
    }

    // Declarations in first-seen order, with the declarators removed from each.
    let mut removals: Vec<(Node<'_>, Vec<Node<'_>>)> = Vec::new();
    let mut removal_index: FxHashMap<usize, usize> = FxHashMap::default();

    for candidate in &candidates {
        let name = text(candidate.name, source);
        let uses = occurrences.get(name).map(Vec::as_slice).unwrap_or_default();
        let Some(reads) = substitution_sites(candidate, name, uses, source) else {
            debug!(binding = name, "binding is written or re-exported, not inlined");
            continue;
        };

        let value = text(candidate.value, source);
        trace!(binding = name, value, uses = reads.len(), "inlining binding");
        for site in reads {
            let replacement = if site.kind() == "shorthand_property_identifier" {
                format!("{name}: {value}")
            } else {
                value.to_string()
            };
            edits.push(Edit::replace(site.byte_range(), replacement));
        }

        let slot = *removal_index
            .entry(candidate.declaration.id())
            .or_insert_with(|| {
                removals.push((candidate.declaration, Vec::new()));
                removals.len() - 1
            });
        removals[slot].1.push(candidate.declarator);
    }

    for (declaration, removed) in removals {
        for edit in declarator_removals(source, declaration, &removed) {
            edits.push(edit);
        }
    }

    edits
}

fn candidate<'t>(declarator: Node<'t>, source: &str) -> Option<Candidate<'t>> {
    let declaration = declarator.parent()?;
    if !matches!(declaration.kind(), "lexical_declaration" | "variable_declaration")
        || !in_statement_list(declaration)
    {
        return None;
    }
    let name = declarator.child_by_field_name("name")?;
    if name.kind() != "identifier" {
        return None;
    }
    let value = declarator.child_by_field_name("value")?;
    literal_value(value, source)?;
    let scope = scope::declaring_scope(declaration)?;
    let reach = if declaration.kind() == "variable_declaration" {
        declaration.end_byte()..declaration.parent()?.end_byte()
    } else {
        scope.byte_range()
    };
    Some(Candidate {
        declaration,
        declarator,
        name,
        value,
        scope,
        reach,
    })
}

/// The reads bound to `candidate`, or `None` if any use forbids inlining.
fn substitution_sites<'t>(
    candidate: &Candidate<'t>,
    name: &str,
    uses: &[Node<'t>],
    source: &str,
) -> Option<Vec<Node<'t>>> {
    let mut reads = Vec::new();
    for &node in uses {
        if node.id() == candidate.name.id() {
            continue;
        }
        let usage = scope::usage(node);
        if usage == Usage::Ignored {
            continue;
        }
        let bound = scope::resolve(node, name, source);
        if bound.map(|s| s.id()) != Some(candidate.scope.id()) {
            continue;
        }
        match usage {
            Usage::Read if !candidate.reach.contains(&node.start_byte()) => return None,
            Usage::Read => reads.push(node),
            Usage::Write | Usage::Blocked => return None,
            Usage::Ignored => {}
        }
    }
    Some(reads)
}

/// Edits deleting `removed` from `declaration`.
///
/// Removing every declarator removes the statement. Otherwise each
/// declarator goes with the comma that joins it to a kept neighbour.
fn declarator_removals(source: &str, declaration: Node<'_>, removed: &[Node<'_>]) -> Vec<Edit> {
    let mut cursor = declaration.walk();
    let declarators: Vec<Node<'_>> = declaration
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "variable_declarator")
        .collect();
    let is_removed = |n: &Node<'_>| removed.iter().any(|r| r.id() == n.id());

    let Some(last_kept) = declarators.iter().rposition(|d| !is_removed(d)) else {
        return vec![Edit::remove(removal_range(source, declaration.byte_range()))];
    };

    declarators
        .iter()
        .enumerate()
        .filter(|(_, d)| is_removed(*d))
        .map(|(i, d)| {
            if i < last_kept {
                Edit::remove(d.start_byte()..declarators[i + 1].start_byte())
            } else {
                Edit::remove(declarators[i - 1].end_byte()..d.end_byte())
            }
        })
        .collect()
}
