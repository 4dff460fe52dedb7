//! Pass 1: fold flag checks for the target flag to `true`.
//!
//! Two call shapes are recognized, each with exactly one string argument
//! equal to the flag name:
//!
//! ```typescript
//! this.flagResolver.isEnabled('archiveProjects')   // resolver check
//! useUiFlag('archiveProjects')                     // UI flag lookup
//! ```
//!
//! Every match becomes the literal `true`. Nothing ever resolves to `false`,
//! and calls reached through `?.` are left alone.

use tracing::trace;
use tree_sitter::Node;

use super::PassContext;
use crate::error::Result;
use crate::syntax::node::{string_value, text};
use crate::syntax::query::ShapeQuery;
use crate::syntax::{Edit, EditSet};

/// Field on the current context that holds the flag resolver.
pub const RESOLVER_FIELD: &str = "flagResolver";
/// Resolver method that tests a flag.
pub const RESOLVER_METHOD: &str = "isEnabled";
/// Hook that looks a flag up in UI code.
pub const LOOKUP_FUNCTION: &str = "useUiFlag";

const FLAG_CALL_QUERY: &str = r#"
((call_expression
   function: (member_expression
     object: (member_expression
       object: (this)
       property: (property_identifier) @field)
     property: (property_identifier) @method)
   arguments: (arguments . (string) @flag .)) @call
 (#eq? @field "flagResolver")
 (#eq? @method "isEnabled"))

((call_expression
   function: (identifier) @callee
   arguments: (arguments . (string) @flag .)) @call
 (#eq? @callee "useUiFlag"))
"#;

pub(super) fn collect(ctx: &PassContext<'_>) -> Result<EditSet> {
    let query = ShapeQuery::new(ctx.dialect, "flag-call", FLAG_CALL_QUERY, "call")?;
    let mut edits = EditSet::new();

    for found in query.matches(ctx.root(), ctx.source) {
        let Some(flag) = found.capture("flag") else {
            continue;
        };
        if string_value(flag, ctx.source).as_deref() != Some(ctx.options.flag_name.as_str()) {
            continue;
        }
        if is_optional_call(found.node) {
            continue;
        }
        trace!(
            shape = if found.pattern == 0 { "resolver-check" } else { "flag-lookup" },
            call = text(found.node, ctx.source),
            "flag check folded to true"
        );
        edits.push(Edit::replace(found.node.byte_range(), "true"));
    }

    Ok(edits)
}

/// True when `?.` appears anywhere along the call's callee chain.
fn is_optional_call(call: Node<'_>) -> bool {
    let mut current = Some(call);
    while let Some(node) = current {
        let mut cursor = node.walk();
        if node.children(&mut cursor).any(|c| c.kind() == "optional_chain") {
            return true;
        }
        current = node
            .child_by_field_name("function")
            .or_else(|| node.child_by_field_name("object"))
            .filter(|n| n.kind() == "member_expression");
    }
    false
}
