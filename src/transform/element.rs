//! Pass 5: resolve `<ConditionallyRender>` elements with a literal condition.
//!
//! ```tsx
//! <ConditionallyRender condition={true} show={<Archive />} />   // -> <Archive />
//! <ConditionallyRender condition={false} show={<Archive />} />  // -> removed
//! <ConditionallyRender condition={true} />                      // unchanged
//! ```
//!
//! A true condition without a `show` attribute leaves the element as it is.

use tracing::trace;
use tree_sitter::Node;

use super::literal::literal_value;
use super::PassContext;
use crate::syntax::edit::{column, removal_range, same_line};
use crate::syntax::node::{descendants, significant_children, text, unwrap_parens};
use crate::syntax::{Edit, EditSet};

/// Tag name of the conditional display component.
pub const ELEMENT_NAME: &str = "ConditionallyRender";
pub const CONDITION_ATTRIBUTE: &str = "condition";
pub const SHOW_ATTRIBUTE: &str = "show";

const JSX_PAYLOAD_KINDS: &[&str] = &["jsx_element", "jsx_self_closing_element", "jsx_fragment"];

pub(super) fn collect(ctx: &PassContext<'_>) -> EditSet {
    let source = ctx.source;
    let mut edits = EditSet::new();

    for element in descendants(ctx.root())
        .filter(|n| matches!(n.kind(), "jsx_element" | "jsx_self_closing_element"))
    {
        let Some(tag) = opening_tag(element) else {
            continue;
        };
        if !tag
            .child_by_field_name("name")
            .is_some_and(|name| name.kind() == "identifier" && text(name, source) == ELEMENT_NAME)
        {
            continue;
        }
        let Some(condition) = attribute_expression(tag, CONDITION_ATTRIBUTE, source) else {
            continue;
        };

        let edit = match literal_value(condition, source) {
            Some(true) => match attribute_expression(tag, SHOW_ATTRIBUTE, source) {
                Some(show) => show_payload(source, element, unwrap_parens(show)),
                None => {
                    trace!(
                        line = element.start_position().row + 1,
                        "condition is true but there is no show attribute"
                    );
                    continue;
                }
            },
            Some(false) => hide_element(source, element),
            None => continue,
        };
        trace!(line = element.start_position().row + 1, "resolved conditional element");
        edits.push(edit);
    }

    edits
}

/// The node holding the tag name and attributes.
fn opening_tag(element: Node<'_>) -> Option<Node<'_>> {
    match element.kind() {
        "jsx_self_closing_element" => Some(element),
        _ => element.child_by_field_name("open_tag").or_else(|| {
            let mut cursor = element.walk();
            let tag = element
                .named_children(&mut cursor)
                .find(|c| c.kind() == "jsx_opening_element");
            tag
        }),
    }
}

/// The expression inside `name={...}` on `tag`.
fn attribute_expression<'t>(tag: Node<'t>, name: &str, source: &str) -> Option<Node<'t>> {
    let mut cursor = tag.walk();
    let attributes: Vec<Node<'t>> = tag
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "jsx_attribute")
        .collect();
    attributes.into_iter().find_map(|attribute| {
        let parts = significant_children(attribute);
        match parts.as_slice() {
            [key, value]
                if key.kind() == "property_identifier"
                    && text(*key, source) == name
                    && value.kind() == "jsx_expression" =>
            {
                significant_children(*value).into_iter().next()
            }
            _ => None,
        }
    })
}

fn show_payload(source: &str, element: Node<'_>, payload: Node<'_>) -> Edit {
    let dedent = if same_line(source, element.start_byte(), payload.start_byte()) {
        0
    } else {
        column(source, payload.start_byte()).saturating_sub(column(source, element.start_byte()))
    };
    let edit = Edit::splice(element.byte_range(), payload.byte_range()).with_dedent(dedent);
    let is_child = element.parent().is_some_and(|p| p.kind() == "jsx_element");
    if is_child && !JSX_PAYLOAD_KINDS.contains(&payload.kind()) {
        edit.wrapped("{", "}")
    } else {
        edit
    }
}

fn hide_element(source: &str, element: Node<'_>) -> Edit {
    match element.parent() {
        Some(parent) if parent.kind() == "expression_statement" => {
            Edit::remove(removal_range(source, parent.byte_range()))
        }
        Some(parent) if parent.kind() == "jsx_element" => {
            Edit::remove(removal_range(source, element.byte_range()))
        }
        _ => Edit::replace(element.byte_range(), "null"),
    }
}
