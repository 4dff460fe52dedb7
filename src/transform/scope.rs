//! Lexical scope resolution for the variable inliner.
//!
//! A reference is bound to the nearest enclosing scope that declares its
//! name. Scopes are blocks (program, statement blocks, switch bodies),
//! functions and methods (their parameters), `for` heads and `catch`
//! clauses.
//!
//! `var` declarations are hoisted: they bind in the nearest enclosing
//! function (or the program), however deeply they sit in nested blocks.

use tree_sitter::Node;

use crate::syntax::node::{descendants, text};

const SCOPE_KINDS: &[&str] = &[
    "program",
    "statement_block",
    "switch_body",
    "function_declaration",
    "function_expression",
    "function",
    "generator_function_declaration",
    "generator_function",
    "arrow_function",
    "method_definition",
    "for_statement",
    "for_in_statement",
    "catch_clause",
];

/// Scopes a `var` declaration hoists to.
const VAR_SCOPE_KINDS: &[&str] = &[
    "program",
    "function_declaration",
    "function_expression",
    "function",
    "generator_function_declaration",
    "generator_function",
    "arrow_function",
    "method_definition",
];

/// How an identifier with a matching name is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// Read as a value; safe to substitute.
    Read,
    /// Assigned, updated or (re)declared.
    Write,
    /// Read in a position where a literal is not allowed.
    Blocked,
    /// Not a variable reference at all (JSX tag names).
    Ignored,
}

pub fn is_scope(node: Node<'_>) -> bool {
    SCOPE_KINDS.contains(&node.kind())
}

fn is_var_scope(node: Node<'_>) -> bool {
    VAR_SCOPE_KINDS.contains(&node.kind())
}

/// The scope a declaration statement declares into.
pub fn declaring_scope(declaration: Node<'_>) -> Option<Node<'_>> {
    if declaration.kind() == "variable_declaration" {
        let mut current = declaration.parent();
        while let Some(node) = current {
            if is_var_scope(node) {
                return Some(node);
            }
            current = node.parent();
        }
        return None;
    }
    let parent = declaration.parent()?;
    match parent.kind() {
        "switch_case" | "switch_default" => parent.parent(),
        _ => Some(parent),
    }
}

/// The nearest scope enclosing `node` that declares `name`.
pub fn resolve<'t>(node: Node<'t>, name: &str, source: &str) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(scope) = current {
        if is_scope(scope) && declares(scope, name, source) {
            return Some(scope);
        }
        current = scope.parent();
    }
    None
}

/// Whether `scope` itself declares `name`.
pub fn declares(scope: Node<'_>, name: &str, source: &str) -> bool {
    match scope.kind() {
        "program" => {
            statements_declare(scope, name, source) || hoists_var(scope, name, source)
        }
        "statement_block" => statements_declare(scope, name, source),
        "switch_body" => {
            let mut cursor = scope.walk();
            let cases: Vec<Node<'_>> = scope.named_children(&mut cursor).collect();
            cases
                .into_iter()
                .any(|case| statements_declare(case, name, source))
        }
        "function_expression" | "function" | "generator_function" => {
            scope
                .child_by_field_name("name")
                .is_some_and(|n| text(n, source) == name)
                || parameters_declare(scope, name, source)
                || hoists_var(scope, name, source)
        }
        "function_declaration"
        | "generator_function_declaration"
        | "arrow_function"
        | "method_definition" => {
            parameters_declare(scope, name, source) || hoists_var(scope, name, source)
        }
        "for_statement" => scope
            .child_by_field_name("initializer")
            .is_some_and(|init| statement_declares(init, name, source)),
        "for_in_statement" => {
            scope
                .child_by_field_name("kind")
                .is_some_and(|kind| text(kind, source) != "var")
                && scope
                    .child_by_field_name("left")
                    .is_some_and(|left| pattern_binds(left, name, source))
        }
        "catch_clause" => scope
            .child_by_field_name("parameter")
            .is_some_and(|param| pattern_binds(param, name, source)),
        _ => false,
    }
}

fn statements_declare(list: Node<'_>, name: &str, source: &str) -> bool {
    let mut cursor = list.walk();
    let statements: Vec<Node<'_>> = list.named_children(&mut cursor).collect();
    statements
        .into_iter()
        .any(|statement| statement_declares(statement, name, source))
}

/// Whether a `var` anywhere inside `scope`, outside nested functions,
/// declares `name`.
fn hoists_var(scope: Node<'_>, name: &str, source: &str) -> bool {
    let mut cursor = scope.walk();
    let mut pending: Vec<Node<'_>> = scope.named_children(&mut cursor).collect();
    while let Some(node) = pending.pop() {
        if is_var_scope(node) {
            continue;
        }
        match node.kind() {
            "variable_declaration" if declarators_bind(node, name, source) => return true,
            "for_in_statement"
                if node
                    .child_by_field_name("kind")
                    .is_some_and(|kind| text(kind, source) == "var")
                    && node
                        .child_by_field_name("left")
                        .is_some_and(|left| pattern_binds(left, name, source)) =>
            {
                return true
            }
            _ => {}
        }
        let mut cursor = node.walk();
        pending.extend(node.named_children(&mut cursor));
    }
    false
}

fn declarators_bind(declaration: Node<'_>, name: &str, source: &str) -> bool {
    let mut cursor = declaration.walk();
    let declarators: Vec<Node<'_>> = declaration.named_children(&mut cursor).collect();
    declarators.into_iter().any(|declarator| {
        declarator.kind() == "variable_declarator"
            && declarator
                .child_by_field_name("name")
                .is_some_and(|pattern| pattern_binds(pattern, name, source))
    })
}

/// Block-scoped declarations only; `var` is found by [`hoists_var`].
fn statement_declares(statement: Node<'_>, name: &str, source: &str) -> bool {
    match statement.kind() {
        "lexical_declaration" => declarators_bind(statement, name, source),
        "function_declaration"
        | "generator_function_declaration"
        | "class_declaration"
        | "abstract_class_declaration"
        | "enum_declaration"
        | "module"
        | "internal_module" => statement
            .child_by_field_name("name")
            .is_some_and(|n| text(n, source) == name),
        "export_statement" => statement
            .child_by_field_name("declaration")
            .is_some_and(|decl| statement_declares(decl, name, source)),
        "import_statement" => import_declares(statement, name, source),
        _ => false,
    }
}

fn import_declares(import: Node<'_>, name: &str, source: &str) -> bool {
    descendants(import).any(|node| {
        if node.kind() != "identifier" || text(node, source) != name {
            return false;
        }
        let Some(parent) = node.parent() else {
            return false;
        };
        match parent.kind() {
            "import_clause" | "namespace_import" => true,
            // `{ a as b }` binds `b`; `{ a }` binds `a`.
            "import_specifier" => match parent.child_by_field_name("alias") {
                Some(alias) => alias.id() == node.id(),
                None => true,
            },
            _ => false,
        }
    })
}

fn parameters_declare(function: Node<'_>, name: &str, source: &str) -> bool {
    if let Some(single) = function.child_by_field_name("parameter") {
        return pattern_binds(single, name, source);
    }
    let Some(params) = function.child_by_field_name("parameters") else {
        return false;
    };
    let mut cursor = params.walk();
    let params: Vec<Node<'_>> = params.named_children(&mut cursor).collect();
    params.into_iter().any(|param| match param.kind() {
        "required_parameter" | "optional_parameter" => param
            .child_by_field_name("pattern")
            .is_some_and(|pattern| pattern_binds(pattern, name, source)),
        _ => pattern_binds(param, name, source),
    })
}

/// Whether the binding pattern `pattern` introduces `name`.
pub fn pattern_binds(pattern: Node<'_>, name: &str, source: &str) -> bool {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => text(pattern, source) == name,
        "pair_pattern" => pattern
            .child_by_field_name("value")
            .is_some_and(|value| pattern_binds(value, name, source)),
        "assignment_pattern" | "object_assignment_pattern" => pattern
            .child_by_field_name("left")
            .is_some_and(|left| pattern_binds(left, name, source)),
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = pattern.walk();
            let children: Vec<Node<'_>> = pattern.named_children(&mut cursor).collect();
            children
                .into_iter()
                .any(|child| pattern_binds(child, name, source))
        }
        _ => false,
    }
}

/// Classify an `identifier` or `shorthand_property_identifier` occurrence.
pub fn usage(node: Node<'_>) -> Usage {
    if node.kind() == "shorthand_property_identifier_pattern" {
        return Usage::Write;
    }
    let Some(parent) = node.parent() else {
        return Usage::Read;
    };
    let is = |field: &str| {
        parent
            .child_by_field_name(field)
            .is_some_and(|n| n.id() == node.id())
    };

    match parent.kind() {
        "assignment_expression" | "augmented_assignment_expression" if is("left") => Usage::Write,
        "update_expression" => Usage::Write,
        "variable_declarator" if is("name") => Usage::Write,
        "function_declaration"
        | "generator_function_declaration"
        | "function_expression"
        | "function"
        | "generator_function"
        | "class_declaration"
        | "class"
        | "abstract_class_declaration"
        | "enum_declaration"
            if is("name") =>
        {
            Usage::Write
        }
        "required_parameter" | "optional_parameter" if is("pattern") => Usage::Write,
        "arrow_function" if is("parameter") => Usage::Write,
        "formal_parameters" | "catch_clause" => Usage::Write,
        "for_in_statement" if is("left") => Usage::Write,
        "import_specifier" | "import_clause" | "namespace_import" => Usage::Write,
        "array_pattern" | "object_pattern" | "rest_pattern" => Usage::Write,
        "pair_pattern" if is("value") => Usage::Write,
        "assignment_pattern" | "object_assignment_pattern" if is("left") => Usage::Write,
        "export_specifier" | "type_query" | "namespace_export" => Usage::Blocked,
        "jsx_opening_element" | "jsx_closing_element" | "jsx_self_closing_element"
            if is("name") =>
        {
            Usage::Ignored
        }
        "member_expression" | "nested_identifier"
            if parent
                .parent()
                .is_some_and(|p| p.kind().starts_with("jsx_") && p.kind().ends_with("element")) =>
        {
            Usage::Ignored
        }
        _ => Usage::Read,
    }
}
