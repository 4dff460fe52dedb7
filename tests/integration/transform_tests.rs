//! End-to-end tests of the resolution pipeline.
//!
//! Sources are indented the way they sit inside real files, and outputs are
//! compared byte for byte.

use std::path::Path;

use flagstrip::{resolve_flag, resolve_flag_source, FlagError, Pass, ResolveOptions};

const FLAG: &str = "archiveProjects";

/// Resolve `FLAG` in `source` without the absent-flag short-circuit.
fn apply(source: &str, file: &str) -> String {
    let options = ResolveOptions::new(FLAG).with_skip_no_flag(false);
    resolve_flag_source(source, Path::new(file), &options).unwrap()
}

/// A project lookup guarded by `condition`, with a fallback branch.
fn guarded(condition: &str) -> String {
    format!(
        "\n            if ({condition}) {{\
         \n                projectExists = await this.projectStore.hasActiveProject(projectId);\
         \n                doSomethingElse();\
         \n            }} else {{\
         \n                projectExists = await this.projectStore.hasProject(projectId);\
         \n            }}\
         \n        "
    )
}

const KEPT: &str = "\n            projectExists = await this.projectStore.hasActiveProject(projectId);\
                    \n            doSomethingElse();\
                    \n        ";

fn resolver_check() -> String {
    format!("this.flagResolver.isEnabled('{FLAG}')")
}

// =============================================================================
// Flag checks and branches
// =============================================================================

#[test]
fn test_inline_resolver_check_keeps_consequent() {
    assert_eq!(apply(&guarded(&resolver_check()), "test.ts"), KEPT);
}

#[test]
fn test_boolean_true_call_resolved() {
    assert_eq!(apply(&guarded("Boolean(true)"), "test.ts"), KEPT);
}

#[test]
fn test_true_and_resolver_check() {
    let condition = format!("true && {}", resolver_check());
    assert_eq!(apply(&guarded(&condition), "test.ts"), KEPT);
}

#[test]
fn test_resolver_check_and_true() {
    let condition = format!("{} && true", resolver_check());
    assert_eq!(apply(&guarded(&condition), "test.ts"), KEPT);
}

#[test]
fn test_literal_true_keeps_consequent_block() {
    assert_eq!(apply(&guarded("true"), "test.ts"), KEPT);
}

#[test]
fn test_missing_else_branch() {
    let source = format!(
        "\n            if ({}) {{\
         \n                projectExists = await this.projectStore.hasActiveProject(projectId);\
         \n            }}\
         \n        ",
        resolver_check()
    );
    assert_eq!(
        apply(&source, "test.ts"),
        "\n            projectExists = await this.projectStore.hasActiveProject(projectId);\n        "
    );
}

#[test]
fn test_unrelated_condition_untouched() {
    let source = "\n            if (someOtherCondition) {\
                  \n                projectExists = await this.projectStore.hasActiveProject(projectId);\
                  \n            }\
                  \n        ";
    assert_eq!(apply(source, "test.ts"), source);
}

#[test]
fn test_else_if_chain() {
    let source = format!(
        "if (legacy) {{\n    a();\n}} else if ({}) {{\n    b();\n}} else {{\n    c();\n}}\n",
        resolver_check()
    );
    assert_eq!(
        apply(&source, "service.ts"),
        "if (legacy) {\n    a();\n} else {\n    b();\n}\n"
    );
}

// =============================================================================
// Variables
// =============================================================================

#[test]
fn test_inline_true_variable() {
    let source = format!("\n            const isEnabled = true;{}", guarded("isEnabled"));
    assert_eq!(apply(&source, "test.ts"), KEPT);
}

#[test]
fn test_inline_resolver_variable_and_remove_declaration() {
    let source = format!(
        "\n            const isEnabled = {};{}",
        resolver_check(),
        guarded("isEnabled")
    );
    assert_eq!(apply(&source, "test.ts"), KEPT);
}

#[test]
fn test_combined_resolver_and_true_variable() {
    let source = format!(
        "\n            const isEnabled = {} && true;{}",
        resolver_check(),
        guarded("isEnabled")
    );
    assert_eq!(apply(&source, "test.ts"), KEPT);
}

#[test]
fn test_shadowed_name_not_substituted() {
    let source = format!(
        "const enabled = useUiFlag('{FLAG}');\n\
         function render(enabled) {{\n    return enabled ? 'on' : 'off';\n}}\n\
         if (enabled) {{\n    render(false);\n}}\n"
    );
    assert_eq!(
        apply(&source, "render.ts"),
        "function render(enabled) {\n    return enabled ? 'on' : 'off';\n}\nrender(false);\n"
    );
}

#[test]
fn test_multi_declarator_keeps_other_bindings() {
    let source = format!(
        "const archived = useUiFlag('{FLAG}'), limit = 10;\nif (archived) {{\n    archive(limit);\n}}\n"
    );
    assert_eq!(apply(&source, "a.ts"), "const limit = 10;\narchive(limit);\n");
}

#[test]
fn test_reassigned_variable_left_alone() {
    let source = format!(
        "let enabled = useUiFlag('{FLAG}');\nif (override) enabled = false;\nif (enabled) {{\n    archive();\n}}\n"
    );
    assert_eq!(
        apply(&source, "a.ts"),
        "let enabled = true;\nif (override) enabled = false;\nif (enabled) {\n    archive();\n}\n"
    );
}

#[test]
fn test_shorthand_property_expanded() {
    let source = format!("const archiveProjects = useUiFlag('{FLAG}');\ntrack({{ archiveProjects }});\n");
    assert_eq!(apply(&source, "a.ts"), "track({ archiveProjects: true });\n");
}

// =============================================================================
// Conditional elements
// =============================================================================

#[test]
fn test_use_ui_flag_and_conditionally_render() {
    let source = "\n            const archiveProjectsEnabled = useUiFlag('archiveProjects');\
                  \n            <ConditionallyRender\
                  \n                condition={Boolean(archiveProjectsEnabled)}\
                  \n                show={<ProjectArchiveLink />}\
                  \n            />;\
                  \n        ";
    assert_eq!(
        apply(source, "test.ts"),
        "\n            <ProjectArchiveLink />;\n        "
    );
}

#[test]
fn test_false_element_removed_from_children() {
    let source = format!(
        "const Page = () => (\n    <div>\n        <Header />\n        <ConditionallyRender\n            \
         condition={{false && useUiFlag('{FLAG}')}}\n            show={{<LegacyArchive />}}\n        />\n    \
         </div>\n);\n"
    );
    assert_eq!(
        apply(&source, "Page.tsx"),
        "const Page = () => (\n    <div>\n        <Header />\n    </div>\n);\n"
    );
}

#[test]
fn test_element_without_show_left_in_place() {
    let source = format!("<ConditionallyRender condition={{useUiFlag('{FLAG}')}} />;\n");
    assert_eq!(
        apply(&source, "a.tsx"),
        "<ConditionallyRender condition={true} />;\n"
    );
}

#[test]
fn test_non_jsx_payload_wrapped_as_child() {
    let source = format!(
        "const Title = () => (\n    <h1>\n        <ConditionallyRender condition={{useUiFlag('{FLAG}')}} show={{label}} />\n    </h1>\n);\n"
    );
    assert_eq!(
        apply(&source, "Title.jsx"),
        "const Title = () => (\n    <h1>\n        {label}\n    </h1>\n);\n"
    );
}

// =============================================================================
// Pipeline properties
// =============================================================================

#[test]
fn test_absent_flag_is_byte_identical() {
    let source = "if   (useUiFlag('otherFlag'))\t{ weird ( ) ;}\r\n";
    let options = ResolveOptions::new(FLAG);
    let resolution = resolve_flag(source, Path::new("a.ts"), &options).unwrap();
    assert!(resolution.skipped);
    assert_eq!(resolution.source, source);
}

#[test]
fn test_second_run_changes_nothing() {
    let first = apply(&guarded(&resolver_check()), "test.ts");
    let options = ResolveOptions::new(FLAG);
    let second = resolve_flag(&first, Path::new("test.ts"), &options).unwrap();
    assert!(!second.changed);
    assert_eq!(second.source, first);
}

#[test]
fn test_cascades_need_another_run() {
    let source = format!("const on = useUiFlag('{FLAG}');\nif (on && ready) {{\n    go();\n}}\n");
    let first = apply(&source, "a.ts");
    // `on && ready` is folded before `on` is inlined.
    assert_eq!(first, "if (true && ready) {\n    go();\n}\n");
    assert_eq!(apply(&first, "a.ts"), "if (ready) {\n    go();\n}\n");

    let source = format!("const a = useUiFlag('{FLAG}');\nconst b = a;\nuse(b);\n");
    let first = apply(&source, "a.ts");
    assert_eq!(first, "const b = true;\nuse(b);\n");
    assert_eq!(apply(&first, "a.ts"), "use(true);\n");
}

#[test]
fn test_rewrite_counts_reported() {
    let options = ResolveOptions::new(FLAG);
    let resolution =
        resolve_flag(&guarded(&resolver_check()), Path::new("test.ts"), &options).unwrap();
    assert_eq!(resolution.rewrites[0], (Pass::FlagCalls, 1));
    assert_eq!(resolution.rewrites[3], (Pass::Conditionals, 1));
    assert_eq!(resolution.total_rewrites(), 2);
}

#[test]
fn test_parse_error_propagates() {
    let options = ResolveOptions::new(FLAG);
    let err = resolve_flag("const x = useUiFlag('archiveProjects'", Path::new("a.ts"), &options)
        .unwrap_err();
    match err {
        FlagError::Parse { file, message } => {
            assert_eq!(file, "a.ts");
            assert!(!message.is_empty());
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_grammar_follows_extension_with_fallback() {
    let source = format!("const on = <boolean>useUiFlag('{FLAG}');\nif (on) {{\n    go();\n}}\n");
    // `<boolean>expr` is an assertion only the TypeScript grammar accepts.
    let expected = "const on = <boolean>true;\nif (on) {\n    go();\n}\n";
    assert_eq!(apply(&source, "a.ts"), expected);
    assert_eq!(apply(&source, "a.tsx"), expected);

    let markup = format!("const link = useUiFlag('{FLAG}') && <Link />;\n");
    assert_eq!(apply(&markup, "link.ts"), "const link = <Link />;\n");
}

#[test]
fn test_hoisted_var_keeps_outside_uses_bound() {
    let source = format!(
        "function f() {{\n    if (ready) {{\n        var on = useUiFlag('{FLAG}');\n    }}\n    use(on);\n}}\n"
    );
    assert_eq!(
        apply(&source, "a.ts"),
        "function f() {\n    if (ready) {\n        var on = true;\n    }\n    use(on);\n}\n"
    );

    let source = format!("try {{\n    x();\n}} catch {{\n    var on = useUiFlag('{FLAG}');\n}}\nuse(on);\n");
    assert_eq!(
        apply(&source, "a.ts"),
        "try {\n    x();\n} catch {\n    var on = true;\n}\nuse(on);\n"
    );
}
