//! Early errors the grammar lets through
//!
//! tree-sitter builds a tree for programs the in-browser compiler refuses:
//! mismatched JSX tags, redeclared bindings, and `await`, `break`,
//! `continue` or `return` outside the constructs that allow them. Each check
//! here reports with the wording and position that compiler uses.

use crate::syntax::Diagnostic;
use std::collections::HashMap;
use tree_sitter::Node;

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "generator_function",
    "generator_function_declaration",
    "arrow_function",
    "method_definition",
];

const LOOP_KINDS: &[&str] = &[
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
];

/// How a name entered its scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// `let`, `const`, `class`
    Lexical,
    /// `var`, function declarations, parameters
    Var,
}

/// Earliest early error in `root`, by position
pub(crate) fn first_early_error(root: Node<'_>, source: &str) -> Option<Diagnostic> {
    let mut first: Option<Diagnostic> = None;
    let mut cursor = root.walk();
    loop {
        if let Some(found) = check_node(cursor.node(), source) {
            let earlier = match &first {
                Some(d) => (found.line, found.column) < (d.line, d.column),
                None => true,
            };
            if earlier {
                first = Some(found);
            }
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return first;
            }
        }
    }
}

fn check_node(node: Node<'_>, source: &str) -> Option<Diagnostic> {
    match node.kind() {
        "jsx_element" => mismatched_close(node, source),
        "program" | "statement_block" | "switch_body" => redeclaration(node, source),
        "await_expression" => (!function_boundary(node).is_some_and(is_async)).then(|| {
            Diagnostic::at(
                "'await' is only allowed within async functions",
                node.start_position(),
            )
        }),
        "return_statement" => {
            let in_function =
                function_boundary(node).is_some_and(|f| FUNCTION_KINDS.contains(&f.kind()));
            (!in_function)
                .then(|| Diagnostic::at("'return' outside of function", node.start_position()))
        }
        "break_statement" => (!has_jump_target(node, source, true))
            .then(|| Diagnostic::at("Unsyntactic break", node.start_position())),
        "continue_statement" => (!has_jump_target(node, source, false))
            .then(|| Diagnostic::at("Unsyntactic continue", node.start_position())),
        _ => None,
    }
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

fn mismatched_close(element: Node<'_>, source: &str) -> Option<Diagnostic> {
    let open = element.child_by_field_name("open_tag")?;
    let close = element.child_by_field_name("close_tag")?;
    let opened = tag_name(open, source);
    if opened == tag_name(close, source) {
        return None;
    }

    let message = if opened.is_empty() {
        "Expected corresponding closing tag for JSX fragment".to_string()
    } else {
        format!("Expected corresponding JSX closing tag for <{opened}>")
    };
    Some(Diagnostic::at(message, close.start_position()))
}

/// Tag name with whitespace removed, empty for fragments
fn tag_name(tag: Node<'_>, source: &str) -> String {
    tag.child_by_field_name("name")
        .map(|name| text(name, source).split_whitespace().collect())
        .unwrap_or_default()
}

fn redeclaration(scope: Node<'_>, source: &str) -> Option<Diagnostic> {
    let mut seen: HashMap<&str, Binding> = HashMap::new();
    for (node, binding) in scope_bindings(scope) {
        let name = text(node, source);
        match seen.get(name) {
            Some(previous) if *previous == Binding::Lexical || binding == Binding::Lexical => {
                return Some(Diagnostic::at(
                    format!("Identifier '{name}' has already been declared"),
                    node.start_position(),
                ));
            }
            Some(_) => {}
            None => {
                seen.insert(name, binding);
            }
        }
    }
    None
}

/// Names bound directly in `scope`, in source order
fn scope_bindings(scope: Node<'_>) -> Vec<(Node<'_>, Binding)> {
    let mut out = Vec::new();

    if scope.kind() == "statement_block" {
        if let Some(owner) = scope.parent() {
            for parameter in owner_parameters(owner) {
                let mut names = Vec::new();
                pattern_names(parameter, &mut names);
                out.extend(names.into_iter().map(|n| (n, Binding::Var)));
            }
        }
    }

    let mut cursor = scope.walk();
    if scope.kind() == "switch_body" {
        for case in scope.named_children(&mut cursor) {
            let mut case_cursor = case.walk();
            for statement in case.children_by_field_name("body", &mut case_cursor) {
                declared_names(statement, &mut out);
            }
        }
    } else {
        for statement in scope.named_children(&mut cursor) {
            declared_names(statement, &mut out);
        }
    }
    out
}

/// Parameter patterns of a function or catch clause owning a block
fn owner_parameters(owner: Node<'_>) -> Vec<Node<'_>> {
    if owner.kind() == "catch_clause" || owner.kind() == "arrow_function" {
        if let Some(single) = owner.child_by_field_name("parameter") {
            return vec![single];
        }
    }
    if !FUNCTION_KINDS.contains(&owner.kind()) {
        return Vec::new();
    }
    let Some(list) = owner.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter_map(|p| p.child_by_field_name("pattern"))
        .collect()
}

fn declared_names<'t>(statement: Node<'t>, out: &mut Vec<(Node<'t>, Binding)>) {
    let binding = match statement.kind() {
        "lexical_declaration" | "class_declaration" => Binding::Lexical,
        "variable_declaration" | "function_declaration" | "generator_function_declaration" => {
            Binding::Var
        }
        _ => return,
    };

    if let Some(name) = statement.child_by_field_name("name") {
        out.push((name, binding));
        return;
    }

    let mut names = Vec::new();
    let mut cursor = statement.walk();
    for declarator in statement.named_children(&mut cursor) {
        if let Some(pattern) = declarator.child_by_field_name("name") {
            pattern_names(pattern, &mut names);
        }
    }
    out.extend(names.into_iter().map(|n| (n, binding)));
}

/// Identifiers a destructuring pattern binds; defaults and keys are skipped
fn pattern_names<'t>(pattern: Node<'t>, out: &mut Vec<Node<'t>>) {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => out.push(pattern),
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = pattern.child_by_field_name("left") {
                pattern_names(left, out);
            }
        }
        "pair_pattern" => {
            if let Some(value) = pattern.child_by_field_name("value") {
                pattern_names(value, out);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = pattern.walk();
            for child in pattern.named_children(&mut cursor) {
                pattern_names(child, out);
            }
        }
        _ => {}
    }
}

/// Nearest enclosing function or class static block
fn function_boundary(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if FUNCTION_KINDS.contains(&ancestor.kind()) || ancestor.kind() == "class_static_block" {
            return Some(ancestor);
        }
        current = ancestor.parent();
    }
    None
}

fn is_async(function: Node<'_>) -> bool {
    let mut cursor = function.walk();
    let found = function.children(&mut cursor).any(|child| child.kind() == "async");
    found
}

/// Whether a `break` (or `continue`) has a statement to leave within its function
fn has_jump_target(jump: Node<'_>, source: &str, is_break: bool) -> bool {
    let label = jump.child_by_field_name("label").map(|l| text(l, source));
    let mut current = jump.parent();
    while let Some(ancestor) = current {
        let kind = ancestor.kind();
        if FUNCTION_KINDS.contains(&kind) || kind == "class_static_block" {
            return false;
        }
        match label {
            Some(label) if kind == "labeled_statement" => {
                let named = ancestor.child_by_field_name("label").map(|l| text(l, source));
                if named == Some(label) {
                    return is_break
                        || ancestor
                            .child_by_field_name("body")
                            .is_some_and(|body| LOOP_KINDS.contains(&body.kind()));
                }
            }
            None if LOOP_KINDS.contains(&kind) || (is_break && kind == "switch_statement") => {
                return true;
            }
            _ => {}
        }
        current = ancestor.parent();
    }
    false
}
