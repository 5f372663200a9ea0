//! Structural parse of JSX components
//!
//! Uses the tree-sitter TSX grammar and then rejects every TypeScript-only
//! construct, so what passes is plain JavaScript with JSX. Early errors the
//! grammar accepts are caught afterwards by the `early` checks.

use crate::early;
use std::fmt;
use tree_sitter::{Node, Parser, Point};

/// Node kinds that only exist in TypeScript, with the label used in diagnostics
const TYPE_ONLY: &[(&str, &str)] = &[
    ("type_annotation", "TypeScript type annotation"),
    ("opting_type_annotation", "TypeScript type annotation"),
    ("omitting_type_annotation", "TypeScript type annotation"),
    ("adding_type_annotation", "TypeScript type annotation"),
    ("asserts_annotation", "TypeScript type annotation"),
    ("type_predicate_annotation", "TypeScript type annotation"),
    ("interface_declaration", "TypeScript interface declaration"),
    ("type_alias_declaration", "TypeScript type alias"),
    ("enum_declaration", "TypeScript enum declaration"),
    ("abstract_class_declaration", "TypeScript abstract class"),
    ("ambient_declaration", "TypeScript declare statement"),
    ("internal_module", "TypeScript namespace"),
    ("module", "TypeScript module declaration"),
    ("as_expression", "TypeScript `as` expression"),
    ("satisfies_expression", "TypeScript `satisfies` expression"),
    ("non_null_expression", "TypeScript non-null assertion"),
    ("type_arguments", "TypeScript type arguments"),
    ("type_parameters", "TypeScript type parameters"),
    ("accessibility_modifier", "TypeScript accessibility modifier"),
    ("override_modifier", "TypeScript override modifier"),
    ("implements_clause", "TypeScript implements clause"),
    ("optional_parameter", "TypeScript optional parameter"),
];

/// Tokens a MISSING node may stand for and still read well as "Missing `x`"
const CLOSERS: &[&str] = &[")", "]", "}", ">", ";", "\"", "'", "`", "*/"];

const SNIPPET_LIMIT: usize = 24;

/// Parse failure with a Babel-style position
///
/// `line` is 1-based and `column` 0-based, matching what generated code
/// authors usually see from JSX toolchains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub(crate) fn at(message: impl Into<String>, position: Point) -> Self {
        Self {
            message: message.into(),
            line: position.row + 1,
            column: position.column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.message, self.line, self.column)
    }
}

/// Parse `source` and report the first structural problem
pub(crate) fn parse_structure(source: &str) -> Result<(), Diagnostic> {
    let language: tree_sitter::Language = tree_sitter_typescript::LANGUAGE_TSX.into();
    let mut parser = Parser::new();
    parser.set_language(&language).map_err(|e| {
        Diagnostic::at(format!("parser unavailable: {e}"), Point::new(0, 0))
    })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Diagnostic::at("parser produced no syntax tree", Point::new(0, 0)))?;
    let root = tree.root_node();

    if root.has_error() {
        let node = find_first(root, |n| n.has_error(), |n| n.is_error() || n.is_missing())
            .unwrap_or(root);
        return Err(describe_error(node, source));
    }

    if let Some((node, label)) = find_type_only(root) {
        return Err(Diagnostic::at(format!("Unexpected {label}"), node.start_position()));
    }

    match early::first_early_error(root, source) {
        Some(diagnostic) => Err(diagnostic),
        None => Ok(()),
    }
}

fn find_type_only(root: Node<'_>) -> Option<(Node<'_>, &'static str)> {
    let node = find_first(root, |_| true, |n| n.is_named() && type_only_label(n.kind()).is_some())?;
    type_only_label(node.kind()).map(|label| (node, label))
}

fn type_only_label(kind: &str) -> Option<&'static str> {
    TYPE_ONLY
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, label)| *label)
}

/// Pre-order search without recursion; generated code can nest deeply
fn find_first<'t>(
    root: Node<'t>,
    descend: impl Fn(&Node<'t>) -> bool,
    hit: impl Fn(&Node<'t>) -> bool,
) -> Option<Node<'t>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if hit(&node) {
            return Some(node);
        }
        if descend(&node) && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn describe_error(node: Node<'_>, source: &str) -> Diagnostic {
    let position = node.start_position();
    if node.is_missing() {
        return if CLOSERS.contains(&node.kind()) {
            Diagnostic::at(format!("Missing `{}`", node.kind()), position)
        } else {
            Diagnostic::at("Unexpected token", position)
        };
    }
    if node.start_byte() >= source.len() {
        return Diagnostic::at("Unexpected end of input", position);
    }

    let mut cursor = node.walk();
    while cursor.goto_first_child() {}
    let leaf = cursor.node();
    let token = leaf
        .utf8_text(source.as_bytes())
        .ok()
        .map(snippet)
        .unwrap_or_default();

    if token.is_empty() {
        Diagnostic::at("Unexpected token", position)
    } else {
        Diagnostic::at(format!("Unexpected token `{token}`"), leaf.start_position())
    }
}

fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() > SNIPPET_LIMIT {
        let cut: String = line.chars().take(SNIPPET_LIMIT).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
