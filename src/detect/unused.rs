//! Unused local variables in python functions.
//!
//! A name counts as a local when a function body binds it with a plain
//! `name = value` assignment. It is unused when no other identifier with
//! that name appears anywhere in the function, nested functions included.

use std::collections::{BTreeMap, HashSet};

use tree_sitter::Node;

use super::{Category, Issue, Severity};
use crate::analysis::{python, ParsedFile};

#[derive(Default)]
struct Scope {
    /// First binding line per name.
    bindings: BTreeMap<String, usize>,
    reads: HashSet<String>,
    declared_outer: HashSet<String>,
}

/// Report every unused local, one issue per (function, name).
pub fn detect_unused_variables(parsed: &ParsedFile) -> Vec<Issue> {
    let mut issues = Vec::new();

    for func in python::function_nodes(parsed) {
        let Some(body) = func.child_by_field_name("body") else {
            continue;
        };

        let mut scope = Scope::default();
        visit(parsed, body, false, &mut scope);

        for (name, line) in scope.bindings {
            if name.starts_with('_')
                || scope.reads.contains(&name)
                || scope.declared_outer.contains(&name)
            {
                continue;
            }
            issues.push(
                Issue::new(
                    "unused-variable",
                    Category::Logic,
                    Severity::Warning,
                    line,
                    format!(
                        "Local variable '{}' in '{}' is assigned but never used",
                        name,
                        python::function_name(parsed, func)
                    ),
                )
                .with_suggestion("Remove the assignment or prefix the name with '_'"),
            );
        }
    }

    issues.sort_by_key(|i| i.line);
    issues
}

fn visit(parsed: &ParsedFile, node: Node, nested: bool, scope: &mut Scope) {
    match node.kind() {
        "function_definition" | "class_definition" | "lambda" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                visit(parsed, child, true, scope);
            }
        }
        "assignment" => {
            let left = node.child_by_field_name("left");
            let simple = left.filter(|l| l.kind() == "identifier");
            if let Some(target) = simple {
                if !nested {
                    let line = target.start_position().row + 1;
                    scope
                        .bindings
                        .entry(parsed.node_text(target).to_string())
                        .or_insert(line);
                }
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if simple.map_or(false, |t| t.id() == child.id()) {
                    continue;
                }
                visit(parsed, child, nested, scope);
            }
        }
        "global_statement" | "nonlocal_statement" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                scope.declared_outer.insert(parsed.node_text(child).to_string());
            }
        }
        "attribute" => {
            // Only the object part is a read; `obj.name` does not read `name`.
            if let Some(object) = node.child_by_field_name("object") {
                visit(parsed, object, nested, scope);
            }
        }
        "keyword_argument" => {
            if let Some(value) = node.child_by_field_name("value") {
                visit(parsed, value, nested, scope);
            }
        }
        "identifier" => {
            scope.reads.insert(parsed.node_text(node).to_string());
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                visit(parsed, child, nested, scope);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unused(source: &str) -> Vec<Issue> {
        detect_unused_variables(&python::parse(source).unwrap())
    }

    #[test]
    fn test_reports_unused_local() {
        let issues = unused("def f():\n    x = 1\n    y = 2\n    return y\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert!(issues[0].message.contains("'x'"));
        assert_eq!(issues[0].category, Category::Logic);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_self_reference_counts_as_read() {
        assert!(unused("def f():\n    n = 0\n    n = n + 1\n    return n\n").is_empty());
    }

    #[test]
    fn test_underscore_and_global_skipped() {
        let source = "def f():\n    global counter\n    counter = 1\n    _tmp = 2\n";
        assert!(unused(source).is_empty());
    }

    #[test]
    fn test_read_in_nested_function() {
        let source = "def outer():\n    total = 0\n    def inner():\n        return total\n    return inner\n";
        assert!(unused(source).is_empty());
    }

    #[test]
    fn test_attribute_name_is_not_a_read() {
        let issues = unused("def f(obj):\n    size = 3\n    return obj.size\n");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_module_level_assignment_ignored() {
        assert!(unused("x = 1\n").is_empty());
    }
}
