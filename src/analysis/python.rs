//! Python structural extraction using tree-sitter.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::{ClassInfo, FunctionInfo, ParsedFile, StructuralSummary};
use crate::error::AnalysisError;

const DEFINITION_QUERY: &str = r#"
(function_definition
  name: (identifier) @func_name
) @function

(class_definition
  name: (identifier) @class_name
) @class
"#;

/// Decision points counted for McCabe complexity.
const COMPLEXITY_QUERY: &str = r#"
(if_statement) @branch
(elif_clause) @branch
(for_statement) @branch
(while_statement) @branch
(except_clause) @branch
(boolean_operator) @branch
(for_in_clause) @branch
(if_clause) @branch
"#;

fn language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

/// Parse python source. A tree containing error or missing nodes is a
/// parse failure.
pub fn parse(text: &str) -> Result<ParsedFile, AnalysisError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language())
        .map_err(|e| AnalysisError::ParseFailure(e.to_string()))?;
    let tree = parser
        .parse(text, None)
        .ok_or_else(|| AnalysisError::ParseFailure("parser produced no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error(root)
            .map(|n| n.start_position().row + 1)
            .unwrap_or(1);
        return Err(AnalysisError::ParseFailure(format!(
            "invalid syntax at line {}",
            line
        )));
    }

    Ok(ParsedFile {
        tree,
        source: text.as_bytes().to_vec(),
    })
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Extract functions, classes and complexity from a successfully parsed file.
pub fn extract(parsed: &ParsedFile, line_count: usize) -> anyhow::Result<StructuralSummary> {
    let query = Query::new(&language(), DEFINITION_QUERY)?;
    let mut cursor = QueryCursor::new();
    let root = parsed.tree.root_node();
    let mut matches = cursor.matches(&query, root, &parsed.source[..]);

    let mut functions: Vec<(usize, FunctionInfo)> = Vec::new();
    let mut classes: Vec<(usize, ClassInfo)> = Vec::new();

    while let Some(m) = matches.next() {
        for capture in m.captures {
            match query.capture_names()[capture.index as usize] {
                "function" => {
                    functions.push((capture.node.start_byte(), function_info(parsed, capture.node)));
                }
                "class" => {
                    classes.push((capture.node.start_byte(), class_info(parsed, capture.node)));
                }
                _ => {}
            }
        }
    }

    functions.sort_by_key(|(pos, _)| *pos);
    classes.sort_by_key(|(pos, _)| *pos);

    Ok(StructuralSummary {
        line_count,
        functions: functions.into_iter().map(|(_, f)| f).collect(),
        classes: classes.into_iter().map(|(_, c)| c).collect(),
        complexity: complexity(parsed, root)?,
        syntax_error: None,
    })
}

/// McCabe complexity of the subtree rooted at `node`: one plus the number
/// of decision points inside it.
pub fn complexity(parsed: &ParsedFile, node: Node) -> anyhow::Result<u32> {
    let query = Query::new(&language(), COMPLEXITY_QUERY)?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, node, &parsed.source[..]);

    let mut decision_points = 0u32;
    while let Some(m) = matches.next() {
        decision_points += m.captures.len() as u32;
    }

    Ok(1 + decision_points)
}

/// Every `function_definition` node in source order.
pub fn function_nodes(parsed: &ParsedFile) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    collect_kind(parsed.tree.root_node(), "function_definition", &mut out);
    out
}

fn collect_kind<'t>(node: Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    if node.kind() == kind {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_kind(child, kind, out);
    }
}

pub fn function_name<'a>(parsed: &'a ParsedFile, node: Node) -> &'a str {
    node.child_by_field_name("name")
        .map(|n| parsed.node_text(n))
        .unwrap_or("")
}

fn function_info(parsed: &ParsedFile, node: Node) -> FunctionInfo {
    let (line_start, line_end) = line_span(node);
    FunctionInfo {
        name: function_name(parsed, node).to_string(),
        parameters: parameters(parsed, node),
        line_start,
        line_end,
        docstring: docstring(parsed, node),
    }
}

fn class_info(parsed: &ParsedFile, node: Node) -> ClassInfo {
    let (line_start, line_end) = line_span(node);
    let name = node
        .child_by_field_name("name")
        .map(|n| parsed.node_text(n).to_string())
        .unwrap_or_default();

    let mut methods = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let def = match child.kind() {
                "function_definition" => Some(child),
                "decorated_definition" => child
                    .child_by_field_name("definition")
                    .filter(|d| d.kind() == "function_definition"),
                _ => None,
            };
            if let Some(def) = def {
                methods.push(function_info(parsed, def));
            }
        }
    }

    ClassInfo {
        name,
        methods,
        docstring: docstring(parsed, node),
        line_start,
        line_end,
    }
}

fn line_span(node: Node) -> (usize, usize) {
    let start = node.start_position();
    let end = node.end_position();
    // A node ending at column 0 stops before that line.
    let end_line = if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    };
    (start.row + 1, end_line)
}

fn parameters(parsed: &ParsedFile, node: Node) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter_map(|p| match p.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                Some(parsed.node_text(p))
            }
            "default_parameter" | "typed_default_parameter" => {
                p.child_by_field_name("name").map(|n| parsed.node_text(n))
            }
            "typed_parameter" => p.named_child(0).map(|n| parsed.node_text(n)),
            _ => None,
        })
        .filter(|name| *name != "self" && *name != "cls")
        .map(str::to_string)
        .collect()
}

/// First statement of the body when it is a plain string literal.
fn docstring(parsed: &ParsedFile, node: Node) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }
    Some(strip_string_literal(parsed.node_text(literal)))
}

fn strip_string_literal(raw: &str) -> String {
    let s = raw.trim().trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if s.len() >= 2 * quote.len() && s.starts_with(quote) && s.ends_with(quote) {
            return s[quote.len()..s.len() - quote.len()].trim().to_string();
        }
    }
    s.trim().to_string()
}
