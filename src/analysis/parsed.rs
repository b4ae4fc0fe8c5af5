//! Parse results shared by extraction and detection.

use tracing::debug;

use super::{python, SourceUnit};
use crate::language::Language;

/// A python syntax tree and the bytes it was parsed from.
///
/// Extraction and the tree checks in `detect` share one of these.
pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: Vec<u8>,
}

impl ParsedFile {
    /// Source text covered by `node`, or "" if it is not valid UTF-8.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// A source unit together with whatever parsing produced for it.
///
/// Only python gets a syntax tree. For the brace-delimited languages both
/// `tree` and `syntax_error` stay empty.
pub struct ParsedSource<'a> {
    pub unit: &'a SourceUnit,
    pub tree: Option<ParsedFile>,
    pub syntax_error: Option<String>,
}

impl<'a> ParsedSource<'a> {
    /// Parse `unit` once for the rest of the pipeline.
    pub fn parse(unit: &'a SourceUnit) -> Self {
        match unit.language() {
            Language::Python => match python::parse(unit.text()) {
                Ok(parsed) => Self {
                    unit,
                    tree: Some(parsed),
                    syntax_error: None,
                },
                Err(err) => {
                    debug!(filename = unit.filename(), error = %err, "python parse failed");
                    Self {
                        unit,
                        tree: None,
                        syntax_error: Some(err.to_string()),
                    }
                }
            },
            Language::JavaScript | Language::Java | Language::Cpp => Self {
                unit,
                tree: None,
                syntax_error: None,
            },
        }
    }
}
