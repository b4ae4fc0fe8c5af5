//! Structural extraction.
//!
//! Turns a [`SourceUnit`] into a [`StructuralSummary`]: line count,
//! functions, classes and McCabe complexity.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────────┐
//! │ SourceUnit  │────▶│ ParsedSource │────▶│ StructuralSummary │
//! └─────────────┘     │ (python tree)│     └───────────────────┘
//!                     └──────────────┘
//!                            │
//!                            ▼
//!                     ┌──────────────┐
//!                     │ Detector     │
//!                     └──────────────┘
//! ```
//!
//! Python goes through tree-sitter. JavaScript, Java and C++ go through the
//! header-regex and brace-depth heuristics in [`heuristic`]. The choice is a
//! closed `match` on [`Language`].

mod facts;
pub mod heuristic;
mod parsed;
pub mod python;

use tracing::{debug, warn};

use crate::language::Language;

pub use facts::{ClassInfo, FunctionInfo, SourceUnit, StructuralSummary};
pub use parsed::{ParsedFile, ParsedSource};

/// Extract the structure of `unit`, parsing it first.
pub fn extract(unit: &SourceUnit) -> StructuralSummary {
    extract_parsed(&ParsedSource::parse(unit))
}

/// Extract the structure of an already parsed unit.
///
/// Never fails: a python unit that does not parse degrades to its line
/// count with complexity 1.
pub fn extract_parsed(parsed: &ParsedSource) -> StructuralSummary {
    let unit = parsed.unit;
    let line_count = unit.line_count();

    let summary = match unit.language() {
        Language::Python => match (&parsed.tree, &parsed.syntax_error) {
            (Some(tree), None) => match python::extract(tree, line_count) {
                Ok(summary) => summary,
                Err(err) => {
                    warn!(filename = unit.filename(), error = %err, "python extraction failed");
                    StructuralSummary::degraded(line_count, err.to_string())
                }
            },
            (_, Some(reason)) => StructuralSummary::degraded(line_count, reason.clone()),
            (None, None) => StructuralSummary::degraded(line_count, "source was not parsed"),
        },
        Language::JavaScript | Language::Java | Language::Cpp => heuristic::extract(unit),
    };

    debug!(
        filename = unit.filename(),
        functions = summary.functions.len(),
        classes = summary.classes.len(),
        complexity = summary.complexity,
        "extracted structure"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_python() {
        let unit = SourceUnit::new("def hello():\n    print('hi')\n", "a.py", None).unwrap();
        let summary = extract(&unit);
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.complexity, 1);
        assert_eq!(summary.functions.len(), 1);
        assert!(summary.syntax_error.is_none());
    }

    #[test]
    fn test_python_syntax_error_degrades() {
        let unit = SourceUnit::new("def f(:\n", "a.py", None).unwrap();
        let summary = extract(&unit);
        assert_eq!(summary.line_count, 1);
        assert_eq!(summary.complexity, 1);
        assert!(summary.functions.is_empty());
        assert!(summary.classes.is_empty());
        assert!(summary.syntax_error.is_some());
    }

    #[test]
    fn test_empty_source() {
        let unit = SourceUnit::new("", "empty.py", None).unwrap();
        let summary = extract(&unit);
        assert_eq!(summary.line_count, 0);
        assert_eq!(summary.complexity, 1);
        assert!(summary.syntax_error.is_none());
    }
}
