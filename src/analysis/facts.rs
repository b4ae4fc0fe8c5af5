//! Fact structures produced by structural extraction.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::language::{self, Language};
use crate::lexical;

/// One piece of source text submitted for analysis.
///
/// Immutable once built; the language is fixed at construction through
/// [`language::detect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    text: String,
    filename: String,
    language: Language,
}

impl SourceUnit {
    /// Build a unit, detecting its language from the hint or the filename.
    pub fn new(
        text: impl Into<String>,
        filename: impl Into<String>,
        hint: Option<&str>,
    ) -> Result<Self, AnalysisError> {
        let filename = filename.into();
        let language = language::detect(&filename, hint)?;
        Ok(Self {
            text: text.into(),
            filename,
            language,
        })
    }

    /// Build a unit whose language is already known.
    pub fn with_language(
        text: impl Into<String>,
        filename: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            text: text.into(),
            filename: filename.into(),
            language,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn line_count(&self) -> usize {
        lexical::count_lines(&self.text)
    }
}

/// A function or method definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    /// Parameter names in declaration order (`self`/`cls` omitted).
    pub parameters: Vec<String>,
    /// First line of the definition (1-indexed).
    pub line_start: usize,
    /// Last line of the definition (1-indexed, inclusive).
    pub line_end: usize,
    pub docstring: Option<String>,
}

/// A class definition and the methods declared directly in its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub methods: Vec<FunctionInfo>,
    pub docstring: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
}

/// Everything structural extraction learns about one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuralSummary {
    pub line_count: usize,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    /// McCabe complexity of the whole unit, at least 1.
    pub complexity: u32,
    /// Set when extraction degraded because the source did not parse.
    pub syntax_error: Option<String>,
}

impl StructuralSummary {
    /// Summary for a unit whose structure could not be recovered.
    pub fn degraded(line_count: usize, reason: impl Into<String>) -> Self {
        Self {
            line_count,
            functions: Vec::new(),
            classes: Vec::new(),
            complexity: 1,
            syntax_error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unit_detects_language() {
        let unit = SourceUnit::new("x = 1\n", "a.py", None).unwrap();
        assert_eq!(unit.language(), Language::Python);
        assert_eq!(unit.line_count(), 1);
    }

    #[test]
    fn test_source_unit_rejects_unknown_extension() {
        let err = SourceUnit::new("", "a.xyz", None).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedLanguage { .. }));
    }

    #[test]
    fn test_degraded_summary() {
        let summary = StructuralSummary::degraded(3, "invalid syntax at line 1");
        assert_eq!(summary.line_count, 3);
        assert_eq!(summary.complexity, 1);
        assert!(summary.functions.is_empty());
        assert!(summary.syntax_error.is_some());
    }
}
