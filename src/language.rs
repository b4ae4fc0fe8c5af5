//! Language detection from file names and explicit hints.

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AnalysisError;

/// The closed set of languages the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Cpp,
}

/// File extension (lowercase, without dot) to language.
static EXTENSIONS: phf::Map<&'static str, Language> = phf_map! {
    "py" => Language::Python,
    "js" => Language::JavaScript,
    "ts" => Language::JavaScript,
    "java" => Language::Java,
    "cpp" => Language::Cpp,
    "cc" => Language::Cpp,
    "cxx" => Language::Cpp,
    "h" => Language::Cpp,
    "hpp" => Language::Cpp,
};

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Human-readable name used in rendered documents.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "python" => Some(Language::Python),
            "javascript" => Some(Language::JavaScript),
            "java" => Some(Language::Java),
            "cpp" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn all() -> [Language; 4] {
        [
            Language::Python,
            Language::JavaScript,
            Language::Java,
            Language::Cpp,
        ]
    }

    /// Extensions (without dot) mapped to this language, sorted.
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = EXTENSIONS
            .entries()
            .filter(|(_, lang)| *lang == self)
            .map(|(ext, _)| *ext)
            .collect();
        exts.sort_unstable();
        exts
    }

    /// Whether `#` starts a line comment (otherwise `//` and `/* */`).
    pub fn uses_hash_comments(&self) -> bool {
        matches!(self, Language::Python)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| format!("unknown language: {}", s))
    }
}

/// Extension of `filename` in lowercase, or "" when there is none.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Look up a language by bare extension (no dot, any case).
pub fn for_extension(ext: &str) -> Option<Language> {
    EXTENSIONS.get(ext.to_lowercase().as_str()).copied()
}

/// All supported extensions, sorted.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut exts: Vec<&'static str> = EXTENSIONS.keys().copied().collect();
    exts.sort_unstable();
    exts
}

/// Detect the language of a source unit.
///
/// A recognised explicit hint wins; otherwise the filename's extension is
/// looked up. An unrecognised hint is ignored rather than rejected.
pub fn detect(filename: &str, explicit_hint: Option<&str>) -> Result<Language, AnalysisError> {
    if let Some(lang) = explicit_hint.and_then(Language::parse) {
        return Ok(lang);
    }

    let ext = extension_of(filename);
    for_extension(&ext).ok_or(AnalysisError::UnsupportedLanguage { extension: ext })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect("a.py", None), Ok(Language::Python));
        assert_eq!(detect("a.js", None), Ok(Language::JavaScript));
        assert_eq!(detect("a.ts", None), Ok(Language::JavaScript));
        assert_eq!(detect("Main.java", None), Ok(Language::Java));
        for name in ["a.cpp", "a.cc", "a.cxx", "a.h", "a.hpp"] {
            assert_eq!(detect(name, None), Ok(Language::Cpp), "{}", name);
        }
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(detect("SCRIPT.PY", None), Ok(Language::Python));
        assert_eq!(detect("x.Hpp", None), Ok(Language::Cpp));
    }

    #[test]
    fn test_hint_wins_over_extension() {
        assert_eq!(detect("a.xyz", Some("java")), Ok(Language::Java));
        assert_eq!(detect("a.py", Some("JavaScript")), Ok(Language::JavaScript));
    }

    #[test]
    fn test_unknown_hint_falls_back_to_extension() {
        assert_eq!(detect("a.py", Some("cobol")), Ok(Language::Python));
    }

    #[test]
    fn test_unsupported_extension() {
        assert_eq!(
            detect("a.xyz", None),
            Err(AnalysisError::UnsupportedLanguage {
                extension: "xyz".to_string()
            })
        );
        assert_eq!(
            detect("Makefile", None),
            Err(AnalysisError::UnsupportedLanguage {
                extension: String::new()
            })
        );
    }

    #[test]
    fn test_extensions_per_language() {
        assert_eq!(Language::Cpp.extensions(), vec!["cc", "cpp", "cxx", "h", "hpp"]);
        assert_eq!(Language::JavaScript.extensions(), vec!["js", "ts"]);
        assert_eq!(supported_extensions().len(), 9);
    }
}
