//! Core types for detection results.

use serde::{Deserialize, Serialize};

/// Severity levels for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// What kind of problem an issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Performance,
    Logic,
    Style,
    Complexity,
}

impl Category {
    /// Fixed order used when grouping issues for display.
    pub const ALL: [Category; 5] = [
        Category::Security,
        Category::Performance,
        Category::Logic,
        Category::Style,
        Category::Complexity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Logic => "logic",
            Category::Style => "style",
            Category::Complexity => "complexity",
        }
    }

    /// Heading used in rendered documents.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Security => "Security",
            Category::Performance => "Performance",
            Category::Logic => "Logic",
            Category::Style => "Style",
            Category::Complexity => "Complexity",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// A single detected issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub category: Category,
    pub severity: Severity,
    /// 1-indexed line, or 0 for issues about the whole unit.
    pub line: usize,
    pub message: String,
    pub suggestion: Option<String>,
    /// Stable identifier of the rule that produced the issue.
    pub rule: String,
}

impl Issue {
    pub fn new(
        rule: impl Into<String>,
        category: Category,
        severity: Severity,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            line,
            message: message.into(),
            suggestion: None,
            rule: rule.into(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_lowercase() {
        let issue = Issue::new("eval-call", Category::Security, Severity::Error, 1, "eval");
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"category\":\"security\""));
        assert!(json.contains("\"severity\":\"error\""));
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Logic".parse::<Category>(), Ok(Category::Logic));
        assert!("syntax".parse::<Category>().is_err());
    }
}
