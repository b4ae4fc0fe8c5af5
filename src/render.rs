//! Documentation rendering for analysis results.
//!
//! Rendering is pure: the same result always produces the same bytes.

use std::fmt::Write;

use crate::analysis::FunctionInfo;
use crate::detect::{Category, Issue};
use crate::pipeline::AnalysisResult;

/// Documentation output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Markdown,
    Html,
    Json,
}

impl DocFormat {
    pub const ALL: [DocFormat; 3] = [DocFormat::Markdown, DocFormat::Html, DocFormat::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocFormat::Markdown => "markdown",
            DocFormat::Html => "html",
            DocFormat::Json => "json",
        }
    }

    /// File extension used when writing documents to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            DocFormat::Markdown => "md",
            DocFormat::Html => "html",
            DocFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for DocFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DocFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(DocFormat::Markdown),
            "html" => Ok(DocFormat::Html),
            "json" => Ok(DocFormat::Json),
            _ => Err(format!(
                "invalid format {:?}, must be 'markdown', 'html', or 'json'",
                s
            )),
        }
    }
}

/// Render `result` as a document in `format`.
pub fn render(result: &AnalysisResult, format: DocFormat) -> anyhow::Result<String> {
    match format {
        DocFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        DocFormat::Markdown => render_markdown(result),
        DocFormat::Html => render_html(result),
    }
}

/// Issues grouped by category, in [`Category::ALL`] order. Empty groups are
/// left out; issues keep their relative order within a group.
fn issues_by_category(issues: &[Issue]) -> Vec<(Category, Vec<&Issue>)> {
    Category::ALL
        .iter()
        .map(|&category| {
            let group: Vec<&Issue> = issues.iter().filter(|i| i.category == category).collect();
            (category, group)
        })
        .filter(|(_, group)| !group.is_empty())
        .collect()
}

fn signature(function: &FunctionInfo) -> String {
    format!("{}({})", function.name, function.parameters.join(", "))
}

fn line_label(line: usize) -> String {
    if line == 0 {
        "File".to_string()
    } else {
        format!("Line {}", line)
    }
}

// =============================================================================
// Markdown
// =============================================================================

fn render_markdown(result: &AnalysisResult) -> anyhow::Result<String> {
    let mut out = String::new();

    writeln!(out, "# Code Analysis: {}", result.filename)?;
    writeln!(out)?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(out, "| Language | {} |", result.language.display_name())?;
    writeln!(out, "| Lines | {} |", result.line_count)?;
    writeln!(out, "| Complexity | {} |", result.complexity)?;
    writeln!(out, "| Quality Score | {:.1}/100 |", result.quality_score)?;
    writeln!(out)?;

    if let Some(summary) = &result.summary {
        writeln!(out, "## Summary")?;
        writeln!(out)?;
        writeln!(out, "{}", summary)?;
        writeln!(out)?;
    }

    if !result.classes.is_empty() {
        writeln!(out, "## Classes")?;
        writeln!(out)?;
        for class in &result.classes {
            writeln!(
                out,
                "### `{}` (lines {}-{})",
                class.name, class.line_start, class.line_end
            )?;
            writeln!(out)?;
            if let Some(doc) = &class.docstring {
                writeln!(out, "{}", doc)?;
                writeln!(out)?;
            }
            if !class.methods.is_empty() {
                writeln!(out, "**Methods:**")?;
                writeln!(out)?;
                for method in &class.methods {
                    write!(
                        out,
                        "- `{}` (lines {}-{})",
                        signature(method),
                        method.line_start,
                        method.line_end
                    )?;
                    match method.docstring.as_deref().and_then(|d| d.lines().next()) {
                        Some(first) => writeln!(out, ": {}", first)?,
                        None => writeln!(out)?,
                    }
                }
                writeln!(out)?;
            }
        }
    }

    if !result.functions.is_empty() {
        writeln!(out, "## Functions")?;
        writeln!(out)?;
        for function in &result.functions {
            writeln!(out, "### `{}`", signature(function))?;
            writeln!(out)?;
            writeln!(
                out,
                "- **Lines:** {}-{}",
                function.line_start, function.line_end
            )?;
            if function.parameters.is_empty() {
                writeln!(out, "- **Parameters:** none")?;
            } else {
                let params: Vec<String> =
                    function.parameters.iter().map(|p| format!("`{}`", p)).collect();
                writeln!(out, "- **Parameters:** {}", params.join(", "))?;
            }
            writeln!(out)?;
            if let Some(doc) = &function.docstring {
                writeln!(out, "{}", doc)?;
                writeln!(out)?;
            }
        }
    }

    writeln!(out, "## Issues")?;
    writeln!(out)?;
    if result.issues.is_empty() {
        writeln!(out, "No issues found.")?;
    } else {
        for (category, group) in issues_by_category(&result.issues) {
            writeln!(out, "### {} ({})", category.title(), group.len())?;
            writeln!(out)?;
            for issue in group {
                writeln!(
                    out,
                    "- **{}** [{}] {}",
                    line_label(issue.line),
                    issue.severity,
                    issue.message
                )?;
                if let Some(suggestion) = &issue.suggestion {
                    writeln!(out, "  - Suggestion: {}", suggestion)?;
                }
            }
            writeln!(out)?;
        }
    }

    Ok(out)
}

// =============================================================================
// HTML
// =============================================================================

const STYLESHEET: &str = "body { font-family: sans-serif; margin: 2em auto; max-width: 60em; color: #222; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ccc; padding: 0.3em 0.8em; text-align: left; }
code { background: #f4f4f4; padding: 0 0.2em; }
.error { color: #b00020; }
.warning { color: #a15c00; }
.doc { white-space: pre-wrap; }";

/// Escape text for use in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_html(result: &AnalysisResult) -> anyhow::Result<String> {
    let mut out = String::new();
    let title = escape_html(&result.filename);

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Code Analysis: {}</title>", title)?;
    writeln!(out, "<style>\n{}\n</style>", STYLESHEET)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>Code Analysis: {}</h1>", title)?;

    writeln!(out, "<table>")?;
    writeln!(out, "<tr><th>Metric</th><th>Value</th></tr>")?;
    writeln!(
        out,
        "<tr><td>Language</td><td>{}</td></tr>",
        result.language.display_name()
    )?;
    writeln!(out, "<tr><td>Lines</td><td>{}</td></tr>", result.line_count)?;
    writeln!(out, "<tr><td>Complexity</td><td>{}</td></tr>", result.complexity)?;
    writeln!(
        out,
        "<tr><td>Quality Score</td><td>{:.1}/100</td></tr>",
        result.quality_score
    )?;
    writeln!(out, "</table>")?;

    if let Some(summary) = &result.summary {
        writeln!(out, "<h2>Summary</h2>")?;
        writeln!(out, "<p>{}</p>", escape_html(summary))?;
    }

    if !result.classes.is_empty() {
        writeln!(out, "<h2>Classes</h2>")?;
        for class in &result.classes {
            writeln!(
                out,
                "<h3><code>{}</code> (lines {}-{})</h3>",
                escape_html(&class.name),
                class.line_start,
                class.line_end
            )?;
            if let Some(doc) = &class.docstring {
                writeln!(out, "<p class=\"doc\">{}</p>", escape_html(doc))?;
            }
            if !class.methods.is_empty() {
                writeln!(out, "<ul>")?;
                for method in &class.methods {
                    write!(
                        out,
                        "<li><code>{}</code> (lines {}-{})",
                        escape_html(&signature(method)),
                        method.line_start,
                        method.line_end
                    )?;
                    if let Some(first) = method.docstring.as_deref().and_then(|d| d.lines().next()) {
                        write!(out, ": {}", escape_html(first))?;
                    }
                    writeln!(out, "</li>")?;
                }
                writeln!(out, "</ul>")?;
            }
        }
    }

    if !result.functions.is_empty() {
        writeln!(out, "<h2>Functions</h2>")?;
        for function in &result.functions {
            writeln!(
                out,
                "<h3><code>{}</code></h3>",
                escape_html(&signature(function))
            )?;
            writeln!(
                out,
                "<p>Lines {}-{}</p>",
                function.line_start, function.line_end
            )?;
            if let Some(doc) = &function.docstring {
                writeln!(out, "<p class=\"doc\">{}</p>", escape_html(doc))?;
            }
        }
    }

    writeln!(out, "<h2>Issues</h2>")?;
    if result.issues.is_empty() {
        writeln!(out, "<p>No issues found.</p>")?;
    } else {
        for (category, group) in issues_by_category(&result.issues) {
            writeln!(out, "<h3>{} ({})</h3>", category.title(), group.len())?;
            writeln!(out, "<ul>")?;
            for issue in group {
                write!(
                    out,
                    "<li class=\"{}\"><strong>{}</strong> [{}] {}",
                    issue.severity,
                    line_label(issue.line),
                    issue.severity,
                    escape_html(&issue.message)
                )?;
                if let Some(suggestion) = &issue.suggestion {
                    write!(out, "<br>Suggestion: {}", escape_html(suggestion))?;
                }
                writeln!(out, "</li>")?;
            }
            writeln!(out, "</ul>")?;
        }
    }

    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Severity;
    use crate::language::Language;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            language: Language::Python,
            filename: "a.py".to_string(),
            line_count: 3,
            complexity: 1,
            functions: vec![FunctionInfo {
                name: "hello".to_string(),
                parameters: vec!["name".to_string()],
                line_start: 1,
                line_end: 3,
                docstring: Some("Say <hi>.".to_string()),
            }],
            classes: Vec::new(),
            issues: vec![
                Issue::new("line-too-long", Category::Style, Severity::Warning, 2, "Line too long"),
                Issue::new("eval-call", Category::Security, Severity::Error, 3, "Use of eval()")
                    .with_suggestion("Use ast.literal_eval()"),
            ],
            quality_score: 87.0,
            summary: None,
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("markdown".parse::<DocFormat>().unwrap(), DocFormat::Markdown);
        assert_eq!("HTML".parse::<DocFormat>().unwrap(), DocFormat::Html);
        assert_eq!("md".parse::<DocFormat>().unwrap(), DocFormat::Markdown);
        assert!("pdf".parse::<DocFormat>().is_err());
    }

    #[test]
    fn test_markdown_groups_issues_in_category_order() {
        let doc = render(&sample(), DocFormat::Markdown).unwrap();
        let security = doc.find("### Security (1)").unwrap();
        let style = doc.find("### Style (1)").unwrap();
        assert!(security < style);
        assert!(doc.contains("| Quality Score | 87.0/100 |"));
        assert!(doc.contains("### `hello(name)`"));
        assert!(doc.contains("  - Suggestion: Use ast.literal_eval()"));
    }

    #[test]
    fn test_markdown_without_issues() {
        let mut result = sample();
        result.issues.clear();
        let doc = render(&result, DocFormat::Markdown).unwrap();
        assert!(doc.contains("No issues found."));
    }

    #[test]
    fn test_html_escapes_content() {
        let doc = render(&sample(), DocFormat::Html).unwrap();
        assert!(doc.contains("Say &lt;hi&gt;."));
        assert!(!doc.contains("Say <hi>."));
        assert!(doc.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && \"c\""), "a &lt; b &amp;&amp; &quot;c&quot;");
    }

    #[test]
    fn test_json_round_trip() {
        let result = sample();
        let doc = render(&result, DocFormat::Json).unwrap();
        let parsed: AnalysisResult = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed, result);
    }
}
