//! The issue detector: pattern rules, structural style checks and python
//! tree checks.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::lint::Linter;
use super::rules::{PatternRule, RuleSet};
use super::unused::detect_unused_variables;
use super::{Category, Issue, Severity};
use crate::analysis::{python, ParsedFile, ParsedSource, SourceUnit};
use crate::language::Language;
use crate::lexical::{self, is_inside_string_literal};

static PY_LOOP_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:async\s+)?(?:for|while)\b.*:\s*$").unwrap());

static PY_TOP_LEVEL_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:async\s+def|def|class)\s").unwrap());

static C_LOOP_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:for|while|do)\b").unwrap());

/// Knobs for the non-regex checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorOptions {
    pub max_line_length: usize,
    /// Python functions above this complexity get a warning.
    pub complexity_threshold: u32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_line_length: 88,
            complexity_threshold: 10,
        }
    }
}

/// Finds issues in a source unit. Never executes the analyzed code.
pub struct Detector<'a> {
    rules: &'a RuleSet,
    options: DetectorOptions,
    linter: Option<&'a dyn Linter>,
}

impl<'a> Detector<'a> {
    pub fn new(rules: &'a RuleSet, options: DetectorOptions) -> Self {
        Self {
            rules,
            options,
            linter: None,
        }
    }

    pub fn with_linter(mut self, linter: &'a dyn Linter) -> Self {
        self.linter = Some(linter);
        self
    }

    /// Detect issues in `unit`, parsing it first.
    pub fn detect(&self, unit: &SourceUnit) -> Vec<Issue> {
        self.detect_parsed(&ParsedSource::parse(unit))
    }

    /// Detect issues in an already parsed unit, ordered by line.
    pub fn detect_parsed(&self, parsed: &ParsedSource) -> Vec<Issue> {
        let unit = parsed.unit;
        let mut issues = Vec::new();

        if let Some(reason) = &parsed.syntax_error {
            issues.push(
                Issue::new(
                    "syntax-error",
                    Category::Logic,
                    Severity::Error,
                    0,
                    format!("Syntax error: {}", reason),
                )
                .with_suggestion("Fix the syntax so the file can be parsed"),
            );
        }

        let raw_lines: Vec<&str> = unit.text().lines().collect();
        let code_lines = lexical::code_lines(unit.text(), unit.language());

        issues.extend(self.pattern_issues(unit.language(), &code_lines));
        issues.extend(self.style_issues(unit.language(), &raw_lines, &code_lines));

        if let Some(tree) = &parsed.tree {
            issues.extend(detect_unused_variables(tree));
            issues.extend(self.complexity_issues(tree));
        }

        if unit.language() == Language::Python {
            if let Some(linter) = self.linter {
                match linter.lint(unit.text()) {
                    Ok(findings) => issues.extend(findings.into_iter().map(|f| f.into_issue())),
                    Err(err) => warn!(filename = unit.filename(), error = %err, "linter failed"),
                }
            }
        }

        issues.sort_by_key(|i| i.line);
        debug!(filename = unit.filename(), issues = issues.len(), "detection complete");
        issues
    }

    fn pattern_issues(&self, language: Language, code_lines: &[String]) -> Vec<Issue> {
        let rules = self.rules.for_language(language);
        let loop_mask = if rules.iter().any(|r| r.loop_only) {
            loop_mask(language, code_lines)
        } else {
            vec![false; code_lines.len()]
        };

        let mut seen: HashSet<(&str, usize)> = HashSet::new();
        let mut issues = Vec::new();

        for (idx, line) in code_lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_number = idx + 1;

            for rule in rules.iter() {
                if rule.loop_only && !loop_mask[idx] {
                    continue;
                }
                if seen.contains(&(rule.id.as_str(), line_number)) {
                    continue;
                }
                if let Some(message) = first_match(rule, line) {
                    seen.insert((rule.id.as_str(), line_number));
                    let mut issue =
                        Issue::new(&rule.id, rule.category, rule.severity, line_number, message);
                    issue.suggestion = rule.suggestion.clone();
                    issues.push(issue);
                }
            }
        }

        issues
    }

    fn style_issues(&self, language: Language, raw_lines: &[&str], code_lines: &[String]) -> Vec<Issue> {
        let mut issues = Vec::new();
        let limit = self.options.max_line_length;

        for (idx, raw) in raw_lines.iter().enumerate() {
            let line_number = idx + 1;

            let length = raw.chars().count();
            if length > limit {
                issues.push(
                    Issue::new(
                        "line-too-long",
                        Category::Style,
                        Severity::Warning,
                        line_number,
                        format!("Line too long ({} > {} characters)", length, limit),
                    )
                    .with_suggestion("Break the line up"),
                );
            }

            if raw.ends_with(' ') || raw.ends_with('\t') {
                issues.push(
                    Issue::new(
                        "trailing-whitespace",
                        Category::Style,
                        Severity::Warning,
                        line_number,
                        "Trailing whitespace",
                    )
                    .with_suggestion("Remove the whitespace at the end of the line"),
                );
            }

            if language == Language::Python && idx > 0 {
                let code = code_lines.get(idx).map(String::as_str).unwrap_or("");
                let prev = raw_lines[idx - 1].trim();
                if PY_TOP_LEVEL_DEF.is_match(code)
                    && !prev.is_empty()
                    && !prev.starts_with('@')
                    && !prev.starts_with('#')
                {
                    issues.push(
                        Issue::new(
                            "blank-line-before-definition",
                            Category::Style,
                            Severity::Warning,
                            line_number,
                            "Expected a blank line before top-level definition",
                        )
                        .with_suggestion("Separate top-level definitions with blank lines"),
                    );
                }
            }
        }

        issues
    }

    fn complexity_issues(&self, tree: &ParsedFile) -> Vec<Issue> {
        let threshold = self.options.complexity_threshold;
        let mut issues = Vec::new();

        for func in python::function_nodes(tree) {
            let complexity = match python::complexity(tree, func) {
                Ok(c) => c,
                Err(err) => {
                    warn!(error = %err, "complexity query failed");
                    continue;
                }
            };
            if complexity > threshold {
                issues.push(
                    Issue::new(
                        "high-complexity",
                        Category::Complexity,
                        Severity::Warning,
                        func.start_position().row + 1,
                        format!(
                            "Function '{}' has high complexity ({} > {})",
                            python::function_name(tree, func),
                            complexity,
                            threshold
                        ),
                    )
                    .with_suggestion("Split it into smaller functions"),
                );
            }
        }

        issues
    }
}

/// Message for the first match of `rule` on `line` that does not sit
/// inside a string literal.
fn first_match(rule: &PatternRule, line: &str) -> Option<String> {
    rule.regex.captures_iter(line).find_map(|caps| {
        let whole = caps.get(0)?;
        // Some patterns consume one character of leading context, so check
        // where the match ends rather than where it starts.
        let anchor = line[..whole.end()]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(whole.start());
        if is_inside_string_literal(line, anchor) {
            return None;
        }
        Some(rule.render_message(&caps))
    })
}

/// For each line, whether it sits inside a loop body.
fn loop_mask(language: Language, code_lines: &[String]) -> Vec<bool> {
    match language {
        Language::Python => python_loop_mask(code_lines),
        Language::JavaScript | Language::Java | Language::Cpp => brace_loop_mask(code_lines),
    }
}

/// Indentation-based: a line is in a loop when it is indented under a
/// `for`/`while` header.
fn python_loop_mask(code_lines: &[String]) -> Vec<bool> {
    let mut headers: Vec<usize> = Vec::new();
    let mut mask = Vec::with_capacity(code_lines.len());

    for line in code_lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            mask.push(false);
            continue;
        }

        let indent = lexical::indent_width(line);
        while headers.last().map_or(false, |&h| indent <= h) {
            headers.pop();
        }
        mask.push(!headers.is_empty());

        if PY_LOOP_HEADER.is_match(trimmed) {
            headers.push(indent);
        }
    }

    mask
}

/// Brace-based: a line is in a loop when an enclosing block was opened by a
/// `for`/`while`/`do` header, or it is the single statement of a brace-less
/// loop.
fn brace_loop_mask(code_lines: &[String]) -> Vec<bool> {
    let mut blocks: Vec<bool> = Vec::new();
    let mut pending = false;
    let mut mask = Vec::with_capacity(code_lines.len());

    for line in code_lines {
        let stripped = lexical::strip_string_literals(line);
        let trimmed = stripped.trim_start();

        let braceless_body = pending && !trimmed.is_empty() && !trimmed.starts_with('{');
        mask.push(blocks.iter().any(|&is_loop| is_loop) || braceless_body);

        let keyword_starts: HashSet<usize> =
            C_LOOP_KEYWORD.find_iter(&stripped).map(|m| m.start()).collect();
        let mut parens = 0i32;

        for (pos, ch) in stripped.char_indices() {
            if keyword_starts.contains(&pos) {
                pending = true;
            }
            match ch {
                '(' => parens += 1,
                ')' => parens -= 1,
                '{' => {
                    blocks.push(pending);
                    pending = false;
                }
                '}' => {
                    blocks.pop();
                }
                ';' if parens <= 0 => pending = false,
                _ => {}
            }
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::rules::DEFAULT_RULES;
    use crate::detect::LintFinding;

    fn detect(text: &str, filename: &str) -> Vec<Issue> {
        let unit = SourceUnit::new(text, filename, None).unwrap();
        Detector::new(&DEFAULT_RULES, DetectorOptions::default()).detect(&unit)
    }

    fn rules_of(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.rule.as_str()).collect()
    }

    #[test]
    fn test_clean_function_has_no_issues() {
        assert!(detect("def hello():\n    print('hi')\n", "a.py").is_empty());
    }

    #[test]
    fn test_eval_is_single_security_error() {
        let issues = detect("eval(user_input)\n", "a.py");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, Category::Security);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].line, 1);
    }

    #[test]
    fn test_syntax_error_reported_at_line_zero() {
        let issues = detect("def f(:\n", "a.py");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "syntax-error");
        assert_eq!(issues[0].line, 0);
        assert_eq!(issues[0].category, Category::Logic);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_pattern_rules_still_run_on_syntax_error() {
        let issues = detect("eval(x)\ndef f(:\n", "a.py");
        assert_eq!(
            rules_of(&issues),
            vec!["syntax-error", "eval-call", "blank-line-before-definition"]
        );
    }

    #[test]
    fn test_long_line() {
        let line = format!("x = \"{}\"\n", "a".repeat(114));
        assert_eq!(line.trim_end().chars().count(), 120);
        let issues = detect(&line, "a.py");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "line-too-long");
        assert_eq!(issues[0].category, Category::Style);
        assert_eq!(issues[0].line, 1);
    }

    #[test]
    fn test_matches_in_comments_and_strings_ignored() {
        let source = "# eval(x) is dangerous\nmsg = \"eval(x)\"\n";
        assert!(detect(source, "a.py").is_empty());
    }

    #[test]
    fn test_one_issue_per_rule_and_line() {
        let issues = detect("x = eval(a) + eval(b)\n", "a.py");
        assert_eq!(rules_of(&issues), vec!["eval-call"]);
    }

    #[test]
    fn test_string_concat_only_inside_python_loop() {
        let source = "s = ''\ns += 'a'\nfor x in xs:\n    s += 'b'\ns += 'c'\n";
        let issues = detect(source, "a.py");
        let lines: Vec<usize> = issues
            .iter()
            .filter(|i| i.rule == "string-concat-in-loop")
            .map(|i| i.line)
            .collect();
        assert_eq!(lines, vec![4]);
    }

    #[test]
    fn test_string_concat_inside_brace_loop() {
        let source = "let s = '';\nfor (let i = 0; i < 3; i++) {\n  s += 'x';\n}\ns += 'y';\n";
        let issues = detect(source, "a.js");
        let lines: Vec<usize> = issues
            .iter()
            .filter(|i| i.rule == "string-concat-in-loop")
            .map(|i| i.line)
            .collect();
        assert_eq!(lines, vec![3]);
    }

    #[test]
    fn test_braceless_loop_body() {
        let mask = brace_loop_mask(&[
            "while (x)".to_string(),
            "    s += \"a\";".to_string(),
            "done();".to_string(),
        ]);
        assert_eq!(mask, vec![false, true, false]);
    }

    #[test]
    fn test_blank_line_before_top_level_def() {
        let issues = detect("import os\ndef f():\n    return os.sep\n", "a.py");
        assert_eq!(rules_of(&issues), vec!["blank-line-before-definition"]);

        let ok = "import os\n\n\n@decorator\ndef f():\n    return os.sep\n";
        assert!(detect(ok, "a.py").is_empty());
    }

    #[test]
    fn test_trailing_whitespace() {
        let issues = detect("x = 1   \n", "a.py");
        assert_eq!(rules_of(&issues), vec!["trailing-whitespace"]);
    }

    #[test]
    fn test_high_complexity_function() {
        let mut source = String::from("def busy(x):\n");
        for i in 0..11 {
            source.push_str(&format!("    if x == {}:\n        return {}\n", i, i));
        }
        source.push_str("    return -1\n");
        let issues = detect(&source, "a.py");
        let complex: Vec<&Issue> = issues
            .iter()
            .filter(|i| i.category == Category::Complexity)
            .collect();
        assert_eq!(complex.len(), 1);
        assert_eq!(complex[0].line, 1);
        assert!(complex[0].message.contains("busy"));
    }

    #[test]
    fn test_cpp_rules() {
        let source = "using namespace std;\nint main() {\n  char b[8];\n  strcpy(b, s);\n  return 0;\n}\n";
        let issues = detect(source, "a.cpp");
        assert_eq!(rules_of(&issues), vec!["using-namespace-std", "unbounded-copy"]);
        assert_eq!(issues[1].message, "strcpy() does not check buffer bounds");
    }

    #[test]
    fn test_java_rules() {
        let source = "class A {\n  void f() {\n    try { g(); } catch (Exception e) {}\n    System.out.println(\"x\");\n  }\n}\n";
        let issues = detect(source, "A.java");
        assert_eq!(rules_of(&issues), vec!["empty-catch", "system-out"]);
    }

    struct FixedLinter;

    impl Linter for FixedLinter {
        fn lint(&self, _source: &str) -> anyhow::Result<Vec<LintFinding>> {
            Ok(vec![LintFinding {
                line: 1,
                message: "something".to_string(),
                rule_id: "E999".to_string(),
            }])
        }
    }

    struct BrokenLinter;

    impl Linter for BrokenLinter {
        fn lint(&self, _source: &str) -> anyhow::Result<Vec<LintFinding>> {
            anyhow::bail!("not installed")
        }
    }

    #[test]
    fn test_linter_findings_merged_for_python_only() {
        let unit = SourceUnit::new("x = 1\n", "a.py", None).unwrap();
        let detector = Detector::new(&DEFAULT_RULES, DetectorOptions::default()).with_linter(&FixedLinter);
        assert_eq!(rules_of(&detector.detect(&unit)), vec!["lint:E999"]);

        let js = SourceUnit::new("let x = 1;\n", "a.js", None).unwrap();
        assert!(detector.detect(&js).is_empty());
    }

    #[test]
    fn test_linter_failure_ignored() {
        let unit = SourceUnit::new("x = 1\n", "a.py", None).unwrap();
        let detector = Detector::new(&DEFAULT_RULES, DetectorOptions::default()).with_linter(&BrokenLinter);
        assert!(detector.detect(&unit).is_empty());
    }
}
