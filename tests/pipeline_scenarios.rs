//! End-to-end checks of the analysis pipeline on small inputs.

use codedoc::analysis::SourceUnit;
use codedoc::config::{Config, ScoringConfig};
use codedoc::detect::{Category, Issue, Severity};
use codedoc::language::{self, Language};
use codedoc::{score, AnalysisError, Analyzer};

fn analyze(text: &str, filename: &str) -> codedoc::AnalysisResult {
    let analyzer = Analyzer::new(Config::default()).expect("default config is valid");
    let unit = SourceUnit::new(text, filename, None).expect("supported language");
    analyzer.analyze(&unit)
}

#[test]
fn test_simple_function_has_no_issues() {
    let result = analyze("def hello():\n    print('hi')\n", "a.py");

    assert_eq!(result.language, Language::Python);
    assert_eq!(result.line_count, 2);
    assert_eq!(result.complexity, 1);
    assert_eq!(result.functions.len(), 1);

    let hello = &result.functions[0];
    assert_eq!(hello.name, "hello");
    assert!(hello.parameters.is_empty());
    assert_eq!((hello.line_start, hello.line_end), (1, 2));
    assert_eq!(hello.docstring, None);

    assert!(result.issues.is_empty(), "unexpected issues: {:?}", result.issues);
    assert_eq!(result.quality_score, 100.0);
}

#[test]
fn test_eval_is_a_security_error() {
    let result = analyze("eval(user_input)\n", "a.py");

    assert_eq!(result.issues.len(), 1, "issues: {:?}", result.issues);
    let issue = &result.issues[0];
    assert_eq!(issue.category, Category::Security);
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.line, 1);
    assert_eq!(result.quality_score, 90.0);
}

#[test]
fn test_syntax_error_degrades() {
    let result = analyze("def f(:\n", "a.py");

    assert!(result.functions.is_empty());
    assert!(result.classes.is_empty());
    assert_eq!(result.complexity, 1);
    assert_eq!(result.issues.len(), 1, "issues: {:?}", result.issues);

    let issue = &result.issues[0];
    assert_eq!(issue.category, Category::Logic);
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.line, 0);
    assert_eq!(result.quality_score, 90.0);
}

#[test]
fn test_long_line_is_a_style_warning() {
    let line = format!("x = \"{}\"", "a".repeat(114));
    assert_eq!(line.chars().count(), 120);
    let result = analyze(&format!("{}\n", line), "a.py");

    assert_eq!(result.issues.len(), 1, "issues: {:?}", result.issues);
    let issue = &result.issues[0];
    assert_eq!(issue.category, Category::Style);
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.line, 1);
}

#[test]
fn test_unknown_extension_is_rejected() {
    let err = SourceUnit::new("whatever\n", "a.xyz", None).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::UnsupportedLanguage {
            extension: "xyz".to_string()
        }
    );
}

#[test]
fn test_detect_covers_every_listed_extension() {
    for ext in language::supported_extensions() {
        let name = format!("file.{}", ext);
        assert!(language::detect(&name, None).is_ok(), "{}", name);
    }
    assert!(language::detect("Makefile", None).is_err());
}

#[test]
fn test_score_is_a_function_of_complexity_and_issues() {
    let result = analyze("try:\n    eval(x)\nexcept:\n    pass\n", "a.py");
    let again = score::score(result.complexity, &result.issues, &ScoringConfig::default());
    assert_eq!(result.quality_score, again);
}

fn issue(severity: Severity, line: usize) -> Issue {
    Issue::new("test", Category::Logic, severity, line, "test")
}

#[test]
fn test_score_is_deterministic_and_order_independent() {
    let config = ScoringConfig::default();
    let issues = vec![
        issue(Severity::Warning, 3),
        issue(Severity::Error, 1),
        issue(Severity::Warning, 7),
        issue(Severity::Error, 2),
    ];
    let mut shuffled = issues.clone();
    shuffled.swap(0, 3);
    shuffled.swap(1, 2);

    let first = score::score(14, &issues, &config);
    assert_eq!(first, score::score(14, &issues, &config));
    assert_eq!(first, score::score(14, &shuffled, &config));
    assert_eq!(first, 72.0);
}

#[test]
fn test_score_never_rises_with_more_errors() {
    let config = ScoringConfig::default();
    for complexity in [1, 10, 25] {
        let mut issues = vec![issue(Severity::Warning, 1)];
        let mut previous = score::score(complexity, &issues, &config);
        for line in 0..12 {
            issues.push(issue(Severity::Error, line));
            let next = score::score(complexity, &issues, &config);
            assert!(next <= previous, "{} > {} at complexity {}", next, previous, complexity);
            assert!(next >= 0.0);
            previous = next;
        }
    }
}

#[test]
fn test_javascript_pipeline() {
    let text = "function check(a) {\n    if (a == 1) {\n        console.log(a);\n    }\n}\n";
    let result = analyze(text, "check.js");

    assert_eq!(result.language, Language::JavaScript);
    assert_eq!(result.functions.len(), 1);
    assert_eq!(result.complexity, 2);

    let rules: Vec<&str> = result.issues.iter().map(|i| i.rule.as_str()).collect();
    assert!(rules.contains(&"loose-equality"), "rules: {:?}", rules);
    assert!(rules.contains(&"console-log"), "rules: {:?}", rules);
}

#[test]
fn test_hint_overrides_extension() {
    let analyzer = Analyzer::new(Config::default()).unwrap();
    let unit = SourceUnit::new("def f():\n    pass\n", "snippet.txt", Some("python")).unwrap();
    let result = analyzer.analyze(&unit);
    assert_eq!(result.language, Language::Python);
    assert_eq!(result.functions[0].name, "f");
}
