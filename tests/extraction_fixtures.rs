//! Structural extraction against the testdata fixtures.

use std::path::PathBuf;

use codedoc::analysis::{self, SourceUnit, StructuralSummary};
use codedoc::language::Language;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn extract_fixture(name: &str) -> StructuralSummary {
    let path = testdata_path().join(name);
    let text = std::fs::read_to_string(&path).expect("fixture should be readable");
    let unit = SourceUnit::new(text, name, None).expect("fixture language is supported");
    analysis::extract(&unit)
}

fn names(summary: &StructuralSummary) -> Vec<&str> {
    summary.functions.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn test_python_fixture() {
    let s = extract_fixture("sample.py");

    assert_eq!(s.line_count, 29);
    assert_eq!(s.syntax_error, None);
    assert_eq!(names(&s), vec!["__init__", "add", "total", "report_path"]);

    let init = &s.functions[0];
    assert_eq!(init.parameters, vec!["items"]);
    assert_eq!((init.line_start, init.line_end), (9, 10));

    let add = &s.functions[1];
    assert_eq!(add.parameters, vec!["name", "count"]);
    assert_eq!(add.docstring.as_deref(), Some("Add count units of name."));

    let total = &s.functions[2];
    assert_eq!(total.parameters, vec!["inventory", "*names", "**options"]);
    assert_eq!((total.line_start, total.line_end), (19, 25));

    assert_eq!(s.classes.len(), 1);
    let class = &s.classes[0];
    assert_eq!(class.name, "Inventory");
    assert_eq!(class.docstring.as_deref(), Some("Tracks item counts."));
    let methods: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["__init__", "add"]);

    // `or`, if, for, if
    assert_eq!(s.complexity, 5);
}

#[test]
fn test_javascript_fixture() {
    let s = extract_fixture("sample.js");

    assert_eq!(
        names(&s),
        vec!["priceWithTax", "formatPrice", "constructor", "add", "total"]
    );
    assert_eq!(s.functions[0].parameters, vec!["price", "rate"]);
    assert_eq!((s.functions[0].line_start, s.functions[0].line_end), (3, 5));
    assert_eq!(s.functions[1].parameters, vec!["amount", "currency"]);
    assert_eq!((s.functions[1].line_start, s.functions[1].line_end), (7, 9));
    assert!(s.functions[4].parameters.is_empty());

    assert_eq!(s.classes.len(), 1);
    assert_eq!(s.classes[0].name, "Cart");
    assert_eq!((s.classes[0].line_start, s.classes[0].line_end), (11, 33));
    assert_eq!(s.classes[0].methods.len(), 3);
    assert!(s.functions.iter().all(|f| f.docstring.is_none()));

    assert_eq!(s.complexity, 4);
}

#[test]
fn test_java_fixture() {
    let s = extract_fixture("Sample.java");

    assert_eq!(names(&s), vec!["Sample", "countLonger", "describe"]);
    assert_eq!(s.functions[0].parameters, vec!["names"]);
    assert_eq!(s.functions[1].parameters, vec!["limit"]);
    assert_eq!((s.functions[1].line_start, s.functions[1].line_end), (10, 18));

    assert_eq!(s.classes.len(), 1);
    assert_eq!((s.classes[0].line_start, s.classes[0].line_end), (3, 28));
    assert_eq!(s.classes[0].methods.len(), 3);

    // for, if, case
    assert_eq!(s.complexity, 4);
}

#[test]
fn test_cpp_fixture() {
    let s = extract_fixture("sample.cpp");

    // The prototype on line 4 has no body.
    assert_eq!(names(&s), vec!["push", "empty", "clamp", "sum"]);
    assert_eq!(s.functions[2].parameters, vec!["value", "low", "high"]);
    assert_eq!((s.functions[2].line_start, s.functions[2].line_end), (20, 28));
    assert_eq!(s.functions[3].parameters, vec!["values"]);

    assert_eq!(s.classes.len(), 1);
    assert_eq!(s.classes[0].name, "Stack");
    let methods: Vec<&str> = s.classes[0].methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["push", "empty"]);

    assert_eq!(s.complexity, 4);
}

#[test]
fn test_languages_detected_from_fixture_names() {
    for (name, language) in [
        ("sample.py", Language::Python),
        ("sample.js", Language::JavaScript),
        ("Sample.java", Language::Java),
        ("sample.cpp", Language::Cpp),
    ] {
        let unit = SourceUnit::new("", name, None).unwrap();
        assert_eq!(unit.language(), language);
    }
}
