//! Best-effort extraction for the brace-delimited languages.
//!
//! JavaScript, Java and C++ are not parsed. Definitions are found with one
//! header regex per dialect, and a definition's extent is the span from its
//! header to the matching closing brace, counted over a view of the source
//! with comments and string literals blanked out. Headers that never open a
//! body (prototypes, abstract or interface methods, forward declarations)
//! are skipped.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ClassInfo, FunctionInfo, SourceUnit, StructuralSummary};
use crate::language::Language;
use crate::lexical;

/// How many lines past a header we look for the opening brace.
const MAX_HEADER_LINES: usize = 3;

static JS_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)").unwrap()
});

static JS_FUNCTIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*\((?P<params>[^)]*)\)",
        )
        .unwrap(),
        Regex::new(
            r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?function\s*\*?\s*[\w$]*\s*\((?P<params>[^)]*)\)",
        )
        .unwrap(),
        Regex::new(
            r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?\((?P<params>[^)]*)\)\s*=>",
        )
        .unwrap(),
        Regex::new(
            r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?P<params>[A-Za-z_$][\w$]*)\s*=>",
        )
        .unwrap(),
    ]
});

/// Methods declared directly inside a JS class body.
static JS_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:static\s+)?(?:async\s+)?(?:get\s+|set\s+)?\*?(?P<name>#?[A-Za-z_$][\w$]*)\s*\((?P<params>[^)]*)\)\s*\{",
    )
    .unwrap()
});

static JAVA_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|static|final|abstract|sealed|strictfp)\s+)*(?:class|interface|enum|record)\s+(?P<name>\w+)",
    )
    .unwrap()
});

static JAVA_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|private|protected|static|final|abstract|synchronized|native|default|strictfp)\s+)*(?:<[^>]*>\s+)?(?:(?P<ret>[\w<>\[\],.?]+)\s+)?(?P<name>\w+)\s*\((?P<params>[^)]*)\)\s*(?:throws\s+[\w.,\s]+)?\s*(?:\{.*)?$",
    )
    .unwrap()
});

static CPP_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:template\s*<[^>]*>\s*)?(?:class|struct)\s+(?P<name>\w+)").unwrap()
});

static CPP_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:template\s*<[^>]*>\s*)?(?:(?:static|inline|virtual|explicit|constexpr|extern|friend)\s+)*(?:(?P<ret>[\w:<>,]+[*&]*)\s+[*&]*)?(?P<name>~?[A-Za-z_]\w*(?:::~?[A-Za-z_]\w*)*)\s*\((?P<params>[^)]*)\)\s*(?:const\s*)?(?:noexcept\s*)?(?:override\s*)?(?:final\s*)?(?:\{.*)?$",
    )
    .unwrap()
});

static DECISION_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:if|for|while|case|catch)\b").unwrap());

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_$][\w$]*").unwrap());

/// Words a header regex can mistake for a function name or return type.
const NOT_A_DEFINITION: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "sizeof", "else", "do",
    "try", "new", "delete", "throw", "synchronized", "typeof", "using", "case",
];

struct Header {
    name: String,
    params: String,
    line: usize,
    /// Byte offset in the stripped line where the body search starts.
    search_from: usize,
}

struct Span {
    start: usize,
    end: usize,
    /// Brace depth inside the body.
    body_depth: usize,
}

/// Extract definitions and complexity from a JavaScript, Java or C++ unit.
pub fn extract(unit: &SourceUnit) -> StructuralSummary {
    let language = unit.language();
    let lines: Vec<String> = lexical::code_lines(unit.text(), language)
        .iter()
        .map(|l| lexical::strip_string_literals(l))
        .collect();
    let depths = line_depths(&lines);

    let mut classes: Vec<(Span, ClassInfo)> = Vec::new();
    let mut functions: Vec<(usize, FunctionInfo)> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if let Some(header) = class_header(language, line, idx) {
            if let Some((end, body_depth)) = find_body(&lines, &depths, &header) {
                classes.push((
                    Span {
                        start: idx,
                        end,
                        body_depth,
                    },
                    ClassInfo {
                        name: header.name,
                        methods: Vec::new(),
                        docstring: None,
                        line_start: idx + 1,
                        line_end: end + 1,
                    },
                ));
            }
            continue;
        }

        let in_class_body = classes
            .iter()
            .any(|(span, _)| idx > span.start && idx <= span.end && depths[idx] == span.body_depth);

        let header = function_header(language, line, idx, in_class_body);
        let Some(header) = header else { continue };
        let Some((end, _)) = find_body(&lines, &depths, &header) else {
            continue;
        };

        let info = FunctionInfo {
            name: header.name,
            parameters: parameter_names(language, &header.params),
            line_start: idx + 1,
            line_end: end + 1,
            docstring: None,
        };

        if let Some((_, class)) = classes.iter_mut().rev().find(|(span, _)| {
            idx > span.start && idx <= span.end && depths[idx] == span.body_depth
        }) {
            class.methods.push(info.clone());
        }
        functions.push((idx, info));
    }

    let complexity = 1 + lines
        .iter()
        .map(|l| DECISION_KEYWORDS.find_iter(l).count() as u32)
        .sum::<u32>();

    StructuralSummary {
        line_count: unit.line_count(),
        functions: functions.into_iter().map(|(_, f)| f).collect(),
        classes: classes.into_iter().map(|(_, c)| c).collect(),
        complexity,
        syntax_error: None,
    }
}

fn class_header(language: Language, line: &str, idx: usize) -> Option<Header> {
    let re: &Regex = match language {
        Language::JavaScript => &JS_CLASS,
        Language::Java => &JAVA_CLASS,
        Language::Cpp => &CPP_CLASS,
        Language::Python => return None,
    };
    let caps = re.captures(line)?;
    Some(Header {
        name: caps["name"].to_string(),
        params: String::new(),
        line: idx,
        search_from: caps.get(0).map_or(0, |m| m.end()),
    })
}

fn function_header(language: Language, line: &str, idx: usize, in_class_body: bool) -> Option<Header> {
    let caps = match language {
        Language::JavaScript => {
            let direct = JS_FUNCTIONS.iter().find_map(|re| re.captures(line));
            match direct {
                Some(caps) => caps,
                None if in_class_body => JS_METHOD.captures(line)?,
                None => return None,
            }
        }
        Language::Java => JAVA_FUNCTION.captures(line)?,
        Language::Cpp => CPP_FUNCTION.captures(line)?,
        Language::Python => return None,
    };

    let name = caps.name("name")?.as_str();
    let ret = caps.name("ret").map(|m| m.as_str()).unwrap_or("");
    if NOT_A_DEFINITION.contains(&name) || NOT_A_DEFINITION.contains(&ret) {
        return None;
    }

    let params = caps.name("params").map(|m| m.as_str()).unwrap_or("");
    let search_from = caps
        .name("params")
        .map_or_else(|| caps.get(0).map_or(0, |m| m.end()), |m| m.end());

    Some(Header {
        name: name.to_string(),
        params: params.to_string(),
        line: idx,
        search_from,
    })
}

/// Brace depth at the start of every line.
fn line_depths(lines: &[String]) -> Vec<usize> {
    let mut depths = Vec::with_capacity(lines.len());
    let mut depth = 0usize;
    for line in lines {
        depths.push(depth);
        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }
    depths
}

/// Locate the body that follows `header`.
///
/// Returns the line holding the matching closing brace and the depth inside
/// the body, or `None` when a `;` or `}` shows up before any `{`. An
/// unterminated body runs to the last line.
fn find_body(lines: &[String], depths: &[usize], header: &Header) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut body_depth = None;

    for (idx, line) in lines.iter().enumerate().skip(header.line) {
        if body_depth.is_none() && idx > header.line + MAX_HEADER_LINES {
            return None;
        }
        let text = if idx == header.line {
            line.get(header.search_from..).unwrap_or("")
        } else {
            line.as_str()
        };

        for ch in text.chars() {
            match ch {
                '{' => {
                    if body_depth.is_none() {
                        body_depth = Some(depths[header.line] + 1);
                    }
                    depth += 1;
                }
                '}' => {
                    if body_depth.is_none() {
                        return None;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return body_depth.map(|d| (idx, d));
                    }
                }
                ';' if body_depth.is_none() => return None,
                _ => {}
            }
        }
    }

    body_depth.map(|d| (lines.len().saturating_sub(1), d))
}

/// Derive parameter names from the text between a header's parentheses.
fn parameter_names(language: Language, params: &str) -> Vec<String> {
    split_top_level(params)
        .into_iter()
        .filter_map(|raw| {
            let raw = raw.split('=').next().unwrap_or("").trim();
            if raw.is_empty() {
                return None;
            }
            match language {
                Language::JavaScript => {
                    let name = raw.split(':').next().unwrap_or("").trim();
                    let name = name.trim_end_matches('?');
                    (!name.is_empty()).then(|| name.to_string())
                }
                _ => {
                    if raw == "void" || raw == "..." {
                        return None;
                    }
                    IDENTIFIER
                        .find_iter(raw)
                        .last()
                        .map(|m| m.as_str().to_string())
                }
            }
        })
        .collect()
}

/// Split on commas that are not nested inside `<>`, `()`, `[]` or `{}`.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, filename: &str) -> StructuralSummary {
        extract(&SourceUnit::new(text, filename, None).unwrap())
    }

    #[test]
    fn test_javascript_functions_and_class() {
        let source = r#"function add(a, b = 2) {
    return a + b;
}

const greet = (name) => {
    console.log("hi {" + name);
};

const double = x => x * 2;

class Counter {
    constructor(start) {
        this.value = start;
    }

    increment(step) {
        if (step > 0) {
            this.value += step;
        }
    }
}
"#;
        let s = run(source, "a.js");
        let names: Vec<&str> = s.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["add", "greet", "constructor", "increment"]);
        assert_eq!(s.functions[0].parameters, vec!["a", "b"]);
        assert_eq!((s.functions[0].line_start, s.functions[0].line_end), (1, 3));
        assert_eq!((s.functions[1].line_start, s.functions[1].line_end), (5, 7));

        assert_eq!(s.classes.len(), 1);
        let class = &s.classes[0];
        assert_eq!(class.name, "Counter");
        assert_eq!((class.line_start, class.line_end), (11, 21));
        let methods: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["constructor", "increment"]);
        assert_eq!(s.complexity, 2);
    }

    #[test]
    fn test_java_methods_skip_abstract() {
        let source = r#"public class Shape {
    private int sides;

    public Shape(int sides) {
        this.sides = sides;
    }

    public abstract double area();

    public static int count(List<String> names, int limit) throws IOException {
        for (String n : names) {
            if (n.isEmpty()) {
                continue;
            }
        }
        return limit;
    }
}
"#;
        let s = run(source, "Shape.java");
        let names: Vec<&str> = s.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Shape", "count"]);
        assert_eq!(s.functions[1].parameters, vec!["names", "limit"]);
        assert_eq!(s.classes[0].methods.len(), 2);
        assert_eq!(s.complexity, 3);
    }

    #[test]
    fn test_cpp_skips_prototypes() {
        let source = r#"#include <string>

int helper(int x);

class Box {
public:
    int width() const {
        return w;
    }
private:
    int w;
};

int helper(int x) {
    // if this were real
    return x > 0 ? x : -x;
}

void Box::reset(const std::string& name, int* out) {
    while (true) {
        break;
    }
}
"#;
        let s = run(source, "a.cpp");
        let names: Vec<&str> = s.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["width", "helper", "Box::reset"]);
        assert_eq!(s.functions[2].parameters, vec!["name", "out"]);
        assert_eq!(s.classes[0].methods.len(), 1);
        // the commented `if` does not count
        assert_eq!(s.complexity, 2);
    }

    #[test]
    fn test_braces_in_strings_ignored() {
        let source = "function f() {\n  return \"}\";\n}\n";
        let s = run(source, "a.js");
        assert_eq!(s.functions[0].line_end, 3);
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("Map<K, V> m, int x"),
            vec!["Map<K, V> m", " int x"]
        );
    }
}
