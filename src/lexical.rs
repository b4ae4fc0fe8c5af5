//! Line-oriented lexical helpers shared by the heuristic extractor and the
//! pattern detector.
//!
//! Neither consumer has a real tokenizer, so these helpers answer the two
//! questions both need: which part of a line is code (not a comment, not the
//! inside of a multi-line string), and whether a byte offset falls inside a
//! single-line string literal.

use crate::language::Language;

/// Multi-line construct still open at the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Carry {
    None,
    BlockComment,
    TripleQuote(char),
    Template,
}

/// Produce one code view per source line.
///
/// Comments are dropped, multi-line strings (python triple quotes, JS
/// template literals) and block comments are blanked with spaces. Ordinary
/// single-line string literals are kept verbatim so rules can still match
/// things like `setTimeout("...")`.
pub fn code_lines(source: &str, language: Language) -> Vec<String> {
    let mut carry = Carry::None;
    source
        .lines()
        .map(|line| {
            let (code, next) = mask_line(line, language, carry);
            carry = next;
            code
        })
        .collect()
}

fn mask_line(line: &str, language: Language, carry: Carry) -> (String, Carry) {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut state = carry;
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        match state {
            Carry::BlockComment => {
                if c == '*' && chars.get(i + 1) == Some(&'/') {
                    out.push_str("  ");
                    i += 2;
                    state = Carry::None;
                } else {
                    out.push(' ');
                    i += 1;
                }
                continue;
            }
            Carry::TripleQuote(q) => {
                if c == '\\' {
                    out.push(' ');
                    i += 1;
                    if i < chars.len() {
                        out.push(' ');
                        i += 1;
                    }
                } else if c == q && chars.get(i + 1) == Some(&q) && chars.get(i + 2) == Some(&q) {
                    out.push_str("   ");
                    i += 3;
                    state = Carry::None;
                } else {
                    out.push(' ');
                    i += 1;
                }
                continue;
            }
            Carry::Template => {
                if c == '\\' {
                    out.push(' ');
                    i += 1;
                    if i < chars.len() {
                        out.push(' ');
                        i += 1;
                    }
                } else {
                    if c == '`' {
                        state = Carry::None;
                    }
                    out.push(' ');
                    i += 1;
                }
                continue;
            }
            Carry::None => {}
        }

        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 2;
                    continue;
                }
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        if language.uses_hash_comments() {
            if c == '#' {
                break;
            }
            if (c == '"' || c == '\'') && chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c)
            {
                state = Carry::TripleQuote(c);
                out.push_str("   ");
                i += 3;
                continue;
            }
        } else {
            if c == '/' && chars.get(i + 1) == Some(&'/') {
                break;
            }
            if c == '/' && chars.get(i + 1) == Some(&'*') {
                state = Carry::BlockComment;
                out.push_str("  ");
                i += 2;
                continue;
            }
            if c == '`' && language == Language::JavaScript {
                state = Carry::Template;
                out.push(' ');
                i += 1;
                continue;
            }
        }

        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        out.push(c);
        i += 1;
    }

    (out, state)
}

/// Replace every single-line string literal (quotes included) with spaces.
///
/// Used where string contents must not count, e.g. brace depth and keyword
/// counting.
pub fn strip_string_literals(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in code.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                out.push(' ');
            }
            None => {
                if c == '"' || c == '\'' || c == '`' {
                    quote = Some(c);
                    out.push(' ');
                } else {
                    out.push(c);
                }
            }
        }
    }

    out
}

/// Check if a byte position in a line falls within a string literal.
/// Supports double-quoted, single-quoted, and backtick strings with escape handling.
pub fn is_inside_string_literal(line: &str, pos: usize) -> bool {
    let mut in_string = false;
    let mut string_char = None;
    let mut escaped = false;

    for (i, ch) in line.char_indices() {
        if i >= pos {
            return in_string;
        }

        if escaped {
            escaped = false;
            continue;
        }

        if ch == '\\' && in_string {
            escaped = true;
            continue;
        }

        if ch == '"' || ch == '\'' || ch == '`' {
            if !in_string {
                in_string = true;
                string_char = Some(ch);
            } else if Some(ch) == string_char {
                in_string = false;
                string_char = None;
            }
        }
    }

    in_string
}

/// Width of the leading whitespace, counting a tab as four columns.
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Number of lines in `text`; a final unterminated line counts, empty text is 0.
pub fn count_lines(text: &str) -> usize {
    text.lines().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_comment_removed() {
        let lines = code_lines("x = 1  # eval(x)\n", Language::Python);
        assert_eq!(lines[0].trim_end(), "x = 1");
    }

    #[test]
    fn test_python_docstring_blanked_across_lines() {
        let src = "def f():\n    \"\"\"Calls eval(\n    on input.\"\"\"\n    return 1\n";
        let lines = code_lines(src, Language::Python);
        assert!(!lines[1].contains("eval"));
        assert!(!lines[2].contains("input"));
        assert_eq!(lines[3].trim(), "return 1");
    }

    #[test]
    fn test_c_like_block_comment() {
        let src = "int a; /* start\n still comment */ int b;\n";
        let lines = code_lines(src, Language::Cpp);
        assert_eq!(lines[0].trim(), "int a;");
        assert_eq!(lines[1].trim(), "int b;");
    }

    #[test]
    fn test_line_comment_inside_string_kept() {
        let lines = code_lines("let u = \"http://x\"; // note\n", Language::JavaScript);
        assert_eq!(lines[0].trim_end(), "let u = \"http://x\";");
    }

    #[test]
    fn test_strip_string_literals() {
        assert_eq!(strip_string_literals("f(\"{\", '}')"), "f(     ,    )");
    }

    #[test]
    fn test_is_inside_string_literal() {
        assert!(!is_inside_string_literal("hello world", 0));
        assert!(is_inside_string_literal(r#""hello world""#, 3));
        assert!(!is_inside_string_literal(r#""hello" world"#, 9));
        assert!(is_inside_string_literal(r#""hello \" world""#, 10));
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\n"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("a\n\nb\n"), 3);
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("    x"), 4);
        assert_eq!(indent_width("\tx"), 4);
        assert_eq!(indent_width("x"), 0);
    }
}
