//! Line-local automatic fixes.
//!
//! A fix rewrites exactly one line and never changes the number of lines.
//! When the rewrite would be ambiguous (more than one candidate on the
//! line, the match sits in a string, a needed import is missing) the fix is
//! skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::rules::DEFAULT_RULES;
use super::Issue;
use crate::analysis::SourceUnit;
use crate::language::Language;
use crate::lexical::is_inside_string_literal;

/// The rewrites codedoc knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    /// `except:` becomes `except Exception:`.
    BareExcept,
    /// `is` / `is not` against a literal becomes `==` / `!=`.
    LiteralIdentity,
    /// `eval(` becomes `ast.literal_eval(` when `ast` is already imported.
    LiteralEval,
}

static BARE_EXCEPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<indent>\s*)except\s*:").unwrap());

static LITERAL_IDENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\bis(?P<not>\s+not)?\s+(?P<lit>-?\d+(?:\.\d+)?|"[^"]*"|'[^']*'|\(\s*\)|\[\s*\]|\{\s*\})"#,
    )
    .unwrap()
});

static EVAL_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\beval\s*\(").unwrap());

static IMPORT_AST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^import\s+ast\s*$").unwrap());

static FROM_AST_LITERAL_EVAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^from\s+ast\s+import\s+[^\n]*\bliteral_eval\b").unwrap());

/// An issue whose fix could not be applied, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFix {
    pub issue: Issue,
    pub reason: String,
}

/// Result of applying every applicable fix to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixOutcome {
    pub fixed_source: String,
    pub applied: Vec<Issue>,
    pub skipped: Vec<SkippedFix>,
}

/// The fix registered for an issue's rule in `language`, if any.
pub fn fix_for(language: Language, issue: &Issue) -> Option<Fix> {
    DEFAULT_RULES
        .for_language(language)
        .find(&issue.rule)
        .and_then(|rule| rule.fix)
}

/// Apply the fix for a single issue, returning the rewritten source.
///
/// Returns `None` when the issue's rule has no fix or the fix is ambiguous.
pub fn fix_issue(source: &SourceUnit, issue: &Issue) -> Option<String> {
    let fix = fix_for(source.language(), issue)?;
    fix_text(source.text(), fix, issue.line).ok()
}

/// Apply every applicable fix, in line order.
pub fn apply_fixes(source: &SourceUnit, issues: &[Issue]) -> FixOutcome {
    let mut ordered: Vec<&Issue> = issues.iter().collect();
    ordered.sort_by_key(|i| i.line);

    let mut text = source.text().to_string();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for issue in ordered {
        let Some(fix) = fix_for(source.language(), issue) else {
            continue;
        };
        match fix_text(&text, fix, issue.line) {
            Ok(fixed) => {
                text = fixed;
                applied.push(issue.clone());
            }
            Err(reason) => skipped.push(SkippedFix {
                issue: issue.clone(),
                reason: reason.to_string(),
            }),
        }
    }

    FixOutcome {
        fixed_source: text,
        applied,
        skipped,
    }
}

fn fix_text(text: &str, fix: Fix, line: usize) -> Result<String, &'static str> {
    if line == 0 {
        return Err("issue does not point at a line");
    }

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let idx = line - 1;
    let raw = *lines.get(idx).ok_or("line is past the end of the source")?;

    let body_len = raw.trim_end_matches(['\n', '\r']).len();
    let (body, ending) = raw.split_at(body_len);

    let fixed_body = match fix {
        Fix::BareExcept => fix_bare_except(body)?,
        Fix::LiteralIdentity => fix_literal_identity(body)?,
        Fix::LiteralEval => fix_literal_eval(body, text)?,
    };

    let mut out = String::with_capacity(text.len() + 16);
    for (i, l) in lines.iter().enumerate() {
        if i == idx {
            out.push_str(&fixed_body);
            out.push_str(ending);
        } else {
            out.push_str(l);
        }
    }
    Ok(out)
}

fn fix_bare_except(line: &str) -> Result<String, &'static str> {
    if !BARE_EXCEPT.is_match(line) {
        return Err("no bare except on this line");
    }
    Ok(BARE_EXCEPT
        .replace(line, "${indent}except Exception:")
        .into_owned())
}

fn fix_literal_identity(line: &str) -> Result<String, &'static str> {
    let candidates: Vec<_> = LITERAL_IDENTITY
        .captures_iter(line)
        .filter(|c| c.get(0).map_or(false, |m| !is_inside_string_literal(line, m.start())))
        .collect();

    let caps = match candidates.as_slice() {
        [] => return Err("no literal identity comparison on this line"),
        [only] => only,
        _ => return Err("more than one identity comparison on this line"),
    };

    let whole = caps.get(0).ok_or("no literal identity comparison on this line")?;
    let op = if caps.name("not").is_some() { "!=" } else { "==" };
    let literal = &caps["lit"];

    Ok(format!(
        "{}{} {}{}",
        &line[..whole.start()],
        op,
        literal,
        &line[whole.end()..]
    ))
}

fn fix_literal_eval(line: &str, text: &str) -> Result<String, &'static str> {
    let replacement = if IMPORT_AST.is_match(text) {
        "ast.literal_eval("
    } else if FROM_AST_LITERAL_EVAL.is_match(text) {
        "literal_eval("
    } else {
        return Err("ast.literal_eval is not imported");
    };

    let calls: Vec<_> = EVAL_CALL
        .find_iter(line)
        .filter(|m| !is_inside_string_literal(line, m.start()))
        .collect();

    let call = match calls.as_slice() {
        [] => return Err("no eval() call on this line"),
        [only] => *only,
        _ => return Err("more than one eval() call on this line"),
    };

    if line[..call.start()].ends_with('.') {
        return Err("eval is a method call");
    }

    Ok(format!(
        "{}{}{}",
        &line[..call.start()],
        replacement,
        &line[call.end()..]
    ))
}
