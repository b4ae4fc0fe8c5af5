//! Pattern rule tables.
//!
//! Each language has four ordered lists of regex rules (security,
//! performance, logic, style). The built-in tables are compiled once into
//! [`DEFAULT_RULES`] and shared read-only; configuration can extend a copy
//! with [`RuleSet::with_custom`].

use once_cell::sync::Lazy;
use regex::Regex;

use super::fix::Fix;
use super::{Category, Severity};
use crate::config::CustomRule;
use crate::language::Language;

/// Built-in rules, compiled on first use.
pub static DEFAULT_RULES: Lazy<RuleSet> = Lazy::new(RuleSet::builtin);

/// Literals that must not be compared by identity.
const PY_LITERAL: &str = r#"(?P<lit>-?\d+(?:\.\d+)?|"[^"]*"|'[^']*'|\(\s*\)|\[\s*\]|\{\s*\})"#;

/// Ids of the issues the detector raises without a pattern rule.
pub const STRUCTURAL_RULE_IDS: &[&str] = &[
    "syntax-error",
    "line-too-long",
    "trailing-whitespace",
    "blank-line-before-definition",
    "high-complexity",
    "unused-variable",
];

/// Prefix of issues reported by the external linter.
pub const LINT_RULE_PREFIX: &str = "lint:";

/// A single regex rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub id: String,
    pub regex: Regex,
    pub category: Category,
    pub severity: Severity,
    /// Message template; `$name` expands to the named capture.
    pub message: String,
    pub suggestion: Option<String>,
    pub fix: Option<Fix>,
    /// Only report matches on lines inside a loop body.
    pub loop_only: bool,
}

impl PatternRule {
    fn new(id: &str, pattern: &str, category: Category, message: &str) -> Self {
        let severity = match category {
            Category::Security => Severity::Error,
            _ => Severity::Warning,
        };
        Self {
            id: id.to_string(),
            regex: Regex::new(pattern).unwrap(),
            category,
            severity,
            message: message.to_string(),
            suggestion: None,
            fix: None,
            loop_only: false,
        }
    }

    fn suggest(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    fn fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    fn in_loops(mut self) -> Self {
        self.loop_only = true;
        self
    }

    /// Render the message for one match.
    pub fn render_message(&self, caps: &regex::Captures) -> String {
        let mut out = String::new();
        caps.expand(&self.message, &mut out);
        out
    }
}

/// Rules for one language, grouped by category.
#[derive(Debug, Clone, Default)]
pub struct LanguageRules {
    pub security: Vec<PatternRule>,
    pub performance: Vec<PatternRule>,
    pub logic: Vec<PatternRule>,
    pub style: Vec<PatternRule>,
}

impl LanguageRules {
    /// All rules, security first, then performance, logic and style.
    pub fn iter(&self) -> impl Iterator<Item = &PatternRule> {
        self.security
            .iter()
            .chain(&self.performance)
            .chain(&self.logic)
            .chain(&self.style)
    }

    pub fn find(&self, id: &str) -> Option<&PatternRule> {
        self.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.security.len() + self.performance.len() + self.logic.len() + self.style.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, rule: PatternRule) {
        match rule.category {
            Category::Security => self.security.push(rule),
            Category::Performance => self.performance.push(rule),
            Category::Logic | Category::Complexity => self.logic.push(rule),
            Category::Style => self.style.push(rule),
        }
    }
}

/// Rule tables for every supported language.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub python: LanguageRules,
    pub javascript: LanguageRules,
    pub java: LanguageRules,
    pub cpp: LanguageRules,
}

impl RuleSet {
    pub fn for_language(&self, language: Language) -> &LanguageRules {
        match language {
            Language::Python => &self.python,
            Language::JavaScript => &self.javascript,
            Language::Java => &self.java,
            Language::Cpp => &self.cpp,
        }
    }

    fn for_language_mut(&mut self, language: Language) -> &mut LanguageRules {
        match language {
            Language::Python => &mut self.python,
            Language::JavaScript => &mut self.javascript,
            Language::Java => &mut self.java,
            Language::Cpp => &mut self.cpp,
        }
    }

    /// Append user rules to this set.
    pub fn with_custom(mut self, rules: &[CustomRule]) -> anyhow::Result<Self> {
        for custom in rules {
            let language = Language::parse(&custom.language).ok_or_else(|| {
                anyhow::anyhow!("custom rule {:?}: unknown language {:?}", custom.id, custom.language)
            })?;
            let regex = Regex::new(&custom.pattern)
                .map_err(|e| anyhow::anyhow!("compiling pattern {:?}: {}", custom.pattern, e))?;
            self.for_language_mut(language).push(PatternRule {
                id: custom.id.clone(),
                regex,
                category: custom.category,
                severity: custom.severity,
                // `$` in a user message is literal text, not a capture reference.
                message: custom.message.replace('$', "$$"),
                suggestion: custom.suggestion.clone(),
                fix: None,
                loop_only: false,
            });
        }
        Ok(self)
    }

    /// Whether `id` names a built-in pattern rule in any language.
    pub fn has_rule_id(&self, id: &str) -> bool {
        Language::all()
            .into_iter()
            .any(|language| self.for_language(language).find(id).is_some())
    }

    /// The built-in tables.
    pub fn builtin() -> Self {
        Self {
            python: python_rules(),
            javascript: javascript_rules(),
            java: java_rules(),
            cpp: cpp_rules(),
        }
    }
}

fn python_rules() -> LanguageRules {
    use Category::*;
    LanguageRules {
        security: vec![
            PatternRule::new("eval-call", r"(?:^|[^.\w])eval\s*\(", Security, "Use of eval() can execute arbitrary code")
                .suggest("Use ast.literal_eval() for literals, or parse the input explicitly")
                .fix(Fix::LiteralEval),
            PatternRule::new("exec-call", r"(?:^|[^.\w])exec\s*\(", Security, "Use of exec() can execute arbitrary code")
                .suggest("Call the intended functions directly instead of executing strings"),
            PatternRule::new("os-system", r"\bos\.system\s*\(", Security, "os.system() runs a shell command")
                .suggest("Use subprocess.run() with a list of arguments"),
            PatternRule::new(
                "subprocess-shell",
                r"\bsubprocess\.(?P<func>\w+)\s*\(.*\bshell\s*=\s*True\b",
                Security,
                "subprocess.$func() called with shell=True",
            )
            .suggest("Pass the command as a list and leave shell=False"),
            PatternRule::new("pickle-load", r"\b(?:c?pickle)\.(?P<func>loads?)\s*\(", Security, "pickle.$func() can execute arbitrary code")
                .suggest("Use json or another data-only format for untrusted input"),
        ],
        performance: vec![
            PatternRule::new(
                "string-concat-in-loop",
                r#"\b(?P<var>\w+)\s*\+=\s*[rbfuRBFU]{0,2}["']"#,
                Performance,
                "String concatenation to '$var' inside a loop",
            )
            .suggest("Collect the parts in a list and use ''.join()")
            .in_loops(),
            PatternRule::new(
                "membership-in-loop",
                r"\bif\s+[\w.\[\]]+\s+(?:not\s+)?in\s+(?P<coll>\w+)\s*:",
                Performance,
                "Membership test against '$coll' inside a loop",
            )
            .suggest("Build a set once before the loop if the collection is a list")
            .in_loops(),
            PatternRule::new(
                "list-range-loop",
                r"\bfor\s+.+\s+in\s+list\s*\(\s*range\s*\(",
                Performance,
                "list(range(...)) builds a list only to iterate over it",
            )
            .suggest("Iterate over range(...) directly"),
            PatternRule::new(
                "range-len",
                r"\brange\s*\(\s*len\s*\(",
                Performance,
                "range(len(...)) used for iteration",
            )
            .suggest("Use enumerate() to get index and item together"),
        ],
        logic: vec![
            PatternRule::new("bare-except", r"^\s*except\s*:", Logic, "Bare except clause catches every exception")
                .suggest("Catch a specific exception type, e.g. except Exception:")
                .fix(Fix::BareExcept),
            PatternRule::new(
                "literal-identity",
                &format!(r"\bis\s+(?:not\s+)?{}", PY_LITERAL),
                Logic,
                "Identity comparison with literal $lit",
            )
            .suggest("Use == or != to compare values")
            .fix(Fix::LiteralIdentity),
            PatternRule::new("wildcard-import", r"^\s*from\s+[\w.]+\s+import\s+\*", Logic, "Wildcard import")
                .suggest("Import the names you use explicitly"),
        ],
        style: vec![
            PatternRule::new(
                "bool-comparison",
                r"(?P<op>==|!=)\s*(?P<lit>True|False)\b",
                Style,
                "Comparison '$op $lit' to a boolean literal",
            )
            .suggest("Test the value directly: if x: / if not x:"),
            PatternRule::new(
                "len-comparison",
                r"\blen\s*\([^)]*\)\s*(?:==|!=|>)\s*0\b",
                Style,
                "Comparing len() to 0",
            )
            .suggest("Use the container's truthiness: if items: / if not items:"),
        ],
    }
}

fn javascript_rules() -> LanguageRules {
    use Category::*;
    LanguageRules {
        security: vec![
            PatternRule::new("eval-call", r"(?:^|[^.\w$])eval\s*\(", Security, "Use of eval() can execute arbitrary code")
                .suggest("Use JSON.parse() for data, or explicit parsing"),
            PatternRule::new("inner-html", r"\.(?P<prop>innerHTML|outerHTML)\s*=(?:[^=]|$)", Security, "Assignment to $prop can inject markup")
                .suggest("Use textContent or build nodes with createElement()"),
            PatternRule::new("document-write", r"\bdocument\.write(?:ln)?\s*\(", Security, "document.write() can inject markup")
                .suggest("Insert nodes with appendChild()"),
            PatternRule::new(
                "string-timer",
                r#"\b(?P<func>setTimeout|setInterval)\s*\(\s*["']"#,
                Security,
                "$func() called with a string evaluates code",
            )
            .suggest("Pass a function instead of a string"),
            PatternRule::new("new-function", r"\bnew\s+Function\s*\(", Security, "new Function() evaluates code from a string")
                .suggest("Define the function directly"),
        ],
        performance: vec![
            PatternRule::new(
                "string-concat-in-loop",
                r#"\b(?P<var>[\w$.]+)\s*\+=\s*["']"#,
                Performance,
                "String concatenation to '$var' inside a loop",
            )
            .suggest("Collect the parts in an array and join() once")
            .in_loops(),
            PatternRule::new(
                "linear-search-in-loop",
                r"\.(?P<method>indexOf|includes)\s*\(",
                Performance,
                "Linear search with $method() inside a loop",
            )
            .suggest("Use a Set or Map for repeated lookups")
            .in_loops(),
        ],
        logic: vec![
            PatternRule::new(
                "assignment-in-condition",
                r"\bif\s*\(\s*[\w$.\[\]]+\s*=(?:[^=>]|$)",
                Logic,
                "Assignment inside an if condition",
            )
            .suggest("Use === to compare, or move the assignment out of the condition"),
            PatternRule::new("empty-catch", r"\bcatch\s*(?:\([^)]*\))?\s*\{\s*\}", Logic, "Empty catch block swallows errors")
                .suggest("Handle or log the error"),
            PatternRule::new("console-log", r"\bconsole\.log\s*\(", Logic, "console.log() left in code")
                .suggest("Remove it or use a proper logger"),
            PatternRule::new("alert-call", r"(?:^|[^.\w$])alert\s*\(", Logic, "alert() left in code")
                .suggest("Use an in-page notification"),
        ],
        style: vec![
            PatternRule::new("var-declaration", r"\bvar\s+[A-Za-z_$]", Style, "var declaration")
                .suggest("Use let or const"),
            PatternRule::new(
                "loose-equality",
                r"(?:^|[^=!<>])(?P<op>[=!]=)(?:[^=]|$)",
                Style,
                "Loose comparison '$op'",
            )
            .suggest("Use === or !== for strict comparison"),
        ],
    }
}

fn java_rules() -> LanguageRules {
    use Category::*;
    LanguageRules {
        security: vec![
            PatternRule::new(
                "runtime-exec",
                r"\bRuntime\.getRuntime\s*\(\s*\)\s*\.exec\s*\(",
                Security,
                "Runtime.exec() runs an external command",
            )
            .suggest("Use ProcessBuilder with a fixed argument list"),
            PatternRule::new(
                "sql-concatenation",
                r#"\.(?P<method>executeQuery|executeUpdate|execute|prepareStatement)\s*\(\s*"[^"]*"\s*\+"#,
                Security,
                "SQL passed to $method() is built by concatenation",
            )
            .suggest("Use a PreparedStatement with bound parameters"),
        ],
        performance: vec![
            PatternRule::new(
                "string-concat-in-loop",
                r#"\b(?P<var>\w+)\s*\+=\s*""#,
                Performance,
                "String concatenation to '$var' inside a loop",
            )
            .suggest("Use a StringBuilder")
            .in_loops(),
            PatternRule::new(
                "linear-search-in-loop",
                r"\.(?P<method>indexOf|contains)\s*\(",
                Performance,
                "Linear search with $method() inside a loop",
            )
            .suggest("Use a HashSet or HashMap for repeated lookups")
            .in_loops(),
        ],
        logic: vec![
            PatternRule::new(
                "assignment-in-condition",
                r"\bif\s*\(\s*[\w.\[\]]+\s*=(?:[^=]|$)",
                Logic,
                "Assignment inside an if condition",
            )
            .suggest("Use == to compare"),
            PatternRule::new("empty-catch", r"\bcatch\s*\([^)]*\)\s*\{\s*\}", Logic, "Empty catch block swallows exceptions")
                .suggest("Handle or log the exception"),
            PatternRule::new(
                "system-out",
                r"\bSystem\.(?P<stream>out|err)\.print(?:ln|f)?\s*\(",
                Logic,
                "System.$stream output left in code",
            )
            .suggest("Use a logger"),
            PatternRule::new("string-identity", r#"(?:==|!=)\s*""#, Logic, "String compared by reference")
                .suggest("Use equals() to compare strings"),
            PatternRule::new("wildcard-import", r"^\s*import\s+(?:static\s+)?[\w.]+\.\*\s*;", Logic, "Wildcard import")
                .suggest("Import the classes you use explicitly"),
        ],
        style: vec![PatternRule::new(
            "print-stack-trace",
            r"\.printStackTrace\s*\(\s*\)",
            Style,
            "printStackTrace() writes to stderr",
        )
        .suggest("Log the exception instead")],
    }
}

fn cpp_rules() -> LanguageRules {
    use Category::*;
    LanguageRules {
        security: vec![
            PatternRule::new("system-call", r"(?:^|[^\w.>:])(?:std::)?system\s*\(", Security, "system() runs a shell command")
                .suggest("Use a process API that takes an argument vector"),
            PatternRule::new("gets-call", r"\bgets\s*\(", Security, "gets() cannot limit input length")
                .suggest("Use fgets() or std::getline()"),
            PatternRule::new(
                "unbounded-copy",
                r"\b(?P<func>strcpy|strcat)\s*\(",
                Security,
                "$func() does not check buffer bounds",
            )
            .suggest("Use std::string, or strncpy/strncat with explicit sizes"),
            PatternRule::new("sprintf-call", r"\b(?P<func>v?sprintf)\s*\(", Security, "$func() does not check buffer bounds")
                .suggest("Use snprintf() or std::format"),
        ],
        performance: vec![
            PatternRule::new(
                "string-concat-in-loop",
                r#"\b(?P<var>\w+)\s*\+=\s*""#,
                Performance,
                "String concatenation to '$var' inside a loop",
            )
            .suggest("Reserve capacity or use std::ostringstream")
            .in_loops(),
            PatternRule::new("linear-search-in-loop", r"\bstd::find\s*\(", Performance, "Linear search with std::find() inside a loop")
                .suggest("Use std::unordered_set or a sorted container")
                .in_loops(),
            PatternRule::new("endl-in-loop", r"\bstd::endl\b", Performance, "std::endl flushes the stream on every iteration")
                .suggest("Write '\\n' and flush once")
                .in_loops(),
        ],
        logic: vec![
            PatternRule::new(
                "assignment-in-condition",
                r"\bif\s*\(\s*[\w.\[\]]+(?:->[\w.\[\]]+)*\s*=(?:[^=]|$)",
                Logic,
                "Assignment inside an if condition",
            )
            .suggest("Use == to compare, or move the assignment out of the condition"),
            PatternRule::new("empty-catch", r"\bcatch\s*\([^)]*\)\s*\{\s*\}", Logic, "Empty catch block swallows exceptions")
                .suggest("Handle or log the exception"),
        ],
        style: vec![
            PatternRule::new("using-namespace-std", r"^\s*using\s+namespace\s+std\s*;", Style, "using namespace std pollutes the global namespace")
                .suggest("Qualify names with std:: or import specific names"),
            PatternRule::new("null-macro", r"\bNULL\b", Style, "NULL used as a null pointer")
                .suggest("Use nullptr"),
        ],
    }
}
