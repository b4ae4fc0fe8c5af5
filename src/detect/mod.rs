//! Issue detection for source units.
//!
//! Regex rule tables per language, a few structural style checks, python
//! tree checks (syntax validity, unused locals, per-function complexity),
//! an optional external linter, and line-local auto-fixes.

mod detector;
mod fix;
mod lint;
mod rules;
mod types;
mod unused;

pub use detector::{Detector, DetectorOptions};
pub use fix::{apply_fixes, fix_for, fix_issue, Fix, FixOutcome, SkippedFix};
pub use lint::{parse_findings, CommandLinter, LintFinding, Linter};
pub use rules::{
    LanguageRules, PatternRule, RuleSet, DEFAULT_RULES, LINT_RULE_PREFIX, STRUCTURAL_RULE_IDS,
};
pub use types::{Category, Issue, Severity};
pub use unused::detect_unused_variables;
