//! Scoring and grading.
//!
//! Calculates a quality score (0-100, higher is better) from the issue list
//! and the unit's complexity.

use serde::{Deserialize, Serialize};

use crate::detect::{Issue, Severity};

pub use crate::config::ScoringConfig;

/// Grade thresholds (minimum score for each grade).
pub mod grades {
    pub const A_MIN: f64 = 90.0;
    pub const B_MIN: f64 = 80.0;
    pub const C_MIN: f64 = 70.0;
    pub const D_MIN: f64 = 60.0;
}

/// The calculated score with the numbers behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Score from 0-100, one decimal place.
    pub score: f64,
    /// Letter grade: "A" (90+), "B" (80+), "C" (70+), "D" (60+), "F"
    pub grade: String,
    pub errors: usize,
    pub warnings: usize,
    /// Points lost to issues, before flooring at zero.
    pub issue_penalty: f64,
    /// Points lost to complexity above the threshold.
    pub complexity_penalty: f64,
}

impl ScoreBreakdown {
    /// Whether the score meets `min_score` (always true without one).
    pub fn passes(&self, min_score: Option<f64>) -> bool {
        min_score.map_or(true, |min| self.score >= min)
    }
}

/// Determine the letter grade from a score.
pub fn grade(score: f64) -> &'static str {
    match score {
        s if s >= grades::A_MIN => "A",
        s if s >= grades::B_MIN => "B",
        s if s >= grades::C_MIN => "C",
        s if s >= grades::D_MIN => "D",
        _ => "F",
    }
}

/// Calculate the quality score.
///
/// Start at 100, subtract the per-issue penalties (floored at 0), then
/// subtract the complexity penalty (floored at 0), rounded to one decimal.
/// Depends only on how many issues of each severity there are, so the
/// order of `issues` does not matter.
pub fn score(complexity: u32, issues: &[Issue], config: &ScoringConfig) -> f64 {
    breakdown(complexity, issues, config).score
}

/// Calculate the score along with its breakdown.
pub fn breakdown(complexity: u32, issues: &[Issue], config: &ScoringConfig) -> ScoreBreakdown {
    let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
    let warnings = issues.iter().filter(|i| i.severity == Severity::Warning).count();

    let issue_penalty =
        errors as f64 * config.error_penalty + warnings as f64 * config.warning_penalty;
    let after_issues = (100.0 - issue_penalty).clamp(0.0, 100.0);

    let excess = complexity.saturating_sub(config.complexity_threshold);
    let complexity_penalty = excess as f64 * config.complexity_weight;

    let score = round1((after_issues - complexity_penalty).clamp(0.0, 100.0));

    ScoreBreakdown {
        score,
        grade: grade(score).to_string(),
        errors,
        warnings,
        issue_penalty,
        complexity_penalty,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Category;

    fn issue(severity: Severity) -> Issue {
        Issue::new("test", Category::Logic, severity, 1, "test")
    }

    #[test]
    fn test_clean_unit_scores_100() {
        assert_eq!(score(1, &[], &ScoringConfig::default()), 100.0);
    }

    #[test]
    fn test_penalties() {
        let issues = vec![issue(Severity::Error), issue(Severity::Warning)];
        assert_eq!(score(1, &issues, &ScoringConfig::default()), 87.0);
    }

    #[test]
    fn test_complexity_penalty() {
        // 15 - 10 = 5 over, 0.5 each
        assert_eq!(score(15, &[], &ScoringConfig::default()), 97.5);
        assert_eq!(score(10, &[], &ScoringConfig::default()), 100.0);
    }

    #[test]
    fn test_floors_at_zero() {
        let issues: Vec<Issue> = (0..15).map(|_| issue(Severity::Error)).collect();
        assert_eq!(score(40, &issues, &ScoringConfig::default()), 0.0);
    }

    #[test]
    fn test_order_independent() {
        let a = vec![issue(Severity::Error), issue(Severity::Warning), issue(Severity::Warning)];
        let mut b = a.clone();
        b.reverse();
        let config = ScoringConfig::default();
        assert_eq!(score(12, &a, &config), score(12, &b, &config));
    }

    #[test]
    fn test_more_errors_never_raise_score() {
        let config = ScoringConfig::default();
        let mut issues = Vec::new();
        let mut last = score(20, &issues, &config);
        for _ in 0..15 {
            issues.push(issue(Severity::Error));
            let next = score(20, &issues, &config);
            assert!(next <= last);
            last = next;
        }
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(grade(100.0), "A");
        assert_eq!(grade(90.0), "A");
        assert_eq!(grade(89.9), "B");
        assert_eq!(grade(80.0), "B");
        assert_eq!(grade(70.0), "C");
        assert_eq!(grade(60.0), "D");
        assert_eq!(grade(59.9), "F");
    }

    #[test]
    fn test_breakdown_counts() {
        let issues = vec![issue(Severity::Error), issue(Severity::Warning)];
        let b = breakdown(12, &issues, &ScoringConfig::default());
        assert_eq!(b.errors, 1);
        assert_eq!(b.warnings, 1);
        assert_eq!(b.issue_penalty, 13.0);
        assert_eq!(b.complexity_penalty, 1.0);
        assert_eq!(b.score, 86.0);
        assert_eq!(b.grade, "B");
        assert!(b.passes(Some(80.0)));
        assert!(!b.passes(Some(90.0)));
        assert!(b.passes(None));
    }

    #[test]
    fn test_score_never_exceeds_100() {
        let config = ScoringConfig {
            warning_penalty: -5.0,
            ..ScoringConfig::default()
        };
        let issues = vec![issue(Severity::Warning), issue(Severity::Warning)];
        assert_eq!(score(1, &issues, &config), 100.0);
    }
}
