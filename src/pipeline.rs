//! The per-unit analysis pipeline.
//!
//! detect → extract → score → aggregate, plus an optional summary.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::{self, ClassInfo, FunctionInfo, ParsedSource, SourceUnit, StructuralSummary};
use crate::config::Config;
use crate::detect::{CommandLinter, Detector, DetectorOptions, Issue, Linter, RuleSet, DEFAULT_RULES};
use crate::language::Language;
use crate::score::{self, ScoreBreakdown};
use crate::summarize::{HttpSummarizer, Summarizer, SUMMARY_UNAVAILABLE};

/// Everything known about one analyzed source unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub language: Language,
    pub filename: String,
    pub line_count: usize,
    pub complexity: u32,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub issues: Vec<Issue>,
    /// 0-100, one decimal place.
    pub quality_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AnalysisResult {
    pub fn errors(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warnings(&self) -> usize {
        self.issues.len() - self.errors()
    }
}

/// Assemble an [`AnalysisResult`] from the pieces.
pub fn aggregate(
    source: &SourceUnit,
    summary: StructuralSummary,
    issues: Vec<Issue>,
    quality_score: f64,
) -> AnalysisResult {
    AnalysisResult {
        language: source.language(),
        filename: source.filename().to_string(),
        line_count: summary.line_count,
        complexity: summary.complexity,
        functions: summary.functions,
        classes: summary.classes,
        issues,
        quality_score,
        summary: None,
    }
}

/// Runs the pipeline with one configuration.
///
/// Holds only read-only state and can be shared across threads.
pub struct Analyzer {
    config: Config,
    /// Built-in rules plus configured custom rules, when there are any.
    custom_rules: Option<Arc<RuleSet>>,
    linter: Option<Arc<dyn Linter>>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl Analyzer {
    /// Create an analyzer. Configured custom rules are compiled here, and a
    /// linter is attached when `linter.command` is set.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let custom_rules = if config.custom_rules.is_empty() {
            None
        } else {
            Some(Arc::new(RuleSet::builtin().with_custom(&config.custom_rules)?))
        };
        let linter = CommandLinter::from_config(&config.linter)
            .map(|l| Arc::new(l) as Arc<dyn Linter>);

        Ok(Self {
            config,
            custom_rules,
            linter,
            summarizer: None,
        })
    }

    /// Create an analyzer whose summarizer is the configured HTTP endpoint,
    /// if `summarizer.enabled` is set.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let summarizer = if config.summarizer.enabled {
            Some(Arc::new(HttpSummarizer::new(&config.summarizer)?) as Arc<dyn Summarizer>)
        } else {
            None
        };
        let analyzer = Self::new(config)?;
        Ok(match summarizer {
            Some(s) => analyzer.with_summarizer(s),
            None => analyzer,
        })
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_linter(mut self, linter: Arc<dyn Linter>) -> Self {
        self.linter = Some(linter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        self.custom_rules.as_deref().unwrap_or(&DEFAULT_RULES)
    }

    pub fn has_summarizer(&self) -> bool {
        self.summarizer.is_some()
    }

    fn detector(&self) -> Detector<'_> {
        let options = DetectorOptions {
            max_line_length: self.config.style.max_line_length,
            complexity_threshold: self.config.scoring.complexity_threshold,
        };
        let detector = Detector::new(self.rules(), options);
        match &self.linter {
            Some(linter) => detector.with_linter(linter.as_ref()),
            None => detector,
        }
    }

    /// Run the pipeline on one unit, without a summary.
    pub fn analyze(&self, unit: &SourceUnit) -> AnalysisResult {
        let parsed = ParsedSource::parse(unit);

        let issues = self.detector().detect_parsed(&parsed);
        debug!(filename = unit.filename(), issues = issues.len(), "detect stage done");

        let structure = analysis::extract_parsed(&parsed);
        debug!(
            filename = unit.filename(),
            functions = structure.functions.len(),
            classes = structure.classes.len(),
            complexity = structure.complexity,
            "extract stage done"
        );

        let quality_score = score::score(structure.complexity, &issues, &self.config.scoring);
        debug!(filename = unit.filename(), quality_score, "score stage done");

        aggregate(unit, structure, issues, quality_score)
    }

    /// Score breakdown for an existing result.
    pub fn breakdown(&self, result: &AnalysisResult) -> ScoreBreakdown {
        score::breakdown(result.complexity, &result.issues, &self.config.scoring)
    }

    /// Run the pipeline and attach a summary.
    ///
    /// Without a summarizer, or when it fails, the summary is the
    /// unavailable sentinel.
    pub async fn analyze_with_summary(&self, unit: &SourceUnit) -> AnalysisResult {
        let mut result = self.analyze(unit);
        result.summary = Some(self.summarize(unit).await);
        result
    }

    /// Request a summary of `unit`, falling back to the sentinel.
    pub async fn summarize(&self, unit: &SourceUnit) -> String {
        let Some(summarizer) = &self.summarizer else {
            return SUMMARY_UNAVAILABLE.to_string();
        };

        let config = &self.config.summarizer;
        let timeout = Duration::from_millis(config.timeout_ms);
        match tokio::time::timeout(timeout, summarizer.summarize(unit.text(), config.max_length))
            .await
        {
            Ok(Ok(summary)) => summary,
            Ok(Err(err)) => {
                warn!(filename = unit.filename(), error = %err, "summary generation failed");
                SUMMARY_UNAVAILABLE.to_string()
            }
            Err(_) => {
                warn!(filename = unit.filename(), timeout_ms = config.timeout_ms, "summary generation timed out");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}
