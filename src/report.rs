//! Output formatting for analysis results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

use crate::batch::DirectoryReport;
use crate::detect::{Issue, Severity};
use crate::pipeline::AnalysisResult;
use crate::score::ScoreBreakdown;

/// Output format for the `analyze` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
    Sarif,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            _ => Err(format!(
                "invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
                s
            )),
        }
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report for a single file.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    pub passed: bool,
}

/// JSON report for a directory.
#[derive(Serialize, Deserialize)]
pub struct JsonDirectoryReport {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    pub passed: bool,
    #[serde(flatten)]
    pub report: DirectoryReport,
}

/// Write a single-file result as JSON.
pub fn write_json(
    out: &mut impl Write,
    result: &AnalysisResult,
    breakdown: &ScoreBreakdown,
    min_score: Option<f64>,
) -> anyhow::Result<()> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        analysis: result.clone(),
        grade: breakdown.grade.clone(),
        min_score,
        passed: breakdown.passes(min_score),
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

/// Write a directory report as JSON.
pub fn write_directory_json(
    out: &mut impl Write,
    report: &DirectoryReport,
    min_score: Option<f64>,
) -> anyhow::Result<()> {
    let json = JsonDirectoryReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        min_score,
        passed: directory_passes(report, min_score),
        report: report.clone(),
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
    Ok(())
}

/// Every successfully analyzed file meets `min_score`.
pub fn directory_passes(report: &DirectoryReport, min_score: Option<f64>) -> bool {
    match min_score {
        Some(min) => report.results().all(|r| r.quality_score >= min),
        None => true,
    }
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "codedoc";

#[derive(Serialize, Deserialize)]
struct SarifReport {
    version: String,
    #[serde(rename = "$schema")]
    schema: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
struct SarifDriver {
    name: String,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_config: SarifRuleConfig,
    properties: SarifRuleProperties,
}

#[derive(Serialize, Deserialize)]
struct SarifRuleConfig {
    level: String,
}

#[derive(Serialize, Deserialize)]
struct SarifRuleProperties {
    category: String,
}

#[derive(Serialize, Deserialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize, Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifact,
    region: SarifRegion,
}

#[derive(Serialize, Deserialize)]
struct SarifArtifact {
    uri: String,
}

#[derive(Serialize, Deserialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
}

fn map_severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}

/// `eval-call` -> `EvalCall`, `lint:E501` -> `LintE501`.
fn rule_name(rule_id: &str) -> String {
    rule_id
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn sarif_rule(issue: &Issue) -> SarifRule {
    SarifRule {
        id: issue.rule.clone(),
        name: rule_name(&issue.rule),
        short_description: SarifMessage {
            text: issue.message.clone(),
        },
        default_config: SarifRuleConfig {
            level: map_severity_to_level(issue.severity).to_string(),
        },
        properties: SarifRuleProperties {
            category: issue.category.to_string(),
        },
    }
}

fn sarif_report(results: &[&AnalysisResult]) -> SarifReport {
    // First occurrence of each rule describes it; BTreeMap keeps the order stable.
    let mut rules: BTreeMap<&str, SarifRule> = BTreeMap::new();
    let mut sarif_results = Vec::new();

    for result in results {
        for issue in &result.issues {
            rules
                .entry(issue.rule.as_str())
                .or_insert_with(|| sarif_rule(issue));

            sarif_results.push(SarifResult {
                rule_id: issue.rule.clone(),
                level: map_severity_to_level(issue.severity).to_string(),
                message: SarifMessage {
                    text: issue.message.clone(),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifact {
                            uri: result.filename.replace('\\', "/"),
                        },
                        region: SarifRegion {
                            start_line: if issue.line > 0 { issue.line } else { 1 },
                        },
                    },
                }],
            });
        }
    }

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules: rules.into_values().collect(),
                },
            },
            results: sarif_results,
        }],
    }
}

/// Write results in SARIF format.
pub fn write_sarif(out: &mut impl Write, results: &[&AnalysisResult]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&sarif_report(results))?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write a single-file result in pretty (human-readable) format.
pub fn write_pretty(
    out: &mut impl Write,
    result: &AnalysisResult,
    breakdown: &ScoreBreakdown,
    min_score: Option<f64>,
) -> anyhow::Result<()> {
    write_header(out, &result.filename)?;

    writeln!(
        out,
        "  {}{}   {}{}   {}{}",
        "Language: ".dimmed(),
        result.language.display_name(),
        "Lines: ".dimmed(),
        result.line_count,
        "Complexity: ".dimmed(),
        result.complexity
    )?;
    writeln!(
        out,
        "  {}{}   {}{}",
        "Functions: ".dimmed(),
        result.functions.len(),
        "Classes: ".dimmed(),
        result.classes.len()
    )?;
    writeln!(out)?;

    write_result_summary(out, breakdown, min_score)?;
    writeln!(out)?;

    if let Some(summary) = &result.summary {
        writeln!(out, "  {}", "Summary:".bold())?;
        writeln!(out, "    {}", summary)?;
        writeln!(out)?;
    }

    if !result.issues.is_empty() {
        write_issues(out, &result.issues)?;
    }

    if breakdown.complexity_penalty > 0.0 || breakdown.issue_penalty > 0.0 {
        write_breakdown(out, breakdown)?;
        writeln!(out)?;
    }

    Ok(())
}

/// Write a directory report in pretty format.
pub fn write_directory_pretty(
    out: &mut impl Write,
    report: &DirectoryReport,
    min_score: Option<f64>,
) -> anyhow::Result<()> {
    write_header(out, &report.directory)?;

    let s = &report.summary;
    writeln!(
        out,
        "  {}{}   {}{}   {}{}",
        "Files: ".dimmed(),
        s.total_files,
        "Analyzed: ".dimmed(),
        s.successful_analyses,
        "Failed: ".dimmed(),
        s.failed_analyses
    )?;
    writeln!(
        out,
        "  {}{}   {}{}   {}{}",
        "Errors: ".dimmed(),
        s.total_errors,
        "Warnings: ".dimmed(),
        s.total_warnings,
        "Auto-fixable: ".dimmed(),
        s.files_with_auto_fixes
    )?;
    write!(out, "  {}", "Average quality: ".dimmed())?;
    write_colored_score(out, s.average_quality_score)?;
    writeln!(out)?;
    writeln!(out)?;

    for file in &report.files {
        match (&file.result, &file.error) {
            (Some(result), _) => {
                write!(out, "    ")?;
                write_colored_score(out, result.quality_score)?;
                write!(out, "  {:<40}", file.path.blue())?;
                writeln!(
                    out,
                    "{}",
                    format!("{} errors, {} warnings", result.errors(), result.warnings()).dimmed()
                )?;
            }
            (None, error) => {
                writeln!(
                    out,
                    "    {}  {:<40}{}",
                    "skip ".red(),
                    file.path.blue(),
                    error.as_deref().unwrap_or("").dimmed()
                )?;
            }
        }
    }
    writeln!(out)?;

    write!(out, "  ")?;
    if directory_passes(report, min_score) {
        writeln!(out, "{}", "PASSED".green())?;
    } else {
        writeln!(out, "{}", "FAILED".red())?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_header(out: &mut impl Write, target: &str) -> anyhow::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {} v{}", "codedoc".cyan().bold(), env!("CARGO_PKG_VERSION"))?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Analyzing: ".dimmed(), target)?;
    writeln!(out)?;
    Ok(())
}

fn write_result_summary(
    out: &mut impl Write,
    breakdown: &ScoreBreakdown,
    min_score: Option<f64>,
) -> anyhow::Result<()> {
    if breakdown.passes(min_score) {
        write!(out, "  {}", "✓ PASS".green())?;
    } else {
        write!(out, "  {}", "✗ FAIL".red())?;
    }

    write!(out, "  Quality: ")?;
    write_colored_score(out, breakdown.score)?;
    write!(out, "/100  Grade: ")?;
    write_colored_grade(out, &breakdown.grade)?;

    if let Some(min) = min_score {
        write!(out, "  {}", format!("(minimum {:.1})", min).dimmed())?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_colored_score(out: &mut impl Write, s: f64) -> std::io::Result<()> {
    let text = format!("{:.1}", s);
    match s {
        s if s >= 90.0 => write!(out, "{}", text.green().bold()),
        s if s >= 80.0 => write!(out, "{}", text.green()),
        s if s >= 70.0 => write!(out, "{}", text.yellow()),
        s if s >= 60.0 => write!(out, "{}", text.yellow().bold()),
        _ => write!(out, "{}", text.red()),
    }
}

fn write_colored_grade(out: &mut impl Write, grade: &str) -> std::io::Result<()> {
    match grade {
        "A" => write!(out, "{}", grade.green().bold()),
        "B" => write!(out, "{}", grade.green()),
        "C" => write!(out, "{}", grade.yellow()),
        "D" => write!(out, "{}", grade.yellow().bold()),
        _ => write!(out, "{}", grade.red()),
    }
}

fn write_issues(out: &mut impl Write, issues: &[Issue]) -> anyhow::Result<()> {
    writeln!(out, "  {} ({}):", "Issues".bold(), issues.len())?;
    writeln!(out)?;

    for issue in issues {
        write_severity_tag(out, issue.severity)?;
        write!(out, "   ")?;
        write!(out, "{:<26}", issue.rule.as_str().dimmed())?;
        write!(out, "{:<12}", issue.category.as_str().blue())?;
        if issue.line > 0 {
            write!(out, "{}", format!("line {}", issue.line).dimmed())?;
        } else {
            write!(out, "{}", "file".dimmed())?;
        }
        writeln!(out)?;

        writeln!(out, "            {}", issue.message)?;
        if let Some(suggestion) = &issue.suggestion {
            writeln!(out, "            {}", format!("hint: {}", suggestion).dimmed())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_severity_tag(out: &mut impl Write, severity: Severity) -> std::io::Result<()> {
    match severity {
        Severity::Error => write!(out, "    {} ", "ERROR".red()),
        Severity::Warning => write!(out, "    {} ", "WARN ".yellow()),
    }
}

fn write_breakdown(out: &mut impl Write, breakdown: &ScoreBreakdown) -> anyhow::Result<()> {
    writeln!(out, "  {}", "Breakdown:".bold())?;
    let plural = |n: usize| if n != 1 { "s" } else { "" };
    writeln!(
        out,
        "    {:<20} {:>5.1} pts ({} error{}, {} warning{})",
        "issues",
        breakdown.issue_penalty,
        breakdown.errors,
        plural(breakdown.errors),
        breakdown.warnings,
        plural(breakdown.warnings)
    )?;
    writeln!(
        out,
        "    {:<20} {:>5.1} pts",
        "complexity", breakdown.complexity_penalty
    )?;
    Ok(())
}
