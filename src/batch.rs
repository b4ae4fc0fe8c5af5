//! Directory analysis.
//!
//! Walks a directory, analyzes every file with a supported extension in
//! parallel, and aggregates the outcomes into a [`DirectoryReport`].

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::analysis::SourceUnit;
use crate::detect::apply_fixes;
use crate::error::AnalysisError;
use crate::language;
use crate::pipeline::{AnalysisResult, Analyzer};
use crate::render::{self, DocFormat};

/// File name of the JSON directory summary written by [`write_outputs`].
pub const SUMMARY_JSON: &str = "directory_analysis_summary.json";
/// File name of the Markdown directory summary written by [`write_outputs`].
pub const SUMMARY_MARKDOWN: &str = "directory_analysis_summary.md";

/// Totals across a directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorySummary {
    pub total_files: usize,
    pub successful_analyses: usize,
    pub failed_analyses: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    /// Mean quality score of the successful analyses, one decimal place.
    pub average_quality_score: f64,
    pub files_with_auto_fixes: usize,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Path relative to the analyzed directory.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub auto_fix_available: bool,
}

/// Result of analyzing a directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryReport {
    pub directory: String,
    pub summary: DirectorySummary,
    pub files: Vec<FileOutcome>,
}

impl DirectoryReport {
    /// Build a report from per-file outcomes, computing the totals.
    pub fn from_outcomes(directory: impl Into<String>, files: Vec<FileOutcome>) -> Self {
        let mut summary = DirectorySummary {
            total_files: files.len(),
            ..DirectorySummary::default()
        };

        let mut scores = Vec::new();
        for outcome in &files {
            match &outcome.result {
                Some(result) => {
                    summary.successful_analyses += 1;
                    summary.total_errors += result.errors();
                    summary.total_warnings += result.warnings();
                    scores.push(result.quality_score);
                }
                None => summary.failed_analyses += 1,
            }
            if outcome.auto_fix_available {
                summary.files_with_auto_fixes += 1;
            }
        }

        if !scores.is_empty() {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            summary.average_quality_score = (mean * 10.0).round() / 10.0;
        }

        Self {
            directory: directory.into(),
            summary,
            files,
        }
    }

    /// Successful results, in file order.
    pub fn results(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.files.iter().filter_map(|f| f.result.as_ref())
    }
}

/// Read a file as a source unit, enforcing the size limit and UTF-8.
pub fn read_source(
    path: &Path,
    display_name: &str,
    language_hint: Option<&str>,
    max_bytes: u64,
) -> anyhow::Result<SourceUnit> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("cannot access {}", path.display()))?;
    if metadata.len() > max_bytes {
        return Err(AnalysisError::InputTooLarge {
            size: metadata.len(),
            limit: max_bytes,
        }
        .into());
    }

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = String::from_utf8(bytes).map_err(|_| AnalysisError::InvalidEncoding)?;
    Ok(SourceUnit::new(text, display_name, language_hint)?)
}

fn exclusion_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!(pattern = %pattern, error = %err, "ignoring invalid exclude pattern"),
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!(error = %err, "failed to build exclude patterns");
        GlobSet::empty()
    })
}

/// Files under `root` with a supported extension, skipping excluded paths.
/// Sorted so reports are stable between runs.
pub fn collect_files(root: &Path, excluded_paths: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let excluded = exclusion_set(excluded_paths);

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !excluded.is_match(e.path()))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = language::extension_of(&path.to_string_lossy());
        if language::for_extension(&ext).is_some() {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn relative_name(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| path.to_string_lossy().to_string())
}

/// Options for [`analyze_directory`].
#[derive(Default)]
pub struct BatchOptions<'a> {
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
    /// Attach summaries, driving the summarizer on this runtime.
    pub summary_runtime: Option<&'a tokio::runtime::Runtime>,
}

/// Analyze every supported file under `root`.
///
/// Per-file failures (unreadable, too large, not UTF-8) are recorded in the
/// report rather than aborting the walk.
pub fn analyze_directory(
    analyzer: &Analyzer,
    root: &Path,
    options: &BatchOptions,
) -> anyhow::Result<DirectoryReport> {
    let files = collect_files(root, &analyzer.config().excluded_paths)?;
    info!(directory = %root.display(), files = files.len(), "found files to analyze");

    let progress = if options.show_progress {
        let bar = ProgressBar::new(files.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let max_bytes = analyzer.config().max_input_bytes;
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| {
            let name = relative_name(path, root);
            progress.set_message(name.clone());
            let outcome = analyze_one(analyzer, path, &name, max_bytes, options.summary_runtime);
            progress.inc(1);
            outcome
        })
        .collect();
    progress.finish_and_clear();

    let report = DirectoryReport::from_outcomes(root.to_string_lossy(), outcomes);
    info!(
        successful = report.summary.successful_analyses,
        failed = report.summary.failed_analyses,
        average_quality_score = report.summary.average_quality_score,
        "directory analysis complete"
    );
    Ok(report)
}

fn analyze_one(
    analyzer: &Analyzer,
    path: &Path,
    name: &str,
    max_bytes: u64,
    runtime: Option<&tokio::runtime::Runtime>,
) -> FileOutcome {
    let unit = match read_source(path, name, None, max_bytes) {
        Ok(unit) => unit,
        Err(err) => {
            warn!(file = name, error = %err, "skipping file");
            return FileOutcome {
                path: name.to_string(),
                result: None,
                error: Some(err.to_string()),
                auto_fix_available: false,
            };
        }
    };

    let result = match runtime {
        Some(rt) => rt.block_on(analyzer.analyze_with_summary(&unit)),
        None => analyzer.analyze(&unit),
    };
    let auto_fix_available = !apply_fixes(&unit, &result.issues).applied.is_empty();
    debug!(file = name, quality_score = result.quality_score, "file analyzed");

    FileOutcome {
        path: name.to_string(),
        result: Some(result),
        error: None,
        auto_fix_available,
    }
}

/// Markdown overview of a directory report.
pub fn markdown_summary(report: &DirectoryReport) -> anyhow::Result<String> {
    let s = &report.summary;
    let mut out = String::new();

    writeln!(out, "# Directory Analysis Summary\n")?;
    writeln!(out, "**Directory:** `{}`\n", report.directory)?;
    writeln!(out, "## Overview\n")?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(out, "| Total Files | {} |", s.total_files)?;
    writeln!(out, "| Successful Analyses | {} |", s.successful_analyses)?;
    writeln!(out, "| Failed Analyses | {} |", s.failed_analyses)?;
    writeln!(out, "| Total Errors | {} |", s.total_errors)?;
    writeln!(out, "| Total Warnings | {} |", s.total_warnings)?;
    writeln!(out, "| Average Quality Score | {:.1}/100 |", s.average_quality_score)?;
    writeln!(out, "| Files with Auto-fixes | {} |", s.files_with_auto_fixes)?;
    writeln!(out, "\n## File Details\n")?;

    for outcome in &report.files {
        writeln!(out, "### {}", outcome.path)?;
        if let Some(result) = &outcome.result {
            writeln!(out, "- **Language:** {}", result.language.display_name())?;
            writeln!(out, "- **Quality Score:** {:.1}/100", result.quality_score)?;
            writeln!(out, "- **Lines of Code:** {}", result.line_count)?;
            writeln!(out, "- **Complexity:** {}", result.complexity)?;
            if !result.issues.is_empty() {
                writeln!(
                    out,
                    "- **Issues:** {} errors, {} warnings",
                    result.errors(),
                    result.warnings()
                )?;
            }
        } else if let Some(error) = &outcome.error {
            writeln!(out, "- **Failed:** {}", error)?;
        }
        writeln!(out)?;
    }

    Ok(out)
}

/// Write `<stem>_analysis.{md,html,json}` for one result into `dir`.
pub fn write_documents(result: &AnalysisResult, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let stem = Path::new(&result.filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "source".to_string());

    let mut written = Vec::new();
    for format in DocFormat::ALL {
        let path = dir.join(format!("{}_analysis.{}", stem, format.extension()));
        let content = render::render(result, format)?;
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Write per-file documents and both directory summaries into `dir`.
pub fn write_outputs(report: &DirectoryReport, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for result in report.results() {
        written.extend(write_documents(result, dir)?);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let json_path = dir.join(SUMMARY_JSON);
    std::fs::write(&json_path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("writing {}", json_path.display()))?;
    written.push(json_path);

    let md_path = dir.join(SUMMARY_MARKDOWN);
    std::fs::write(&md_path, markdown_summary(report)?)
        .with_context(|| format!("writing {}", md_path.display()))?;
    written.push(md_path);

    Ok(written)
}
