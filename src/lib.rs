//! Codedoc - multi-language static inspection and documentation.
//!
//! Codedoc inspects a source unit (or a directory of them), extracts its
//! structure, detects issues with per-language rule tables plus a few
//! syntax-tree checks, scores the result, optionally attaches a prose
//! summary from an external service, and renders Markdown, HTML or JSON.
//!
//! # Architecture
//!
//! - `language`: language detection from file names and hints
//! - `analysis`: structural extraction (tree-sitter for python, brace-depth
//!   heuristics for JavaScript, Java and C++)
//! - `detect`: pattern rules, style checks, tree checks, auto-fixes
//! - `score`: quality score calculation
//! - `pipeline`: the per-unit analyzer and `AnalysisResult`
//! - `summarize`: summarization service client
//! - `render`: documentation output (markdown, html, json)
//! - `report`: terminal, JSON and SARIF reports
//! - `batch`: directory analysis
//! - `config`: YAML configuration schema and discovery

pub mod analysis;
pub mod batch;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod language;
pub mod lexical;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod score;
pub mod summarize;

pub use analysis::{ClassInfo, FunctionInfo, SourceUnit, StructuralSummary};
pub use config::Config;
pub use detect::{Category, Detector, Issue, RuleSet, Severity};
pub use error::AnalysisError;
pub use language::Language;
pub use pipeline::{aggregate, AnalysisResult, Analyzer};
pub use render::{render, DocFormat};
pub use score::{score, ScoreBreakdown};
