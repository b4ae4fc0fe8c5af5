//! Error taxonomy for the analysis pipeline.

use thiserror::Error;

/// Errors surfaced by the analysis pipeline and its transport layer.
///
/// Only `UnsupportedLanguage`, `InputTooLarge` and `InvalidEncoding` ever reach
/// a caller. `ParseFailure` and `SummarizerUnavailable` are recovered inside
/// the pipeline and show up as an issue or a sentinel summary instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("unsupported language for extension {extension:?}")]
    UnsupportedLanguage { extension: String },
    #[error("failed to parse source: {0}")]
    ParseFailure(String),
    #[error("summarizer unavailable: {0}")]
    SummarizerUnavailable(String),
    #[error("input is {size} bytes, limit is {limit} bytes")]
    InputTooLarge { size: u64, limit: u64 },
    #[error("input is not valid UTF-8 text")]
    InvalidEncoding,
}
