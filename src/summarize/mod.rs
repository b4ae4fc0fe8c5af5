//! Prose summaries from an external summarization service.
//!
//! The service is optional. Callers treat every failure as "no summary" and
//! fall back to [`SUMMARY_UNAVAILABLE`].

mod http;

pub use http::HttpSummarizer;

use futures::future::BoxFuture;
use thiserror::Error;

/// Summary used whenever the service cannot produce one.
pub const SUMMARY_UNAVAILABLE: &str = "Code analysis complete. Summary generation unavailable.";

/// Errors that can occur while requesting a summary.
#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by summarizer")]
    RateLimited,
    #[error("input too long for summarizer")]
    InputTooLong,
    #[error("malformed summarizer response: {0}")]
    Malformed(String),
    #[error("summarizer unavailable: {0}")]
    Unavailable(String),
}

/// Something that can turn source text into a short prose summary.
pub trait Summarizer: Send + Sync {
    fn summarize<'a>(
        &'a self,
        text: &'a str,
        max_length: u32,
    ) -> BoxFuture<'a, Result<String, SummarizeError>>;
}

/// Prefix `code` with the summarization prompt, truncating it to
/// `max_chars` characters first.
pub fn build_prompt(code: &str, max_chars: usize) -> String {
    let snippet = match code.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &code[..cut]),
        None => code.to_string(),
    };
    format!("This is a code snippet:\n{}\n\nSummary:", snippet)
}
