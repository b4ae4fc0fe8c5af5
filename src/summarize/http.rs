//! Hosted inference endpoint client.
//!
//! POST {endpoint} with `{"inputs": prompt, "parameters": {...}}`, expecting
//! `[{"summary_text": "..."}]` back.

use std::time::Duration;

use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{build_prompt, SummarizeError, Summarizer};
use crate::config::SummarizerConfig;

#[derive(Serialize)]
struct Request<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Parameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Deserialize)]
struct Output {
    summary_text: String,
}

/// Summarizer backed by an HTTP inference endpoint.
pub struct HttpSummarizer {
    http: Client,
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
    max_input_chars: usize,
    min_length: u32,
}

impl HttpSummarizer {
    /// Create a client from configuration. The API token, if any, is read
    /// from the environment variable named by `api_token_env`.
    pub fn new(config: &SummarizerConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("codedoc/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;

        let token = config
            .api_token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|t| !t.is_empty());

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            token,
            timeout: Duration::from_millis(config.timeout_ms),
            max_input_chars: config.max_input_chars,
            min_length: config.min_length,
        })
    }

    async fn request(&self, text: &str, max_length: u32) -> Result<String, SummarizeError> {
        let prompt = build_prompt(text, self.max_input_chars);
        let body = Request {
            inputs: &prompt,
            parameters: Parameters {
                max_length,
                min_length: self.min_length.min(max_length),
                do_sample: false,
            },
        };

        let mut request = self.http.post(&self.endpoint).timeout(self.timeout).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SummarizeError::Timeout
            } else {
                SummarizeError::Network(e)
            }
        })?;

        match response.status().as_u16() {
            200 => {}
            413 => return Err(SummarizeError::InputTooLong),
            429 => return Err(SummarizeError::RateLimited),
            status => return Err(SummarizeError::Unavailable(format!("HTTP {}", status))),
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| SummarizeError::Malformed(e.to_string()))?;
        parse_response(value)
    }
}

impl Summarizer for HttpSummarizer {
    fn summarize<'a>(
        &'a self,
        text: &'a str,
        max_length: u32,
    ) -> BoxFuture<'a, Result<String, SummarizeError>> {
        self.request(text, max_length).boxed()
    }
}

/// Pull the summary text out of an inference response.
fn parse_response(value: Value) -> Result<String, SummarizeError> {
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(SummarizeError::Unavailable(error.to_string()));
    }

    let outputs: Vec<Output> =
        serde_json::from_value(value).map_err(|e| SummarizeError::Malformed(e.to_string()))?;
    let summary = outputs
        .into_iter()
        .next()
        .map(|o| o.summary_text.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SummarizeError::Malformed("no summary_text in response".to_string()))?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response() {
        let value = json!([{"summary_text": " Prints a greeting. "}]);
        assert_eq!(parse_response(value).unwrap(), "Prints a greeting.");
    }

    #[test]
    fn test_parse_error_object() {
        let value = json!({"error": "Model is currently loading"});
        assert!(matches!(
            parse_response(value),
            Err(SummarizeError::Unavailable(msg)) if msg.contains("loading")
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_response(json!([])),
            Err(SummarizeError::Malformed(_))
        ));
        assert!(matches!(
            parse_response(json!({"text": "x"})),
            Err(SummarizeError::Malformed(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = Request {
            inputs: "prompt",
            parameters: Parameters {
                max_length: 150,
                min_length: 30,
                do_sample: false,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["inputs"], "prompt");
        assert_eq!(value["parameters"]["max_length"], 150);
        assert_eq!(value["parameters"]["do_sample"], false);
    }

    #[test]
    fn test_token_read_from_env() {
        std::env::set_var("CODEDOC_TEST_SUMMARIZER_TOKEN", "secret");
        let config = SummarizerConfig {
            api_token_env: Some("CODEDOC_TEST_SUMMARIZER_TOKEN".to_string()),
            ..SummarizerConfig::default()
        };
        let summarizer = HttpSummarizer::new(&config).unwrap();
        assert_eq!(summarizer.token.as_deref(), Some("secret"));
    }
}
