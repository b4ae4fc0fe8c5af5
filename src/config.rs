//! Configuration schema for codedoc.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::detect::{Category, Severity, DEFAULT_RULES, LINT_RULE_PREFIX, STRUCTURAL_RULE_IDS};

/// File names looked up in the working directory, in order.
pub const LOCAL_CONFIG_FILES: &[&str] = &["codedoc.yaml", ".codedoc.yaml"];

/// Default configuration written by `codedoc init`.
pub const DEFAULT_TEMPLATE: &str = include_str!("templates/default.yaml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Inputs larger than this many bytes are rejected before analysis.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub linter: LinterConfig,
    /// Glob patterns for paths skipped in directory mode.
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,
    /// Extra pattern rules appended to the built-in tables.
    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            style: StyleConfig::default(),
            scoring: ScoringConfig::default(),
            summarizer: SummarizerConfig::default(),
            linter: LinterConfig::default(),
            excluded_paths: default_excluded_paths(),
            custom_rules: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to null rather than an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        validate(&config)?;
        Ok(config)
    }

    /// Resolve and load the configuration.
    ///
    /// An explicit path wins; otherwise the first of [`LOCAL_CONFIG_FILES`]
    /// in `cwd`, then the user config directory, then defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading explicit config");
            return Self::parse_file(path)
                .map_err(|e| anyhow::anyhow!("loading config {}: {}", path.display(), e));
        }

        let candidates = LOCAL_CONFIG_FILES
            .iter()
            .map(|name| cwd.join(name))
            .chain(user_config_path());

        for path in candidates {
            if path.is_file() {
                debug!(path = %path.display(), "loading discovered config");
                return Self::parse_file(&path)
                    .map_err(|e| anyhow::anyhow!("loading config {}: {}", path.display(), e));
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }
}

/// `<config dir>/codedoc/config.yaml` for the current user, if known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "codedoc").map(|d| d.config_dir().join("config.yaml"))
}

fn default_max_input_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_excluded_paths() -> Vec<String> {
    ["**/.git/**", "**/node_modules/**", "**/venv/**", "**/.venv/**", "**/__pycache__/**"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Structural style checks.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StyleConfig {
    /// Lines longer than this many characters are flagged (default: 88)
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
        }
    }
}

fn default_max_line_length() -> usize {
    88
}

/// Quality score penalties.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScoringConfig {
    #[serde(default = "default_error_penalty")]
    pub error_penalty: f64,
    #[serde(default = "default_warning_penalty")]
    pub warning_penalty: f64,
    /// Complexity above this is penalized; also the per-function warning
    /// threshold (default: 10)
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: u32,
    /// Points per unit of complexity above the threshold (default: 0.5)
    #[serde(default = "default_complexity_weight")]
    pub complexity_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            error_penalty: default_error_penalty(),
            warning_penalty: default_warning_penalty(),
            complexity_threshold: default_complexity_threshold(),
            complexity_weight: default_complexity_weight(),
        }
    }
}

fn default_error_penalty() -> f64 {
    10.0
}

fn default_warning_penalty() -> f64 {
    3.0
}

fn default_complexity_threshold() -> u32 {
    10
}

fn default_complexity_weight() -> f64 {
    0.5
}

/// External summarization service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Inference endpoint accepting `{"inputs", "parameters"}` JSON.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Environment variable holding a bearer token, if the endpoint needs one.
    #[serde(default)]
    pub api_token_env: Option<String>,
    /// Request timeout in milliseconds (default: 30000)
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_ms: u64,
    /// Source text is truncated to this many characters (default: 1024)
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_min_length")]
    pub min_length: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            api_token_env: None,
            timeout_ms: default_summarizer_timeout(),
            max_input_chars: default_max_input_chars(),
            max_length: default_max_length(),
            min_length: default_min_length(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn".to_string()
}

fn default_summarizer_timeout() -> u64 {
    30_000
}

fn default_max_input_chars() -> usize {
    1024
}

fn default_max_length() -> u32 {
    150
}

fn default_min_length() -> u32 {
    30
}

/// Optional external linter for python sources.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LinterConfig {
    /// Command to run, e.g. `flake8`. The source is written to its stdin.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// The linter is killed after this many milliseconds (default: 10000)
    #[serde(default = "default_linter_timeout")]
    pub timeout_ms: u64,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_ms: default_linter_timeout(),
        }
    }
}

fn default_linter_timeout() -> u64 {
    10_000
}

/// A user-supplied pattern rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CustomRule {
    /// `python`, `javascript`, `java` or `cpp`.
    pub language: String,
    pub id: String,
    pub pattern: String,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.style.max_line_length == 0 {
        anyhow::bail!("style.max_line_length must be positive");
    }

    let scoring = &config.scoring;
    for (name, value) in [
        ("scoring.error_penalty", scoring.error_penalty),
        ("scoring.warning_penalty", scoring.warning_penalty),
        ("scoring.complexity_weight", scoring.complexity_weight),
    ] {
        if !value.is_finite() || value < 0.0 {
            anyhow::bail!("{} must be a non-negative number, got {}", name, value);
        }
    }

    if config.linter.timeout_ms == 0 {
        anyhow::bail!("linter.timeout_ms must be positive");
    }

    if config.summarizer.min_length > config.summarizer.max_length {
        anyhow::bail!(
            "summarizer.min_length ({}) exceeds summarizer.max_length ({})",
            config.summarizer.min_length,
            config.summarizer.max_length
        );
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    let mut custom_ids = HashSet::new();
    for rule in &config.custom_rules {
        if DEFAULT_RULES.has_rule_id(&rule.id)
            || STRUCTURAL_RULE_IDS.contains(&rule.id.as_str())
            || rule.id.starts_with(LINT_RULE_PREFIX)
        {
            anyhow::bail!("custom rule {:?}: id is reserved for a built-in rule", rule.id);
        }
        if !custom_ids.insert(rule.id.as_str()) {
            anyhow::bail!("custom rule {:?}: id is used more than once", rule.id);
        }
        if crate::language::Language::parse(&rule.language).is_none() {
            anyhow::bail!("custom rule {:?}: unknown language {:?}", rule.id, rule.language);
        }
        if rule.category == Category::Complexity {
            anyhow::bail!("custom rule {:?}: complexity is not a pattern category", rule.id);
        }
        regex::Regex::new(&rule.pattern)
            .map_err(|e| anyhow::anyhow!("invalid custom rule pattern {:?}: {}", rule.pattern, e))?;
    }

    Ok(())
}
