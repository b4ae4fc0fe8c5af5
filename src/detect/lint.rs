//! External linter integration.
//!
//! The linter is optional and only consulted for python. Its findings are
//! folded into the issue list as style warnings; any failure to run it is
//! logged by the caller and otherwise ignored.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use super::rules::LINT_RULE_PREFIX;
use super::{Category, Issue, Severity};
use crate::config::LinterConfig;

/// `path:line:col: CODE message`, column optional.
static FINDING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<path>[^:]*):(?P<line>\d+):(?:\d+:)?\s*(?P<code>[A-Z]+\d+)\s+(?P<msg>.+)$")
        .unwrap()
});

/// One diagnostic reported by a linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub line: usize,
    pub message: String,
    pub rule_id: String,
}

impl LintFinding {
    pub fn into_issue(self) -> Issue {
        Issue::new(
            format!("{}{}", LINT_RULE_PREFIX, self.rule_id),
            Category::Style,
            Severity::Warning,
            self.line,
            format!("{} {}", self.rule_id, self.message),
        )
    }
}

/// Something that can lint python source text.
pub trait Linter: Send + Sync {
    fn lint(&self, source: &str) -> anyhow::Result<Vec<LintFinding>>;
}

/// Runs a linter executable with the source on stdin.
#[derive(Debug, Clone)]
pub struct CommandLinter {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

impl CommandLinter {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: Duration::from_millis(LinterConfig::default().timeout_ms),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a linter from configuration, if one is configured.
    pub fn from_config(config: &LinterConfig) -> Option<Self> {
        config
            .command
            .as_ref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| {
                Self::new(c.clone(), config.args.clone())
                    .with_timeout(Duration::from_millis(config.timeout_ms))
            })
    }

    /// Wait for `child` until the timeout, killing it when the time runs out.
    fn wait(&self, child: &mut Child) -> anyhow::Result<ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("waiting for linter {:?}", self.command))?
            {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                anyhow::bail!(
                    "linter {:?} timed out after {}ms",
                    self.command,
                    self.timeout.as_millis()
                );
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

fn read_to_end(mut pipe: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

impl Linter for CommandLinter {
    fn lint(&self, source: &str) -> anyhow::Result<Vec<LintFinding>> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning linter {:?}", self.command))?;

        let mut stdin = child.stdin.take().context("linter stdin unavailable")?;
        let stdout = read_to_end(child.stdout.take().context("linter stdout unavailable")?);
        let stderr = read_to_end(child.stderr.take().context("linter stderr unavailable")?);

        let input = source.to_string();
        let writer = std::thread::spawn(move || match stdin.write_all(input.as_bytes()) {
            // The linter may exit without reading its input.
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        });

        let status = self.wait(&mut child)?;
        writer
            .join()
            .map_err(|_| anyhow::anyhow!("linter stdin writer panicked"))?
            .context("writing source to linter")?;
        let stdout = stdout
            .join()
            .map_err(|_| anyhow::anyhow!("linter stdout reader panicked"))?;
        let stderr = stderr
            .join()
            .map_err(|_| anyhow::anyhow!("linter stderr reader panicked"))?;

        let findings = parse_findings(&String::from_utf8_lossy(&stdout));

        // Linters exit non-zero when they find something; only treat it as a
        // failure when nothing parseable came back.
        if findings.is_empty() && !status.success() {
            anyhow::bail!(
                "linter {:?} exited with {}: {}",
                self.command,
                status,
                String::from_utf8_lossy(&stderr).trim()
            );
        }

        Ok(findings)
    }
}

/// Parse flake8-style output, skipping lines that do not fit the format.
pub fn parse_findings(output: &str) -> Vec<LintFinding> {
    output
        .lines()
        .filter_map(|line| {
            let caps = FINDING_LINE.captures(line.trim_end())?;
            Some(LintFinding {
                line: caps["line"].parse().ok()?,
                message: caps["msg"].trim().to_string(),
                rule_id: caps["code"].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flake8_output() {
        let output = "stdin:1:1: F401 'os' imported but unused\n\
                      stdin:3:80: E501 line too long (90 > 79 characters)\n\
                      garbage line\n";
        let findings = parse_findings(output);
        assert_eq!(findings.len(), 2);
        assert_eq!(
            findings[0],
            LintFinding {
                line: 1,
                message: "'os' imported but unused".to_string(),
                rule_id: "F401".to_string(),
            }
        );
        assert_eq!(findings[1].line, 3);
    }

    #[test]
    fn test_finding_into_issue() {
        let issue = LintFinding {
            line: 4,
            message: "whitespace".to_string(),
            rule_id: "W291".to_string(),
        }
        .into_issue();
        assert_eq!(issue.rule, "lint:W291");
        assert_eq!(issue.category, Category::Style);
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.line, 4);
    }

    #[test]
    fn test_from_config_requires_command() {
        assert!(CommandLinter::from_config(&LinterConfig::default()).is_none());
        let config = LinterConfig {
            command: Some("flake8".to_string()),
            args: vec!["-".to_string()],
            ..LinterConfig::default()
        };
        assert!(CommandLinter::from_config(&config).is_some());
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let linter = CommandLinter::new("codedoc-no-such-linter", Vec::new());
        assert!(linter.lint("x = 1\n").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_hanging_linter_is_killed() {
        let linter = CommandLinter::new("sleep", vec!["30".to_string()])
            .with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = linter.lint("x = 1\n").unwrap_err();
        assert!(err.to_string().contains("timed out"), "{}", err);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_linter_that_ignores_stdin_keeps_findings() {
        let script = "echo 'a.py:2:1: E302 expected 2 blank lines'";
        let linter = CommandLinter::new("sh", vec!["-c".to_string(), script.to_string()]);
        // Large enough to overflow the pipe buffer once the linter has exited.
        let source = "x = 1\n".repeat(50_000);
        let findings = linter.lint(&source).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "E302");
        assert_eq!(findings[0].line, 2);
    }
}
