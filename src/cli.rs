//! Command-line interface for codedoc.

use clap::{ArgAction, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::SourceUnit;
use crate::batch::{self, BatchOptions};
use crate::config::{self, Config};
use crate::detect::apply_fixes;
use crate::language::{self, Language};
use crate::pipeline::{AnalysisResult, Analyzer};
use crate::render::{self, DocFormat};
use crate::report::{self, OutputFormat};
use crate::summarize::HttpSummarizer;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Multi-language static inspection and documentation generator.
///
/// Extracts functions, classes and complexity from Python, JavaScript, Java
/// and C++ sources, flags security, performance, logic and style issues,
/// scores the result and renders it as Markdown, HTML or JSON.
#[derive(Parser)]
#[command(name = "codedoc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a file or directory and report issues and quality scores
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// Generate documentation for a single file
    Docs(DocsArgs),
    /// Apply safe automatic fixes to a single file
    Fix(FixArgs),
    /// List supported languages and file extensions
    Languages,
    /// Write the default configuration file
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Language to assume instead of detecting it from the extension
    #[arg(short, long)]
    pub language: Option<String>,

    /// Request prose summaries from the configured summarization service
    #[arg(short, long)]
    pub summarize: bool,

    /// Minimum acceptable quality score (exit 1 if any file scores lower)
    #[arg(short, long)]
    pub min_score: Option<f64>,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also write Markdown, HTML and JSON documents into this directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the docs command.
#[derive(Parser)]
pub struct DocsArgs {
    /// Source file to document
    pub path: PathBuf,

    /// Document format: markdown, html, or json
    #[arg(short, long, default_value = "markdown")]
    pub format: String,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Language to assume instead of detecting it from the extension
    #[arg(short, long)]
    pub language: Option<String>,

    /// Request a prose summary from the configured summarization service
    #[arg(short, long)]
    pub summarize: bool,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the fix command.
#[derive(Parser)]
pub struct FixArgs {
    /// Source file to fix
    pub path: PathBuf,

    /// Write the fixed source here instead of stdout
    #[arg(short, long, conflicts_with = "in_place")]
    pub output: Option<PathBuf>,

    /// Overwrite the input file with the fixed source
    #[arg(long)]
    pub in_place: bool,

    /// Language to assume instead of detecting it from the extension
    #[arg(short, long)]
    pub language: Option<String>,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "codedoc.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Load and validate configuration for a command.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(explicit, &cwd)?;
    config::validate(&config)?;
    Ok(config)
}

/// Build the analyzer, attaching the HTTP summarizer when requested on the
/// command line or enabled in configuration.
fn build_analyzer(config: Config, summarize: bool) -> anyhow::Result<Analyzer> {
    if summarize && !config.summarizer.enabled {
        let summarizer = HttpSummarizer::new(&config.summarizer)?;
        return Ok(Analyzer::new(config)?.with_summarizer(Arc::new(summarizer)));
    }
    Analyzer::from_config(config)
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

/// Analyze one unit, with a summary when the analyzer has a summarizer.
fn analyze_unit(analyzer: &Analyzer, unit: &SourceUnit) -> anyhow::Result<AnalysisResult> {
    if analyzer.has_summarizer() {
        Ok(runtime()?.block_on(analyzer.analyze_with_summary(unit)))
    } else {
        Ok(analyzer.analyze(unit))
    }
}

fn read_unit(path: &Path, language: Option<&str>, config: &Config) -> anyhow::Result<SourceUnit> {
    let name = path.to_string_lossy();
    batch::read_source(path, &name, language, config.max_input_bytes)
}

/// Report an unknown `--language` value. `None` is always accepted.
fn language_is_known(language: Option<&str>) -> bool {
    match language {
        Some(lang) if Language::parse(lang).is_none() => {
            eprintln!("Error: unknown language {:?}", lang);
            eprintln!("Run 'codedoc languages' to see supported languages");
            false
        }
        _ => true,
    }
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let format: OutputFormat = match args.format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if !language_is_known(args.language.as_deref()) {
        return Ok(EXIT_ERROR);
    }

    let metadata = match std::fs::metadata(&args.path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let config = load_config(args.config.as_deref())?;
    let analyzer = build_analyzer(config, args.summarize)?;

    if metadata.is_dir() {
        return analyze_directory(&analyzer, args, format);
    }

    let unit = read_unit(&args.path, args.language.as_deref(), analyzer.config())?;
    let result = analyze_unit(&analyzer, &unit)?;
    let breakdown = analyzer.breakdown(&result);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => report::write_json(&mut out, &result, &breakdown, args.min_score)?,
        OutputFormat::Sarif => report::write_sarif(&mut out, &[&result])?,
        OutputFormat::Pretty => report::write_pretty(&mut out, &result, &breakdown, args.min_score)?,
    }

    if let Some(dir) = &args.output_dir {
        for path in batch::write_documents(&result, dir)? {
            eprintln!("Wrote {}", path.display());
        }
    }

    if breakdown.passes(args.min_score) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

fn analyze_directory(
    analyzer: &Analyzer,
    args: &AnalyzeArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let rt = if analyzer.has_summarizer() {
        Some(runtime()?)
    } else {
        None
    };
    let options = BatchOptions {
        show_progress: format == OutputFormat::Pretty && std::io::stderr().is_terminal(),
        summary_runtime: rt.as_ref(),
    };

    let report = batch::analyze_directory(analyzer, &args.path, &options)?;
    if report.files.is_empty() {
        eprintln!("Warning: no files to analyze");
        return Ok(EXIT_SUCCESS);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => report::write_directory_json(&mut out, &report, args.min_score)?,
        OutputFormat::Sarif => {
            let results: Vec<&AnalysisResult> = report.results().collect();
            report::write_sarif(&mut out, &results)?
        }
        OutputFormat::Pretty => {
            report::write_directory_pretty(&mut out, &report, args.min_score)?
        }
    }

    if let Some(dir) = &args.output_dir {
        let written = batch::write_outputs(&report, dir)?;
        eprintln!("Wrote {} files to {}", written.len(), dir.display());
    }

    if report::directory_passes(&report, args.min_score) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the docs command.
pub fn run_docs(args: &DocsArgs) -> anyhow::Result<i32> {
    let format: DocFormat = match args.format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if !language_is_known(args.language.as_deref()) {
        return Ok(EXIT_ERROR);
    }

    let config = load_config(args.config.as_deref())?;
    let analyzer = build_analyzer(config, args.summarize)?;
    let unit = read_unit(&args.path, args.language.as_deref(), analyzer.config())?;
    let result = analyze_unit(&analyzer, &unit)?;
    let document = render::render(&result, format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, document)?;
            eprintln!("Wrote {} documentation to {}", format, path.display());
        }
        None => print!("{}", document),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the fix command.
pub fn run_fix(args: &FixArgs) -> anyhow::Result<i32> {
    if !language_is_known(args.language.as_deref()) {
        return Ok(EXIT_ERROR);
    }

    let config = load_config(args.config.as_deref())?;
    let analyzer = Analyzer::new(config)?;
    let unit = read_unit(&args.path, args.language.as_deref(), analyzer.config())?;
    let result = analyzer.analyze(&unit);
    let outcome = apply_fixes(&unit, &result.issues);

    for issue in &outcome.applied {
        eprintln!("fixed   line {:>4}  {}", issue.line, issue.rule);
    }
    for skipped in &outcome.skipped {
        eprintln!(
            "skipped line {:>4}  {} ({})",
            skipped.issue.line, skipped.issue.rule, skipped.reason
        );
    }

    let target = if args.in_place {
        Some(args.path.as_path())
    } else {
        args.output.as_deref()
    };
    match target {
        Some(path) => {
            std::fs::write(path, &outcome.fixed_source)?;
            eprintln!(
                "Applied {} fix(es), wrote {}",
                outcome.applied.len(),
                path.display()
            );
        }
        None => print!("{}", outcome.fixed_source),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the languages command.
pub fn run_languages() -> anyhow::Result<i32> {
    println!("Supported languages:");
    println!();
    for lang in Language::all() {
        let exts: Vec<String> = lang.extensions().iter().map(|e| format!(".{}", e)).collect();
        println!("  {:<12} {}", lang.as_str(), exts.join(" "));
    }
    println!();
    println!("Extensions: {}", language::supported_extensions().join(", "));
    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it, pass --force, or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, config::DEFAULT_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: codedoc analyze . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_analyze_args() {
        let cli = Cli::parse_from([
            "codedoc", "-vv", "analyze", "src", "--format", "json", "--min-score", "80",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.path, PathBuf::from("src"));
                assert_eq!(args.format, "json");
                assert_eq!(args.min_score, Some(80.0));
                assert!(!args.summarize);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_fix_output_conflicts_with_in_place() {
        let parsed = Cli::try_parse_from(["codedoc", "fix", "a.py", "--in-place", "-o", "b.py"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_init_writes_template() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("nested").join("codedoc.yaml");
        let args = InitArgs {
            output: output.clone(),
            force: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, config::DEFAULT_TEMPLATE);

        // Refuses to overwrite without --force.
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_analyze_rejects_bad_format() {
        let args = AnalyzeArgs {
            path: PathBuf::from("."),
            format: "xml".to_string(),
            language: None,
            summarize: false,
            min_score: None,
            config: None,
            output_dir: None,
        };
        assert_eq!(run_analyze(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_analyze_min_score_exit_code() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("risky.py");
        std::fs::write(&file, "eval(user_input)\n").unwrap();
        let config = dir.path().join("codedoc.yaml");
        std::fs::write(&config, "").unwrap();

        let mut args = AnalyzeArgs {
            path: file,
            format: "json".to_string(),
            language: None,
            summarize: false,
            min_score: Some(95.0),
            config: Some(config),
            output_dir: None,
        };
        assert_eq!(run_analyze(&args).unwrap(), EXIT_FAILED);

        args.min_score = Some(90.0);
        assert_eq!(run_analyze(&args).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn test_fix_in_place() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "try:\n    run()\nexcept:\n    pass\n").unwrap();
        let config = dir.path().join("codedoc.yaml");
        std::fs::write(&config, "").unwrap();

        let args = FixArgs {
            path: file.clone(),
            output: None,
            in_place: true,
            language: None,
            config: Some(config),
        };
        assert_eq!(run_fix(&args).unwrap(), EXIT_SUCCESS);
        let fixed = std::fs::read_to_string(&file).unwrap();
        assert_eq!(fixed, "try:\n    run()\nexcept Exception:\n    pass\n");
    }

    #[test]
    fn test_docs_and_fix_reject_unknown_language() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "x = 1\n").unwrap();

        let docs = DocsArgs {
            path: file.clone(),
            format: "markdown".to_string(),
            output: None,
            language: Some("cobol".to_string()),
            summarize: false,
            config: None,
        };
        assert_eq!(run_docs(&docs).unwrap(), EXIT_ERROR);

        let fix = FixArgs {
            path: file.clone(),
            output: None,
            in_place: true,
            language: Some("cobol".to_string()),
            config: None,
        };
        assert_eq!(run_fix(&fix).unwrap(), EXIT_ERROR);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x = 1\n");
    }
}
