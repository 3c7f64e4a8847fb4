//! Command-line interface for codepulse.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::analysis::AnalyzerRegistry;
use crate::config::Config;
use crate::git::GitCli;
use crate::model::{metric_catalog, ProjectReport};
use crate::pipeline::{AnalysisRequest, Orchestrator};
use crate::ports::ReportStore;
use crate::report::RendererRegistry;
use crate::scan::FsScanner;
use crate::storage::JsonFileStore;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

const DEFAULT_FORMAT: &str = "text";

/// Source quality analyzer.
///
/// Measures complexity, size, coupling and comment density per function,
/// combines them with git churn, and ranks the files most worth a look.
#[derive(Parser)]
#[command(name = "codepulse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a project and store the report
    Analyze(AnalyzeArgs),
    /// Render the last stored report
    Report(ReportArgs),
    /// List the metrics codepulse computes
    Metrics(MetricsArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Project root
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML (default: auto-discover in the project root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: text, json, or sarif
    #[arg(short, long, env = "CODEPULSE_FORMAT")]
    pub format: Option<String>,

    /// Number of parser threads
    #[arg(short, long, env = "CODEPULSE_WORKERS")]
    pub workers: Option<usize>,

    /// Extensions to scan, comma-separated (e.g. "go,c,h")
    #[arg(long = "ext", env = "CODEPULSE_EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Exit with status 1 when the report has warnings
    #[arg(long)]
    pub strict: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Project root
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format: text, json, or sarif
    #[arg(short, long, env = "CODEPULSE_FORMAT", default_value = DEFAULT_FORMAT)]
    pub format: String,
}

#[derive(Args)]
pub struct MetricsArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log filter for `EnvFilter` when RUST_LOG is unset.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "codepulse=debug"
    } else {
        "warn"
    }
}

fn resolve_root(path: &Path) -> anyhow::Result<PathBuf> {
    path.canonicalize()
        .map_err(|e| anyhow::anyhow!("cannot access path {:?}: {}", path, e))
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs, out: &mut dyn Write) -> anyhow::Result<i32> {
    let root = resolve_root(&args.path)?;
    let config = Config::load(args.config.as_deref(), &root)?;

    // Flags beat the config file.
    let format = args
        .format
        .clone()
        .or_else(|| config.format.clone())
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string());
    let renderers = RendererRegistry::default();
    let renderer = renderers.require(&format)?;

    let workers = args.workers.or(config.workers);
    if workers == Some(0) {
        anyhow::bail!("workers must be at least 1");
    }

    let analyzers = AnalyzerRegistry::with_thresholds(config.smells);
    let extensions: Vec<String> = if !args.extensions.is_empty() {
        args.extensions
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect()
    } else if !config.extensions.is_empty() {
        config.extensions.clone()
    } else {
        analyzers.extensions().into_iter().map(String::from).collect()
    };
    debug!(?extensions, ?workers, format = %format, "resolved settings");

    let scanner = FsScanner::new(&config.excluded_paths)?;
    let orchestrator = Orchestrator::new(
        Box::new(scanner.clone()),
        Box::new(scanner),
        analyzers,
        Box::new(GitCli::new()),
        Box::new(JsonFileStore::new()),
    );

    let request = AnalysisRequest {
        root: root.clone(),
        extensions,
        workers,
    };

    let bar = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("█▓▒░  "),
        );
        bar.set_message("analyzing");
        bar
    };
    let on_progress = |done: usize, total: usize| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    };

    let result = orchestrator.execute_with_progress(&request, Some(&on_progress));
    bar.finish_and_clear();
    let report = result?;

    writeln!(out, "{}", renderer.render(&report)?)?;
    Ok(exit_code(&report, args.strict))
}

fn exit_code(report: &ProjectReport, strict: bool) -> i32 {
    if strict && !report.warnings.is_empty() {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    }
}

/// Run the report command.
pub fn run_report(args: &ReportArgs, out: &mut dyn Write) -> anyhow::Result<i32> {
    let root = resolve_root(&args.path)?;
    let renderers = RendererRegistry::default();
    let renderer = renderers.require(&args.format)?;

    let report = JsonFileStore::new().load(&root).map_err(|e| {
        anyhow::anyhow!(
            "{} (run 'codepulse analyze {}' first)",
            e,
            args.path.display()
        )
    })?;

    writeln!(out, "{}", renderer.render(&report)?)?;
    Ok(EXIT_SUCCESS)
}

/// Run the metrics command.
pub fn run_metrics(args: &MetricsArgs, out: &mut dyn Write) -> anyhow::Result<i32> {
    let catalog = metric_catalog();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&catalog)?)?;
        return Ok(EXIT_SUCCESS);
    }

    writeln!(out, "{}", "Metrics:".bold())?;
    writeln!(out)?;
    for metric in &catalog {
        writeln!(
            out,
            "  {:<34} {:<11} {}",
            metric.id.cyan(),
            metric.group.dimmed(),
            metric.description
        )?;
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn analyze_args(path: &Path) -> AnalyzeArgs {
        AnalyzeArgs {
            path: path.to_path_buf(),
            config: None,
            format: Some("json".to_string()),
            workers: Some(2),
            extensions: Vec::new(),
            strict: false,
            no_progress: true,
        }
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("calc.c"),
            "int add(int a, int b) {\n    return a + b;\n}\n\nint twice(int a) {\n    return add(a, a);\n}\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["codepulse", "-v", "analyze", "src", "--strict"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.path, PathBuf::from("src"));
                assert!(args.strict);
            }
            _ => panic!("expected analyze"),
        }

        let cli = Cli::try_parse_from(["codepulse", "report"]).unwrap();
        match cli.command {
            Commands::Report(args) => assert_eq!(args.path, PathBuf::from(".")),
            _ => panic!("expected report"),
        }

        assert!(Cli::try_parse_from(["codepulse", "lint"]).is_err());
    }

    #[test]
    fn test_analyze_then_report() {
        let dir = project();
        let mut out = Vec::new();
        let code = run_analyze(&analyze_args(dir.path()), &mut out).unwrap();
        // No git repository, so a warning exists but strict is off.
        assert_eq!(code, EXIT_SUCCESS);

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["project"]["totalFunctions"], 2);
        assert!(dir.path().join(".codepulse/report.json").is_file());

        let mut out = Vec::new();
        let args = ReportArgs {
            path: dir.path().to_path_buf(),
            format: "sarif".to_string(),
        };
        assert_eq!(run_report(&args, &mut out).unwrap(), EXIT_SUCCESS);
        let sarif: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(sarif["version"], "2.1.0");
    }

    #[test]
    fn test_ext_flag_parses_list() {
        let cli = Cli::try_parse_from(["codepulse", "analyze", "--ext", "go,c", "--ext", "h"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => assert_eq!(args.extensions, vec!["go", "c", "h"]),
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_ext_flag_overrides_config() {
        let dir = project();
        fs::write(dir.path().join("extra.cpp"), "void extra() {\n}\n").unwrap();
        fs::write(dir.path().join("codepulse.yaml"), "extensions: [cpp]\n").unwrap();

        let mut out = Vec::new();
        run_analyze(&analyze_args(dir.path()), &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["project"]["totalFunctions"], 1);

        let mut args = analyze_args(dir.path());
        args.extensions = vec!["c".to_string()];
        let mut out = Vec::new();
        run_analyze(&args, &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["project"]["totalFunctions"], 2);
    }

    #[test]
    fn test_strict_fails_on_warnings() {
        let dir = project();
        let mut args = analyze_args(dir.path());
        args.strict = true;

        let mut out = Vec::new();
        // Outside a git repository the report always carries a git warning.
        assert_eq!(run_analyze(&args, &mut out).unwrap(), EXIT_FAILED);
    }

    #[test]
    fn test_unknown_format_is_error() {
        let dir = project();
        let mut args = analyze_args(dir.path());
        args.format = Some("html".to_string());

        let err = run_analyze(&args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("unknown format"));
        assert!(!dir.path().join(".codepulse").exists());
    }

    #[test]
    fn test_report_without_analysis() {
        let dir = TempDir::new().unwrap();
        let args = ReportArgs {
            path: dir.path().to_path_buf(),
            format: "text".to_string(),
        };
        let err = run_report(&args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("codepulse analyze"));
    }

    #[test]
    fn test_metrics_json() {
        let mut out = Vec::new();
        run_metrics(&MetricsArgs { json: true }, &mut out).unwrap();
        let list: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(list.len(), metric_catalog().len());
        assert_eq!(list[0]["id"], "complexity.ccn");
    }

    #[test]
    fn test_default_log_filter() {
        assert_eq!(default_log_filter(false), "warn");
        assert_eq!(default_log_filter(true), "codepulse=debug");
    }
}
