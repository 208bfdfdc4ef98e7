use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use rulecheck_core::{
    AnalysisTarget, HarnessConfig, RuleEngine, RuleExecutionConfig, ScriptUnit, TargetVersion,
};
use rulecheck_harness::{
    check_baseline, format_record, update_requested, BaselineOutcome, HarnessError, RuleTestHarness,
};
use rulecheck_model::ScriptModelEngine;
use rulecheck_rules::{CatalogRuleEngine, RuleCatalog};

const DEFAULT_CONFIG: &str = "rulecheck.toml";

/// RuleCheck - run one analysis rule against SQL scripts and report what it finds
#[derive(Parser)]
#[command(name = "rulecheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: rulecheck.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single rule against scripts and print the problem report
    Run {
        /// Rule id to run
        #[arg(short, long)]
        rule: String,

        /// Script files or directories (*.sql, searched recursively)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Analyze the scripted model (public) or a reloaded package (package)
        #[arg(short, long)]
        target: Option<AnalysisTarget>,

        /// Package destination for the package target
        #[arg(long)]
        package_path: Option<PathBuf>,

        /// Platform version of the model
        #[arg(long = "platform")]
        platform: Option<TargetVersion>,

        /// Directory of custom rule definitions
        #[arg(long)]
        rules_dir: Option<PathBuf>,

        /// Compare the report with this baseline file
        #[arg(short, long)]
        baseline: Option<PathBuf>,

        /// Rewrite the baseline instead of comparing
        #[arg(long, requires = "baseline")]
        update_baseline: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the rules loaded for a platform version
    Rules {
        /// Platform version (default: from config)
        #[arg(long = "platform")]
        platform: Option<TargetVersion>,

        /// Directory of custom rule definitions
        #[arg(long)]
        rules_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Run {
            rule,
            paths,
            target,
            package_path,
            platform,
            rules_dir,
            baseline,
            update_baseline,
            json,
        } => {
            let mut config = config;
            if let Some(target) = target {
                config.analysis_target = target;
            }
            if let Some(path) = package_path {
                config.package_path = Some(path);
            }
            if let Some(version) = platform {
                config.target_version = version;
            }
            if let Some(dir) = rules_dir {
                config.rules_dir = Some(dir);
            }

            let options = RunOptions {
                baseline,
                update_baseline: update_baseline || update_requested(),
                json,
                verbose: cli.verbose,
            };
            run_command(&config, &rule, &paths, &options)
        }
        Commands::Rules { platform, rules_dir } => {
            let mut config = config;
            if let Some(version) = platform {
                config.target_version = version;
            }
            if let Some(dir) = rules_dir {
                config.rules_dir = Some(dir);
            }
            rules_command(&config)
        }
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<HarnessConfig> {
    if let Some(path) = path {
        return HarnessConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let default_path = Path::new(DEFAULT_CONFIG);
    if default_path.exists() {
        return HarnessConfig::from_file(default_path)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG));
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(HarnessConfig::default())
}

fn rule_catalog(config: &HarnessConfig) -> RuleCatalog {
    let mut catalog = RuleCatalog::builtin();
    if let Some(dir) = &config.rules_dir {
        catalog.load_definitions_dir(&config.resolve_path(dir));
    }
    catalog
}

struct RunOptions {
    baseline: Option<PathBuf>,
    update_baseline: bool,
    json: bool,
    verbose: bool,
}

/// Run command - one rule, one report
fn run_command(config: &HarnessConfig, rule: &str, paths: &[PathBuf], options: &RunOptions) -> Result<()> {
    let scripts = collect_scripts(paths)?;
    if scripts.is_empty() {
        anyhow::bail!("No .sql scripts found under the given paths");
    }

    if options.verbose {
        eprintln!(
            "{} {} against {} scripts ({}, {} model)",
            "Running".cyan(),
            rule,
            scripts.len(),
            config.target_version,
            config.analysis_target
        );
    }

    let mut harness = RuleTestHarness::from_config(
        Arc::new(ScriptModelEngine::new()),
        Arc::new(CatalogRuleEngine::new(rule_catalog(config))),
        config,
    )
    .with_scripts(scripts);

    let outcome = match harness.run(rule) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{} {}", "✗".red(), failure_title(&err).red().bold());
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    if options.json {
        let output = serde_json::json!({
            "rule": rule,
            "target": config.analysis_target,
            "summary": outcome.result.summary(),
            "report": &outcome.report,
            "result": &outcome.result,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", outcome.report);
        let summary = outcome.result.summary();
        eprintln!(
            "{} {} problem(s), {} suppressed",
            if summary.total_problems == 0 { "✓".green() } else { "!".yellow() },
            summary.total_problems,
            summary.suppressed
        );
    }

    if let Some(baseline) = &options.baseline {
        match check_baseline(&outcome.report, baseline, options.update_baseline) {
            Ok(BaselineOutcome::Matched) => {
                eprintln!("{} {}", "Baseline matched:".green(), baseline.display());
            }
            Ok(BaselineOutcome::Updated) => {
                eprintln!("{} {}", "Baseline updated:".green(), baseline.display());
            }
            Err(err) => {
                eprintln!("{} {}", "✗".red(), err);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn failure_title(err: &HarnessError) -> &'static str {
    match err {
        HarnessError::Argument(_) => "Invalid arguments",
        HarnessError::ModelValidation { .. } => "Model validation failed",
        HarnessError::RuleDiscovery(_) => "Rule discovery failed",
        HarnessError::AnalysisExecution(_) => "Analysis raised errors",
        HarnessError::BaselineMismatch { .. } => "Baseline mismatch",
        HarnessError::Engine(_) | HarnessError::Io { .. } => "Run failed",
    }
}

/// Rules command - list what the engine loads for a version
fn rules_command(config: &HarnessConfig) -> Result<()> {
    let engine = CatalogRuleEngine::new(rule_catalog(config));
    let service = engine
        .create_service(config.target_version, &RuleExecutionConfig::all())
        .context("Failed to create analysis service")?;

    println!("{} {}", "Rules loaded for".bold(), config.target_version.to_string().cyan());
    println!();
    for rule in service.loaded_rules() {
        let marker = if rule.requires_script { " (script)" } else { "" };
        println!("  {} [{}]{}", rule.id.green(), rule.severity, marker.dimmed());
        println!("      {}", rule.short_description);
    }

    let errors = service.load_errors();
    if !errors.is_empty() {
        println!();
        println!("{}", "Load errors:".red().bold());
        for error in &errors {
            println!("  {}", format_record(error).red());
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Gather scripts from files and directories
///
/// Directories are searched recursively for `*.sql`; results are sorted by
/// path so the model is built in the same order on every platform.
fn collect_scripts(paths: &[PathBuf]) -> Result<Vec<ScriptUnit>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && entry.path().extension().map_or(false, |ext| ext == "sql") {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            anyhow::bail!("Path not found: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(count = files.len(), "Collected scripts");

    let mut scripts = Vec::with_capacity(files.len());
    for file in files {
        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let source_name = file.display().to_string().replace('\\', "/");
        let source_name = source_name.strip_prefix("./").unwrap_or(&source_name).to_string();
        scripts.push(ScriptUnit::new(content, source_name));
    }
    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_sql_files_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tables")).unwrap();
        std::fs::write(dir.path().join("tables/b.sql"), "CREATE TABLE b (Id INT);").unwrap();
        std::fs::write(dir.path().join("tables/a.sql"), "CREATE TABLE a (Id INT);").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let scripts = collect_scripts(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].source_name.ends_with("tables/a.sql"));
        assert!(scripts[1].source_name.ends_with("tables/b.sql"));
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(collect_scripts(&[PathBuf::from("/nonexistent/scripts")]).is_err());
    }

    #[test]
    fn cli_parses_run_arguments() {
        let cli = Cli::try_parse_from([
            "rulecheck",
            "run",
            "--rule",
            "RC.Naming.TablePrefix",
            "--target",
            "package",
            "--platform",
            "sql2019",
            "db/",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { rule, target, platform, paths, .. } => {
                assert_eq!(rule, "RC.Naming.TablePrefix");
                assert_eq!(target, Some(AnalysisTarget::Package));
                assert_eq!(platform, Some(TargetVersion::Sql2019));
                assert_eq!(paths, vec![PathBuf::from("db/")]);
            }
            _ => panic!("expected run command"),
        }
    }
}
