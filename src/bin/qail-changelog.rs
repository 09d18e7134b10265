//! qail-changelog: build and inspect `.qcl` changelogs.
//!
//! # Usage
//!
//! ```bash
//! # Build a changelog and report problems
//! qail-changelog check db/changelog.qcl
//!
//! # Dump the changeset graph
//! qail-changelog show db/changelog.qcl --format json
//!
//! # List registered change and precondition kinds
//! qail-changelog kinds
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use qail_changelog::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qail-changelog")]
#[command(version)]
#[command(about = "Build and inspect .qcl migration changelogs", long_about = None)]
#[command(after_help = "EXAMPLES:
    qail-changelog check db/changelog.qcl
    qail-changelog show db/changelog.qcl --format json
    qail-changelog --classpath resources check classpath:db/main.qcl")]
struct Cli {
    /// Parser configuration file (default: ./qail-changelog.toml)
    #[arg(long, global = true, env = "QAIL_CHANGELOG_CONFIG")]
    config: Option<PathBuf>,

    /// Directory searched for `classpath:` paths (repeatable)
    #[arg(long, global = true)]
    classpath: Vec<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Tree,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a changelog and report changesets and warnings
    Check {
        /// Root changelog file
        file: String,
    },
    /// Print the built changeset graph
    Show {
        /// Root changelog file
        file: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "tree")]
        format: OutputFormat,
    },
    /// List the registered change and precondition kinds
    Kinds,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let parser = build_parser(cli)?;
    match &cli.command {
        Commands::Check { file } => check(&parser, file),
        Commands::Show { file, format } => show(&parser, file, *format),
        Commands::Kinds => {
            list_kinds(&parser);
            Ok(())
        }
    }
}

fn build_parser(cli: &Cli) -> Result<ChangelogParser> {
    let config = match &cli.config {
        Some(path) => ParserConfig::load(path)?,
        None => ParserConfig::discover()?,
    };

    let mut accessor = FileSystemAccessor::current_dir().context("cannot resolve working directory")?;
    for dir in &cli.classpath {
        accessor = accessor.with_classpath(dir);
    }
    Ok(ChangelogParser::new(accessor).with_config(config))
}

fn check(parser: &ChangelogParser, file: &str) -> Result<()> {
    let log = parser
        .parse(file)
        .with_context(|| format!("failed to build {}", file))?;

    let changes: usize = log.change_sets.iter().map(|cs| cs.changes.len()).sum();
    println!(
        "{} {} ({} changesets, {} changes, {} properties)",
        "✓".green(),
        log.physical_path.white().bold(),
        log.change_sets.len().to_string().cyan(),
        changes.to_string().cyan(),
        log.properties.len().to_string().cyan()
    );

    for warning in &log.warnings {
        println!("  {} {}", "⚠".yellow(), warning.to_string().yellow());
    }
    Ok(())
}

fn show(parser: &ChangelogParser, file: &str, format: OutputFormat) -> Result<()> {
    let log = parser
        .parse(file)
        .with_context(|| format!("failed to build {}", file))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&log)?);
        }
        OutputFormat::Tree => print_tree(&log),
    }
    Ok(())
}

fn print_tree(log: &ChangeLog) {
    println!("{} {}", "ChangeLog".cyan().bold(), log.file_path().white());
    if let Some(contexts) = &log.contexts {
        println!("  {} {}", "context:".dimmed(), contexts.as_str());
    }
    if let Some(preconditions) = &log.preconditions {
        println!("  {} {} nested", "preConditions:".dimmed(), preconditions.nested.len());
    }

    for cs in &log.change_sets {
        let mut flags = Vec::new();
        if cs.always_run {
            flags.push("runAlways");
        }
        if cs.run_on_change {
            flags.push("runOnChange");
        }
        if cs.ignore {
            flags.push("ignore");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        println!();
        println!(
            "  {} {}::{}::{}{}",
            "•".cyan(),
            cs.file_path.dimmed(),
            cs.author.yellow(),
            cs.id.white().bold(),
            flags.dimmed()
        );
        for change in &cs.changes {
            println!("      {} {}", "+".green(), describe(change));
        }
        for change in &cs.rollback {
            println!("      {} {}", "-".red(), describe(change));
        }
    }
}

fn describe(change: &Change) -> String {
    let target = ["tableName", "viewName", "sequenceName", "indexName", "sql"]
        .iter()
        .find_map(|key| change.text(key));
    match target {
        Some(target) => {
            let target: String = target.lines().next().unwrap_or_default().chars().take(60).collect();
            format!("{} {}", change.kind, target.white())
        }
        None => change.kind.clone(),
    }
}

fn list_kinds(parser: &ChangelogParser) {
    println!("{}", "Change kinds".cyan().bold());
    for name in parser.changes().names() {
        println!("  {}", name);
    }
    println!();
    println!("{}", "Preconditions".cyan().bold());
    for name in parser.preconditions().names() {
        println!("  {}", name);
    }
    println!();
    println!("{}", "includeAll plugins".cyan().bold());
    for name in parser.plugins().names() {
        println!("  {}", name);
    }
}
