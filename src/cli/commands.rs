//! CLI definitions and dispatch for corpus-forge.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use crate::config::ForgeConfig;
use crate::llm::CompletionClient;
use crate::pipeline::{Orchestrator, StageSelection};

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "corpus-forge.yaml";

/// Instruction-tuning corpus generator.
#[derive(Parser)]
#[command(name = "corpus-forge")]
#[command(about = "Generate, merge and deduplicate LLM instruction-tuning datasets")]
#[command(version)]
#[command(
    long_about = "corpus-forge builds an instruction-tuning corpus in four stages: two LLM \
generation passes per subject, a combine pass that merges every per-subject dataset into one \
corpus with a derived text column, and a deduplication pass.\n\nExample usage:\n  \
corpus-forge --first-generation --subject math\n  corpus-forge --combine --no-duplicates"
)]
pub struct Cli {
    /// Run the first generation stage (seeded from manual questions).
    #[arg(long)]
    pub first_generation: bool,

    /// Run the second generation stage (extends the generated dataset).
    #[arg(long)]
    pub second_generation: bool,

    /// Merge every per-subject dataset into the combined corpus.
    #[arg(long)]
    pub combine: bool,

    /// Remove duplicates from the combined corpus.
    #[arg(long)]
    pub no_duplicates: bool,

    /// Subject to generate for; required with a generation stage and must
    /// be one of the configured themes.
    #[arg(long)]
    pub subject: Option<String>,

    /// Path to the YAML configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override the configured data directory.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Validate arguments and run the selected stages.
///
/// Argument problems (no stage selected, missing or unknown subject) print
/// guidance and perform no pipeline action; they are not process failures.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let mut config = if cli.config.exists() {
        ForgeConfig::from_file(&cli.config)?
    } else {
        warn!(path = %cli.config.display(), "Config file not found, using defaults");
        ForgeConfig::default()
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let selection = StageSelection {
        first_generation: cli.first_generation,
        second_generation: cli.second_generation,
        combine: cli.combine,
        no_duplicates: cli.no_duplicates,
    };

    if !selection.any() {
        print_guidance(&config, "No stage selected.");
        return Ok(());
    }

    if selection.needs_generation() {
        match cli.subject.as_deref() {
            None => {
                print_guidance(&config, "Generation stages require --subject.");
                return Ok(());
            }
            Some(subject) if !config.has_subject(subject) => {
                print_guidance(&config, &format!("Unknown subject '{}'.", subject));
                return Ok(());
            }
            Some(_) => {}
        }
    }

    std::fs::create_dir_all(&config.data_dir)?;

    // The completion client is only constructed when a generation stage
    // actually runs, so combine/dedup runs need no API key.
    let client = if selection.needs_generation() {
        Some(CompletionClient::from_env()?)
    } else {
        None
    };

    let orchestrator = Orchestrator::new(
        &config,
        client
            .as_ref()
            .map(|c| c as &dyn crate::llm::CompletionBackend),
    );
    let summary = orchestrator.run(selection, cli.subject.as_deref()).await?;

    if let Some(report) = &summary.first_generation {
        info!(
            records = report.records_appended,
            empty_iterations = report.empty_iterations,
            "First generation done"
        );
    }
    if let Some(report) = &summary.second_generation {
        info!(
            records = report.records_appended,
            empty_iterations = report.empty_iterations,
            "Second generation done"
        );
    }
    if let Some(merge) = &summary.merge {
        if merge.is_empty_corpus() {
            warn!("Combine found no generated datasets");
        } else {
            info!(files = merge.files_merged, rows = merge.rows, "Combine done");
        }
    }
    if let Some(dedup) = &summary.dedup {
        info!(kept = dedup.kept, removed = dedup.removed, "Deduplication done");
    }

    Ok(())
}

/// Print operator guidance for an argument problem.
fn print_guidance(config: &ForgeConfig, reason: &str) {
    eprintln!("{}", reason);
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  corpus-forge --first-generation --subject <name>");
    eprintln!("  corpus-forge --second-generation --subject <name>");
    eprintln!("  corpus-forge --combine [--no-duplicates]");
    eprintln!();
    let subjects: Vec<&str> = config.subjects().collect();
    if subjects.is_empty() {
        eprintln!("No subjects configured; add a 'themes' section to the config file.");
    } else {
        eprintln!("Configured subjects: {}", subjects.join(", "));
    }
}
