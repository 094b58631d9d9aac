use std::process::ExitCode;

use colored::Colorize;
use qhist_config::{HistoryConfig, LookupFailurePolicy};
use qhist_registry::HistoryQueryManager;
use qhist_types::{QueryId, QueryRecord, QueryState};
use serde_json::json;

use crate::cli::*;

/// How a command finished, for the process exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::NotFound => ExitCode::FAILURE,
        }
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<Outcome> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    let manager = HistoryQueryManager::new(config);
    qhist_sources::register_builtin_factories(&manager)?;

    match cli.command {
        Command::Lookup(args) => {
            manager.load_configured_sources()?;
            cmd_lookup(&manager, args, format)
        }
        Command::Sources(_) => {
            manager.load_configured_sources()?;
            cmd_sources(&manager, format)
        }
        Command::Factories(_) => cmd_factories(&manager, format),
    }
}

/// TOML settings (or defaults), then command-line overrides.
pub(crate) fn resolve_config(cli: &Cli) -> anyhow::Result<HistoryConfig> {
    let mut config = match &cli.config {
        Some(path) => HistoryConfig::load(path)?,
        None => HistoryConfig::default(),
    };
    if let Some(root) = &cli.root_config {
        config.root_config = root.clone();
    }
    if let Some(dir) = &cli.instance_dir {
        config.instance_config_dir = dir.clone();
    }
    if cli.isolate_failures {
        config.on_source_error = LookupFailurePolicy::Isolate;
    }
    Ok(config)
}

fn cmd_lookup(
    manager: &HistoryQueryManager,
    args: LookupArgs,
    format: OutputFormat,
) -> anyhow::Result<Outcome> {
    let id = QueryId::new(&args.query_id)?;
    let Some(record) = manager.get_query_by_id(&id)? else {
        match format {
            OutputFormat::Text => println!("Query {} not found.", id.to_string().yellow()),
            OutputFormat::Json => println!("{}", json!({ "query_id": id, "found": false })),
        }
        return Ok(Outcome::NotFound);
    };

    match format {
        OutputFormat::Text => print_record(&record),
        OutputFormat::Json => println!("{}", record.to_json_pretty()?),
    }
    Ok(Outcome::Success)
}

fn print_record(record: &QueryRecord) {
    println!("Query {}  {}", record.query_id.to_string().yellow().bold(), colored_state(record));
    if let Some(source) = &record.source_name {
        println!("  Source:  {}", source.cyan());
    }
    if let Some(user) = &record.user {
        println!("  User:    {user}");
    }
    println!("  Created: {}", record.created_at.to_rfc3339());
    if let Some(ended) = record.ended_at {
        println!("  Ended:   {}", ended.to_rfc3339());
    }
    if let Some(elapsed) = record.elapsed() {
        println!("  Elapsed: {}ms", elapsed.num_milliseconds());
    }
    if let Some(error) = &record.error {
        println!("  Error:   {}", error.red());
    }
    println!("\n{}", record.query);
}

fn colored_state(record: &QueryRecord) -> colored::ColoredString {
    let state = record.state.to_string();
    match record.state {
        QueryState::Finished => state.green(),
        QueryState::Failed => state.red().bold(),
        QueryState::Canceled => state.dimmed(),
        QueryState::Queued | QueryState::Running => state.blue(),
    }
}

fn cmd_sources(manager: &HistoryQueryManager, format: OutputFormat) -> anyhow::Result<Outcome> {
    let sources = manager.sources();
    match format {
        OutputFormat::Text => {
            if sources.is_empty() {
                println!("No history sources loaded.");
            }
            for (position, source) in sources.iter().enumerate() {
                println!(
                    "{}. {} ({}) {}",
                    position + 1,
                    source.instance().bold(),
                    source.factory().cyan(),
                    source.describe().dimmed()
                );
            }
        }
        OutputFormat::Json => {
            let listing: Vec<_> = sources
                .iter()
                .map(|s| {
                    json!({
                        "instance": s.instance(),
                        "factory": s.factory(),
                        "description": s.describe(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }
    Ok(Outcome::Success)
}

fn cmd_factories(manager: &HistoryQueryManager, format: OutputFormat) -> anyhow::Result<Outcome> {
    let names = manager.factory_names();
    match format {
        OutputFormat::Text => {
            for name in &names {
                println!("{}", name.bold());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
    }
    Ok(Outcome::Success)
}
