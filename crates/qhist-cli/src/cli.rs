use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "qhist",
    about = "Look up historical queries across configured history sources",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with manager settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root history properties file (overrides the TOML setting)
    #[arg(long, global = true)]
    pub root_config: Option<PathBuf>,

    /// Directory of per-instance properties files (overrides the TOML setting)
    #[arg(long, global = true)]
    pub instance_dir: Option<PathBuf>,

    /// Skip failing sources instead of aborting the lookup
    #[arg(long, global = true)]
    pub isolate_failures: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Find a query by id in the configured sources
    Lookup(LookupArgs),
    /// List loaded sources in lookup order
    Sources(SourcesArgs),
    /// List registered source factories
    Factories(FactoriesArgs),
}

#[derive(Args)]
pub struct LookupArgs {
    pub query_id: String,
}

#[derive(Args)]
pub struct SourcesArgs {}

#[derive(Args)]
pub struct FactoriesArgs {}
