use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "postlens", about = "Postlens: revision diffs and account analysis", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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
    /// Show a token-level diff between two texts
    Diff(DiffArgs),
    /// Find a reachable API base
    Health(HealthArgs),
    /// Analyze an account through the server queue
    Analyze(AnalyzeArgs),
    /// Show population-wide averages
    Stats(StatsArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub original: String,
    pub updated: String,
    /// Treat ORIGINAL and UPDATED as file paths
    #[arg(long)]
    pub files: bool,
}

#[derive(Args)]
pub struct HealthArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct StatsArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    pub username: String,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Total attempts for the analyze request
    #[arg(long)]
    pub attempts: Option<u32>,
    #[arg(long)]
    pub base_delay_ms: Option<u64>,
    /// Ask the server to skip its cache
    #[arg(long)]
    pub force_refresh: bool,
}
