use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use postlens_client::{
    AnalyzeOptions, AnalyzeRequest, ApiClient, ClientConfig, GlobalStats, QueueProgress,
};
use postlens_diff::{diff_strings, SegmentKind, TextDiff};
use postlens_queue::RetryPolicy;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, format),
        Command::Health(args) => cmd_health(args, format).await,
        Command::Analyze(args) => cmd_analyze(args, format).await,
        Command::Stats(args) => cmd_stats(args, format).await,
    }
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (original, updated) = if args.files {
        (read_text(&args.original)?, read_text(&args.updated)?)
    } else {
        (args.original, args.updated)
    };

    let diff = diff_strings(&original, &updated);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
        OutputFormat::Text => {
            println!("{}", render_diff(&diff));
            println!("{}", summary_line(&diff));
        }
    }
    Ok(())
}

async fn cmd_health(args: HealthArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let client = ApiClient::from_config(config);
    let base = client.resolve_api_base().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "api_base": base })),
        OutputFormat::Text => println!("{} API base: {}", "✓".green().bold(), base.bold()),
    }
    Ok(())
}

async fn cmd_analyze(args: AnalyzeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut options = AnalyzeOptions::from(&config);
    if args.attempts.is_some() || args.base_delay_ms.is_some() {
        options.retry = RetryPolicy::new(
            args.attempts.unwrap_or(options.retry.attempts),
            args.base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(options.retry.base_delay),
        );
    }

    let client = ApiClient::from_config(config);
    let mut request = AnalyzeRequest::new(args.username);
    request.force_refresh = args.force_refresh;
    debug!(?options, "starting analysis");

    let quiet = format == OutputFormat::Json;
    let analysis = client
        .analyze(&request, &options, |progress| {
            if !quiet {
                eprintln!("{}", progress_line(progress));
            }
        })
        .await
        .with_context(|| format!("analysis of {} failed", request.username))?;

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn cmd_stats(args: StatsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::from_config(load_config(args.config.as_deref())?);
    let stats = client.global_stats().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => {
            for (label, value) in stats_rows(&stats) {
                println!("  {:<20} {}", label.bold(), value);
            }
        }
    }
    Ok(())
}

fn stats_rows(stats: &GlobalStats) -> Vec<(&'static str, String)> {
    vec![
        ("karma per item", format!("{:.1}", stats.karma_per_item)),
        ("activity per day", format!("{:.2}", stats.activity_per_day)),
        ("comment length", format!("{:.0}", stats.comment_length)),
        ("controversy", format!("{:.1}%", stats.controversy_pct)),
        ("type-token ratio", format!("{:.1}%", stats.ttr)),
        ("night activity", format!("{:.1}%", stats.night_pct)),
        ("weekend activity", format!("{:.1}%", stats.weekend_pct)),
        ("subreddits", format!("{:.0}", stats.subreddit_count)),
        ("karma efficiency", format!("{:.1}", stats.karma_efficiency)),
        ("users", stats.total_users.to_string()),
    ]
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ClientConfig::default()),
    }
}

fn read_text(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

fn render_diff(diff: &TextDiff) -> String {
    diff.iter()
        .map(|segment| match segment.kind {
            SegmentKind::Equal => segment.value.normal(),
            SegmentKind::Insert => segment.value.green().underline(),
            SegmentKind::Delete => segment.value.red().strikethrough(),
        })
        .map(|styled| styled.to_string())
        .collect()
}

fn summary_line(diff: &TextDiff) -> String {
    if diff.is_unchanged() {
        return "No changes.".to_string();
    }
    format!(
        "{} insertion(s) (+{} chars), {} deletion(s) (-{} chars)",
        diff.insertions(),
        diff.inserted_chars(),
        diff.deletions(),
        diff.deleted_chars()
    )
}

fn progress_line(progress: &QueueProgress) -> String {
    let mut line = format!("  {} {}", "queue:".cyan(), progress.status);
    if let Some(position) = progress.position {
        line.push_str(&format!(", position {position}"));
    }
    if let Some(eta) = progress.eta_seconds {
        line.push_str(&format!(", eta {eta:.0}s"));
    }
    line
}
