//! Ingestion pipeline binary
//!
//! Usage: askdocs-ingest [github|docs|all] [start-date] [end-date]
//!
//! Dates are ISO (YYYY-MM-DD); the window defaults to yesterday..today UTC,
//! matching a daily scheduled run.

use chrono::{Duration, NaiveDate, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use askdocs_ingest::config::IngestConfig;
use askdocs_ingest::ingestion::github::DateRange;
use askdocs_ingest::pipeline::IngestPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askdocs_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("all");
    let range = parse_range(&args)?;

    let config = IngestConfig::from_env()?;
    tracing::info!(
        "Ingesting {} into index {} ({} to {})",
        config.github.repo,
        config.pinecone.index,
        range.start,
        range.end
    );

    let pipeline = IngestPipeline::new(&config)?;
    let reports = match command {
        "github" => pipeline.run_github(&range).await?,
        "docs" => pipeline.run_docs().await?,
        "all" => pipeline.run_all(&range).await?,
        _ => {
            eprintln!("Usage: askdocs-ingest [github|docs|all] [start-date] [end-date]");
            anyhow::bail!("Unknown command: {}", command);
        }
    };

    for report in &reports {
        println!(
            "{}: {} produced, {} skipped",
            report.step, report.produced, report.skipped
        );
    }

    Ok(())
}

/// Date window from argv, defaulting to yesterday..today (UTC)
fn parse_range(args: &[String]) -> anyhow::Result<DateRange> {
    let today = Utc::now().date_naive();

    let start = match args.get(2) {
        Some(arg) => parse_date(arg)?,
        None => today - Duration::days(1),
    };
    let end = match args.get(3) {
        Some(arg) => parse_date(arg)?,
        None => today,
    };

    Ok(DateRange::new(start, end))
}

fn parse_date(arg: &str) -> anyhow::Result<NaiveDate> {
    arg.parse()
        .map_err(|_| anyhow::anyhow!("Invalid date (expected YYYY-MM-DD): {}", arg))
}
