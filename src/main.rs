mod cli;
mod error;
mod fetcher;
mod models;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::Args;
use fetcher::{FetchOptions, Fetcher};
use models::RunSummary;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if !Path::new(&args.link_file).exists() {
        return Err(anyhow!("Link file not found: {}", args.link_file));
    }

    let tasks = models::load_tasks(&args.link_file)?;
    println!("Loaded {} tasks from {}", tasks.len(), args.link_file);

    let mut options = FetchOptions {
        min_bytes: args.min_bytes,
        delay: Duration::from_millis(args.delay_ms),
        timeout: Duration::from_secs(args.timeout_secs),
        max_redirects: args.max_redirects,
        ..FetchOptions::default()
    };
    if let Some(user_agent) = args.user_agent {
        options.user_agent = user_agent;
    }
    options.referer = args.referer;

    // Failing to create the output directory is the one fatal error; no task
    // could succeed without it.
    let fetcher = Fetcher::new(&args.output, options)?;

    let summary = fetcher.run(tasks).await;
    print_summary(&summary, &args.output);

    Ok(())
}

fn print_summary(summary: &RunSummary, output_dir: &str) {
    println!("\n{}", "=".repeat(60));
    println!("DOWNLOAD SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Succeeded: {}", summary.succeeded);
    println!("Failed: {}", summary.failed);
    println!(
        "Total size: {:.2} MB",
        summary.total_bytes as f64 / 1024.0 / 1024.0
    );
    println!("Output directory: {output_dir}");

    if summary.failed > 0 {
        println!("\nFailed downloads:");
        for result in &summary.results {
            if let Err(e) = &result.outcome {
                println!("  {}: {}", result.task.file_name, e);
            }
        }
    }
}
