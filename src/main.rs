mod batch;
mod catalog;
mod config;
mod feed;
mod http;
mod marketplace;
mod metrics;
mod models;
mod normalize;
mod pipeline;
mod reconcile;
mod upload;

use config::Config;
use eyre::WrapErr;
use feed::{FeedSource, JsonFileFeed};
use models::{FailureReport, SyncReport};
use pipeline::{Pipeline, PipelineErrorKind};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => error!(target = "stocksync", "unable to render report: {err}"),
            }
            if report.succeeded() {
                return ExitCode::SUCCESS;
            }
            for failure in &report.failures {
                eprintln!("{}", failure_message(failure));
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(target = "stocksync", "sync could not start: {err:#}");
            eprintln!("Sync failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> eyre::Result<SyncReport> {
    let config = Config::from_env().wrap_err("invalid configuration")?;
    let records = JsonFileFeed::new(&config.feed_path)
        .fetch_records()
        .await
        .wrap_err("unable to load supplier feed")?;
    let pipeline = Pipeline::new(config);
    Ok(pipeline.run(&records).await)
}

fn failure_message(failure: &FailureReport) -> String {
    match failure.kind {
        PipelineErrorKind::Timeout => format!("[{}] Request timed out...", failure.target),
        PipelineErrorKind::Connection => {
            format!("[{}] {} Connection error", failure.target, failure.detail)
        }
        PipelineErrorKind::InvalidInput | PipelineErrorKind::Internal => {
            format!("[{}] {} Sync failed", failure.target, failure.detail)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
