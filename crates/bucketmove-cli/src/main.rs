mod cli;
mod config;
mod preflight;

use std::sync::Arc;

use bucketmove_core::audit::MySqlAuditSink;
use bucketmove_core::enumeration::list_keys;
use bucketmove_core::report::{write_report, Report};
use bucketmove_core::stats::{StatsAggregator, StatsSnapshot};
use bucketmove_core::store::{ObjectStore, S3Store};
use bucketmove_core::transfer::TransferRoute;
use bucketmove_core::transfer_engine::{pool_size, TransferEngine};
use chrono::Local;
use clap::Parser;
use eyre::{bail, Result, WrapErr};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::RunConfig;
use crate::preflight::check_bucket;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = RunConfig::resolve(&cli)?;
    run(config).await
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn run(config: RunConfig) -> Result<()> {
    let stats = Arc::new(StatsAggregator::start_now());
    let src_bucket = config.source.bucket.clone();
    let dst_bucket = config.destination.bucket.clone();

    std::fs::create_dir_all(&config.report.output_dir).wrap_err_with(|| {
        format!(
            "failed to create report directory {}",
            config.report.output_dir.display()
        )
    })?;

    let audit = Arc::new(MySqlAuditSink::connect(&config.audit.url, &config.audit.table)?);
    let version = audit
        .check()
        .await
        .wrap_err("audit store connection test failed")?;
    log::info!("audit store connected (server {version}, table '{}')", config.audit.table);

    let source: Arc<dyn ObjectStore> = Arc::new(S3Store::connect(&config.source.s3_settings()).await);
    let destination: Arc<dyn ObjectStore> =
        Arc::new(S3Store::connect(&config.destination.s3_settings()).await);

    check_bucket(source.as_ref(), &src_bucket, "source").await?;
    check_bucket(destination.as_ref(), &dst_bucket, "destination").await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("interrupt received; finishing in-flight transfers");
                cancel.cancel();
            }
        });
    }

    let keys = list_keys(source.as_ref(), &src_bucket, config.source_prefix(), &cancel).await?;
    println!("Found {} files in source bucket '{src_bucket}'", keys.len());

    let total = keys.len();
    let (workers, pool_error) = if keys.is_empty() {
        println!("No files found in source bucket. Nothing to move.");
        (0, None)
    } else {
        println!(
            "Starting transfer at: {}",
            stats.snapshot().started_at.format("%Y-%m-%d %H:%M:%S")
        );
        let route = Arc::new(TransferRoute::new(
            source,
            destination,
            src_bucket.as_str(),
            dst_bucket.as_str(),
        ));
        let engine = TransferEngine::new(route, Arc::clone(&stats), audit.clone());
        match engine.run(keys, &cancel).await {
            Ok(workers) => (workers, None),
            Err(err) => (pool_size(total), Some(err)),
        }
    };

    let snapshot = stats.finalize(Local::now());
    print_summary(&snapshot);

    let report = Report::from_snapshot(&snapshot, &src_bucket, &dst_bucket, workers);
    match write_report(&config.report.output_dir, &report) {
        Ok(path) => println!("Transfer summary written to: {}", path.display()),
        Err(err) => log::error!("failed to write summary report: {err:#}"),
    }

    match Arc::try_unwrap(audit) {
        Ok(audit) => {
            if let Err(err) = audit.disconnect().await {
                log::warn!("{err:#}");
            }
        }
        Err(_) => log::debug!("audit sink still shared at shutdown; leaving pool to drop"),
    }

    if let Some(err) = pool_error {
        return Err(err);
    }
    if cancel.is_cancelled() {
        bail!(
            "run cancelled after {} of {} files",
            snapshot.completed(),
            snapshot.total_jobs
        );
    }
    println!("All files processed.");
    Ok(())
}

fn print_summary(snapshot: &StatsSnapshot) {
    if let Some(end) = snapshot.ended_at {
        println!("Transfer completed at: {}", end.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("Total duration: {:?}", snapshot.elapsed());
    println!(
        "Summary: {} total, {} success, {} errors",
        snapshot.total_jobs, snapshot.success_count, snapshot.error_count
    );
    if !snapshot.methods.is_empty() {
        println!("Methods used:");
        for (method, count) in &snapshot.methods {
            println!("   - {method}: {count} files");
        }
    }
}
