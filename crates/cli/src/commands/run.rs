//! `run` command implementation.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::{Delivery, Record, RouterConfig, RoutingKey};
use observability::{RoutingStatsAggregator, RoutingSummary};
use router::{BuiltinSinkFactory, ChildRouter, Router, RouterError};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;

/// Report printed once routing finishes
#[derive(Debug, Serialize)]
struct RunReport {
    #[serde(flatten)]
    summary: RoutingSummary,
    skipped: u64,
    destinations: usize,
}

/// Execute the `run` command
pub async fn run_router(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config).context("Invalid configuration overrides")?;

    info!(
        name = %config.name,
        policy = ?config.policy,
        sink_type = ?config.sink.sink_type,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration validated, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let router = Router::builder(BuiltinSinkFactory::from_config(&config))
        .config(&config)
        .build()
        .await
        .context("Failed to create aggregate sink")?;

    let input = open_input(args.input.as_deref()).await?;
    let mut stats = RoutingStatsAggregator::new();
    let mut skipped = 0u64;

    info!("Routing records...");

    let interrupted = tokio::select! {
        result = route_records(&router, input, &config.selector, &mut stats, &mut skipped) => {
            result?;
            false
        }
        _ = shutdown_signal() => true,
    };

    if interrupted {
        warn!(records = stats.total, "Shutdown signal received, stopping");
    } else {
        info!(records = stats.total, skipped, "Input exhausted");
    }

    let destinations = router.registry().len();
    observability::record_destination_count(destinations);
    router.shutdown().await;

    let report = RunReport {
        summary: stats.summary(),
        skipped,
        destinations,
    };
    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize summary")?;
        println!("{}", json);
    } else {
        print!("{}", report.summary);
        println!("Skipped lines: {}", report.skipped);
        println!("Destinations: {}", report.destinations);
    }

    Ok(())
}

fn apply_overrides(config: &mut RouterConfig, args: &RunArgs) {
    if let Some(ref base_path) = args.base_path {
        config.sink.base_path = base_path.clone();
    }
    if let Some(policy) = args.policy {
        config.policy = policy.into();
    }
    if let Some(level) = args.level {
        config.level = level;
    }
}

async fn open_input(path: Option<&Path>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

async fn route_records<R>(
    router: &Router<BuiltinSinkFactory>,
    input: R,
    selector: &str,
    stats: &mut RoutingStatsAggregator,
    skipped: &mut u64,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut line_no = 0usize;
    let mut children = HashMap::new();

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let record = match parse_record(&line, line_no, selector) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Skipping line");
                *skipped += 1;
                continue;
            }
        };

        let result = match record.routing_key.clone() {
            Some(key) => emit_keyed(router, &mut children, key, record).await,
            None => router.emit(record).await,
        };

        match result {
            Ok(delivery) => {
                debug!(line = line_no, ?delivery, "Record routed");
                observability::record_delivery(&delivery);
                stats.record(&delivery);
            }
            Err(e) => {
                warn!(line = line_no, identity = %e.identity(), error = %e, "Emit failed");
                observability::record_failure(e.identity(), e.kind());
                stats.record_failure(e.identity());
            }
        }
    }

    Ok(())
}

/// Emit a keyed record through the child handle for its key.
///
/// Child handles reach keyed destinations under every policy; the root
/// handle of a hierarchical router only writes to the aggregate.
async fn emit_keyed(
    router: &Router<BuiltinSinkFactory>,
    children: &mut HashMap<RoutingKey, ChildRouter<BuiltinSinkFactory>>,
    key: RoutingKey,
    record: Record,
) -> Result<Delivery, RouterError> {
    if record.level < router.minimum_level() {
        return Ok(Delivery::BelowThreshold);
    }

    let child = match children.get(&key) {
        Some(child) => child.clone(),
        None => {
            let child = router.child(key.clone()).await?;
            children.insert(key, child.clone());
            child
        }
    };
    child.emit(record).await
}

/// Parse one NDJSON line and lift the selector attribute into the routing key
fn parse_record(line: &str, line_no: usize, selector: &str) -> Result<Record, CliError> {
    serde_json::from_str::<Record>(line)
        .map(|record| record.lift_selector(selector))
        .map_err(|e| CliError::malformed_record(line_no, e.to_string()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &RouterConfig) {
    println!("\n=== Configuration Summary ===");
    println!("Name: {}", config.name);
    println!("Policy: {:?}", config.policy);
    println!("Selector attribute: {}", config.selector);
    println!("Router level: {}", config.level);
    println!("Format: {:?}", config.format.kind);
    println!(
        "Sink: {:?} at {} (level {})",
        config.sink.sink_type,
        config.sink.base_path.display(),
        config.sink.level
    );
    println!("=============================\n");
}
