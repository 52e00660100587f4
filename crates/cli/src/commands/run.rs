//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::workload::{Outage, Workload, WorkloadConfig};
use contracts::{saturating_millis, DispatcherBlueprint};

/// Execute the `run` command
pub async fn run_workload(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    let failover = &blueprint.failover;
    info!(
        primary = %blueprint.primary.name,
        secondary = %blueprint.secondary.name,
        primary_timeout_ms = failover.primary_timeout_ms,
        secondary_timeout_ms = saturating_millis(failover.secondary_timeout()),
        failover_medium = failover.failover_medium,
        failover_dangerous = failover.failover_dangerous,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let workload_config = WorkloadConfig {
        blueprint,
        calls: args.calls,
        concurrency: args.concurrency,
        key_space: args.key_space,
        outage: args.outage_after.map(|after_calls| Outage {
            after_calls,
            duration: Duration::from_millis(args.outage_ms),
        }),
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let workload = Workload::new(workload_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting workload...");

    tokio::select! {
        result = workload.run() => {
            let stats = result.context("Workload execution failed")?;
            info!(
                calls = stats.calls.total_calls,
                failovers = stats.dispatch.failovers,
                dual_failures = stats.dispatch.dual_failures,
                duration_secs = stats.duration.as_secs_f64(),
                throughput = format!("{:.2}", stats.throughput()),
                "Workload completed"
            );

            stats.print_summary();
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping workload...");
        }
    }

    info!("Failover dispatch finished");
    Ok(())
}

/// CLI flags win over file values
fn apply_overrides(blueprint: &mut DispatcherBlueprint, args: &RunArgs) {
    let failover = &mut blueprint.failover;

    if let Some(ms) = args.primary_timeout_ms {
        info!(primary_timeout_ms = ms, "Overriding primary timeout from CLI");
        failover.primary_timeout_ms = ms;
    }
    if let Some(ms) = args.secondary_timeout_ms {
        info!(secondary_timeout_ms = ms, "Overriding secondary timeout from CLI");
        failover.secondary_timeout_ms = Some(ms);
    }
    if args.failover_medium {
        failover.failover_medium = true;
    }
    if args.failover_dangerous {
        warn!("Failover enabled for dangerous operations, writes may land on both endpoints");
        failover.failover_dangerous = true;
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
fn print_config_summary(blueprint: &DispatcherBlueprint) {
    let failover = &blueprint.failover;

    println!("\n=== Configuration Summary ===\n");
    println!("Endpoints:");
    println!(
        "  Primary: {} (latency {}ms, failure rate {})",
        blueprint.primary.name, blueprint.primary.latency_ms, blueprint.primary.failure_rate
    );
    println!(
        "  Secondary: {} (latency {}ms, failure rate {})",
        blueprint.secondary.name, blueprint.secondary.latency_ms, blueprint.secondary.failure_rate
    );

    println!("\nFailover:");
    println!("  Primary timeout: {}ms", failover.primary_timeout_ms);
    println!(
        "  Secondary timeout: {}ms",
        failover.secondary_timeout().as_millis()
    );
    println!("  Medium eligible: {}", failover.failover_medium);
    println!("  Dangerous eligible: {}", failover.failover_dangerous);
    println!("  Cooldowns (ms): {:?}", failover.cooldowns_ms);
    if let Some(reset) = failover.stable_reset_ms {
        println!("  Counter reset after: {}ms stable", reset);
    }

    println!();
}
