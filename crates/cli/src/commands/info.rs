//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{saturating_millis, DangerClass, DispatcherBlueprint, OperationKind};
use dispatcher::{CooldownSchedule, FailoverPolicy};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    primary: EndpointInfo,
    secondary: EndpointInfo,
    failover: FailoverInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    operations: Vec<OperationInfo>,
}

#[derive(Serialize)]
struct EndpointInfo {
    name: String,
    latency_ms: u64,
    failure_rate: f64,
}

#[derive(Serialize)]
struct FailoverInfo {
    primary_timeout_ms: u64,
    secondary_timeout_ms: u64,
    eligible_tiers: Vec<DangerClass>,
    /// Cooldown for switch counts 0, 1, 2 and beyond
    cooldowns_ms: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stable_reset_ms: Option<u64>,
    lane_capacity: usize,
}

#[derive(Serialize)]
struct OperationInfo {
    operation: OperationKind,
    danger: DangerClass,
    failover: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &DispatcherBlueprint, args: &InfoArgs) -> ConfigInfo {
    let failover = &blueprint.failover;
    let policy = FailoverPolicy::from_config(failover);

    // Validated configs always carry at least one step
    let schedule = CooldownSchedule::new(failover.cooldowns()).unwrap_or_default();
    let steps = failover.cooldowns_ms.len().max(3) as u64;
    let cooldowns_ms = (0..steps)
        .map(|count| saturating_millis(schedule.cooldown(count)))
        .collect();

    let eligible_tiers = [DangerClass::Safe, DangerClass::Medium, DangerClass::Dangerous]
        .into_iter()
        .filter(|class| policy.is_eligible(*class))
        .collect();

    let operations = if args.operations {
        OperationKind::ALL
            .iter()
            .map(|kind| OperationInfo {
                operation: *kind,
                danger: kind.danger_class(),
                failover: policy.allows(*kind),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        primary: endpoint_info(&blueprint.primary),
        secondary: endpoint_info(&blueprint.secondary),
        failover: FailoverInfo {
            primary_timeout_ms: failover.primary_timeout_ms,
            secondary_timeout_ms: saturating_millis(failover.secondary_timeout()),
            eligible_tiers,
            cooldowns_ms,
            stable_reset_ms: failover.stable_reset_ms,
            lane_capacity: failover.lane_capacity,
        },
        operations,
    }
}

fn endpoint_info(config: &contracts::EndpointConfig) -> EndpointInfo {
    EndpointInfo {
        name: config.name.clone(),
        latency_ms: config.latency_ms,
        failure_rate: config.failure_rate,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Failover Dispatch Configuration                ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🔌 Endpoints ({:?})", info.version);
    for (label, endpoint, prefix) in [
        ("Primary", &info.primary, "├─"),
        ("Secondary", &info.secondary, "└─"),
    ] {
        println!(
            "   {} {}: {} (latency {}ms, failure rate {})",
            prefix, label, endpoint.name, endpoint.latency_ms, endpoint.failure_rate
        );
    }

    let failover = &info.failover;
    println!("\n⏱️  Failover");
    println!("   ├─ Primary timeout: {}ms", failover.primary_timeout_ms);
    println!("   ├─ Secondary timeout: {}ms", failover.secondary_timeout_ms);
    println!("   ├─ Eligible tiers: {:?}", failover.eligible_tiers);
    println!("   ├─ Lane capacity: {}", failover.lane_capacity);
    match failover.stable_reset_ms {
        Some(reset) => println!("   ├─ Counter reset: after {}ms stable", reset),
        None => println!("   ├─ Counter reset: never"),
    }
    println!("   └─ Switchback cooldowns:");
    let last = failover.cooldowns_ms.len().saturating_sub(1);
    for (count, cooldown) in failover.cooldowns_ms.iter().enumerate() {
        let prefix = if count == last { "└─" } else { "├─" };
        let suffix = if count == last { "+" } else { "" };
        println!("      {} switch #{}{}: {}ms", prefix, count, suffix, cooldown);
    }

    if !info.operations.is_empty() {
        println!("\n🧭 Operations ({})", info.operations.len());
        for (i, op) in info.operations.iter().enumerate() {
            let prefix = if i == info.operations.len() - 1 { "└─" } else { "├─" };
            let marker = if op.failover { "failover" } else { "pinned" };
            println!(
                "   {} {} ({}) - {}",
                prefix, op.operation, op.danger, marker
            );
        }
    }

    println!();
}
