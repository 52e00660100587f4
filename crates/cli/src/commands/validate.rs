//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use contracts::{saturating_millis, DispatcherBlueprint};

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    primary: String,
    secondary: String,
    primary_timeout_ms: u64,
    secondary_timeout_ms: u64,
    cooldown_steps: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    primary: blueprint.primary.name.clone(),
                    secondary: blueprint.secondary.name.clone(),
                    primary_timeout_ms: blueprint.failover.primary_timeout_ms,
                    secondary_timeout_ms: saturating_millis(blueprint.failover.secondary_timeout()),
                    cooldown_steps: blueprint.failover.cooldowns_ms.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &DispatcherBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let failover = &blueprint.failover;

    if failover.failover_medium {
        warnings.push(
            "failover_medium is enabled - non-idempotent writes may be applied on both endpoints"
                .to_string(),
        );
    }
    if failover.failover_dangerous {
        warnings.push(
            "failover_dangerous is enabled - counters and conditional writes may be applied twice"
                .to_string(),
        );
    }

    if failover.secondary_timeout() < failover.primary_timeout() {
        warnings.push(format!(
            "secondary timeout ({}ms) is shorter than primary timeout ({}ms)",
            failover.secondary_timeout().as_millis(),
            failover.primary_timeout_ms
        ));
    }

    if blueprint.primary.latency_ms >= failover.primary_timeout_ms {
        warnings.push(format!(
            "primary '{}' latency ({}ms) meets or exceeds primary timeout - every eligible call will fail over",
            blueprint.primary.name, blueprint.primary.latency_ms
        ));
    }

    if failover.stable_reset_ms.is_some() {
        warnings.push(
            "stable_reset_ms is set - switch counter resets after stable periods".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Primary: {}", summary.primary);
            println!("  Secondary: {}", summary.secondary);
            println!(
                "  Timeouts: {}ms / {}ms",
                summary.primary_timeout_ms, summary.secondary_timeout_ms
            );
            println!("  Cooldown steps: {}", summary.cooldown_steps);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config(
            r#"
[failover]
primary_timeout_ms = 20
secondary_timeout_ms = 5
failover_dangerous = true

[primary]
name = "a"

[secondary]
name = "b"
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };

        let result = validate_config(&args);
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2, "{warnings:?}");
        assert!(warnings.iter().any(|w| w.contains("failover_dangerous")));
        assert!(warnings.iter().any(|w| w.contains("shorter than primary")));
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config(
            r#"
[primary]
name = "same"

[secondary]
name = "same"
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };

        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("duplicate endpoint name"));
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/failover.toml".into(),
            json: false,
        };
        assert!(run_validate(&args).is_err());
    }
}
