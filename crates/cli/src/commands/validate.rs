//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{FormatKind, RouterConfig, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

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
    name: String,
    policy: String,
    selector: String,
    level: String,
    format: String,
    sink_type: String,
    base_path: String,
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

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(summarize(&config)),
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

fn summarize(config: &RouterConfig) -> ConfigSummary {
    ConfigSummary {
        name: config.name.clone(),
        policy: format!("{:?}", config.policy).to_lowercase(),
        selector: config.selector.clone(),
        level: config.level.to_string(),
        format: format!("{:?}", config.format.kind).to_lowercase(),
        sink_type: format!("{:?}", config.sink.sink_type).to_lowercase(),
        base_path: config.sink.base_path.display().to_string(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RouterConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.sink.level < config.level {
        warnings.push(format!(
            "sink.level ({}) is below the router level ({}) and has no effect",
            config.sink.level, config.level
        ));
    }

    if config.sink.sink_type == SinkType::Log && config.format.kind == FormatKind::Json {
        warnings.push("JSON lines are re-emitted through the process log, not written to files".to_string());
    }

    if config.format.kind == FormatKind::Pattern && !config.format.pattern.contains("{message}") {
        warnings.push("format.pattern has no {message} placeholder".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Name: {}", summary.name);
            println!("  Policy: {}", summary.policy);
            println!("  Selector: {}", summary.selector);
            println!("  Level: {}", summary.level);
            println!("  Format: {}", summary.format);
            println!("  Sink: {} ({})", summary.sink_type, summary.base_path);
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
