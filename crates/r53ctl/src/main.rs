// # r53ctl - Hosted-Zone Record Tool
//
// Thin command-line shell over r53-core. Parses arguments, loads
// configuration, builds the limiter registry and backend, runs exactly one
// operation and maps its outcome to an exit code. All DNS logic, pacing and
// error classification live in r53-core.
//
// ## Configuration
//
// Precedence, highest first: flags, `R53_*` environment variables, the
// JSON file given by `--config`, built-in defaults.
//
// - `R53_CONFIG`: JSON configuration file
// - `R53_STATE_FILE`: Zone file (selects the file backend)
// - `R53_PROPAGATION_DELAY_MS`: How long changes stay PENDING
// - `R53_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export R53_STATE_FILE=/var/lib/r53/zones.json
//
// r53ctl create-hosted-zone example.com
// r53ctl create-record Z0000000000001 example.com 10.0.0.1 api web
// r53ctl wait-change C0000000000002 --timeout-secs 60
// ```

mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use r53_core::config::{AutomationConfig, BackendConfig};
use r53_core::traits::{HostedZone, ResourceRecordSet};
use r53_core::{ClassifiedError, DnsOperations, DnsRecord, ErrorKind, ProtectedExecutor, RecordType};
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Command};

/// Exit codes for the outcome of one command
///
/// - 0: Success
/// - 1: Configuration or input validation error
/// - 2: Runtime error (unexpected)
/// - 3..=6: Classified remote failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum R53ExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    NotFound = 3,
    PermissionDenied = 4,
    Throttled = 5,
    Timeout = 6,
}

impl R53ExitCode {
    fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => R53ExitCode::ConfigError,
            ErrorKind::NotFound => R53ExitCode::NotFound,
            ErrorKind::PermissionDenied | ErrorKind::Credentials => R53ExitCode::PermissionDenied,
            ErrorKind::Throttled => R53ExitCode::Throttled,
            ErrorKind::Timeout => R53ExitCode::Timeout,
            ErrorKind::Generic => R53ExitCode::RuntimeError,
        }
    }

    /// Pick the exit code for a failed command
    fn for_error(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<ClassifiedError>())
            .map(|classified| Self::for_kind(classified.kind()))
            .unwrap_or(R53ExitCode::RuntimeError)
    }
}

impl From<R53ExitCode> for ExitCode {
    fn from(code: R53ExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_level) = parse_level(cli.effective_log_level()) else {
        eprintln!(
            "Log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            cli.log_level
        );
        return R53ExitCode::ConfigError.into();
    };

    // Logs go to stderr so stdout carries only results.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return R53ExitCode::ConfigError.into();
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return R53ExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return R53ExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(&cli, &config).await {
            Ok(()) => R53ExitCode::Success,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                R53ExitCode::for_error(&e)
            }
        }
    });

    result.into()
}

/// Merge the config file with flag overrides
fn load_config(cli: &Cli) -> Result<AutomationConfig> {
    let mut config = match &cli.config {
        Some(path) => AutomationConfig::from_json_file(path)?,
        None => AutomationConfig::new(),
    };

    let delay_ms = cli
        .propagation_delay_ms
        .unwrap_or_else(|| config.backend.propagation_delay().as_millis() as u64);

    config.backend = match (&cli.state_file, &config.backend) {
        (Some(path), _) => BackendConfig::File {
            path: path.clone(),
            propagation_delay_ms: delay_ms,
        },
        (None, BackendConfig::File { path, .. }) => BackendConfig::File {
            path: path.clone(),
            propagation_delay_ms: delay_ms,
        },
        (None, BackendConfig::Memory { .. }) => BackendConfig::Memory {
            propagation_delay_ms: delay_ms,
        },
    };

    config.validate()?;
    debug!("Using configuration: {:?}", config);
    Ok(config)
}

/// Run one command to completion
async fn run(cli: &Cli, config: &AutomationConfig) -> Result<()> {
    let executor = ProtectedExecutor::from_config(&config.limits)?;
    let api = r53_core::zone::open_backend(&config.backend)
        .await
        .context("Failed to open hosted-zone backend")?;
    let ops = DnsOperations::new(Arc::clone(&api), executor).with_default_ttl(config.records.ttl);

    match &cli.command {
        Command::ListRecords { zone_id } => {
            let records = ops.list_records(zone_id).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("Found {} records in zone {}:", records.len(), zone_id);
                for record in &records {
                    println!("  {}", format_record(record));
                }
            }
        }
        Command::CreateRecord {
            zone_id,
            domain,
            ip,
            services,
        } => {
            let info = ops.create_dns_records(zone_id, domain, *ip, services.as_slice()).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Created DNS records");
                println!("   Zone ID: {}", zone_id);
                println!("   Domain: {}", domain);
                println!("   IP: {}", ip);
                println!("   Services: {}", services.join(", "));
                println!("   Change ID: {} ({})", info.id, info.status);
            }
        }
        Command::DeleteRecords {
            zone_id,
            domain,
            services,
        } => {
            let info = ops.delete_dns_records(zone_id, domain, services.as_slice()).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Deleted DNS records");
                println!("   Services: {}", services.join(", "));
                println!("   Change ID: {} ({})", info.id, info.status);
            }
        }
        Command::UpdateRecord {
            zone_id,
            name,
            values,
            record_type,
            ttl,
        } => {
            let record_type: RecordType = record_type.parse()?;
            let record = DnsRecord::new(record_type, name.clone(), values.as_slice())?
                .with_ttl(ttl.unwrap_or(config.records.ttl));
            let info = ops.upsert_record(zone_id, &record).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Updated {} record {}", record_type, name);
                println!("   Change ID: {} ({})", info.id, info.status);
            }
        }
        Command::CheckChange { change_id } => {
            let status = ops.get_change_status(change_id).await?;
            if cli.json {
                println!("{}", serde_json::json!({ "id": change_id, "status": status }));
            } else {
                println!("Change {} status: {}", change_id, status);
            }
        }
        Command::WaitChange {
            change_id,
            timeout_secs,
            poll_secs,
        } => {
            ops.wait_for_change(
                change_id,
                Duration::from_secs(*poll_secs),
                Duration::from_secs(*timeout_secs),
            )
            .await?;
            println!("Change {} is INSYNC", change_id);
        }
        Command::CreateHostedZone { domain, comment } => {
            let zone = ops.create_hosted_zone(domain, comment.as_deref()).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&zone)?);
            } else {
                println!("Created hosted zone {}", format_zone(&zone));
            }
        }
        Command::ListHostedZones => {
            let zones = ops.list_hosted_zones().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&zones)?);
            } else {
                println!("Found {} hosted zones:", zones.len());
                for zone in &zones {
                    println!("  {}", format_zone(zone));
                }
            }
        }
    }

    debug!("{} backend handled {} command", api.api_name(), command_name(&cli.command));
    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::ListRecords { .. } => "list-records",
        Command::CreateRecord { .. } => "create-record",
        Command::DeleteRecords { .. } => "delete-records",
        Command::UpdateRecord { .. } => "update-record",
        Command::CheckChange { .. } => "check-change",
        Command::WaitChange { .. } => "wait-change",
        Command::CreateHostedZone { .. } => "create-hosted-zone",
        Command::ListHostedZones => "list-hosted-zones",
    }
}

fn format_record(record: &ResourceRecordSet) -> String {
    let value = match &record.alias_target {
        Some(alias) => format!("ALIAS -> {}", alias.dns_name),
        None => record.values.join(", "),
    };
    format!("{:<6} {:<40} {}", record.record_type, record.name, value)
}

fn format_zone(zone: &HostedZone) -> String {
    format!(
        "{:<40} {} ({} records)",
        zone.name, zone.id, zone.record_set_count
    )
}
