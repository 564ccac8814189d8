//! Command-line definition for `r53ctl`
//!
//! Every global flag can also be set through an `R53_*` environment
//! variable. Flags win over the config file.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "r53ctl",
    version,
    about = "Rate-limited hosted-zone DNS record automation"
)]
pub(crate) struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "R53_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Persist zones to this file instead of keeping them in memory
    #[arg(long, global = true, env = "R53_STATE_FILE")]
    pub(crate) state_file: Option<PathBuf>,

    /// How long submitted changes stay PENDING (in milliseconds)
    #[arg(long, global = true, env = "R53_PROPAGATION_DELAY_MS")]
    pub(crate) propagation_delay_ms: Option<u64>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, env = "R53_LOG_LEVEL", default_value = "info")]
    pub(crate) log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub(crate) json: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// List every record set in a hosted zone
    ListRecords {
        zone_id: String,
    },

    /// Point `{service}.{domain}` records at an IP address
    CreateRecord {
        zone_id: String,
        domain: String,
        ip: IpAddr,
        #[arg(required = true, num_args = 1..)]
        services: Vec<String>,
    },

    /// Delete the `{service}.{domain}` A records
    DeleteRecords {
        zone_id: String,
        domain: String,
        #[arg(required = true, num_args = 1..)]
        services: Vec<String>,
    },

    /// Create or replace a single record
    UpdateRecord {
        zone_id: String,
        name: String,
        #[arg(required = true, num_args = 1..)]
        values: Vec<String>,
        /// Record type: A, AAAA, CNAME, MX, TXT
        #[arg(long = "type", default_value = "A")]
        record_type: String,
        /// TTL in seconds (defaults to the configured record TTL)
        #[arg(long)]
        ttl: Option<u32>,
    },

    /// Show the propagation status of a change
    CheckChange {
        change_id: String,
    },

    /// Wait until a change is INSYNC
    WaitChange {
        change_id: String,
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
        #[arg(long, default_value_t = 5)]
        poll_secs: u64,
    },

    /// Create a hosted zone
    CreateHostedZone {
        domain: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// List all hosted zones
    ListHostedZones,
}

impl Cli {
    /// Effective log level after `--verbose`
    pub(crate) fn effective_log_level(&self) -> &str {
        if self.verbose { "debug" } else { &self.log_level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_record_args() {
        let cli = Cli::try_parse_from([
            "r53ctl",
            "create-record",
            "Z1234567890ABC",
            "example.com",
            "10.0.0.1",
            "api",
            "web",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Command::CreateRecord {
                zone_id: "Z1234567890ABC".to_string(),
                domain: "example.com".to_string(),
                ip: "10.0.0.1".parse().unwrap(),
                services: vec!["api".to_string(), "web".to_string()],
            }
        );
    }

    #[test]
    fn test_services_required() {
        let result = Cli::try_parse_from(["r53ctl", "delete-records", "Z1234567890ABC", "example.com"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_record_flags() {
        let cli = Cli::try_parse_from([
            "r53ctl",
            "update-record",
            "Z1234567890ABC",
            "example.com",
            "v=spf1 -all",
            "--type",
            "txt",
            "--ttl",
            "60",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(cli.effective_log_level(), "debug");
        match cli.command {
            Command::UpdateRecord { record_type, ttl, values, .. } => {
                assert_eq!(record_type, "txt");
                assert_eq!(ttl, Some(60));
                assert_eq!(values, vec!["v=spf1 -all".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_ip_rejected() {
        let result = Cli::try_parse_from([
            "r53ctl",
            "create-record",
            "Z1234567890ABC",
            "example.com",
            "not-an-ip",
            "api",
        ]);
        assert!(result.is_err());
    }
}
