use clap::Parser;
use clap_complete::Shell;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::endpoint::Endpoint;
use crate::engine::types::SpeedTestConfig;

/// Which output mode was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Tui,
    Simple,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

/// Multi-connection HTTP speed test with a live terminal gauge
#[derive(Parser, Debug)]
#[command(name = "devspeedtest", version, about)]
pub struct Cli {
    /// Number of latency probes
    #[arg(long = "latency-probes", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub latency_probes: u32,

    /// Latency in ms recorded for a failed probe
    #[arg(long = "fallback-latency", value_name = "MS", default_value_t = 100.0)]
    pub fallback_latency: f64,

    /// Download trial sizes in MB, run in order
    #[arg(long = "download-sizes", value_name = "MB", value_delimiter = ',', default_values_t = [1.0, 2.0, 5.0, 10.0])]
    pub download_sizes: Vec<f64>,

    /// Upload trial sizes in MB, run in order
    #[arg(long = "upload-sizes", value_name = "MB", value_delimiter = ',', default_values_t = [1.0, 2.0, 5.0])]
    pub upload_sizes: Vec<f64>,

    /// Parallel connections per download trial
    #[arg(long = "download-connections", default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub download_connections: u32,

    /// Parallel connections per upload trial
    #[arg(long = "upload-connections", default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub upload_connections: u32,

    /// Timeout for server and latency probes in ms (500-5000)
    #[arg(long = "probe-timeout", value_name = "MS", default_value_t = 5000)]
    pub probe_timeout: u64,

    /// Test server as URL[,download-path,upload-path,ping-path]; repeat to
    /// supply several candidates
    #[arg(long = "server", value_name = "SERVER", value_parser = parse_endpoint)]
    pub servers: Vec<Endpoint>,

    /// Skip the connection info lookup
    #[arg(long = "no-metadata")]
    pub no_metadata: bool,

    /// Do not persist the result
    #[arg(long = "no-save")]
    pub no_save: bool,

    /// Where the last result is stored
    #[arg(long = "results-file", value_name = "PATH")]
    pub results_file: Option<PathBuf>,

    /// Print the last saved result and exit
    #[arg(long)]
    pub last: bool,

    /// One-line output (no TUI)
    #[arg(long)]
    pub simple: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,

    /// Pretty JSON output
    #[arg(long = "json-pretty")]
    pub json_pretty: bool,

    /// CSV output
    #[arg(long)]
    pub csv: bool,

    /// Plain-text report with quality ratings
    #[arg(long)]
    pub summary: bool,

    /// Force IPv4 with optional source address
    #[arg(long, num_args = 0..=1, default_missing_value = "0.0.0.0", conflicts_with = "ipv6")]
    pub ipv4: Option<String>,

    /// Force IPv6 with optional source address
    #[arg(long, num_args = 0..=1, default_missing_value = "::", conflicts_with = "ipv4")]
    pub ipv6: Option<String>,

    /// Generate shell completions
    #[arg(long = "generate-completion", value_name = "SHELL")]
    pub completion: Option<Shell>,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.simple {
            OutputMode::Simple
        } else if self.json {
            OutputMode::Json
        } else if self.json_pretty {
            OutputMode::JsonPretty
        } else if self.csv {
            OutputMode::Csv
        } else if self.summary {
            OutputMode::Summary
        } else {
            OutputMode::Tui
        }
    }

    pub fn to_config(&self) -> SpeedTestConfig {
        let defaults = SpeedTestConfig::default();
        SpeedTestConfig {
            endpoints: if self.servers.is_empty() {
                defaults.endpoints
            } else {
                self.servers.clone()
            },
            latency_probes: self.latency_probes,
            fallback_latency_ms: self.fallback_latency,
            download_sizes_mb: self.download_sizes.clone(),
            upload_sizes_mb: self.upload_sizes.clone(),
            download_connections: self.download_connections,
            upload_connections: self.upload_connections,
            probe_timeout: Duration::from_millis(self.probe_timeout),
            lookup_metadata: !self.no_metadata,
            ..defaults
        }
    }

    /// Source address to bind, if `--ipv4` or `--ipv6` was given.
    pub fn local_address(&self) -> Result<Option<IpAddr>, String> {
        self.ipv4
            .as_deref()
            .or(self.ipv6.as_deref())
            .map(|addr| {
                addr.parse::<IpAddr>()
                    .map_err(|e| format!("invalid source address {addr}: {e}"))
            })
            .transpose()
    }
}

fn parse_endpoint(input: &str) -> Result<Endpoint, String> {
    input.parse()
}
