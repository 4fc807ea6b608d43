//! Clap derive structures for the `skyport-exporter` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use skyport_config::Settings;

/// skyport-exporter -- Prometheus metrics for a Daikin Skyport thermostat
#[derive(Debug, Parser)]
#[command(
    name = "skyport-exporter",
    version,
    about = "Export Daikin Skyport thermostat readings as Prometheus metrics",
    long_about = "Polls the Daikin Skyport integrator API for one thermostat and serves\n\
        the latest readings on /metrics.\n\n\
        Credentials come from DAIKIN_API_KEY, DAIKIN_API_TOKEN and\n\
        DAIKIN_API_EMAIL, or from the config file."
)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, short = 'c', env = "SKYPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to serve /metrics on (overrides config)
    #[arg(long, short = 'l')]
    pub listen: Option<String>,

    /// Thermostat display name (overrides config)
    #[arg(long, short = 't')]
    pub thermostat: Option<String>,

    /// Validate the configuration, print it with secrets redacted, and exit
    #[arg(long)]
    pub check_config: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, env = "SKYPORT_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl Cli {
    /// Apply flag overrides on top of file and environment settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(ref listen) = self.listen {
            settings.listen.clone_from(listen);
        }
        if let Some(ref thermostat) = self.thermostat {
            settings.thermostat.clone_from(thermostat);
        }
    }
}
