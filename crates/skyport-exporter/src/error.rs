//! Binary error types with miette diagnostics.
//!
//! Only startup can fail; once the poller and server are running, cycle
//! errors are logged by the poller and never reach this type.

use std::net::SocketAddr;

use miette::Diagnostic;
use thiserror::Error;

use skyport_config::ConfigError;
use skyport_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const RUNTIME: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const BIND: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum ExporterError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Missing credential: {env} is not set")]
    #[diagnostic(
        code(skyport::missing_credential),
        help(
            "Export {env}, or set `{key}` in the config file.\n\
             All of DAIKIN_API_KEY, DAIKIN_API_TOKEN and DAIKIN_API_EMAIL are required."
        )
    )]
    MissingCredential { key: &'static str, env: &'static str },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(skyport::no_config),
        help("Check the --config path, or omit it to use the default location.")
    )]
    ConfigNotFound { path: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(skyport::config),
        help("Run with --check-config to see the merged settings.")
    )]
    InvalidConfig { message: String },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(skyport::bind),
        help("Is another process using the port? Choose another with --listen.")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Metrics server failed")]
    #[diagnostic(code(skyport::server))]
    Server(#[source] std::io::Error),

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Startup failed: {message}")]
    #[diagnostic(code(skyport::runtime))]
    Runtime { message: String },
}

impl ExporterError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredential { .. }
            | Self::ConfigNotFound { .. }
            | Self::InvalidConfig { .. } => exit_code::CONFIG,
            Self::Bind { .. } => exit_code::BIND,
            Self::Server(_) | Self::Runtime { .. } => exit_code::RUNTIME,
        }
    }
}

impl From<ConfigError> for ExporterError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingCredential { key, env } => Self::MissingCredential { key, env },
            ConfigError::FileNotFound { path } => Self::ConfigNotFound { path },
            other => Self::InvalidConfig {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for ExporterError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => Self::InvalidConfig { message },
            other => Self::Runtime {
                message: other.to_string(),
            },
        }
    }
}
