//! Layered configuration for the exporter.
//!
//! Built-in defaults, then an optional TOML file, then `DAIKIN_*`
//! environment variables, validated and translated into
//! `skyport_core::ExporterConfig` plus the listen address.
//! Core never sees these types.

use std::collections::BTreeMap;
use std::env::VarError;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skyport_core::config::{
    DEFAULT_BASE_URL, DEFAULT_THERMOSTAT, DEFAULT_TOKEN_MARGIN, MIN_POLL_INTERVAL,
};
use skyport_core::{Credentials, ExporterConfig};

/// Prefix for environment overrides (`DAIKIN_API_KEY`, `DAIKIN_LISTEN`, ...).
pub const ENV_PREFIX: &str = "DAIKIN_";

/// Keys taken from the environment as exact text. `Env` types its values,
/// so `DAIKIN_API_KEY=00123` would otherwise arrive as the integer 123.
const VERBATIM_KEYS: [&str; 4] = ["api_key", "api_token", "api_email", "thermostat"];

const REDACTED: &str = "[REDACTED]";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential `{key}`: set {env} or add `{key}` to the config file")]
    MissingCredential { key: &'static str, env: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Merged settings, before validation.
///
/// Durations are whole seconds, matching the file and env formats.
#[derive(Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Integrator API key (`x-api-key`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Integrator token used to mint bearer tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Account email the integrator token belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_email: Option<String>,

    /// Thermostat display name.
    pub thermostat: String,

    /// Address the metrics endpoint binds to.
    pub listen: String,

    pub base_url: String,

    pub poll_interval: u64,

    pub timeout: u64,

    pub token_margin: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_token: None,
            api_email: None,
            thermostat: DEFAULT_THERMOSTAT.into(),
            listen: "0.0.0.0:8000".into(),
            base_url: DEFAULT_BASE_URL.into(),
            poll_interval: MIN_POLL_INTERVAL.as_secs(),
            timeout: 30,
            token_margin: DEFAULT_TOKEN_MARGIN.as_secs(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| REDACTED);
        f.debug_struct("Settings")
            .field("api_key", &redact(&self.api_key))
            .field("api_token", &redact(&self.api_token))
            .field("api_email", &redact(&self.api_email))
            .field("thermostat", &self.thermostat)
            .field("listen", &self.listen)
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .field("token_margin", &self.token_margin)
            .finish()
    }
}

/// Validated configuration ready for the binary.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub exporter: ExporterConfig,
    pub listen: SocketAddr,
}

impl Settings {
    /// Validate and build the runtime configuration.
    pub fn into_runtime_config(self) -> Result<RuntimeConfig, ConfigError> {
        let api_key = required(self.api_key, "api_key")?;
        let api_token = required(self.api_token, "api_token")?;
        let api_email = required(self.api_email, "api_email")?;

        let thermostat = self.thermostat.trim();
        if thermostat.is_empty() {
            return Err(ConfigError::invalid("thermostat", "must not be empty"));
        }

        let listen: SocketAddr = self.listen.trim().parse().map_err(|_| {
            ConfigError::invalid("listen", format!("expected host:port, got '{}'", self.listen))
        })?;

        let base_url = url::Url::parse(self.base_url.trim())
            .map_err(|e| ConfigError::invalid("base_url", format!("{e}: {}", self.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "base_url",
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let poll_interval = Duration::from_secs(self.poll_interval);
        if poll_interval < MIN_POLL_INTERVAL {
            return Err(ConfigError::invalid(
                "poll_interval",
                format!(
                    "must be at least {}s, got {}s",
                    MIN_POLL_INTERVAL.as_secs(),
                    self.poll_interval
                ),
            ));
        }
        if self.timeout == 0 {
            return Err(ConfigError::invalid("timeout", "must be greater than zero"));
        }
        if self.token_margin == 0 {
            return Err(ConfigError::invalid("token_margin", "must be greater than zero"));
        }

        let mut exporter = ExporterConfig::new(Credentials::new(api_key, api_token, api_email));
        exporter.thermostat = thermostat.to_owned();
        exporter.base_url = self.base_url.trim().to_owned();
        exporter.timeout = Duration::from_secs(self.timeout);
        exporter.poll_interval = poll_interval;
        exporter.token_margin = Duration::from_secs(self.token_margin);

        Ok(RuntimeConfig { exporter, listen })
    }

    /// Settings as TOML with credential values replaced.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let redact = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_owned());
        let shown = Self {
            api_key: redact(&self.api_key),
            api_token: redact(&self.api_token),
            api_email: redact(&self.api_email),
            ..self.clone()
        };
        Ok(toml::to_string_pretty(&shown)?)
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential {
            key,
            env: env_var_for(key),
        })
}

fn env_var_for(key: &'static str) -> &'static str {
    match key {
        "api_key" => "DAIKIN_API_KEY",
        "api_token" => "DAIKIN_API_TOKEN",
        _ => "DAIKIN_API_EMAIL",
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Default config file location via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "skyport", "skyport-exporter").map_or_else(
        || PathBuf::from("skyport-exporter.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Merge defaults, the config file and the environment.
///
/// An explicitly given `path` must exist; the default location is
/// optional.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) if !p.is_file() => {
            return Err(ConfigError::FileNotFound {
                path: p.display().to_string(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&file))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&VERBATIM_KEYS))
        .merge(Serialized::defaults(verbatim_env()?))
        .extract()?;
    Ok(settings)
}

fn verbatim_env() -> Result<BTreeMap<&'static str, String>, ConfigError> {
    let mut values = BTreeMap::new();
    for key in VERBATIM_KEYS {
        let var = format!("{ENV_PREFIX}{}", key.to_ascii_uppercase());
        match std::env::var(&var) {
            Ok(value) => {
                values.insert(key, value);
            }
            Err(VarError::NotPresent) => {}
            Err(VarError::NotUnicode(_)) => {
                return Err(ConfigError::invalid(key, format!("{var} is not valid UTF-8")));
            }
        }
    }
    Ok(values)
}
