//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `PDFSEAL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `PDFSEAL_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `PDFSEAL_ENCRYPTION__TIMEOUT=2m` sets the `encryption.timeout` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! PDFSEAL_PORT=8080
//!
//! # Point at a different temp directory
//! PDFSEAL_DATA_DIR=/var/lib/pdfseal
//!
//! # Override nested values
//! PDFSEAL_LIMITS__MAX_UPLOAD_BYTES=10485760
//! PDFSEAL_ENCRYPTION__BINARY=/usr/local/bin/qpdf
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PDFSEAL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Directory where per-request temporary files (staged uploads and encrypted
    /// outputs) are written. Created at startup if missing.
    pub data_dir: PathBuf,
    /// Resource limits for protecting system capacity
    pub limits: LimitsConfig,
    /// External encryption tool configuration
    pub encryption: EncryptionConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

/// Resource limits for protecting system capacity.
///
/// The upload ceiling bounds both memory and disk usage per request, since the
/// upload is buffered before staging and re-read whole in inline mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum upload size in bytes. Default: 50MB
    pub max_upload_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// External encryption tool configuration.
///
/// The encryption parameters themselves (256-bit keys, all document permissions
/// disabled) are a fixed policy of the service, not configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncryptionConfig {
    /// Path to the qpdf binary (resolved via PATH when not absolute)
    pub binary: PathBuf,
    /// Maximum time the external process may run before being killed
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("qpdf"),
            timeout: Duration::from_secs(30),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests.
    /// Must be false while a wildcard origin is configured.
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // The service is meant to be callable from arbitrary API clients
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: Some(3600),
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_dir: PathBuf::from("./data"),
            limits: LimitsConfig::default(),
            encryption: EncryptionConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("PDFSEAL_").split("__"))
    }

    /// Check invariants that serde defaults cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.limits.max_upload_bytes == 0 {
            return Err("limits.max_upload_bytes must be greater than zero".to_string());
        }
        if self.encryption.timeout.is_zero() {
            return Err("encryption.timeout must be greater than zero".to_string());
        }
        if self.encryption.binary.as_os_str().is_empty() {
            return Err("encryption.binary must not be empty".to_string());
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }
        if self.cors.allow_credentials
            && self.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard))
        {
            return Err("cors.allow_credentials cannot be combined with a wildcard origin".to_string());
        }
        Ok(())
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
