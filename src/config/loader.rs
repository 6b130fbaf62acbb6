//! Configuration loading from disk, flags and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

use crate::config::schema::{LogFormat, ProxyConfig, SecretKey};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("PROXY_KEY environment variable is required")]
    MissingSecretKey,

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command line flags. Every flag can also be set through its environment variable.
#[derive(Debug, Default, Parser)]
#[command(name = "bot-proxy", version)]
#[command(about = "Key-gated reverse proxy for bot APIs", long_about = None)]
pub struct Args {
    /// Optional TOML configuration file
    #[arg(short, long, env = "PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Shared secret clients put before the first '_' of the path token
    #[arg(short, long, env = "PROXY_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Upstream API origin
    #[arg(long, env = "UPSTREAM_URL")]
    pub upstream: Option<String>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the process configuration: file (if any), then flags and env on top.
pub fn resolve(args: &Args) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(key) = &args.key {
        config.auth.secret_key = SecretKey::new(key.clone());
    }
    if let Some(port) = args.port {
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }
    if let Some(upstream) = &args.upstream {
        config.upstream.base_url = upstream.clone();
    }
    if let Some(format) = args.log_format {
        config.observability.log_format = format;
    }

    if config.auth.secret_key.is_empty() {
        return Err(ConfigError::MissingSecretKey);
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

fn with_port(bind_address: &str, port: u16) -> String {
    match bind_address.parse::<SocketAddr>() {
        Ok(mut addr) => {
            addr.set_port(port);
            addr.to_string()
        }
        Err(_) => format!("0.0.0.0:{port}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(key: Option<&str>) -> Args {
        Args {
            key: key.map(str::to_string),
            ..Args::default()
        }
    }

    #[test]
    fn missing_key_is_fatal() {
        assert!(matches!(resolve(&args(None)), Err(ConfigError::MissingSecretKey)));
    }

    #[test]
    fn key_and_port_from_flags() {
        let mut args = args(Some("abc"));
        args.port = Some(9000);

        let config = resolve(&args).unwrap();
        assert_eq!(config.auth.secret_key.expose(), "abc");
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.upstream.base_url, "https://api.telegram.org");
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[listener]
bind_address = "127.0.0.1:7000"
max_connections = 64

[upstream]
base_url = "http://127.0.0.1:7001"

[auth]
secret_key = "fromfile"

[observability]
log_format = "json"
"#
        )
        .unwrap();

        let mut args = args(Some("fromflag"));
        args.config = Some(file.path().to_path_buf());
        args.port = Some(7002);

        let config = resolve(&args).unwrap();
        assert_eq!(config.auth.secret_key.expose(), "fromflag");
        assert_eq!(config.listener.bind_address, "127.0.0.1:7002");
        assert_eq!(config.listener.max_connections, 64);
        assert_eq!(config.upstream.base_url, "http://127.0.0.1:7001");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn load_config_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[auth]\nsecret_key = \"a_b\"\n").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(!err.to_string().contains("a_b"));
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/bot-proxy.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bot-proxy.toml"));
    }
}
