//! Configuration loading.
//!
//! Layering, lowest precedence first: schema defaults, optional TOML
//! file, environment variables, CLI-supplied TLS material.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const DATABASE_URI: &str = "DATABASE_URI";
pub const DATABASE_NAME: &str = "DATABASE_NAME";
pub const DATABASE_COLLECTION: &str = "DATABASE_COLLECTION";
pub const SERVER_PORT: &str = "SERVER_PORT";
pub const SERVER_TLS_PORT: &str = "SERVER_TLS_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Certificate and key paths supplied at process start.
#[derive(Debug, Clone, Default)]
pub struct TlsFiles {
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

/// Load the base configuration from a TOML file, or defaults without one.
pub fn load_file(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ServiceConfig::default());
    };

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Override configuration values from the environment.
///
/// `lookup` abstracts the environment so callers can supply any source.
/// Empty values count as unset.
pub fn apply_env<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(uri) = get(DATABASE_URI) {
        config.database.uri = uri;
    }
    if let Some(name) = get(DATABASE_NAME) {
        config.database.name = name;
    }
    if let Some(collection) = get(DATABASE_COLLECTION) {
        config.database.collection = collection;
    }
    if let Some(port) = get(SERVER_PORT) {
        config.server.port = Some(parse_port(SERVER_PORT, &port)?);
    }
    if let Some(port) = get(SERVER_TLS_PORT) {
        config.tls.port = Some(parse_port(SERVER_TLS_PORT, &port)?);
    }

    Ok(())
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Build and validate the full configuration.
pub fn load_config<F>(
    path: Option<&Path>,
    lookup: F,
    tls: TlsFiles,
) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = load_file(path)?;
    apply_env(&mut config, lookup)?;

    if tls.cert_path.is_some() {
        config.tls.cert_path = tls.cert_path;
    }
    if tls.key_path.is_some() {
        config.tls.key_path = tls.key_path;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
