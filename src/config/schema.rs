//! Configuration schema definitions.
//!
//! All types derive Serde traits so a TOML file can provide the base
//! configuration; environment variables and CLI flags are layered on top
//! by the loader.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Port the health-probe listener binds when not configured.
pub const DEFAULT_HEALTH_PORT: u16 = 3040;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Document store connection.
    pub database: DatabaseConfig,

    /// Plain application listener.
    pub server: ServerConfig,

    /// Optional encrypted application listener.
    pub tls: TlsConfig,

    /// Health-probe listener.
    pub health: HealthConfig,

    /// Request and shutdown deadlines.
    pub timeouts: TimeoutConfig,

    /// Application traffic limits.
    pub limits: LimitsConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Document store connection settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URI; the scheme selects the driver.
    pub uri: String,

    /// Database name.
    pub name: String,

    /// Collection holding the notes.
    pub collection: String,
}

/// Plain listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface all listeners bind to.
    pub host: String,

    /// Application port. Required.
    pub port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
        }
    }
}

/// Encrypted listener configuration.
///
/// The listener only starts when all three values are present.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    pub port: Option<u16>,

    /// Path to certificate file (PEM).
    pub cert_path: Option<PathBuf>,

    /// Path to private key file (PEM).
    pub key_path: Option<PathBuf>,
}

impl TlsConfig {
    /// Port, certificate and key when the encrypted listener is enabled.
    pub fn enabled(&self) -> Option<(u16, &Path, &Path)> {
        let cert = self.cert_path.as_deref().filter(|p| !p.as_os_str().is_empty())?;
        let key = self.key_path.as_deref().filter(|p| !p.as_os_str().is_empty())?;
        Some((self.port?, cert, key))
    }
}

/// Health-probe listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HEALTH_PORT,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request deadline on application listeners.
    pub request_secs: u64,

    /// Shared deadline for stopping every listener.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 30,
        }
    }
}

/// Limits applied to application traffic only.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum concurrently handled application requests.
    pub max_in_flight: usize,

    /// Maximum request body size in bytes.
    pub body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 1024,
            body_bytes: 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub log_filter: String,

    pub log_format: LogFormat,

    /// Serve Prometheus metrics on the health listener.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "notes_service=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}
