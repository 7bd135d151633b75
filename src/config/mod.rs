//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (--config)
//!     → loader.rs (defaults, then environment, then CLI TLS paths)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to the supervisor at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All optional fields have defaults; only the database settings and
//!   the application port are required
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, TlsFiles};
pub use schema::{
    DatabaseConfig, HealthConfig, LimitsConfig, LogFormat, ObservabilityConfig, ServerConfig,
    ServiceConfig, TimeoutConfig, TlsConfig,
};
pub use validation::ValidationError;
