//! Configuration validation.
//!
//! # Responsibilities
//! - Required values are present (database, application port)
//! - Value ranges (timeouts > 0, limits > 0)
//! - Listeners do not collide on a port
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before any listener starts

use thiserror::Error;

use crate::config::loader::{DATABASE_COLLECTION, DATABASE_NAME, DATABASE_URI, SERVER_PORT};
use crate::config::schema::ServiceConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("env var {0} is empty")]
    Missing(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{first} and {second} listeners both use port {port}")]
    PortConflict {
        first: &'static str,
        second: &'static str,
        port: u16,
    },
}

/// Validate a fully layered configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database.uri.is_empty() {
        errors.push(ValidationError::Missing(DATABASE_URI));
    }
    if config.database.name.is_empty() {
        errors.push(ValidationError::Missing(DATABASE_NAME));
    }
    if config.database.collection.is_empty() {
        errors.push(ValidationError::Missing(DATABASE_COLLECTION));
    }
    if config.server.port.is_none() {
        errors.push(ValidationError::Missing(SERVER_PORT));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.shutdown_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.shutdown_secs"));
    }
    if config.limits.max_in_flight == 0 {
        errors.push(ValidationError::Zero("limits.max_in_flight"));
    }
    if config.limits.body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.body_bytes"));
    }

    // Port 0 asks the OS for an ephemeral port, so it never collides.
    let mut ports: Vec<(&'static str, u16)> = Vec::new();
    if let Some(port) = config.server.port {
        ports.push(("http", port));
    }
    if let Some((port, _, _)) = config.tls.enabled() {
        ports.push(("https", port));
    }
    ports.push(("health", config.health.port));

    for (i, (first, a)) in ports.iter().enumerate() {
        for (second, b) in &ports[i + 1..] {
            if *a != 0 && a == b {
                errors.push(ValidationError::PortConflict {
                    first: *first,
                    second: *second,
                    port: *a,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
