//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (tasks reference existing connections and profiles)
//! - Validate value ranges (headroom below the request budget, hosts present)
//! - Detect duplicate names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::schema::AppConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate connection '{0}'")]
    DuplicateConnection(String),

    #[error("connection '{connection}' defines profile '{profile}' more than once")]
    DuplicateProfile { connection: String, profile: String },

    #[error("connection '{0}' has an empty host")]
    EmptyHost(String),

    #[error("task '{field}' references unknown connection '{connection}'")]
    UnknownConnection { field: String, connection: String },

    #[error("task '{field}' references unknown profile '{profile}' on connection '{connection}'")]
    UnknownProfile {
        field: String,
        connection: String,
        profile: String,
    },

    #[error("duplicate task field '{0}'")]
    DuplicateField(String),

    #[error("headroom_ms ({headroom_ms}) must be below timeout_ms ({timeout_ms})")]
    HeadroomExceedsBudget { headroom_ms: u64, timeout_ms: u64 },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let invocation = &config.invocation;
    if invocation.headroom_ms >= invocation.timeout_ms {
        errors.push(ValidationError::HeadroomExceedsBudget {
            headroom_ms: invocation.headroom_ms,
            timeout_ms: invocation.timeout_ms,
        });
    }

    let mut profiles: HashMap<&str, HashSet<&str>> = HashMap::new();
    for connection in &config.connections {
        if connection.host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost(connection.name.clone()));
        }
        if profiles.contains_key(connection.name.as_str()) {
            errors.push(ValidationError::DuplicateConnection(connection.name.clone()));
            continue;
        }

        let mut names = HashSet::new();
        for profile in &connection.cache {
            if !names.insert(profile.profile.as_str()) {
                errors.push(ValidationError::DuplicateProfile {
                    connection: connection.name.clone(),
                    profile: profile.profile.clone(),
                });
            }
        }
        profiles.insert(connection.name.as_str(), names);
    }

    let mut fields = HashSet::new();
    for task in &config.tasks {
        if !fields.insert(task.field.as_str()) {
            errors.push(ValidationError::DuplicateField(task.field.clone()));
        }
        match profiles.get(task.connection.as_str()) {
            None => errors.push(ValidationError::UnknownConnection {
                field: task.field.clone(),
                connection: task.connection.clone(),
            }),
            Some(names) if !names.contains(task.profile.as_str()) => {
                errors.push(ValidationError::UnknownProfile {
                    field: task.field.clone(),
                    connection: task.connection.clone(),
                    profile: task.profile.clone(),
                })
            }
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
