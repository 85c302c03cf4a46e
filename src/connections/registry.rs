//! Connection registry.
//!
//! # Responsibilities
//! - Hold every upstream connection by name
//! - Hand out per-request copies that callers may mutate freely
//! - Resolve named cache profiles
//!
//! # Design Decisions
//! - Built once at startup, read-only afterwards (shared via Arc, no locks)
//! - Unknown names are errors, never silent `None`

use std::collections::HashMap;
use thiserror::Error;

use crate::config::schema::ConnectionConfig;
use crate::connections::connection::Connection;
use crate::connections::profile::CacheProfile;

/// Errors from registry construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),

    #[error("unknown connection '{0}'")]
    UnknownConnection(String),

    #[error("unknown cache profile '{profile}' on connection '{connection}'")]
    UnknownProfile { connection: String, profile: String },
}

/// Immutable set of upstream connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration.
    pub fn from_config(configs: &[ConnectionConfig]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(Connection::from_config(config))?;
        }
        tracing::debug!(connections = ?registry.names(), "Connection registry built");
        Ok(registry)
    }

    /// Add a connection. Names must be unique.
    pub fn register(&mut self, connection: Connection) -> Result<(), RegistryError> {
        if self.connections.contains_key(connection.name()) {
            return Err(RegistryError::DuplicateConnection(connection.name().to_string()));
        }
        self.connections.insert(connection.name().to_string(), connection);
        Ok(())
    }

    /// Get a copy of the named connection.
    pub fn get(&self, name: &str) -> Result<Connection, RegistryError> {
        self.connections
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownConnection(name.to_string()))
    }

    /// Resolve a cache profile on a connection.
    pub fn cache_profile(&self, connection: &str, profile: &str) -> Result<&CacheProfile, RegistryError> {
        let conn = self
            .connections
            .get(connection)
            .ok_or_else(|| RegistryError::UnknownConnection(connection.to_string()))?;

        conn.profile(profile).ok_or_else(|| RegistryError::UnknownProfile {
            connection: connection.to_string(),
            profile: profile.to_string(),
        })
    }

    /// Sorted connection names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn registry() -> ConnectionRegistry {
        let mut registry = ConnectionRegistry::new();
        registry
            .register(
                Connection::new("demo", "https", "api.example.net")
                    .with_profile(CacheProfile::new("games", 600))
                    .with_profile(CacheProfile::new("prediction", 1)),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = registry();
        let err = registry
            .register(Connection::new("demo", "https", "other.example.net"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateConnection("demo".into()));
        assert_eq!(registry.get("demo").unwrap().host(), "api.example.net");
    }

    #[test]
    fn test_unknown_connection_fails() {
        let registry = registry();
        for name in ["", "weather", "DEMO", "demo "] {
            assert_eq!(
                registry.get(name).unwrap_err(),
                RegistryError::UnknownConnection(name.to_string())
            );
        }
    }

    #[test]
    fn test_get_returns_defensive_copy() {
        let registry = registry();
        let mut copy = registry.get("demo").unwrap();
        copy.set_path("/games/");
        copy.set_timeout(Duration::from_millis(10));

        let fresh = registry.get("demo").unwrap();
        assert_eq!(fresh.path(), None);
        assert_eq!(fresh.timeout(), None);
    }

    #[test]
    fn test_cache_profile_lookup() {
        let registry = registry();
        assert_eq!(registry.cache_profile("demo", "games").unwrap().default_expiration_in_seconds, 600);
        assert!(matches!(
            registry.cache_profile("demo", "weather"),
            Err(RegistryError::UnknownProfile { .. })
        ));
        assert!(matches!(
            registry.cache_profile("nope", "games"),
            Err(RegistryError::UnknownConnection(_))
        ));
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = registry();
        registry.register(Connection::new("alpha", "https", "a.test")).unwrap();
        assert_eq!(registry.names(), vec!["alpha", "demo"]);
        assert_eq!(registry.len(), 2);
    }
}
