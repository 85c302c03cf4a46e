//! Upstream connection subsystem.
//!
//! # Data Flow
//! ```text
//! [[connections]] in config
//!     → connection.rs (Connection + shared cache profiles)
//!     → registry.rs (name → Connection, built once)
//!     → per-task clone (path override, timeout)
//!     → upstream fetcher / cache port
//! ```
//!
//! # Design Decisions
//! - Connections are immutable in the registry; tasks mutate private copies
//! - Secrets stay in the environment and are resolved at request build time

pub mod connection;
pub mod parameter;
pub mod profile;
pub mod registry;

pub use connection::Connection;
pub use parameter::ParameterValue;
pub use profile::CacheProfile;
pub use registry::{ConnectionRegistry, RegistryError};
