//! Upstream caching subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher task
//!     → port.rs (CacheAccessPort: profile + fetcher + connection)
//!     → memory.rs (key lookup)
//!         hit   → stored body
//!         miss  → fetcher → expiration.rs (TTL / interval) → store
//!         error → stale body if one exists, else UpstreamError
//! ```
//!
//! # Design Decisions
//! - The dispatcher only sees the port; storage is swappable
//! - Profiles, not call sites, own expiry policy

pub mod expiration;
pub mod memory;
pub mod port;

pub use memory::MemoryCache;
pub use port::{CacheAccessPort, CacheStatus, CachedResult};
