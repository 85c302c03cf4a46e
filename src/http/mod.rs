//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handler)
//!     → request.rs (request ID, client metadata, query, deadline)
//!     → tasks / dispatch (fan-out)
//!     → response.rs (assemble fields or error envelope, add headers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_EXEC_MS};
pub use response::ResponseEnvelope;
pub use server::{AppState, HttpServer};
