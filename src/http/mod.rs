//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request ID assigned, traced, size and time limited
//!     → admin handlers (access lists, catalog, status)
//!     → JSON response
//! ```

pub mod server;

pub use server::{AdminServer, AppState};
