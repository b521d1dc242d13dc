//! Access list administration over condition-rule routes.

pub mod access;
pub mod admin;
pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod route;
pub mod rule;

pub use access::AccessListReconciler;
pub use config::AdminConfig;
pub use http::AdminServer;
pub use lifecycle::Shutdown;
