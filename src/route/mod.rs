//! Route record subsystem.
//!
//! # Data Flow
//! ```text
//! RouteStore (find_by_service / find_by_address / find_all)
//!     → RouteRecord { rule: "<match> => <filter>" }
//!     → record.rs (split into transient RuleParts)
//!     → caller rewrites the match rule
//!     → RuleParts::combine → RouteRecord.rule
//!     → RouteStore (create / update / delete)
//! ```
//!
//! # Design Decisions
//! - `rule` is the only persisted form; match/filter halves never hit disk
//! - The store is a narrow trait so the reconciler does not care where
//!   records live
//! - No optimistic locking: a concurrent writer can clobber an update

pub mod record;
pub mod store;

pub use record::{MalformedRuleError, RouteRecord, RuleParts};
pub use store::{InMemoryRouteStore, RouteStore, StoreError, StoreResult};
