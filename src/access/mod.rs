//! Access list (black/white list) subsystem.
//!
//! # Data Flow
//! ```text
//! list(service?, address?)
//!     → RouteStore.find_* (force routes only)
//!     → split rule → decode match rule → consumer.host MatchPair
//!     → AccessEntry per matched (denied) / unmatched (allowed) address
//!
//! grant(services, addresses, allow) / revoke([(service, address)])
//!     → RouteStore.find_by_service
//!     → decode → mutate consumer.host → encode
//!     → RouteStore.create / update / delete
//! ```
//!
//! # Design Decisions
//! - Listing tolerates corrupt records (logged, skipped); mutation never does
//! - A record whose access clause empties out is deleted, not left blank
//! - Read-modify-write against the store is not isolated; callers that need
//!   strict consistency must serialize writes per service

pub mod error;
pub mod normalize;
pub mod reconciler;
pub mod types;

pub use error::{AccessError, AccessResult};
pub use normalize::{AddressNormalizer, HostNormalizer};
pub use reconciler::{AccessListReconciler, CONSUMER_HOST};
pub use types::{AccessEntry, CreateAccessControl, RevokeEntry};
