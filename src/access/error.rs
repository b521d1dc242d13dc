//! Error taxonomy for access list operations.

use thiserror::Error;

use crate::route::{MalformedRuleError, StoreError};
use crate::rule::ParseError;

/// Errors surfaced by the access list reconciler.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The caller's request is incomplete. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// A stored match rule violates the condition grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A stored rule is not `<match> => <filter>`.
    #[error(transparent)]
    MalformedRule(#[from] MalformedRuleError),

    /// The route store failed; passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for access list operations.
pub type AccessResult<T> = Result<T, AccessError>;
