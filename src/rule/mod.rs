//! Condition rule subsystem.
//!
//! # Data Flow
//! ```text
//! "consumer.host=10.0.0.1,10.0.0.2 & consumer.host!=10.0.0.9"
//!     → condition.rs (decode: tokenize separators / values)
//!     → Condition { "consumer.host" → MatchPair { matches, unmatches } }
//!     → caller mutates the MatchPair sets
//!     → condition.rs (encode: key=v1,v2&key!=v3)
//!     → rule string
//! ```
//!
//! # Design Decisions
//! - Codec is pure: no I/O, no logging, no shared state
//! - Ordered maps and sets so encoding is deterministic
//! - Parse failures always surface as `ParseError`; callers pick the policy

pub mod condition;
pub mod match_pair;

pub use condition::{decode, encode, to_rule_string, Condition, ParseError};
pub use match_pair::MatchPair;
