//! Retry policy: applied uniformly to every outbound connector call.
//!
//! ```text
//! Request → [RetryPolicy + RetryPredicate] → [ConnectorTransport]
//! ```

pub mod predicate;
pub mod retry;

pub use predicate::{NeverRetry, PatternPredicate, RetryPredicate};
pub use retry::{RetryConfig, RetryPolicy};
