//! Retryability predicates.
//!
//! The retry loop only asks "is this failure worth another attempt?".
//! How that is decided (pattern match on the error text today) lives here.

use regex::Regex;

use crate::error::TransportError;

/// Decides whether a failed connector call may be retried.
pub trait RetryPredicate: Send + Sync + 'static {
    fn is_retryable(&self, error: &TransportError) -> bool;
}

/// Matches the rendered error text against a configured regular expression.
#[derive(Debug, Clone)]
pub struct PatternPredicate {
    pattern: Regex,
}

impl PatternPredicate {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl RetryPredicate for PatternPredicate {
    fn is_retryable(&self, error: &TransportError) -> bool {
        self.pattern.is_match(&error.to_string())
    }
}

/// Treats every failure as permanent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn is_retryable(&self, _error: &TransportError) -> bool {
        false
    }
}
