//! Resilience and accounting for backend calls.
//!
//! - Retry with backoff for transient provider failures
//! - Token and cost accounting

mod retry;
mod usage;

pub use retry::RetryPolicy;
pub use usage::{LlmUsage, UsageTracker};
