//! Retry and backoff policy.
//!
//! Classifies transport failures, HTTP statuses and disk errors into a small
//! set of kinds, and turns a kind plus attempt number into a backoff decision.
//! The run loop uses it for optional re-fetching of transient failures; the
//! artifact store uses it for write retries.

mod classify;
mod policy;
mod run;

pub use classify::{classify_curl_error, classify_http_status, classify_io, classify_transient};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
