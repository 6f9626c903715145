//! The sequential sweep loop.
//!
//! Visits every id of the range in ascending order with one request in
//! flight, folds each result into `RunStatistics`, appends one audit row per
//! attempted id, sleeps the politeness delay between requests, and stops early
//! on repeated auth failures, persistence failures, or an abort request.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::audit::{LogRecord, RecordSink};
use crate::config::SweepConfig;
use crate::control::AbortToken;
use crate::error::SweepError;
use crate::fetch::Fetch;
use crate::progress::ProgressStats;
use crate::range::RefRange;
use crate::result::{FetchResult, ResultKind};
use crate::retry::{classify_transient, RetryDecision, RetryPolicy};

/// Loop parameters derived from the config; immutable for the whole run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub delay: Duration,
    pub auth_failure_threshold: u32,
    pub progress_every: u64,
    /// Re-fetch policy for retryable transient errors.
    pub retry: RetryPolicy,
    /// Ids settled by an earlier run; never fetched.
    pub skip: BTreeSet<u64>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&SweepConfig::default())
    }
}

impl RunSettings {
    pub fn from_config(cfg: &SweepConfig) -> Self {
        Self {
            delay: Duration::from_secs_f64(cfg.delay_secs.max(0.0)),
            auth_failure_threshold: cfg.auth_failure_threshold.max(1),
            progress_every: cfg.progress_every.max(1),
            retry: cfg
                .retry
                .as_ref()
                .map(RetryPolicy::from_config)
                .unwrap_or_else(RetryPolicy::single_attempt),
            skip: BTreeSet::new(),
        }
    }
}

/// Per-kind counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub successful: u64,
    pub not_found: u64,
    pub auth_required: u64,
    pub errors: u64,
    pub skipped: u64,
    pub total_checked: u64,
    #[serde(rename = "elapsed_seconds", serialize_with = "secs_f64")]
    pub elapsed: Duration,
}

impl RunStatistics {
    fn record(&mut self, kind: ResultKind) {
        match kind {
            ResultKind::Success => self.successful += 1,
            ResultKind::NotFound => self.not_found += 1,
            ResultKind::AuthRequired => self.auth_required += 1,
            ResultKind::TransientError => self.errors += 1,
        }
    }
}

fn secs_f64<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Every id in the range was visited.
    Completed,
    /// Consecutive auth-required results reached the threshold at `last_id`.
    AuthExhausted { last_id: u64 },
    /// Abort requested; `last_id` is the last id attempted, if any.
    Interrupted { last_id: Option<u64> },
    /// An artifact or audit row could not be written.
    PersistenceFailed { id: u64, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub stats: RunStatistics,
    pub termination: Termination,
}

/// Receives results and progress as the loop runs.
pub trait RunObserver {
    fn on_result(&mut self, _id: u64, _result: &FetchResult) {}
    fn on_progress(&mut self, _stats: &ProgressStats) {}
}

/// Observer that ignores everything.
pub struct NullObserver;
impl RunObserver for NullObserver {}

/// Sweep `range` with `fetcher`, writing one record per attempted id to `sink`.
///
/// Never fails: every way the loop can stop is described by the returned
/// `Termination`, and statistics are always returned so a summary can be
/// written.
pub fn run_range<F, S>(
    range: RefRange,
    settings: &RunSettings,
    fetcher: &mut F,
    sink: &mut S,
    observer: &mut dyn RunObserver,
    abort: &AbortToken,
) -> RunReport
where
    F: Fetch + ?Sized,
    S: RecordSink + ?Sized,
{
    let started = Instant::now();
    let mut stats = RunStatistics::default();
    let mut consecutive_auth = 0u32;
    let mut last_attempted: Option<u64> = None;
    let mut termination = Termination::Completed;

    tracing::info!(
        start = range.start(),
        end = range.end(),
        skip = settings.skip.len(),
        "sweep started"
    );

    for id in range.iter() {
        if settings.skip.contains(&id) {
            stats.skipped += 1;
            continue;
        }
        if abort.is_aborted() {
            termination = Termination::Interrupted {
                last_id: last_attempted,
            };
            break;
        }
        if last_attempted.is_some() && !abort.sleep(settings.delay) {
            termination = Termination::Interrupted {
                last_id: last_attempted,
            };
            break;
        }

        let outcome = fetch_with_retry(fetcher, id, settings, abort);
        last_attempted = Some(id);
        stats.total_checked += 1;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                stats.errors += 1;
                let reason = e.to_string();
                tracing::error!(id, "halting: {}", reason);
                let record = LogRecord {
                    id,
                    status: ResultKind::TransientError.label(),
                    detail: reason.clone(),
                    size: None,
                    url: e.url().unwrap_or_default().to_string(),
                    sha256: None,
                };
                if let Err(e) = sink.append(&record) {
                    tracing::error!(id, "audit log write failed: {}", e);
                }
                termination = Termination::PersistenceFailed { id, reason };
                break;
            }
        };

        stats.record(result.kind());
        log_result(id, &result);
        observer.on_result(id, &result);

        if let Err(e) = sink.append(&LogRecord::from_result(id, &result)) {
            tracing::error!(id, "audit log write failed: {}", e);
            termination = Termination::PersistenceFailed {
                id,
                reason: format!("audit log: {}", e),
            };
            break;
        }

        if result.kind() == ResultKind::AuthRequired {
            consecutive_auth += 1;
            if consecutive_auth >= settings.auth_failure_threshold {
                tracing::warn!(
                    id,
                    consecutive = consecutive_auth,
                    "authentication exhausted; halting"
                );
                termination = Termination::AuthExhausted { last_id: id };
                break;
            }
        } else {
            consecutive_auth = 0;
        }

        if stats.total_checked % settings.progress_every == 0 {
            observer.on_progress(&ProgressStats {
                processed: stats.total_checked,
                succeeded: stats.successful,
                remaining: remaining_to_fetch(range, id, &settings.skip),
                elapsed_secs: started.elapsed().as_secs_f64(),
            });
        }

        if abort.is_aborted() {
            termination = Termination::Interrupted { last_id: Some(id) };
            break;
        }
    }

    stats.elapsed = started.elapsed();
    tracing::info!(
        checked = stats.total_checked,
        successful = stats.successful,
        not_found = stats.not_found,
        auth_required = stats.auth_required,
        errors = stats.errors,
        termination = ?termination,
        "sweep finished"
    );
    RunReport { stats, termination }
}

/// Ids after `id` that will still be requested (skipped ones excluded).
fn remaining_to_fetch(range: RefRange, id: u64, skip: &BTreeSet<u64>) -> u64 {
    let ahead = range.remaining_after(id);
    if ahead == 0 {
        return 0;
    }
    let skipped_ahead = skip.range(id + 1..=range.end()).count() as u64;
    ahead.saturating_sub(skipped_ahead)
}

/// One id, re-fetched while the result is a retryable transient error.
fn fetch_with_retry<F: Fetch + ?Sized>(
    fetcher: &mut F,
    id: u64,
    settings: &RunSettings,
    abort: &AbortToken,
) -> Result<FetchResult, SweepError> {
    let mut attempt = 1u32;
    loop {
        let result = fetcher.fetch_one(id)?;
        let FetchResult::TransientError { cause, .. } = &result else {
            return Ok(result);
        };
        match settings.retry.decide(attempt, classify_transient(cause)) {
            RetryDecision::NoRetry => return Ok(result),
            RetryDecision::RetryAfter(backoff) => {
                let wait = backoff.max(settings.delay);
                tracing::warn!(id, attempt, wait_ms = wait.as_millis() as u64, "{}; retrying", cause);
                if !abort.sleep(wait) {
                    return Ok(result);
                }
                attempt += 1;
            }
        }
    }
}

fn log_result(id: u64, result: &FetchResult) {
    match result {
        FetchResult::Success { path, bytes, .. } => {
            tracing::info!(id, bytes, path = %path.display(), "downloaded")
        }
        FetchResult::NotFound { reason, .. } => tracing::debug!(id, "not found: {}", reason),
        FetchResult::AuthRequired { reason, url } => {
            tracing::warn!(id, %url, "auth required: {}", reason)
        }
        FetchResult::TransientError { cause, url } => {
            tracing::warn!(id, %url, "error: {}", cause)
        }
    }
}
